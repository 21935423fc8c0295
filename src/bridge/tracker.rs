//! Active-document tracking.
//!
//! Two states: Idle and Focused. Each switch drops the listeners of the
//! previously focused buffer before the new buffer is subscribed. The state
//! lock is never held while calling into the host or a buffer.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, warn};

use super::translator::BufferTarget;
use crate::error::{BridgeError, BridgeResult, LockResultExt};
use crate::host::{ChangeListener, EditorBuffer, EditorHost, ListenerId, SelectionListener};
use crate::protocol::RelativePath;

const LOG_TARGET: &str = "editbridge::tracker";

/// The focused buffer and its listener registrations.
struct ActiveDocument {
    buffer: Arc<dyn EditorBuffer>,
    path: Option<RelativePath>,
    listeners: Vec<ListenerId>,
}

enum TrackerState {
    Idle,
    Focused(ActiveDocument),
}

pub struct ActiveDocumentTracker {
    state: Mutex<TrackerState>,
    project_root: Mutex<Option<PathBuf>>,
}

impl Default for ActiveDocumentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveDocumentTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState::Idle),
            project_root: Mutex::new(None),
        }
    }

    pub fn set_project_root(&self, root: Option<PathBuf>) {
        *self
            .project_root
            .lock()
            .recover_poison("ActiveDocumentTracker::set_project_root") = root;
    }

    pub fn project_root(&self) -> Option<PathBuf> {
        self.project_root
            .lock()
            .recover_poison("ActiveDocumentTracker::project_root")
            .clone()
    }

    /// Focused buffer and its project-relative path.
    pub fn active(&self) -> Option<(Arc<dyn EditorBuffer>, Option<RelativePath>)> {
        match &*self.state.lock().recover_poison("ActiveDocumentTracker::active") {
            TrackerState::Idle => None,
            TrackerState::Focused(doc) => Some((Arc::clone(&doc.buffer), doc.path.clone())),
        }
    }

    pub fn active_path(&self) -> Option<RelativePath> {
        match &*self
            .state
            .lock()
            .recover_poison("ActiveDocumentTracker::active_path")
        {
            TrackerState::Idle => None,
            TrackerState::Focused(doc) => doc.path.clone(),
        }
    }

    /// Absolute location of `path` under the project root.
    pub fn absolute_path(&self, path: &RelativePath) -> BridgeResult<PathBuf> {
        self.project_root()
            .map(|root| path.to_absolute(&root))
            .ok_or(BridgeError::NotStarted)
    }

    /// Decide whether `path` is served by the live buffer or by storage.
    pub fn resolve(&self, path: &RelativePath) -> BridgeResult<BufferTarget> {
        let absolute = self.absolute_path(path)?;
        if let Some((buffer, Some(active))) = self.active()
            && &active == path
        {
            return Ok(BufferTarget::Live(buffer));
        }
        Ok(BufferTarget::Stored(absolute))
    }

    /// Move to Focused(`buffer`), or to Idle when `buffer` is None.
    ///
    /// `make_listeners` builds the change and selection listeners for the new
    /// buffer from its resolved path. Returns that path.
    pub fn active_changed<F>(
        &self,
        host: &dyn EditorHost,
        buffer: Option<Arc<dyn EditorBuffer>>,
        make_listeners: F,
    ) -> Option<RelativePath>
    where
        F: FnOnce(&Arc<dyn EditorBuffer>, Option<RelativePath>) -> (ChangeListener, SelectionListener),
    {
        self.release(host);

        let buffer = buffer?;
        let path = self.relative_path_of(buffer.as_ref());
        let (on_change, on_selection) = make_listeners(&buffer, path.clone());
        let listeners = vec![
            host.on_buffer_change(&buffer, on_change),
            host.on_selection_change(&buffer, on_selection),
        ];
        debug!(
            target: LOG_TARGET,
            "Focused {}",
            path.as_ref()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "<no path>".to_string())
        );

        *self
            .state
            .lock()
            .recover_poison("ActiveDocumentTracker::active_changed") =
            TrackerState::Focused(ActiveDocument {
                buffer,
                path: path.clone(),
                listeners,
            });
        path
    }

    /// Unsubscribe from the focused buffer and go Idle.
    pub fn release(&self, host: &dyn EditorHost) {
        let previous = std::mem::replace(
            &mut *self.state.lock().recover_poison("ActiveDocumentTracker::release"),
            TrackerState::Idle,
        );
        if let TrackerState::Focused(doc) = previous {
            for id in doc.listeners {
                host.off_buffer(&doc.buffer, id);
            }
        }
    }

    fn relative_path_of(&self, buffer: &dyn EditorBuffer) -> Option<RelativePath> {
        let root = self.project_root()?;
        let absolute = buffer.absolute_path()?;
        let path = RelativePath::from_project(&root, &absolute);
        if path.is_none() {
            warn!(
                target: LOG_TARGET,
                "Active buffer {} is outside project root {}",
                absolute.display(),
                root.display()
            );
        }
        path
    }
}
