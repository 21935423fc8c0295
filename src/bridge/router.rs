//! `SessionBridge`: the façade the transport talks to.
//!
//! Inbound calls are routed to the live buffer when they target the active
//! file and to the storage collaborator otherwise. Local edits and selection
//! changes come out of the receiver returned by [`SessionBridge::new`].

use std::sync::{Arc, Mutex, Weak};

use arc_swap::ArcSwap;
use log::{debug, info, trace};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::relay::ChangeRelay;
use super::scheduler::RenderScheduler;
use super::selection::{OverlayRenderer, selection_event};
use super::tracker::ActiveDocumentTracker;
use super::translator::Translator;
use crate::config::{BridgeSettings, RenderMode};
use crate::error::{BridgeError, BridgeResult, LockResultExt};
use crate::host::{
    BufferChange, BufferMaterializer, ChangeListener, EditorBuffer, EditorHost, ListenerId,
    SelectionListener, Storage,
};
use crate::protocol::{
    BridgeEvent, BufferPosition, ChangeRecord, LinearOffset, RelativePath, SelectionRange,
    SelectionSet,
};

const LOG_TARGET: &str = "editbridge::router";

enum Lifecycle {
    Stopped,
    Started { host_listener: Option<ListenerId> },
}

struct BridgeInner {
    host: Arc<dyn EditorHost>,
    storage: Arc<dyn Storage>,
    translator: Translator,
    relay: ChangeRelay,
    renderer: OverlayRenderer,
    scheduler: RenderScheduler,
    tracker: ActiveDocumentTracker,
    settings: ArcSwap<BridgeSettings>,
    events: UnboundedSender<BridgeEvent>,
    lifecycle: Mutex<Lifecycle>,
}

/// Synchronization bridge between one editor host and one collaboration session.
///
/// Cloning is cheap; clones share the same session state.
#[derive(Clone)]
pub struct SessionBridge {
    inner: Arc<BridgeInner>,
}

impl std::fmt::Debug for SessionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBridge")
            .field("started", &self.is_started())
            .field("active_path", &self.active_path())
            .finish()
    }
}

impl SessionBridge {
    /// Create a stopped bridge and the receiver its outbound events go to.
    pub fn new(
        host: Arc<dyn EditorHost>,
        storage: Arc<dyn Storage>,
        materializer: Arc<dyn BufferMaterializer>,
        settings: BridgeSettings,
    ) -> (Self, UnboundedReceiver<BridgeEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let inner = BridgeInner {
            host,
            storage,
            translator: Translator::new(materializer),
            relay: ChangeRelay::new(),
            renderer: OverlayRenderer::new(),
            scheduler: RenderScheduler::new(),
            tracker: ActiveDocumentTracker::new(),
            settings: ArcSwap::from_pointee(settings),
            events,
            lifecycle: Mutex::new(Lifecycle::Stopped),
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            receiver,
        )
    }

    /// Subscribe to the host and activate its current buffer.
    ///
    /// Must be called from within a tokio runtime; render passes run on it.
    pub fn start(&self) -> BridgeResult<()> {
        {
            let mut lifecycle = self.inner.lifecycle.lock().recover_poison("SessionBridge::start");
            if matches!(*lifecycle, Lifecycle::Started { .. }) {
                return Err(BridgeError::AlreadyStarted);
            }
            self.inner.scheduler.bind()?;
            *lifecycle = Lifecycle::Started {
                host_listener: None,
            };
        }

        let root = self.inner.host.project_root();
        info!(target: LOG_TARGET, "Starting session bridge at {}", root.display());
        self.inner.tracker.set_project_root(Some(root));

        let weak = Arc::downgrade(&self.inner);
        let id = self
            .inner
            .host
            .on_active_change(Arc::new(move |buffer: Option<Arc<dyn EditorBuffer>>| {
                if let Some(inner) = weak.upgrade() {
                    inner.activate(buffer);
                }
            }));
        if let Lifecycle::Started { host_listener } =
            &mut *self.inner.lifecycle.lock().recover_poison("SessionBridge::start")
        {
            *host_listener = Some(id);
        }

        self.inner.activate(self.inner.host.active_buffer());
        Ok(())
    }

    /// Unsubscribe everything, remove overlays and cancel pending passes.
    ///
    /// Does nothing when not started.
    pub fn stop(&self) {
        let previous = std::mem::replace(
            &mut *self.inner.lifecycle.lock().recover_poison("SessionBridge::stop"),
            Lifecycle::Stopped,
        );
        let Lifecycle::Started { host_listener } = previous else {
            return;
        };

        if let Some(id) = host_listener {
            self.inner.host.off_active_change(id);
        }
        self.inner.scheduler.unbind();
        if let Some((buffer, _)) = self.inner.tracker.active() {
            buffer.clear_marks();
        }
        self.inner.renderer.drop_carets();
        self.inner.tracker.release(self.inner.host.as_ref());
        self.inner.tracker.set_project_root(None);
        info!(target: LOG_TARGET, "Session bridge stopped");
    }

    pub fn is_started(&self) -> bool {
        matches!(
            *self
                .inner
                .lifecycle
                .lock()
                .recover_poison("SessionBridge::is_started"),
            Lifecycle::Started { .. }
        )
    }

    /// Apply a remote edit.
    pub async fn change(&self, path: &RelativePath, change: &ChangeRecord) -> BridgeResult<()> {
        let target = self.inner.tracker.resolve(path)?;
        debug!(target: LOG_TARGET, "change {} -> {:?}", path, target);
        self.inner
            .relay
            .apply(&target, change, self.inner.storage.as_ref())
            .await
    }

    /// Create a file, or replace its whole content.
    pub async fn create_file(&self, path: &RelativePath, content: &str) -> BridgeResult<()> {
        let target = self.inner.tracker.resolve(path)?;
        debug!(target: LOG_TARGET, "createFile {} -> {:?}", path, target);
        self.inner
            .relay
            .replace_content(&target, content, self.inner.storage.as_ref())
            .await
    }

    pub async fn create_directory(&self, path: &RelativePath) -> BridgeResult<()> {
        let absolute = self.inner.tracker.absolute_path(path)?;
        debug!(target: LOG_TARGET, "createDirectory {}", absolute.display());
        self.inner.storage.create_directory(&absolute).await
    }

    pub async fn delete_file(&self, path: &RelativePath) -> BridgeResult<()> {
        let absolute = self.inner.tracker.absolute_path(path)?;
        debug!(target: LOG_TARGET, "deleteFile {}", absolute.display());
        self.inner.storage.delete_file(&absolute).await
    }

    /// Replace all remote overlay state with `selections`.
    ///
    /// Rendering happens after the configured delay. Before `start()` the
    /// batch is only stored, to be drawn on the first activation.
    pub fn highlight(&self, selections: Vec<SelectionSet>) {
        if !self.inner.scheduler.is_bound() {
            trace!(target: LOG_TARGET, "Storing highlight batch while stopped");
            self.inner.renderer.store(selections);
            return;
        }
        let settings = self.inner.settings.load();
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .scheduler
            .schedule(settings.render_delay, settings.render_mode, move || {
                if let Some(inner) = weak.upgrade() {
                    inner.render_pass(Some(selections));
                }
            });
    }

    pub async fn position_from_offset(
        &self,
        path: &RelativePath,
        offset: LinearOffset,
    ) -> BridgeResult<BufferPosition> {
        let target = self.inner.tracker.resolve(path)?;
        self.inner
            .translator
            .position_from_offset(&target, offset)
            .await
    }

    pub async fn offset_from_position(
        &self,
        path: &RelativePath,
        position: BufferPosition,
    ) -> BridgeResult<LinearOffset> {
        let target = self.inner.tracker.resolve(path)?;
        self.inner
            .translator
            .offset_from_position(&target, position)
            .await
    }

    /// Callback form of [`Self::position_from_offset`].
    ///
    /// The callback runs before this returns when `path` is the active file,
    /// and later on the bridge's runtime otherwise.
    pub fn pos_from_index<F>(&self, path: &RelativePath, offset: LinearOffset, callback: F)
    where
        F: FnOnce(BridgeResult<BufferPosition>) + Send + 'static,
    {
        let target = match self.inner.tracker.resolve(path) {
            Ok(target) => target,
            Err(e) => return callback(Err(e)),
        };
        if let Some(position) = Translator::position_from_offset_now(&target, offset) {
            return callback(Ok(position));
        }
        let inner = Arc::clone(&self.inner);
        let spawned = self.inner.scheduler.spawn(async move {
            callback(inner.translator.position_from_offset(&target, offset).await);
        });
        if !spawned {
            debug!(target: LOG_TARGET, "posFromIndex dropped; bridge stopped");
        }
    }

    /// Callback form of [`Self::offset_from_position`].
    pub fn index_from_pos<F>(&self, path: &RelativePath, position: BufferPosition, callback: F)
    where
        F: FnOnce(BridgeResult<LinearOffset>) + Send + 'static,
    {
        let target = match self.inner.tracker.resolve(path) {
            Ok(target) => target,
            Err(e) => return callback(Err(e)),
        };
        if let Some(offset) = Translator::offset_from_position_now(&target, position) {
            return callback(Ok(offset));
        }
        let inner = Arc::clone(&self.inner);
        let spawned = self.inner.scheduler.spawn(async move {
            callback(inner.translator.offset_from_position(&target, position).await);
        });
        if !spawned {
            debug!(target: LOG_TARGET, "indexFromPos dropped; bridge stopped");
        }
    }

    /// Project-relative path of the active buffer, if it has one.
    pub fn active_path(&self) -> Option<RelativePath> {
        self.inner.tracker.active_path()
    }

    /// The most recently rendered (or stored) remote selection batch.
    pub fn last_selections(&self) -> Arc<Vec<SelectionSet>> {
        self.inner.renderer.last_known()
    }

    pub fn settings(&self) -> Arc<BridgeSettings> {
        self.inner.settings.load_full()
    }

    /// Swap settings. Takes effect from the next scheduled pass.
    pub fn apply_settings(&self, settings: BridgeSettings) {
        self.inner.settings.store(Arc::new(settings));
    }
}

impl BridgeInner {
    fn activate(self: &Arc<Self>, buffer: Option<Arc<dyn EditorBuffer>>) {
        self.renderer.drop_carets();

        let weak = Arc::downgrade(self);
        let path = self
            .tracker
            .active_changed(self.host.as_ref(), buffer, |buffer, path| {
                listeners_for(weak, Arc::downgrade(buffer), path)
            });

        if self.tracker.active().is_none() {
            debug!(target: LOG_TARGET, "No active buffer");
            return;
        }

        let settings = self.settings.load();
        let weak = Arc::downgrade(self);
        self.scheduler
            .schedule(settings.render_delay, RenderMode::FireAndForget, move || {
                if let Some(inner) = weak.upgrade() {
                    inner.render_pass(None);
                }
            });

        if let Some(path) = path {
            self.emit(BridgeEvent::ChangeFile {
                path,
                change: ChangeRecord::activation(),
            });
        }
    }

    /// One render pass. `batch` replaces the last-known batch when given.
    fn render_pass(&self, batch: Option<Vec<SelectionSet>>) {
        let settings = self.settings.load();
        let active = self.tracker.active();
        let active = active
            .as_ref()
            .map(|(buffer, path)| (buffer, path.as_ref()));
        match batch {
            Some(batch) => self.renderer.render(batch, active, &settings),
            None => self.renderer.redraw(active, &settings),
        }
    }

    fn on_local_change(
        &self,
        buffer: &dyn EditorBuffer,
        path: Option<&RelativePath>,
        change: &BufferChange,
    ) {
        if let Some(event) = self.relay.local_change(path, buffer, change) {
            self.emit(event);
        }
    }

    fn on_local_selection(&self, path: Option<&RelativePath>, ranges: &[SelectionRange]) {
        if let Some(event) = selection_event(path, ranges) {
            trace!(target: LOG_TARGET, "Local selection with {} ranges", ranges.len());
            self.emit(event);
        }
    }

    fn emit(&self, event: BridgeEvent) {
        if self.events.send(event).is_err() {
            trace!(target: LOG_TARGET, "Event receiver dropped; discarding event");
        }
    }
}

fn listeners_for(
    inner: Weak<BridgeInner>,
    buffer: Weak<dyn EditorBuffer>,
    path: Option<RelativePath>,
) -> (ChangeListener, SelectionListener) {
    let change_inner = inner.clone();
    let change_path = path.clone();
    let on_change: ChangeListener = Arc::new(move |change: &BufferChange| {
        let (Some(inner), Some(buffer)) = (change_inner.upgrade(), buffer.upgrade()) else {
            return;
        };
        inner.on_local_change(buffer.as_ref(), change_path.as_ref(), change);
    });
    let on_selection: SelectionListener = Arc::new(move |ranges: &[SelectionRange]| {
        if let Some(inner) = inner.upgrade() {
            inner.on_local_selection(path.as_ref(), ranges);
        }
    });
    (on_change, on_selection)
}
