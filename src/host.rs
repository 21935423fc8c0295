//! Collaborator interfaces the bridge depends on.
//!
//! The bridge never talks to a concrete editor. It sees:
//! - an [`EditorHost`]: project root, the active buffer, and change subscriptions
//! - [`EditorBuffer`]s: live text plus the overlay primitives used for remote cursors
//! - a [`Storage`]: file operations against absolute paths
//! - a [`BufferMaterializer`]: loads a buffer for a file that is not active
//!
//! [`memory`] provides an in-memory host and buffer; [`fs`] provides
//! tokio-backed storage and materialization.

pub mod fs;
pub mod memory;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::BridgeResult;
use crate::protocol::{
    BufferPosition, ChangeOrigin, ChangeRecord, LinearOffset, SelectionRange,
};

pub use fs::{FsMaterializer, FsStorage};
pub use memory::{CaretWidget, MemoryBuffer, MemoryHost, RangeMark};

/// Boxed future returned by collaborator operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handle identifying one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocate a process-unique listener id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle identifying one visual overlay (caret widget or range mark).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(u64);

impl OverlayId {
    /// Allocate a process-unique overlay id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A mutation the buffer reports after it has been applied.
///
/// `from`/`to` describe the replaced range in the content before the edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferChange {
    pub from: BufferPosition,
    pub to: BufferPosition,
    pub removed_text: Vec<String>,
    pub inserted_text: Vec<String>,
    pub origin: ChangeOrigin,
}

pub type ChangeListener = Arc<dyn Fn(&BufferChange) + Send + Sync>;
pub type SelectionListener = Arc<dyn Fn(&[SelectionRange]) + Send + Sync>;
pub type ActiveChangeListener = Arc<dyn Fn(Option<Arc<dyn EditorBuffer>>) + Send + Sync>;

/// A live, editable text buffer.
///
/// Change and selection listeners are invoked synchronously, after the
/// mutation is visible through `content()`, on the thread that caused it.
/// Position conversion clamping is defined by the implementation.
pub trait EditorBuffer: Send + Sync {
    /// Absolute path of the file backing this buffer, if any.
    fn absolute_path(&self) -> Option<PathBuf>;

    /// Current content.
    fn content(&self) -> String;

    fn position_from_offset(&self, offset: LinearOffset) -> BufferPosition;

    fn offset_from_position(&self, position: BufferPosition) -> LinearOffset;

    /// Replace `from..to` with `inserted_text` (one entry per line).
    fn replace_range(
        &self,
        inserted_text: &[String],
        from: BufferPosition,
        to: BufferPosition,
        origin: ChangeOrigin,
    );

    /// Replace the whole content. Reported with origin [`ChangeOrigin::SetValue`].
    fn set_value(&self, content: &str);

    fn subscribe_changes(&self, listener: ChangeListener) -> ListenerId;

    fn subscribe_selections(&self, listener: SelectionListener) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId);

    /// Place a zero-width caret widget at `at`.
    fn add_caret_widget(&self, at: BufferPosition, class_name: &str) -> OverlayId;

    fn remove_caret_widget(&self, id: OverlayId);

    /// Decorate `from..to` persistently.
    fn mark_range(&self, from: BufferPosition, to: BufferPosition, class_name: &str)
    -> OverlayId;

    /// Remove every range decoration on this buffer.
    fn clear_marks(&self);
}

/// The editor application hosting the buffers.
pub trait EditorHost: Send + Sync {
    /// Absolute path of the session's project root.
    fn project_root(&self) -> PathBuf;

    /// The buffer with the user's focus, if any.
    fn active_buffer(&self) -> Option<Arc<dyn EditorBuffer>>;

    /// Subscribe to active-buffer switches. Called with None when focus leaves
    /// every buffer.
    fn on_active_change(&self, listener: ActiveChangeListener) -> ListenerId;

    fn off_active_change(&self, id: ListenerId);

    fn on_buffer_change(
        &self,
        buffer: &Arc<dyn EditorBuffer>,
        listener: ChangeListener,
    ) -> ListenerId {
        buffer.subscribe_changes(listener)
    }

    fn on_selection_change(
        &self,
        buffer: &Arc<dyn EditorBuffer>,
        listener: SelectionListener,
    ) -> ListenerId {
        buffer.subscribe_selections(listener)
    }

    fn off_buffer(&self, buffer: &Arc<dyn EditorBuffer>, id: ListenerId) {
        buffer.unsubscribe(id);
    }
}

/// Persistent storage for files that are not open in the editor.
///
/// Failures are returned as-is to whoever asked the bridge for the operation.
pub trait Storage: Send + Sync {
    fn change<'a>(&'a self, path: &'a Path, change: &'a ChangeRecord)
    -> BoxFuture<'a, BridgeResult<()>>;

    fn create_file<'a>(&'a self, path: &'a Path, content: &'a str)
    -> BoxFuture<'a, BridgeResult<()>>;

    fn create_directory<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, BridgeResult<()>>;

    fn delete_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, BridgeResult<()>>;
}

/// Produces a buffer for a file that is not the active one.
///
/// Each call must reflect the file's content at call time.
pub trait BufferMaterializer: Send + Sync {
    fn materialize<'a>(&'a self, path: &'a Path)
    -> BoxFuture<'a, BridgeResult<Arc<dyn EditorBuffer>>>;
}
