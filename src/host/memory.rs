//! In-memory editor host and buffer.
//!
//! `MemoryBuffer` keeps its text in a `String` and its listeners and overlays
//! in `DashMap`s. It backs headless sessions, buffers materialized from disk,
//! and the tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use super::{
    ActiveChangeListener, BufferChange, ChangeListener, EditorBuffer, EditorHost, ListenerId,
    OverlayId, SelectionListener,
};
use crate::error::LockResultExt;
use crate::protocol::{BufferPosition, ChangeOrigin, LinearOffset, SelectionRange, split_lines};
use crate::text::{PositionMapper, replace_range};

/// A caret widget currently placed in a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretWidget {
    pub id: OverlayId,
    pub at: BufferPosition,
    pub class_name: String,
}

/// A range decoration currently applied to a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeMark {
    pub id: OverlayId,
    pub from: BufferPosition,
    pub to: BufferPosition,
    pub class_name: String,
}

pub struct MemoryBuffer {
    path: Option<PathBuf>,
    text: Mutex<String>,
    change_listeners: DashMap<ListenerId, ChangeListener>,
    selection_listeners: DashMap<ListenerId, SelectionListener>,
    carets: DashMap<OverlayId, CaretWidget>,
    marks: DashMap<OverlayId, RangeMark>,
}

impl std::fmt::Debug for MemoryBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBuffer")
            .field("path", &self.path)
            .field("change_listeners", &self.change_listeners.len())
            .field("selection_listeners", &self.selection_listeners.len())
            .field("carets", &self.carets.len())
            .field("marks", &self.marks.len())
            .finish()
    }
}

impl MemoryBuffer {
    pub fn new(path: Option<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path,
            text: Mutex::new(content.into()),
            change_listeners: DashMap::new(),
            selection_listeners: DashMap::new(),
            carets: DashMap::new(),
            marks: DashMap::new(),
        }
    }

    /// Buffer backed by the file at `path`.
    pub fn with_path(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(Some(path.into()), content)
    }

    /// Buffer with no backing file.
    pub fn scratch(content: impl Into<String>) -> Self {
        Self::new(None, content)
    }

    /// Simulate the user typing over `from..to`.
    pub fn edit(&self, from: BufferPosition, to: BufferPosition, text: &str) {
        self.replace_range(&split_lines(text), from, to, ChangeOrigin::Input);
    }

    /// Simulate the user changing the selection. Ranges are reported as given.
    pub fn select(&self, ranges: Vec<SelectionRange>) {
        let mut listeners: Vec<_> = self
            .selection_listeners
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        listeners.sort_by_key(|(id, _)| *id);
        for (_, listener) in listeners {
            listener(&ranges);
        }
    }

    /// Caret widgets currently placed, in creation order.
    pub fn carets(&self) -> Vec<CaretWidget> {
        let mut carets: Vec<_> = self.carets.iter().map(|e| e.value().clone()).collect();
        carets.sort_by_key(|caret| caret.id);
        carets
    }

    /// Range decorations currently applied, in creation order.
    pub fn marks(&self) -> Vec<RangeMark> {
        let mut marks: Vec<_> = self.marks.iter().map(|e| e.value().clone()).collect();
        marks.sort_by_key(|mark| mark.id);
        marks
    }

    /// Number of change plus selection listeners.
    pub fn listener_count(&self) -> usize {
        self.change_listeners.len() + self.selection_listeners.len()
    }

    fn notify_change(&self, change: &BufferChange) {
        let mut listeners: Vec<_> = self
            .change_listeners
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        listeners.sort_by_key(|(id, _)| *id);
        for (_, listener) in listeners {
            listener(change);
        }
    }
}

impl EditorBuffer for MemoryBuffer {
    fn absolute_path(&self) -> Option<PathBuf> {
        self.path.clone()
    }

    fn content(&self) -> String {
        self.text.lock().recover_poison("MemoryBuffer::content").clone()
    }

    fn position_from_offset(&self, offset: LinearOffset) -> BufferPosition {
        let text = self
            .text
            .lock()
            .recover_poison("MemoryBuffer::position_from_offset");
        PositionMapper::new(&text).position_from_offset(offset)
    }

    fn offset_from_position(&self, position: BufferPosition) -> LinearOffset {
        let text = self
            .text
            .lock()
            .recover_poison("MemoryBuffer::offset_from_position");
        PositionMapper::new(&text).offset_from_position(position)
    }

    fn replace_range(
        &self,
        inserted_text: &[String],
        from: BufferPosition,
        to: BufferPosition,
        origin: ChangeOrigin,
    ) {
        let replacement = {
            let mut text = self.text.lock().recover_poison("MemoryBuffer::replace_range");
            replace_range(&mut text, from, to, inserted_text)
        };

        self.notify_change(&BufferChange {
            from: replacement.from,
            to: replacement.to,
            removed_text: replacement.removed_text,
            inserted_text: inserted_text.to_vec(),
            origin,
        });
    }

    fn set_value(&self, content: &str) {
        let (old_end, removed_text) = {
            let mut text = self.text.lock().recover_poison("MemoryBuffer::set_value");
            let old_end = PositionMapper::new(&text).end_position();
            let removed = split_lines(&text);
            *text = content.to_string();
            (old_end, removed)
        };

        self.notify_change(&BufferChange {
            from: BufferPosition::ZERO,
            to: old_end,
            removed_text,
            inserted_text: split_lines(content),
            origin: ChangeOrigin::SetValue,
        });
    }

    fn subscribe_changes(&self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId::next();
        self.change_listeners.insert(id, listener);
        id
    }

    fn subscribe_selections(&self, listener: SelectionListener) -> ListenerId {
        let id = ListenerId::next();
        self.selection_listeners.insert(id, listener);
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.change_listeners.remove(&id);
        self.selection_listeners.remove(&id);
    }

    fn add_caret_widget(&self, at: BufferPosition, class_name: &str) -> OverlayId {
        let id = OverlayId::next();
        self.carets.insert(
            id,
            CaretWidget {
                id,
                at,
                class_name: class_name.to_string(),
            },
        );
        id
    }

    fn remove_caret_widget(&self, id: OverlayId) {
        self.carets.remove(&id);
    }

    fn mark_range(
        &self,
        from: BufferPosition,
        to: BufferPosition,
        class_name: &str,
    ) -> OverlayId {
        let id = OverlayId::next();
        self.marks.insert(
            id,
            RangeMark {
                id,
                from,
                to,
                class_name: class_name.to_string(),
            },
        );
        id
    }

    fn clear_marks(&self) {
        self.marks.clear();
    }
}

/// Editor host holding at most one focused [`MemoryBuffer`].
pub struct MemoryHost {
    project_root: PathBuf,
    active: Mutex<Option<Arc<MemoryBuffer>>>,
    active_listeners: DashMap<ListenerId, ActiveChangeListener>,
}

impl MemoryHost {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            active: Mutex::new(None),
            active_listeners: DashMap::new(),
        }
    }

    /// Give `buffer` the focus and notify subscribers.
    pub fn focus(&self, buffer: Arc<MemoryBuffer>) {
        *self.active.lock().recover_poison("MemoryHost::focus") = Some(Arc::clone(&buffer));
        self.notify(Some(buffer as Arc<dyn EditorBuffer>));
    }

    /// Drop the focus from every buffer and notify subscribers.
    pub fn blur(&self) {
        *self.active.lock().recover_poison("MemoryHost::blur") = None;
        self.notify(None);
    }

    /// The focused buffer with its concrete type.
    pub fn active_memory_buffer(&self) -> Option<Arc<MemoryBuffer>> {
        self.active
            .lock()
            .recover_poison("MemoryHost::active_memory_buffer")
            .clone()
    }

    pub fn active_listener_count(&self) -> usize {
        self.active_listeners.len()
    }

    fn notify(&self, buffer: Option<Arc<dyn EditorBuffer>>) {
        let mut listeners: Vec<_> = self
            .active_listeners
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        listeners.sort_by_key(|(id, _)| *id);
        for (_, listener) in listeners {
            listener(buffer.clone());
        }
    }
}

impl EditorHost for MemoryHost {
    fn project_root(&self) -> PathBuf {
        self.project_root.clone()
    }

    fn active_buffer(&self) -> Option<Arc<dyn EditorBuffer>> {
        self.active_memory_buffer()
            .map(|buffer| buffer as Arc<dyn EditorBuffer>)
    }

    fn on_active_change(&self, listener: ActiveChangeListener) -> ListenerId {
        let id = ListenerId::next();
        self.active_listeners.insert(id, listener);
        id
    }

    fn off_active_change(&self, id: ListenerId) {
        self.active_listeners.remove(&id);
    }
}
