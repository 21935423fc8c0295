//! Bidirectional edit propagation with echo suppression.
//!
//! Local edits become [`BridgeEvent::ChangeFile`]. Remote edits are applied to
//! the live buffer while the [`ApplyGuard`] is held, so the change notification
//! the buffer fires in response is recognised and dropped instead of being
//! sent back out.

use std::sync::atomic::{AtomicU8, Ordering};

use log::{debug, trace, warn};

use super::translator::BufferTarget;
use crate::error::BridgeResult;
use crate::host::{BufferChange, EditorBuffer, Storage};
use crate::protocol::{BridgeEvent, ChangeOrigin, ChangeRecord, RelativePath};

const LOG_TARGET: &str = "editbridge::relay";

const IDLE: u8 = 0;
const APPLYING: u8 = 1;

/// Single-writer flag marking that a remote mutation is in progress.
///
/// Held only across the synchronous buffer mutation. Entering while already
/// applying is a programming error.
#[derive(Debug, Default)]
pub struct ApplyGuard {
    state: AtomicU8,
}

/// Releases the [`ApplyGuard`] when dropped.
#[must_use = "the guard is released as soon as the token is dropped"]
pub struct ApplyToken<'a> {
    guard: &'a ApplyGuard,
}

impl ApplyGuard {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
        }
    }

    pub fn enter(&self) -> ApplyToken<'_> {
        if self
            .state
            .compare_exchange(IDLE, APPLYING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug_assert!(false, "nested remote apply");
            warn!(target: LOG_TARGET, "Nested remote apply; applies must be serialized");
        }
        ApplyToken { guard: self }
    }

    pub fn is_applying(&self) -> bool {
        self.state.load(Ordering::Acquire) == APPLYING
    }
}

impl Drop for ApplyToken<'_> {
    fn drop(&mut self) {
        self.guard.state.store(IDLE, Ordering::Release);
    }
}

#[derive(Debug, Default)]
pub struct ChangeRelay {
    guard: ApplyGuard,
}

impl ChangeRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_applying(&self) -> bool {
        self.guard.is_applying()
    }

    /// Translate a local buffer mutation into an outbound event.
    ///
    /// Returns None for whole-buffer initialization, for mutations caused by
    /// a remote apply, and when the buffer has no project-relative path.
    pub fn local_change(
        &self,
        path: Option<&RelativePath>,
        buffer: &dyn EditorBuffer,
        change: &BufferChange,
    ) -> Option<BridgeEvent> {
        if change.origin == ChangeOrigin::SetValue {
            trace!(target: LOG_TARGET, "Skipping setValue change");
            return None;
        }
        if self.is_applying() {
            trace!(target: LOG_TARGET, "Skipping echo of remote change at {}", change.from);
            return None;
        }
        let path = path?;

        let record = ChangeRecord {
            from: change.from,
            to: change.to,
            start: buffer.offset_from_position(change.from),
            removed_text: change.removed_text.clone(),
            inserted_text: change.inserted_text.clone(),
            origin: change.origin.clone(),
        };
        debug!(
            target: LOG_TARGET,
            "Local change in {} at offset {}",
            path,
            record.start
        );
        Some(BridgeEvent::ChangeFile {
            path: path.clone(),
            change: record,
        })
    }

    /// Apply a remote change to the live buffer, or forward it to storage.
    pub async fn apply(
        &self,
        target: &BufferTarget,
        change: &ChangeRecord,
        storage: &dyn Storage,
    ) -> BridgeResult<()> {
        match target {
            BufferTarget::Live(buffer) => {
                self.apply_live(buffer.as_ref(), change);
                Ok(())
            }
            BufferTarget::Stored(path) => {
                debug!(
                    target: LOG_TARGET,
                    "Forwarding remote change to storage: {}",
                    path.display()
                );
                storage.change(path, change).await
            }
        }
    }

    /// Replace a file's whole content in the live buffer, or write it through storage.
    pub async fn replace_content(
        &self,
        target: &BufferTarget,
        content: &str,
        storage: &dyn Storage,
    ) -> BridgeResult<()> {
        match target {
            BufferTarget::Live(buffer) => {
                let _token = self.guard.enter();
                buffer.set_value(content);
                debug!(target: LOG_TARGET, "Replaced live buffer content");
                Ok(())
            }
            BufferTarget::Stored(path) => storage.create_file(path, content).await,
        }
    }

    fn apply_live(&self, buffer: &dyn EditorBuffer, change: &ChangeRecord) {
        let _token = self.guard.enter();
        buffer.replace_range(
            &change.inserted_text,
            change.from,
            change.to,
            ChangeOrigin::Remote,
        );
        debug!(
            target: LOG_TARGET,
            "Applied remote change {}..{} to live buffer",
            change.from,
            change.to
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryBuffer;
    use crate::protocol::BufferPosition;
    use std::sync::Arc;
    use std::sync::Mutex;

    fn pos(line: usize, column: usize) -> BufferPosition {
        BufferPosition::new(line, column)
    }

    fn change(origin: ChangeOrigin) -> BufferChange {
        BufferChange {
            from: pos(1, 1),
            to: pos(1, 1),
            removed_text: vec![String::new()],
            inserted_text: vec!["x".to_string()],
            origin,
        }
    }

    #[test]
    fn test_local_change_resolves_start_offset() {
        let relay = ChangeRelay::new();
        let buffer = MemoryBuffer::scratch("ab\ncxd");
        let path = RelativePath::from_wire("a.js").unwrap();

        let event = relay
            .local_change(Some(&path), &buffer, &change(ChangeOrigin::Input))
            .unwrap();

        match event {
            BridgeEvent::ChangeFile { path, change } => {
                assert_eq!(path.as_str(), "a.js");
                assert_eq!(change.start, 4);
                assert_eq!(change.inserted_text, vec!["x"]);
                assert_eq!(change.origin, ChangeOrigin::Input);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_set_value_and_missing_path_are_not_emitted() {
        let relay = ChangeRelay::new();
        let buffer = MemoryBuffer::scratch("ab\ncd");
        let path = RelativePath::from_wire("a.js").unwrap();

        assert!(
            relay
                .local_change(Some(&path), &buffer, &change(ChangeOrigin::SetValue))
                .is_none()
        );
        assert!(
            relay
                .local_change(None, &buffer, &change(ChangeOrigin::Input))
                .is_none()
        );
    }

    #[test]
    fn test_live_apply_is_not_echoed() {
        let relay = Arc::new(ChangeRelay::new());
        let buffer = Arc::new(MemoryBuffer::scratch("hello"));
        let emitted = Arc::new(Mutex::new(Vec::new()));

        let listener_relay = Arc::clone(&relay);
        let weak = Arc::downgrade(&buffer);
        let sink = Arc::clone(&emitted);
        buffer.subscribe_changes(Arc::new(move |change: &BufferChange| {
            let Some(buffer) = weak.upgrade() else { return };
            let path = RelativePath::from_wire("a.js").unwrap();
            if let Some(event) = listener_relay.local_change(Some(&path), buffer.as_ref(), change) {
                sink.lock().unwrap().push(event);
            }
        }));

        relay.apply_live(
            buffer.as_ref(),
            &ChangeRecord::replace(pos(0, 5), pos(0, 5), "!"),
        );
        assert_eq!(buffer.content(), "hello!");
        assert!(emitted.lock().unwrap().is_empty());
        assert!(!relay.is_applying());

        buffer.edit(pos(0, 0), pos(0, 0), ">");
        assert_eq!(emitted.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_guard_is_released_on_drop() {
        let guard = ApplyGuard::new();
        {
            let _token = guard.enter();
            assert!(guard.is_applying());
        }
        assert!(!guard.is_applying());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "nested remote apply")]
    fn test_nested_apply_is_a_programming_error() {
        let guard = ApplyGuard::new();
        let _outer = guard.enter();
        let _inner = guard.enter();
    }
}
