//! Selection normalization (outbound) and remote overlay rendering (inbound).

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use log::{debug, trace};

use crate::config::BridgeSettings;
use crate::error::LockResultExt;
use crate::host::{EditorBuffer, OverlayId};
use crate::protocol::{BridgeEvent, BufferPosition, RelativePath, SelectionRange, SelectionSet};

const LOG_TARGET: &str = "editbridge::overlay";

/// Order every range head-before-anchor. Empty ranges are kept.
pub fn normalize_ranges(ranges: &[SelectionRange]) -> Vec<SelectionRange> {
    ranges.iter().map(|range| range.normalized()).collect()
}

/// Outbound event for a local selection change, if the active file has a path.
pub fn selection_event(
    path: Option<&RelativePath>,
    ranges: &[SelectionRange],
) -> Option<BridgeEvent> {
    let path = path?;
    Some(BridgeEvent::ChangeSelection {
        path: path.clone(),
        selection: SelectionSet::new(path.clone(), normalize_ranges(ranges)),
    })
}

/// One remote caret widget. Removes itself from its buffer when dropped.
pub struct RemoteCaretOverlay {
    buffer: Arc<dyn EditorBuffer>,
    id: OverlayId,
}

impl RemoteCaretOverlay {
    fn place(buffer: &Arc<dyn EditorBuffer>, at: BufferPosition, class_name: &str) -> Self {
        let id = buffer.add_caret_widget(at, class_name);
        Self {
            buffer: Arc::clone(buffer),
            id,
        }
    }
}

impl Drop for RemoteCaretOverlay {
    fn drop(&mut self) {
        self.buffer.remove_caret_widget(self.id);
    }
}

/// Renders the last-known remote selection batch onto the active buffer.
///
/// Every pass starts from scratch: previous carets and range marks are removed
/// before anything is drawn.
pub struct OverlayRenderer {
    last_known: ArcSwap<Vec<SelectionSet>>,
    carets: Mutex<Vec<RemoteCaretOverlay>>,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self {
            last_known: ArcSwap::from_pointee(Vec::new()),
            carets: Mutex::new(Vec::new()),
        }
    }

    /// Replace the last-known batch without drawing anything.
    pub fn store(&self, batch: Vec<SelectionSet>) {
        self.last_known.store(Arc::new(batch));
    }

    pub fn last_known(&self) -> Arc<Vec<SelectionSet>> {
        self.last_known.load_full()
    }

    /// Number of caret overlays currently owned.
    pub fn caret_count(&self) -> usize {
        self.carets.lock().recover_poison("OverlayRenderer::caret_count").len()
    }

    /// Tear down every caret overlay, wherever it was drawn.
    pub fn drop_carets(&self) {
        let previous = std::mem::take(
            &mut *self.carets.lock().recover_poison("OverlayRenderer::drop_carets"),
        );
        if !previous.is_empty() {
            trace!(target: LOG_TARGET, "Removing {} caret overlays", previous.len());
        }
    }

    /// Draw the last-known batch onto `active`.
    ///
    /// Carets and marks are cleared even when nothing matches or the active
    /// buffer has no path.
    pub fn redraw(
        &self,
        active: Option<(&Arc<dyn EditorBuffer>, Option<&RelativePath>)>,
        settings: &BridgeSettings,
    ) {
        let batch = self.last_known.load();
        let mut carets = self.carets.lock().recover_poison("OverlayRenderer::redraw");
        carets.clear();

        let Some((buffer, path)) = active else {
            trace!(target: LOG_TARGET, "No active buffer; overlays cleared");
            return;
        };
        buffer.clear_marks();
        let Some(path) = path else {
            return;
        };

        let mut marks = 0;
        for set in batch.iter().filter(|set| &set.file_path == path) {
            for range in &set.ranges {
                if range.is_empty() {
                    trace!(target: LOG_TARGET, "Caret at {}", range.head);
                    carets.push(RemoteCaretOverlay::place(
                        buffer,
                        range.head,
                        &settings.caret_class,
                    ));
                } else {
                    trace!(target: LOG_TARGET, "Range {}..{}", range.head, range.anchor);
                    buffer.mark_range(range.head, range.anchor, &settings.selection_class);
                    marks += 1;
                }
            }
        }
        debug!(
            target: LOG_TARGET,
            "Rendered {} carets and {} ranges for {}",
            carets.len(),
            marks,
            path
        );
    }

    /// Store `batch` as last-known, then draw it.
    pub fn render(
        &self,
        batch: Vec<SelectionSet>,
        active: Option<(&Arc<dyn EditorBuffer>, Option<&RelativePath>)>,
        settings: &BridgeSettings,
    ) {
        self.store(batch);
        self.redraw(active, settings);
    }
}
