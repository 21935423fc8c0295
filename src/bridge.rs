//! The synchronization core.
//!
//! - [`translator`]: position/offset conversion for active and non-active files
//! - [`relay`]: local edit emission and guarded remote apply
//! - [`selection`]: selection normalization and remote overlay rendering
//! - [`scheduler`]: deferred render passes
//! - [`tracker`]: which buffer has the focus
//! - [`router`]: the [`SessionBridge`] façade

pub mod relay;
pub mod router;
pub mod scheduler;
pub mod selection;
pub mod tracker;
pub mod translator;

pub use relay::{ApplyGuard, ApplyToken, ChangeRelay};
pub use router::SessionBridge;
pub use scheduler::RenderScheduler;
pub use selection::{OverlayRenderer, RemoteCaretOverlay, normalize_ranges, selection_event};
pub use tracker::ActiveDocumentTracker;
pub use translator::{BufferTarget, Translator};
