//! Text manipulation utilities.
//!
//! This module provides utilities for working with text content:
//! - Position mapping between row/column (UTF-16 columns) and linear offsets
//! - Applying range replacements to plain strings
//! - Normalizing `\r\n` and `\r` line endings to `\n`

pub mod edits;
pub mod line_endings;
pub mod position;

pub use edits::{Replacement, apply_change, replace_range};
pub use line_endings::{LineEnding, normalize_line_endings};
pub use position::{PositionMapper, compute_line_starts, convert_utf16_to_byte_in_line};
