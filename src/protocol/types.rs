use serde::{Deserialize, Serialize};
use std::fmt;

use super::path::RelativePath;

/// Character-count location within a buffer, independent of line structure.
///
/// Counted in UTF-16 code units with `\n` counting as one unit, which is what
/// JavaScript-based peers count.
pub type LinearOffset = usize;

/// Zero-based row/column location within a buffer's current content.
///
/// Ordering is lexicographic by `(line, column)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct BufferPosition {
    pub line: usize,
    #[serde(rename = "ch")]
    pub column: usize,
}

impl BufferPosition {
    pub const ZERO: BufferPosition = BufferPosition { line: 0, column: 0 };

    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for BufferPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Tag describing what produced a buffer mutation.
///
/// Serialized as the plain origin string used on the wire (`"+input"`,
/// `"setValue"`, ...). Unknown tags round-trip through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeOrigin {
    #[default]
    Input,
    Delete,
    Paste,
    Undo,
    Redo,
    /// Whole-buffer initialization; never relayed to peers.
    SetValue,
    /// Mutation applied on behalf of a remote peer.
    Remote,
    Other(String),
}

impl ChangeOrigin {
    pub fn as_str(&self) -> &str {
        match self {
            ChangeOrigin::Input => "+input",
            ChangeOrigin::Delete => "+delete",
            ChangeOrigin::Paste => "paste",
            ChangeOrigin::Undo => "undo",
            ChangeOrigin::Redo => "redo",
            ChangeOrigin::SetValue => "setValue",
            ChangeOrigin::Remote => "remote",
            ChangeOrigin::Other(tag) => tag,
        }
    }
}

impl From<String> for ChangeOrigin {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "+input" => ChangeOrigin::Input,
            "+delete" => ChangeOrigin::Delete,
            "paste" => ChangeOrigin::Paste,
            "undo" => ChangeOrigin::Undo,
            "redo" => ChangeOrigin::Redo,
            "setValue" => ChangeOrigin::SetValue,
            "remote" => ChangeOrigin::Remote,
            _ => ChangeOrigin::Other(tag),
        }
    }
}

impl From<ChangeOrigin> for String {
    fn from(origin: ChangeOrigin) -> Self {
        match origin {
            ChangeOrigin::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ChangeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One text replacement, in both positional and linear form.
///
/// `from`/`to` bound the replaced range in the buffer *before* the edit and
/// `start` is the linear offset of `from` at emission time. Removed and
/// inserted text are carried one entry per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub from: BufferPosition,
    pub to: BufferPosition,
    #[serde(default)]
    pub start: LinearOffset,
    #[serde(rename = "removed", default)]
    pub removed_text: Vec<String>,
    #[serde(rename = "text")]
    pub inserted_text: Vec<String>,
    #[serde(default)]
    pub origin: ChangeOrigin,
}

impl ChangeRecord {
    /// Replacement of `from..to` with `text`, split into lines.
    pub fn replace(from: BufferPosition, to: BufferPosition, text: &str) -> Self {
        Self {
            from,
            to,
            start: 0,
            removed_text: Vec::new(),
            inserted_text: split_lines(text),
            origin: ChangeOrigin::Input,
        }
    }

    /// Zero-length change at offset 0 announcing that a file became active.
    pub fn activation() -> Self {
        Self {
            from: BufferPosition::ZERO,
            to: BufferPosition::ZERO,
            start: 0,
            removed_text: vec![String::new()],
            inserted_text: vec![String::new()],
            origin: ChangeOrigin::Input,
        }
    }

    /// Inserted text joined back into a single string.
    pub fn inserted(&self) -> String {
        self.inserted_text.join("\n")
    }
}

/// Split text into the one-entry-per-line form used by ChangeRecord.
///
/// Always yields at least one entry, so `""` becomes `[""]`.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

/// One cursor or selection span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRange {
    pub head: BufferPosition,
    pub anchor: BufferPosition,
}

impl SelectionRange {
    pub fn new(head: BufferPosition, anchor: BufferPosition) -> Self {
        Self { head, anchor }
    }

    /// Zero-width range at `at`.
    pub fn caret(at: BufferPosition) -> Self {
        Self::new(at, at)
    }

    /// True when the range covers no characters (a bare caret).
    pub fn is_empty(&self) -> bool {
        self.head == self.anchor
    }

    /// Order the endpoints so `head` is the earlier one.
    pub fn normalized(self) -> Self {
        if self.head > self.anchor {
            Self {
                head: self.anchor,
                anchor: self.head,
            }
        } else {
            self
        }
    }
}

/// One participant's selection state for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    #[serde(rename = "filePath")]
    pub file_path: RelativePath,
    pub ranges: Vec<SelectionRange>,
}

impl SelectionSet {
    pub fn new(file_path: RelativePath, ranges: Vec<SelectionRange>) -> Self {
        Self { file_path, ranges }
    }
}
