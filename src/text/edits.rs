//! Applying replacements to plain text.
//!
//! Used by the in-memory buffer for live edits and by the filesystem
//! collaborator to apply a ChangeRecord to a file that is not open.

use crate::protocol::{BufferPosition, ChangeRecord, split_lines};

use super::PositionMapper;

/// Outcome of replacing a range of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Start of the replaced range (the earlier endpoint)
    pub from: BufferPosition,
    /// End of the replaced range, before the edit
    pub to: BufferPosition,
    /// Replaced text, one entry per line
    pub removed_text: Vec<String>,
}

/// Replace `from..to` in `text` with `inserted_text` (one entry per line).
///
/// Endpoints are clamped into the text and swapped when given backwards.
pub fn replace_range(
    text: &mut String,
    from: BufferPosition,
    to: BufferPosition,
    inserted_text: &[String],
) -> Replacement {
    let mapper = PositionMapper::new(text);
    let (from, to) = {
        let (a, b) = (mapper.clip(from), mapper.clip(to));
        if a <= b { (a, b) } else { (b, a) }
    };
    let start_byte = mapper.byte_from_position(from);
    let end_byte = mapper.byte_from_position(to);

    let removed_text = split_lines(&text[start_byte..end_byte]);
    text.replace_range(start_byte..end_byte, &inserted_text.join("\n"));

    Replacement {
        from,
        to,
        removed_text,
    }
}

/// Apply a ChangeRecord to `text`, returning the updated text.
pub fn apply_change(text: &str, change: &ChangeRecord) -> String {
    let mut updated = text.to_string();
    replace_range(&mut updated, change.from, change.to, &change.inserted_text);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, column: usize) -> BufferPosition {
        BufferPosition::new(line, column)
    }

    fn lines(text: &str) -> Vec<String> {
        split_lines(text)
    }

    #[test]
    fn test_insert_at_end_of_line() {
        let mut text = "hello".to_string();
        let replacement = replace_range(&mut text, pos(0, 5), pos(0, 5), &lines("!"));
        assert_eq!(text, "hello!");
        assert_eq!(replacement.removed_text, vec![""]);
    }

    #[test]
    fn test_replace_across_lines_reports_removed_lines() {
        let mut text = "one\ntwo\nthree".to_string();
        let replacement = replace_range(&mut text, pos(0, 1), pos(2, 2), &lines("X"));
        assert_eq!(text, "oXree");
        assert_eq!(replacement.removed_text, vec!["ne", "two", "th"]);
    }

    #[test]
    fn test_insert_multiple_lines() {
        let mut text = "ab".to_string();
        replace_range(&mut text, pos(0, 1), pos(0, 1), &lines("1\n2"));
        assert_eq!(text, "a1\n2b");
    }

    #[test]
    fn test_backwards_range_is_swapped() {
        let mut text = "hello world".to_string();
        let replacement = replace_range(&mut text, pos(0, 11), pos(0, 6), &lines("rust"));
        assert_eq!(text, "hello rust");
        assert_eq!(replacement.from, pos(0, 6));
        assert_eq!(replacement.to, pos(0, 11));
    }

    #[test]
    fn test_out_of_range_end_clamps_to_text_end() {
        let mut text = "ab\ncd".to_string();
        replace_range(&mut text, pos(1, 1), pos(7, 0), &lines(""));
        assert_eq!(text, "ab\nc");
    }

    #[test]
    fn test_apply_change_uses_inserted_lines() {
        let change = ChangeRecord::replace(pos(0, 0), pos(0, 3), "AAA");
        assert_eq!(apply_change("aaa bbb", &change), "AAA bbb");
    }
}
