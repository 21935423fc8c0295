use crate::protocol::{BufferPosition, LinearOffset};

/// Maps between row/column positions and linear offsets over one text.
///
/// Columns and offsets are counted in UTF-16 code units, and each `\n`
/// counts as one unit. Out-of-range input is clamped rather than rejected:
/// - an offset past the end maps to the end of the text
/// - a line past the last line maps to the end of the text
/// - a column past the end of its line maps to the end of that line
pub struct PositionMapper<'a> {
    text: &'a str,
    /// Byte offset of each line start
    line_starts: Vec<usize>,
    /// UTF-16 offset of each line start
    line_starts_utf16: Vec<usize>,
    len_utf16: usize,
}

impl<'a> PositionMapper<'a> {
    /// Create a new PositionMapper with pre-computed line starts
    pub fn new(text: &'a str) -> Self {
        let line_starts = compute_line_starts(text);
        let mut line_starts_utf16 = Vec::with_capacity(line_starts.len());
        let mut utf16 = 0;
        let mut previous = 0;
        for &start in &line_starts {
            utf16 += text[previous..start].encode_utf16().count();
            line_starts_utf16.push(utf16);
            previous = start;
        }
        let len_utf16 = utf16 + text[previous..].encode_utf16().count();

        Self {
            text,
            line_starts,
            line_starts_utf16,
            len_utf16,
        }
    }

    /// Number of lines; an empty text has one empty line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Length of the whole text in UTF-16 code units.
    pub fn len_utf16(&self) -> usize {
        self.len_utf16
    }

    /// Text of `line` without its trailing newline.
    pub fn line_text(&self, line: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(line)?;
        let end = match self.line_starts.get(line + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        };
        Some(&self.text[start..end])
    }

    /// Position of the end of the text.
    pub fn end_position(&self) -> BufferPosition {
        let last = self.line_count() - 1;
        let column = self
            .line_text(last)
            .map(|line| line.encode_utf16().count())
            .unwrap_or(0);
        BufferPosition::new(last, column)
    }

    /// Clamp `position` into the text.
    pub fn clip(&self, position: BufferPosition) -> BufferPosition {
        match self.line_text(position.line) {
            Some(line) => {
                let line_len = line.encode_utf16().count();
                BufferPosition::new(position.line, position.column.min(line_len))
            }
            None => self.end_position(),
        }
    }

    /// Convert a position to a linear offset.
    pub fn offset_from_position(&self, position: BufferPosition) -> LinearOffset {
        let clipped = self.clip(position);
        self.line_starts_utf16[clipped.line] + clipped.column
    }

    /// Convert a linear offset to a position.
    pub fn position_from_offset(&self, offset: LinearOffset) -> BufferPosition {
        let offset = offset.min(self.len_utf16);
        let line = match self.line_starts_utf16.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        BufferPosition::new(line, offset - self.line_starts_utf16[line])
    }

    /// Convert a position to a byte offset into the text.
    ///
    /// A column inside a surrogate pair rounds up to the next character.
    pub fn byte_from_position(&self, position: BufferPosition) -> usize {
        let clipped = self.clip(position);
        let line_start = self.line_starts[clipped.line];
        let line_text = self.line_text(clipped.line).unwrap_or("");
        match convert_utf16_to_byte_in_line(line_text, clipped.column) {
            Some(byte_offset) => line_start + byte_offset,
            None => line_start + line_text.len(),
        }
    }
}

/// Compute line start offsets for efficient position mapping
pub fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut line_starts = vec![0];
    let mut offset = 0;

    for ch in text.chars() {
        offset += ch.len_utf8();
        if ch == '\n' {
            line_starts.push(offset);
        }
    }

    line_starts
}

/// Convert UTF-16 position to byte position within a line
/// Returns None if the UTF-16 position is beyond the end of the line
#[inline(always)]
pub fn convert_utf16_to_byte_in_line(line_text: &str, utf16_pos: usize) -> Option<usize> {
    let mut byte_offset = 0;
    let mut utf16_offset = 0;

    for ch in line_text.chars() {
        if utf16_offset >= utf16_pos {
            return Some(byte_offset);
        }
        utf16_offset += ch.len_utf16();
        byte_offset += ch.len_utf8();
    }

    if utf16_offset >= utf16_pos {
        Some(byte_offset)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, column: usize) -> BufferPosition {
        BufferPosition::new(line, column)
    }

    #[test]
    fn test_compute_line_starts() {
        assert_eq!(compute_line_starts(""), vec![0]);
        assert_eq!(compute_line_starts("ab\ncd\n"), vec![0, 3, 6]);
    }

    #[test]
    fn test_offsets_count_newline_as_one_unit() {
        let mapper = PositionMapper::new("hello\nworld");
        assert_eq!(mapper.offset_from_position(pos(0, 5)), 5);
        assert_eq!(mapper.offset_from_position(pos(1, 0)), 6);
        assert_eq!(mapper.offset_from_position(pos(1, 5)), 11);
        assert_eq!(mapper.position_from_offset(6), pos(1, 0));
        assert_eq!(mapper.position_from_offset(5), pos(0, 5));
    }

    #[test]
    fn test_round_trip_for_every_position_in_bounds() {
        let text = "fn main() {\n    let x = 1;\n\n}\n";
        let mapper = PositionMapper::new(text);
        let mut expected_offset = 0;
        for line in 0..mapper.line_count() {
            let len = mapper.line_text(line).unwrap().encode_utf16().count();
            for column in 0..=len {
                let p = pos(line, column);
                let offset = mapper.offset_from_position(p);
                assert_eq!(offset, expected_offset + column);
                assert_eq!(mapper.position_from_offset(offset), p);
            }
            expected_offset += len + 1;
        }
        for offset in 0..=mapper.len_utf16() {
            let p = mapper.position_from_offset(offset);
            assert_eq!(mapper.offset_from_position(p), offset);
        }
    }

    #[test]
    fn test_utf16_columns() {
        // "é" is one UTF-16 unit, "😀" is two.
        let mapper = PositionMapper::new("é😀x\nz");
        assert_eq!(mapper.len_utf16(), 6);
        assert_eq!(mapper.offset_from_position(pos(0, 3)), 3);
        assert_eq!(mapper.position_from_offset(5), pos(1, 0));
        assert_eq!(mapper.byte_from_position(pos(0, 3)), "é😀".len());
    }

    #[test]
    fn test_out_of_range_inputs_clamp() {
        let mapper = PositionMapper::new("ab\ncd");
        assert_eq!(mapper.position_from_offset(99), pos(1, 2));
        assert_eq!(mapper.offset_from_position(pos(0, 99)), 2);
        assert_eq!(mapper.offset_from_position(pos(9, 0)), 5);
        assert_eq!(mapper.clip(pos(9, 9)), pos(1, 2));
    }

    #[test]
    fn test_empty_text() {
        let mapper = PositionMapper::new("");
        assert_eq!(mapper.line_count(), 1);
        assert_eq!(mapper.position_from_offset(0), pos(0, 0));
        assert_eq!(mapper.offset_from_position(pos(0, 0)), 0);
        assert_eq!(mapper.end_position(), pos(0, 0));
    }

    #[test]
    fn test_convert_utf16_to_byte_in_line() {
        assert_eq!(convert_utf16_to_byte_in_line("abc", 0), Some(0));
        assert_eq!(convert_utf16_to_byte_in_line("abc", 3), Some(3));
        assert_eq!(convert_utf16_to_byte_in_line("abc", 4), None);
        // Inside the surrogate pair rounds up past the emoji.
        assert_eq!(convert_utf16_to_byte_in_line("😀a", 1), Some(4));
    }
}
