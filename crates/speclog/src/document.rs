use crate::ir::{LineRange, Position};

/// Read-only, line addressable view of a log document.
pub trait LineSource {
    fn line_count(&self) -> usize;

    /// Text of line `index` without its line terminator.
    ///
    /// Callers only pass indices below [`line_count`](Self::line_count).
    fn line_text(&self, index: usize) -> &str;

    fn line(&self, index: usize) -> Line<'_> {
        Line {
            index,
            text: self.line_text(index),
        }
    }
}

impl<T: AsRef<str>> LineSource for [T] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line_text(&self, index: usize) -> &str {
        self[index].as_ref()
    }
}

impl<T: AsRef<str>> LineSource for Vec<T> {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line_text(&self, index: usize) -> &str {
        self[index].as_ref()
    }
}

/// One row of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub index: usize,
    pub text: &'a str,
}

impl Line<'_> {
    pub fn is_empty_or_whitespace(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn start(&self) -> Position {
        Position::new(self.index as u32, 0)
    }

    pub fn end(&self) -> Position {
        Position::new(self.index as u32, utf16_len(self.text))
    }

    pub fn range(&self) -> LineRange {
        LineRange::new(self.start(), self.end())
    }
}

/// Owned lines of a text buffer, split the way an editor splits them.
///
/// `\r\n`, `\n` and a bare `\r` each end a line, so `"a\n"` has two lines
/// and the empty text has one. Progress output in terminal captures relies
/// on bare `\r`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextLines {
    lines: Vec<String>,
}

impl TextLines {
    pub fn new(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut start = 0;
        let mut chars = text.char_indices().peekable();
        while let Some((offset, c)) = chars.next() {
            match c {
                '\n' => {}
                '\r' => {
                    if let Some(&(_, '\n')) = chars.peek() {
                        chars.next();
                    }
                }
                _ => continue,
            }
            lines.push(text[start..offset].to_string());
            start = chars.peek().map_or(text.len(), |&(next, _)| next);
        }
        lines.push(text[start..].to_string());
        Self { lines }
    }
}

impl From<&str> for TextLines {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl LineSource for TextLines {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_text(&self, index: usize) -> &str {
        &self.lines[index]
    }
}

pub(crate) fn utf16_len(text: &str) -> u32 {
    text.encode_utf16().count() as u32
}

/// Converts a byte offset inside `text` into a UTF-16 column.
pub(crate) fn utf16_column(text: &str, byte_offset: usize) -> u32 {
    utf16_len(&text[..byte_offset])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_lines_follow_editor_model() {
        assert_eq!(TextLines::new("").line_count(), 1);
        assert_eq!(TextLines::new("a\n").line_count(), 2);

        let lines = TextLines::new("one\r\ntwo");
        assert_eq!(lines.line_text(0), "one");
        assert_eq!(lines.line_text(1), "two");
    }

    #[test]
    fn test_bare_carriage_return_ends_a_line() {
        let lines = TextLines::new("a\rb\nc");
        assert_eq!(lines.line_count(), 3);
        assert_eq!(lines.line_text(0), "a");
        assert_eq!(lines.line_text(1), "b");
        assert_eq!(lines.line_text(2), "c");

        let lines = TextLines::new("x\r\r\ny\r");
        assert_eq!(lines.line_count(), 4);
        assert_eq!(lines.line_text(1), "");
        assert_eq!(lines.line_text(2), "y");
        assert_eq!(lines.line_text(3), "");
    }

    #[test]
    fn test_line_range_counts_utf16_units() {
        let doc = vec!["Δt = 5", "𝛼"];
        assert_eq!(doc.line(0).end(), Position::new(0, 6));
        // Astral characters take two code units.
        assert_eq!(doc.line(1).end(), Position::new(1, 2));
        assert_eq!(utf16_column("𝛼x", 4), 2);
    }

    #[test]
    fn test_whitespace_lines_are_blank() {
        let doc = vec!["   ", "\t", "x"];
        assert!(doc.line(0).is_empty_or_whitespace());
        assert!(doc.line(1).is_empty_or_whitespace());
        assert!(!doc.line(2).is_empty_or_whitespace());
    }
}
