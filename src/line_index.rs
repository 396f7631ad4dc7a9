//! Line map for converting between line/column locations and character offsets.

use crate::types::{AnnotatedRange, Diagnostic, Location};

/// Precomputed line start offsets for one source text.
///
/// `line_starts[0]` is always 0 and `line_starts[n]` is the character offset
/// of line `n + 1`. `\r\n`, `\n`, and a lone `\r` each end a line.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Character offsets where each line starts, strictly increasing.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Number of lines in the source. An empty source has one empty line.
    pub const fn line_count(&self) -> usize {
        return self.line_starts.len();
    }

    /// Convert a character offset back to a one-based location.
    /// Offsets past the end land on the last line.
    pub fn location(&self, offset: usize) -> Location {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line_idx).copied().unwrap_or(0);
        return Location::new(
            line_idx.saturating_add(1),
            offset.saturating_sub(line_start).saturating_add(1),
        );
    }

    /// Scan the source once and record where every line starts.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        let mut offset = 0_usize;
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            offset = offset.saturating_add(1);
            match c {
                '\n' => line_starts.push(offset),
                '\r' => {
                    if chars.next_if_eq(&'\n').is_some() {
                        offset = offset.saturating_add(1);
                    }
                    line_starts.push(offset);
                },
                _ => {},
            }
        }

        return Self { line_starts };
    }

    /// Resolve a location to a flat character offset:
    /// `line_starts[line - 1] + column - 1`.
    ///
    /// Returns `None` for zero lines or columns and for lines past the end.
    /// The column is not checked against the line's length.
    pub fn offset(&self, location: Location) -> Option<usize> {
        let line_start = self.line_starts.get(location.line.checked_sub(1)?)?;
        let column = location.column.checked_sub(1)?;
        return line_start.checked_add(column);
    }

    /// Turn a diagnostic into a half-open range. A missing or degenerate end
    /// becomes a one-character point at the start.
    pub fn range(&self, diagnostic: &Diagnostic) -> Option<AnnotatedRange> {
        let start = self.offset(diagnostic.start)?;
        let point_end = start.checked_add(1)?;
        let end = diagnostic
            .end
            .and_then(|loc| return self.offset(loc))
            .filter(|&end| return end > start)
            .unwrap_or(point_end);

        return Some(AnnotatedRange {
            end,
            message: diagnostic.message.clone(),
            start,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_starts_at_zero() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.offset(Location::new(1, 1)), Some(0));
    }

    #[test]
    fn resolves_line_and_column() {
        let index = LineIndex::new("fn main() {\n    let x = 1;\n}\n");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.offset(Location::new(2, 5)), Some(16));
        assert_eq!(index.offset(Location::new(3, 1)), Some(27));
    }

    #[test]
    fn crlf_counts_as_one_break() {
        let index = LineIndex::new("ab\r\ncd\ref");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.offset(Location::new(2, 1)), Some(4));
        assert_eq!(index.offset(Location::new(3, 2)), Some(8));
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let index = LineIndex::new("é = 1\nλ");
        assert_eq!(index.offset(Location::new(2, 1)), Some(6));
    }

    #[test]
    fn out_of_range_lines_do_not_resolve() {
        let index = LineIndex::new("one\ntwo");
        assert_eq!(index.offset(Location::new(3, 1)), None);
        assert_eq!(index.offset(Location::new(0, 1)), None);
        assert_eq!(index.offset(Location::new(1, 0)), None);
    }

    #[test]
    fn location_is_inverse_of_offset() {
        let index = LineIndex::new("one\ntwo\r\nthree");
        for loc in [Location::new(1, 1), Location::new(2, 3), Location::new(3, 5)] {
            let offset = index.offset(loc).unwrap();
            assert_eq!(index.location(offset), loc);
        }
    }

    #[test]
    fn missing_end_becomes_a_point() {
        let index = LineIndex::new("let x = 1;");
        let diagnostic = Diagnostic {
            end: None,
            fatal: false,
            message: "unused".to_string(),
            start: Location::new(1, 5),
        };
        let range = index.range(&diagnostic).unwrap();
        assert_eq!((range.start, range.end), (4, 5));
        assert_eq!(range.message, "unused");
    }

    #[test]
    fn end_location_bounds_the_range() {
        let index = LineIndex::new("let x = 1;\nlet y = 2;");
        let diagnostic = Diagnostic {
            end: Some(Location::new(2, 6)),
            fatal: false,
            message: "spans lines".to_string(),
            start: Location::new(1, 5),
        };
        let range = index.range(&diagnostic).unwrap();
        assert_eq!((range.start, range.end), (4, 16));
    }
}
