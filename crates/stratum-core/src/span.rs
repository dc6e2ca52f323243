//! Source ranges for diagnostics.

use std::fmt;

/// A range of source text from a start position up to an end position.
///
/// Lines and columns start at 1; columns count bytes. Displayed as the
/// start position, `line:col`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub line: u32,
    pub col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    /// A range of `len` bytes on one line.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self::between((line, col), (line, col + len))
    }

    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, 0)
    }

    /// A range between two `(line, col)` positions, in either order.
    pub fn between(a: (u32, u32), b: (u32, u32)) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self {
            line: start.0,
            col: start.1,
            end_line: end.0,
            end_col: end.1,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        (self.line, self.col) == (self.end_line, self.end_col)
    }

    /// The smallest span covering both.
    pub fn merge(self, other: Span) -> Span {
        let start = (self.line, self.col).min((other.line, other.col));
        let end = (self.end_line, self.end_col).max((other.end_line, other.end_col));
        Span::between(start, end)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}..{}:{}",
            self.line, self.col, self.end_line, self.end_col
        )
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_covers_both_ranges() {
        let call = Span::new(1, 10, 3).merge(Span::new(1, 5, 3));
        assert_eq!(call, Span::new(1, 5, 8));

        let block = Span::new(1, 5, 3).merge(Span::new(3, 1, 1));
        assert_eq!(block, Span::between((1, 5), (3, 2)));
        assert_eq!(block.to_string(), "1:5");
    }

    #[test]
    fn points_are_empty() {
        assert!(Span::point(4, 2).is_empty());
        assert!(!Span::new(4, 2, 1).is_empty());
        assert_eq!(format!("{:?}", Span::new(2, 3, 4)), "2:3..2:7");
    }
}
