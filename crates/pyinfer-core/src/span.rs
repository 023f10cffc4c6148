//! Source ranges attached to AST nodes and diagnostics.

use std::fmt;

/// A line/column position. Both are 1-based; columns count characters.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open range `[start, end)` in a document, as reported by the parser.
///
/// The analyzer copies spans from nodes onto diagnostics and never looks
/// inside them, so a default (all-zero) span is a valid "unknown location".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A range within one line covering columns `[start_column, end_column)`.
    #[inline]
    pub const fn on_line(line: u32, start_column: u32, end_column: u32) -> Self {
        Self::new(
            Position::new(line, start_column),
            Position::new(line, end_column),
        )
    }

    /// An empty range at a position.
    #[inline]
    pub const fn point(line: u32, column: u32) -> Self {
        Self::on_line(line, column, column)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn is_multiline(&self) -> bool {
        self.end.line > self.start.line
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Smallest range covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}-{:?}", self.start, self.end)
    }
}

/// Only the start is printed, matching the usual `file:line:col` prefix.
impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.line, self.start.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_is_empty() {
        assert!(Span::point(4, 2).is_empty());
        assert!(!Span::on_line(4, 2, 3).is_empty());
        assert!(Span::default().is_empty());
    }

    #[test]
    fn contains_is_half_open() {
        let span = Span::on_line(2, 5, 9);
        assert!(span.contains(Position::new(2, 5)));
        assert!(span.contains(Position::new(2, 8)));
        assert!(!span.contains(Position::new(2, 9)));
        assert!(!span.contains(Position::new(1, 6)));
    }

    #[test]
    fn cover_spans_lines() {
        let a = Span::on_line(3, 10, 14);
        let b = Span::on_line(1, 1, 4);
        let covered = a.cover(b);
        assert_eq!(covered.start, Position::new(1, 1));
        assert_eq!(covered.end, Position::new(3, 14));
        assert!(covered.is_multiline());
        assert!(!a.is_multiline());
    }

    #[test]
    fn display_prints_start() {
        let span = Span::new(Position::new(7, 3), Position::new(9, 1));
        assert_eq!(span.to_string(), "7:3");
        assert_eq!(format!("{span:?}"), "7:3-9:1");
    }
}
