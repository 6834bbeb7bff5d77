use std::fmt;

use serde::Serialize;

/// Byte range into the parsed source, `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`.
    pub fn point(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }

    pub fn contains(self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::DUMMY
    }
}

/// 1-based line and column (in bytes) of a source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };

    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The position reached after reading `text` starting at `self`.
    pub fn advance(self, text: &str) -> Position {
        let mut pos = self;
        for b in text.bytes() {
            if b == b'\n' {
                pos.line += 1;
                pos.column = 1;
            } else {
                pos.column += 1;
            }
        }
        pos
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(5, 10);
        let b = Span::new(8, 15);
        assert_eq!(a.merge(b), Span::new(5, 15));
    }

    #[test]
    fn test_span_merge_non_overlapping() {
        let merged = Span::new(10, 20).merge(Span::new(0, 5));
        assert_eq!(merged, Span::new(0, 20));
    }

    #[test]
    fn test_span_len_and_empty() {
        assert_eq!(Span::new(3, 10).len(), 7);
        assert!(Span::point(5).is_empty());
        assert!(!Span::new(5, 6).is_empty());
    }

    #[test]
    fn test_span_contains() {
        let span = Span::new(2, 4);
        assert!(span.contains(2));
        assert!(span.contains(3));
        assert!(!span.contains(4));
    }

    #[test]
    fn test_span_default_is_dummy() {
        assert_eq!(Span::default(), Span::DUMMY);
        assert!(Span::DUMMY.is_empty());
    }

    #[test]
    fn test_position_advance() {
        let pos = Position::START.advance("ab\ncd");
        assert_eq!(pos, Position::new(2, 3));
        assert_eq!(Position::new(4, 7).advance(""), Position::new(4, 7));
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(12, 3).to_string(), "12:3");
    }
}
