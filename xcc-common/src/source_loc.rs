//! Source positions for diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source file (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }

    /// Location used by tests and synthesized nodes
    pub fn dummy() -> Self {
        Self::new("<unknown>", 0, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// A half-open range of source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    pub fn from_location(location: SourceLocation) -> Self {
        Self {
            end: location.clone(),
            start: location,
        }
    }

    pub fn dummy() -> Self {
        Self::from_location(SourceLocation::dummy())
    }

    /// Smallest span covering both `self` and `other`.
    pub fn extend(&self, other: &SourceSpan) -> SourceSpan {
        let key = |l: &SourceLocation| (l.line, l.column);
        let start = if key(&self.start) <= key(&other.start) {
            self.start.clone()
        } else {
            other.start.clone()
        };
        let end = if key(&self.end) >= key(&other.end) {
            self.end.clone()
        } else {
            other.end.clone()
        };
        SourceSpan::new(start, end)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            if self.start.column == self.end.column {
                write!(f, "{}", self.start)
            } else {
                write!(f, "{}-{}", self.start, self.end.column)
            }
        } else {
            write!(
                f,
                "{}-{}:{}",
                self.start, self.end.line, self.end.column
            )
        }
    }
}

/// Line/column cursor advanced character by character by the lexer
#[derive(Debug, Clone)]
pub struct SourceTracker {
    filename: String,
    line: u32,
    column: u32,
}

impl SourceTracker {
    pub fn new(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            line: 1,
            column: 1,
        }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(&self.filename, self.line, self.column)
    }

    pub fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Span from `start` up to the current position
    pub fn span_from(&self, start: SourceLocation) -> SourceSpan {
        SourceSpan::new(start, self.location())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display() {
        let span = SourceSpan::new(
            SourceLocation::new("t.c", 1, 5),
            SourceLocation::new("t.c", 1, 10),
        );
        assert_eq!(span.to_string(), "t.c:1:5-10");

        let multi = SourceSpan::new(
            SourceLocation::new("t.c", 1, 5),
            SourceLocation::new("t.c", 4, 2),
        );
        assert_eq!(multi.to_string(), "t.c:1:5-4:2");
    }

    #[test]
    fn test_span_extend() {
        let a = SourceSpan::new(SourceLocation::new("t.c", 2, 3), SourceLocation::new("t.c", 2, 8));
        let b = SourceSpan::new(SourceLocation::new("t.c", 1, 1), SourceLocation::new("t.c", 2, 4));
        let joined = a.extend(&b);
        assert_eq!(joined.start, SourceLocation::new("t.c", 1, 1));
        assert_eq!(joined.end, SourceLocation::new("t.c", 2, 8));
    }

    #[test]
    fn test_tracker_newlines() {
        let mut tracker = SourceTracker::new("t.c");
        for ch in "ab\nc".chars() {
            tracker.advance(ch);
        }
        assert_eq!(tracker.location(), SourceLocation::new("t.c", 2, 2));
    }
}
