//! Source location tracking for diagnostics.
//!
//! A [`Span`] is a contiguous byte-offset region of source text; parse
//! failures carry one pointing at the offending input. Byte offsets match
//! Rust's string slicing semantics: `&source[span.start..span.end]` extracts
//! the spanned text.
//!
//! A [`Position`] is the human-facing rendering of an offset: 1-based line
//! and column, computed on demand from the source text. ASN.1 inputs are
//! read fully before parsing, so there is no need to track lines during the
//! scan itself.

/// A byte-offset range in source text.
///
/// Spans are `Copy` and cheap to pass around. Use [`Span::merge`] to combine
/// spans when a diagnostic covers several tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset of the first character (inclusive).
    pub start: usize,
    /// Byte offset past the last character (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a span from byte offsets.
    ///
    /// No validation is performed; `start` may exceed `end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A zero-width span at the given offset.
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Creates a span covering from the start of `self` to the end of `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns the length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if this span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A 1-based line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Computes the line/column of a byte offset within `source`.
    ///
    /// Offsets past the end of `source` are clamped to the final position.
    /// Columns count bytes, which coincides with characters for the ASCII
    /// inputs the ASN.1 grammar accepts.
    pub fn of(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let prefix = &source.as_bytes()[..offset];
        let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = prefix
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|p| p + 1)
            .unwrap_or(0);
        Position {
            line,
            column: offset - line_start + 1,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
