//! Source span types for pointing into declaration manifests.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Identifier of a manifest registered in the [`SourceCache`](crate::SourceCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    /// Placeholder for spans that do not belong to any file.
    pub const DUMMY: FileId = FileId(u32::MAX);
}

/// Byte range inside one manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// File ID (index into source cache)
    pub file_id: FileId,
    /// Byte offset of start (inclusive)
    pub start: u32,
    /// Byte offset of end (exclusive)
    pub end: u32,
}

impl Span {
    /// A span for values with no place in any manifest, such as literals.
    pub const DUMMY: Span = Span {
        file_id: FileId::DUMMY,
        start: 0,
        end: 0,
    };

    /// Create a new span.
    pub fn new(file_id: FileId, start: u32, end: u32) -> Self {
        Self { file_id, start, end }
    }

    /// Build a span from the byte range a deserializer reports.
    pub fn from_range(file_id: FileId, range: Range<usize>) -> Self {
        Self::new(file_id, range.start as u32, range.end as u32)
    }

    /// Check if this is a dummy/unknown span.
    pub fn is_dummy(&self) -> bool {
        self.file_id == FileId::DUMMY
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::DUMMY
    }
}

/// A span resolved to a human readable position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Manifest path as registered in the cache
    pub file: String,
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed)
    pub column: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Extra highlighted location attached to a diagnostic, e.g. the declaration
/// of the bound that a type argument violated.
#[derive(Debug, Clone)]
pub struct Label {
    /// Location being pointed at
    pub span: Span,
    /// Note printed next to the location
    pub message: String,
}

impl Label {
    /// Create a new label.
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_is_default() {
        assert!(Span::default().is_dummy());
        assert!(Span::DUMMY.is_empty());
        assert!(!Span::new(FileId(0), 0, 0).is_dummy());
    }

    #[test]
    fn test_from_range() {
        let span = Span::from_range(FileId(2), 10..14);
        assert_eq!(span.len(), 4);
        assert!(!span.is_empty());
        assert!(!span.is_dummy());
    }
}
