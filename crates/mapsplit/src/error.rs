//! Error types for mapsplit

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Half-open byte range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn point(pos: Pos) -> Self {
        Self::new(pos, pos)
    }

    pub const fn empty() -> Self {
        Self::point(Pos::new(0, 0, 0))
    }

    /// Length of the range in bytes
    pub const fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    // Markup
    InvalidToken,
    UnexpectedEof,
    InvalidUtf8,
    InvalidEntity,
    MismatchedTag { expected: String, found: String },
    DuplicateAttribute { name: String },
    MaxDepthExceeded { max: u16 },
    MaxSizeExceeded { max: usize },

    // Grouping
    MissingAttribute { element: String, attribute: String },

    // Filesystem
    Io { path: PathBuf, kind: io::ErrorKind },
    InvalidFileName { name: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken => write!(f, "invalid token"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::InvalidEntity => write!(f, "invalid xml entity"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{expected}>, found </{found}>")
            }
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::MaxSizeExceeded { max } => write!(f, "max size exceeded: {max}"),
            Self::MissingAttribute { element, attribute } => {
                write!(f, "<{element}> is missing required attribute `{attribute}`")
            }
            Self::Io { path, kind } => write!(f, "{}: {kind}", path.display()),
            Self::InvalidFileName { name } => write!(f, "invalid output file name: {name}"),
        }
    }
}

impl ErrorKind {
    /// Whether the failure came from reading or writing the filesystem
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::InvalidFileName { .. })
    }
}

/// Main error type for mapsplit
#[derive(Error, Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
    #[source]
    source: Option<Arc<io::Error>>,
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.span == other.span && self.message == other.message
    }
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
            source: None,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
            source: None,
        }
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::point(pos))
    }

    /// Wrap an I/O failure on `path`
    pub fn io(path: &Path, err: io::Error) -> Self {
        Self {
            kind: ErrorKind::Io {
                path: path.to_path_buf(),
                kind: err.kind(),
            },
            span: Span::empty(),
            message: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Io { path, .. } => write!(f, "{}: {}", path.display(), self.message),
            ErrorKind::InvalidFileName { .. } => f.write_str(&self.message),
            _ => write!(f, "error at {}: {}", self.span.start, self.message),
        }
    }
}

/// Result type alias for mapsplit
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_display() {
        let pos = Pos::new(42, 10, 5);
        assert_eq!(pos.to_string(), "10:5");
    }

    #[test]
    fn test_error_creation() {
        let err = Error::at(ErrorKind::InvalidToken, Pos::new(0, 1, 1));
        assert_eq!(err.kind(), &ErrorKind::InvalidToken);
        assert!(err.span().is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = Error::at(ErrorKind::InvalidEntity, Pos::new(10, 2, 5));
        let display = err.to_string();
        assert_eq!(display, "error at 2:5: invalid xml entity");
    }

    #[test]
    fn test_missing_attribute_display() {
        let kind = ErrorKind::MissingAttribute {
            element: "g".to_string(),
            attribute: "aria-label".to_string(),
        };
        let err = Error::at(kind, Pos::new(120, 4, 3));
        assert_eq!(
            err.to_string(),
            "error at 4:3: <g> is missing required attribute `aria-label`"
        );
    }

    #[test]
    fn test_io_error_names_path() {
        let source = io::Error::new(io::ErrorKind::NotFound, "No such file or directory");
        let err = Error::io(Path::new("maps/world.svg"), source);
        assert!(err.kind().is_io());
        assert_eq!(err.to_string(), "maps/world.svg: No such file or directory");
        assert!(matches!(
            err.kind(),
            ErrorKind::Io { kind: io::ErrorKind::NotFound, .. }
        ));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = Error::io(
            Path::new("out"),
            io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"),
        );
        let source = std::error::Error::source(&err)
            .and_then(|source| source.downcast_ref::<Arc<io::Error>>())
            .map(|source| (source.kind(), source.to_string()));
        assert_eq!(
            source,
            Some((io::ErrorKind::PermissionDenied, "Permission denied".to_string()))
        );

        let cloned = err.clone();
        assert_eq!(cloned, err);
        assert!(std::error::Error::source(&cloned).is_some());
    }

    #[test]
    fn test_markup_errors_have_no_source() {
        let err = Error::at(ErrorKind::InvalidToken, Pos::new(0, 1, 1));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_span_len() {
        let span = Span::new(Pos::new(4, 1, 5), Pos::new(10, 1, 11));
        assert_eq!(span.len(), 6);
        assert!(!span.is_empty());
    }
}
