//! Source document loading

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, ErrorKind, Pos, Result, Span};

/// Source document held in memory
#[derive(Clone, Debug)]
pub struct Input {
    text: String,
    filename: Option<PathBuf>,
}

impl Input {
    /// Read the whole file at `path` as UTF-8 text
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_limit(path, 0)
    }

    /// Like [`Input::load`], but refuse files larger than `max_size` bytes
    /// before reading them (0 means unlimited)
    pub fn load_with_limit(path: impl AsRef<Path>, max_size: usize) -> Result<Self> {
        let path = path.as_ref();
        if max_size > 0 {
            let len = fs::metadata(path).map_err(|err| Error::io(path, err))?.len();
            if len > u64::try_from(max_size).unwrap_or(u64::MAX) {
                return Err(Error::with_message(
                    ErrorKind::MaxSizeExceeded { max: max_size },
                    Span::empty(),
                    format!(
                        "{} is {len} bytes, larger than the {max_size} byte limit",
                        path.display()
                    ),
                ));
            }
        }

        let bytes = fs::read(path).map_err(|err| Error::io(path, err))?;
        let text = String::from_utf8(bytes).map_err(|err| {
            let valid = err.as_bytes().get(..err.utf8_error().valid_up_to());
            let pos = end_position(valid.unwrap_or_default());
            Error::with_message(
                ErrorKind::InvalidUtf8,
                Span::point(pos),
                format!("{} is not valid utf-8", path.display()),
            )
        })?;

        Ok(Self {
            text,
            filename: Some(path.to_path_buf()),
        })
    }

    /// Create from already loaded text
    pub fn from_string(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filename: None,
        }
    }

    /// Set filename for error reporting
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Get filename if set
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Get length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Self::from_string(text)
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Self::from_string(text)
    }
}

/// Line and column just past the end of `bytes`
fn end_position(bytes: &[u8]) -> Pos {
    let mut cursor = crate::lexer::Cursor::new(bytes);
    while !cursor.is_eof() {
        cursor.advance();
    }
    cursor.position()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_input_from_str() {
        let input = Input::from("hello");
        assert_eq!(input.len(), 5);
        assert!(!input.is_empty());
        assert_eq!(input.filename(), None);
    }

    #[test]
    fn test_input_with_filename() {
        let input = Input::from_string("<svg/>").with_filename("pixelmap.svg");
        assert_eq!(input.filename(), Some(Path::new("pixelmap.svg")));
    }

    #[test]
    fn test_empty_input() {
        let input = Input::from_string(String::new());
        assert!(input.is_empty());
        assert_eq!(input.len(), 0);
    }

    #[test]
    fn test_load_reads_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("map.svg");
        fs::write(&path, "<svg>Côte</svg>")?;

        let input = Input::load(&path)?;
        assert_eq!(input.as_str(), "<svg>Côte</svg>");
        assert_eq!(input.as_bytes().len(), input.len());
        assert_eq!(input.filename(), Some(path.as_path()));
        Ok(())
    }

    #[test]
    fn test_load_missing_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("absent.svg");

        let err = Input::load(&path).err().ok_or("expected load failure")?;
        assert_eq!(
            err.kind(),
            &ErrorKind::Io {
                path,
                kind: io::ErrorKind::NotFound
            }
        );
        Ok(())
    }

    #[test]
    fn test_load_with_limit_checks_before_reading(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("map.svg");
        fs::write(&path, "<svg><g/></svg>")?;

        let err = Input::load_with_limit(&path, 8)
            .err()
            .ok_or("expected size failure")?;
        assert_eq!(err.kind(), &ErrorKind::MaxSizeExceeded { max: 8 });

        assert_eq!(Input::load_with_limit(&path, 15)?.len(), 15);
        assert_eq!(Input::load_with_limit(&path, 0)?.len(), 15);
        Ok(())
    }

    #[test]
    fn test_load_with_limit_missing_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("absent.svg");

        let err = Input::load_with_limit(&path, 1024)
            .err()
            .ok_or("expected load failure")?;
        assert!(matches!(
            err.kind(),
            ErrorKind::Io { kind: io::ErrorKind::NotFound, .. }
        ));
        Ok(())
    }

    #[test]
    fn test_load_rejects_invalid_utf8() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("latin1.svg");
        fs::write(&path, b"<svg>\nC\xF4te</svg>")?;

        let err = Input::load(&path).err().ok_or("expected load failure")?;
        assert_eq!(err.kind(), &ErrorKind::InvalidUtf8);
        assert_eq!(err.span().start, Pos::new(7, 2, 2));
        Ok(())
    }
}
