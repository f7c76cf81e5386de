//! Byte cursor for input navigation

use crate::error::Pos;

/// Cursor for navigating byte input with position tracking
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    /// Create cursor from byte slice
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Get current byte without consuming
    pub fn current(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Check whether the remaining input starts with `pattern`
    pub fn starts_with(&self, pattern: &[u8]) -> bool {
        self.remaining().starts_with(pattern)
    }

    /// Advance cursor by one byte
    pub fn advance(&mut self) {
        if let Some(b) = self.current() {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else if !is_utf8_continuation(b) {
                self.col += 1;
            }
        }
    }

    /// Advance cursor by `count` bytes
    pub fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    /// Skip a leading UTF-8 byte order mark without moving the column
    pub fn skip_bom(&mut self) -> bool {
        if self.pos == 0 && self.starts_with(UTF8_BOM) {
            self.pos = UTF8_BOM.len();
            true
        } else {
            false
        }
    }

    /// Skip whitespace
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.current() {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Consume byte if it matches
    pub fn consume(&mut self, expected: u8) -> bool {
        if self.current() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Get current position
    pub const fn position(&self) -> Pos {
        Pos::new(self.pos, self.line, self.col)
    }

    /// Check if at end of input
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> &'a [u8] {
        self.input.get(self.pos..).unwrap_or_default()
    }

    /// Get current position index
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Get slice from start to current position
    pub fn slice_from(&self, start: usize) -> &'a [u8] {
        self.input.get(start..self.pos).unwrap_or_default()
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// Columns count characters, so continuation bytes of a multi-byte sequence don't move them.
const fn is_utf8_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_basic() {
        let mut cursor = Cursor::new(b"hello");
        assert_eq!(cursor.current(), Some(b'h'));
        cursor.advance();
        assert_eq!(cursor.current(), Some(b'e'));
    }

    #[test]
    fn test_cursor_whitespace() {
        let mut cursor = Cursor::new(b"  \t\nhello");
        cursor.skip_whitespace();
        assert_eq!(cursor.current(), Some(b'h'));
        assert_eq!(cursor.position().line, 2);
    }

    #[test]
    fn test_cursor_consume() {
        let mut cursor = Cursor::new(b"abc");
        assert!(cursor.consume(b'a'));
        assert!(!cursor.consume(b'z'));
        assert_eq!(cursor.current(), Some(b'b'));
    }

    #[test]
    fn test_cursor_eof() {
        let cursor = Cursor::new(b"");
        assert!(cursor.is_eof());
        assert_eq!(cursor.current(), None);
        assert_eq!(cursor.remaining(), b"");
    }

    #[test]
    fn test_cursor_slice() {
        let mut cursor = Cursor::new(b"hello world");
        let start = cursor.pos();
        cursor.advance_by(3);
        assert_eq!(cursor.slice_from(start), b"hel");
    }

    #[test]
    fn test_cursor_lookahead() {
        let mut cursor = Cursor::new(b"<!-- x -->");
        assert!(cursor.starts_with(b"<!--"));
        assert!(!cursor.starts_with(b"<!-- x -->!"));
        cursor.advance_by(4);
        assert!(!cursor.starts_with(b"<!--"));
    }

    #[test]
    fn test_cursor_skip_bom() {
        let mut cursor = Cursor::new(b"\xEF\xBB\xBF<a/>");
        assert!(cursor.skip_bom());
        assert_eq!(cursor.current(), Some(b'<'));
        assert_eq!(cursor.position(), Pos::new(3, 1, 1));
        assert!(!cursor.skip_bom());
    }

    #[test]
    fn test_cursor_column_counts_characters() {
        let mut cursor = Cursor::new("ôx".as_bytes());
        cursor.advance_by(2);
        assert_eq!(cursor.current(), Some(b'x'));
        assert_eq!(cursor.position().col, 2);
    }
}
