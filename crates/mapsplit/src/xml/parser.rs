//! XML parser implementation
//!
//! Parses in strict XML mode: tags must nest and close exactly, attribute
//! names are unique per element, and only the predefined and numeric
//! entities are decoded. Every element records the byte span it occupies so
//! callers can lift its original markup out of the source untouched.
//!
//! Open elements live on an explicit stack, so nesting depth costs heap
//! rather than call stack.

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::lexer::Cursor;
use crate::xml::model::{Content, Document, Element};

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_size: 0,
        }
    }
}

impl Config {
    /// Create a new config with unlimited depth and size
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
        }
    }

    /// Create a new config with specific limits
    pub const fn new(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }
}

/// Element whose start tag has been read but not its end tag
#[derive(Debug)]
struct OpenElement {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<Content>,
    start: Pos,
}

impl OpenElement {
    fn close(self, end: Pos) -> Element {
        Element {
            name: self.name,
            attributes: self.attributes,
            children: self.children,
            span: Span::new(self.start, end),
        }
    }
}

enum StartTag {
    Empty(Element),
    Open(OpenElement),
}

/// Where reading the content of the innermost open element stopped
enum ContentEnd {
    /// At the `<` of a child start tag
    ChildStart,
    /// Past the end tag; the element has been popped
    Closed(Element),
}

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    len: usize,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser with default configuration
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new XML parser with custom configuration
    pub const fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            len: input.len(),
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        if self.config.max_size > 0 && self.len > self.config.max_size {
            return Err(Error::at(
                ErrorKind::MaxSizeExceeded {
                    max: self.config.max_size,
                },
                self.cursor.position(),
            ));
        }

        self.cursor.skip_bom();
        self.skip_misc(true)?;

        if self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::UnexpectedEof, "document has no root element"));
        }
        if self.cursor.current() != Some(b'<') {
            return Err(self.error_here(ErrorKind::InvalidToken, "expected root element"));
        }

        let root = self.parse_root()?;
        self.skip_misc(false)?;

        if !self.cursor.is_eof() {
            return Err(self.error_here(
                ErrorKind::InvalidToken,
                "unexpected content after root element",
            ));
        }

        Ok(Document { root })
    }

    /// Skip whitespace, comments and processing instructions outside the root.
    fn skip_misc(&mut self, allow_doctype: bool) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if allow_doctype && self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    /// Parse the root element and everything nested in it.
    fn parse_root(&mut self) -> Result<Element> {
        let mut stack: Vec<OpenElement> = Vec::new();

        loop {
            let mut element = match self.parse_start_tag(stack.len())? {
                StartTag::Empty(element) => element,
                StartTag::Open(open) => {
                    stack.push(open);
                    match self.parse_content(&mut stack)? {
                        ContentEnd::ChildStart => continue,
                        ContentEnd::Closed(element) => element,
                    }
                }
            };

            loop {
                let Some(parent) = stack.last_mut() else {
                    return Ok(element);
                };
                parent.children.push(Content::Element(element));
                match self.parse_content(&mut stack)? {
                    ContentEnd::ChildStart => break,
                    ContentEnd::Closed(closed) => element = closed,
                }
            }
        }
    }

    /// Read a start tag; `open` is the number of enclosing open elements.
    fn parse_start_tag(&mut self, open: usize) -> Result<StartTag> {
        let start = self.cursor.position();
        let depth = open.saturating_add(1);
        if self.config.max_depth > 0 && depth > usize::from(self.config.max_depth) {
            return Err(self.error_here(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                "max depth exceeded",
            ));
        }

        self.expect_byte(b'<')?;
        if self.cursor.current() == Some(b'/') {
            return Err(self.error_here(ErrorKind::InvalidToken, "unexpected closing tag"));
        }

        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            return Ok(StartTag::Empty(Element {
                name,
                attributes,
                children: Vec::new(),
                span: Span::new(start, self.cursor.position()),
            }));
        }

        self.expect_byte(b'>')?;
        Ok(StartTag::Open(OpenElement {
            name,
            attributes,
            children: Vec::new(),
            start,
        }))
    }

    /// Read content of the innermost open element up to a child start tag
    /// or through its end tag.
    fn parse_content(&mut self, stack: &mut Vec<OpenElement>) -> Result<ContentEnd> {
        let Some(open) = stack.last_mut() else {
            return Err(self.error_here(ErrorKind::InvalidToken, "no open element"));
        };

        loop {
            if self.cursor.starts_with(b"</") {
                let close_pos = self.cursor.position();
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != open.name {
                    return Err(Error::at(
                        ErrorKind::MismatchedTag {
                            expected: open.name.clone(),
                            found: close_name,
                        },
                        close_pos,
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                let end = self.cursor.position();
                return stack
                    .pop()
                    .map(|open| ContentEnd::Closed(open.close(end)))
                    .ok_or_else(|| self.error_here(ErrorKind::InvalidToken, "no open element"));
            }

            if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
                continue;
            }

            if self.cursor.starts_with(b"<![CDATA[") {
                let text = self.parse_cdata()?;
                if !text.is_empty() {
                    open.children.push(Content::Text(text));
                }
                continue;
            }

            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
                continue;
            }

            if self.cursor.current() == Some(b'<') {
                return Ok(ContentEnd::ChildStart);
            }

            if self.cursor.is_eof() {
                return Err(self.error_here(
                    ErrorKind::UnexpectedEof,
                    format!("unterminated element <{}>", open.name),
                ));
            }

            if let Some(text) = self.parse_text()? {
                open.children.push(Content::Text(text));
            }
        }
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            let before = self.cursor.pos();
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) => {}
                None => {
                    return Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated start tag"))
                }
            }
            if self.cursor.pos() == before {
                return Err(self.error_here(
                    ErrorKind::InvalidToken,
                    "expected whitespace before attribute",
                ));
            }

            let name_pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(Error::at(ErrorKind::DuplicateAttribute { name }, name_pos));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(
                    self.error_here(ErrorKind::InvalidToken, "expected quoted attribute value")
                )
            }
        };
        self.cursor.advance();

        let value_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = bytes_to_str(raw, value_pos)?;
                return decode_entities(text, value_pos);
            }
            if b == b'<' {
                return Err(
                    self.error_here(ErrorKind::InvalidToken, "'<' not allowed in attribute value")
                );
            }
            self.cursor.advance();
        }

        Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated attribute value"))
    }

    fn parse_text(&mut self) -> Result<Option<String>> {
        let text_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = bytes_to_str(self.cursor.slice_from(start), text_pos)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        decode_entities(raw, text_pos).map(Some)
    }

    fn parse_cdata(&mut self) -> Result<String> {
        let open_pos = self.cursor.position();
        self.cursor.advance_by(b"<![CDATA[".len());
        let start = self.cursor.pos();
        while !self.cursor.starts_with(b"]]>") {
            if self.cursor.is_eof() {
                return Err(Error::with_message(
                    ErrorKind::UnexpectedEof,
                    Span::point(open_pos),
                    "unterminated CDATA section",
                ));
            }
            self.cursor.advance();
        }
        let raw = self.cursor.slice_from(start);
        self.cursor.advance_by(3);
        bytes_to_str(raw, open_pos).map(str::to_string)
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        let Some(first) = self.cursor.current() else {
            return Err(self.error_here(ErrorKind::UnexpectedEof, "expected name"));
        };
        if !is_name_start(first) {
            return Err(Error::with_message(
                ErrorKind::InvalidToken,
                Span::point(start_pos),
                "expected name",
            ));
        }

        self.cursor.advance();
        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_str(self.cursor.slice_from(start), start_pos).map(str::to_string)
    }

    fn skip_comment(&mut self) -> Result<()> {
        // cursor currently at '<!--'
        self.cursor.advance_by(4);
        self.skip_until(b"-->", "comment")
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        // cursor currently at '<?'
        self.cursor.advance_by(2);
        self.skip_until(b"?>", "processing instruction")
    }

    /// Skip `<!DOCTYPE ...>` including an internal subset in brackets.
    fn skip_doctype(&mut self) -> Result<()> {
        let open_pos = self.cursor.position();
        self.cursor.advance_by(b"<!DOCTYPE".len());

        let mut brackets = 0usize;
        let mut quote = None;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => brackets += 1,
                (None, b']') => brackets = brackets.saturating_sub(1),
                (None, b'>') if brackets == 0 => return Ok(()),
                (None, _) => {}
            }
        }

        Err(Error::with_message(
            ErrorKind::UnexpectedEof,
            Span::point(open_pos),
            "unterminated DOCTYPE",
        ))
    }

    fn skip_until(&mut self, pattern: &[u8], what: &str) -> Result<()> {
        let open_pos = self.cursor.position();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                self.cursor.advance_by(pattern.len());
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(Error::with_message(
            ErrorKind::UnexpectedEof,
            Span::point(open_pos),
            format!("unterminated {what}"),
        ))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            return Ok(());
        }
        match self.cursor.current() {
            Some(found) => Err(self.error_here(
                ErrorKind::InvalidToken,
                format!(
                    "expected '{}', found '{}'",
                    char::from(expected),
                    char::from(found).escape_default()
                ),
            )),
            None => Err(self.error_here(
                ErrorKind::UnexpectedEof,
                format!("expected '{}', found end of input", char::from(expected)),
            )),
        }
    }

    fn error_here(&self, kind: ErrorKind, message: impl Into<String>) -> Error {
        Error::with_message(kind, Span::point(self.cursor.position()), message)
    }
}

fn bytes_to_str(bytes: &[u8], pos: Pos) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|err| {
        let offset = pos.offset.saturating_add(err.valid_up_to());
        Error::with_message(
            ErrorKind::InvalidUtf8,
            Span::point(Pos::new(offset, pos.line, pos.col)),
            "invalid utf-8",
        )
    })
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str, pos: Pos) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some((before, after)) = rest.split_once('&') {
        result.push_str(before);

        let Some((entity, tail)) = after.split_once(';') else {
            return Err(Error::with_message(
                ErrorKind::InvalidEntity,
                Span::point(pos),
                "unterminated xml entity",
            ));
        };

        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };

        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(Error::with_message(
                    ErrorKind::InvalidEntity,
                    Span::point(pos),
                    format!("invalid xml entity: &{entity};"),
                ));
            }
        }
        rest = tail;
    }

    result.push_str(rest);
    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code).filter(|&ch| is_xml_char(ch))
}

/// The XML `Char` production
const fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{9}' | '\u{A}' | '\u{D}' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}
