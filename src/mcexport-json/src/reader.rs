//! Pull-style JSON token reader
//!
//! The reader walks an in-memory document one token at a time. After a
//! successful [`Reader::advance`] the new token is available through
//! [`Reader::current`]; codecs consume a value starting from the current
//! token and leave the reader on the value's last token.
//!
//! Token order is validated as the document is read, so a codec only ever
//! sees sequences that are structurally valid JSON up to the current
//! position. Leniency (trailing commas, comments) is controlled by
//! [`ReaderOptions`].

use crate::config::{CommentHandling, ReaderOptions};
use crate::token::Token;
use crate::{Error, Position, Result};

/// Open container on the reader's stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object,
    Array,
}

/// What the grammar allows at the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Any value (document root, or after a `:`)
    Value,
    /// Directly after `{`
    FirstKeyOrEnd,
    /// After `,` inside an object
    Key,
    /// After a property name
    Colon,
    /// Directly after `[`
    FirstElementOrEnd,
    /// After `,` inside an array
    Element,
    /// After a complete value inside a container
    CommaOrEnd,
    /// The root value is complete
    Done,
}

const LITERALS: [(&str, Token); 3] = [
    ("true", Token::True),
    ("false", Token::False),
    ("null", Token::Null),
];

pub struct Reader<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
    line_start: usize,
    options: ReaderOptions,
    stack: Vec<Frame>,
    expect: Expect,
    current: Option<Token>,
    token_start: Position,
}

impl<'a> Reader<'a> {
    /// Create a reader with the default (lenient) options
    pub fn new(text: &'a str) -> Self {
        Self::with_options(text, ReaderOptions::default())
    }

    pub fn with_options(text: &'a str, options: ReaderOptions) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            line_start: 0,
            options,
            stack: Vec::new(),
            expect: Expect::Value,
            current: None,
            token_start: Position { line: 1, column: 1 },
        }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// The token the reader is positioned on, if any
    pub fn current(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    /// Take ownership of the current token, leaving the reader without one
    pub fn take_current(&mut self) -> Option<Token> {
        self.current.take()
    }

    /// Advance and take ownership of the new current token.
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        if self.advance()? {
            Ok(self.current.take())
        } else {
            Ok(None)
        }
    }

    /// Position of the cursor
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.pos - self.line_start + 1,
        }
    }

    /// Position where the current token started
    pub fn token_position(&self) -> Position {
        self.token_start
    }

    /// Build a [`Error::MalformedDocument`] located at the current token
    pub fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::malformed(self.token_start, reason)
    }

    /// Build a [`Error::UnexpectedEndOfInput`] located at the cursor
    pub fn unexpected_end(&self, expected: &'static str) -> Error {
        Error::UnexpectedEndOfInput {
            position: self.position(),
            expected,
        }
    }

    /// Move to the next token.
    ///
    /// Returns `Ok(false)` when the input is exhausted, whether or not the
    /// root value is complete; callers that require more tokens report
    /// [`Error::UnexpectedEndOfInput`] themselves. Use [`Reader::finish`] to
    /// check that a document ended cleanly.
    pub fn advance(&mut self) -> Result<bool> {
        self.current = None;
        loop {
            self.skip_trivia()?;
            self.token_start = self.position();
            let Some(byte) = self.peek() else {
                return Ok(false);
            };

            match self.expect {
                Expect::Done => {
                    return Err(self.malformed("unexpected data after the top-level value"));
                }
                Expect::Value => return self.lex_value(byte),
                Expect::Colon => {
                    if byte != b':' {
                        return Err(self.malformed(format!(
                            "expected ':' after property name, found {}",
                            describe(byte)
                        )));
                    }
                    self.pos += 1;
                    self.expect = Expect::Value;
                }
                Expect::FirstKeyOrEnd | Expect::Key => {
                    if byte == b'}' {
                        if self.expect == Expect::Key && !self.options.allow_trailing_commas {
                            return Err(self.malformed("trailing comma before '}'"));
                        }
                        return self.close(Token::EndObject);
                    }
                    if byte != b'"' {
                        return Err(self.malformed(format!(
                            "expected a property name, found {}",
                            describe(byte)
                        )));
                    }
                    let name = self.lex_string()?;
                    self.expect = Expect::Colon;
                    return self.emit(Token::PropertyName(name));
                }
                Expect::FirstElementOrEnd | Expect::Element => {
                    if byte == b']' {
                        if self.expect == Expect::Element && !self.options.allow_trailing_commas {
                            return Err(self.malformed("trailing comma before ']'"));
                        }
                        return self.close(Token::EndArray);
                    }
                    return self.lex_value(byte);
                }
                Expect::CommaOrEnd => match (byte, self.stack.last().copied()) {
                    (b',', Some(Frame::Object)) => {
                        self.pos += 1;
                        self.expect = Expect::Key;
                    }
                    (b',', Some(Frame::Array)) => {
                        self.pos += 1;
                        self.expect = Expect::Element;
                    }
                    (b'}', Some(Frame::Object)) => return self.close(Token::EndObject),
                    (b']', Some(Frame::Array)) => return self.close(Token::EndArray),
                    (_, Some(Frame::Object)) => {
                        return Err(self.malformed(format!(
                            "expected ',' or '}}', found {}",
                            describe(byte)
                        )));
                    }
                    _ => {
                        return Err(self.malformed(format!(
                            "expected ',' or ']', found {}",
                            describe(byte)
                        )));
                    }
                },
            }
        }
    }

    /// Check that the document ended cleanly after the root value.
    ///
    /// Trailing whitespace and comments are allowed; anything else is
    /// malformed.
    pub fn finish(&mut self) -> Result<()> {
        self.skip_trivia()?;
        self.token_start = self.position();
        match (self.peek(), self.expect) {
            (None, Expect::Done) => Ok(()),
            (None, _) => Err(self.unexpected_end("the end of the top-level value")),
            (Some(_), _) => Err(self.malformed("unexpected data after the top-level value")),
        }
    }

    // ========================================================================
    // Token emission
    // ========================================================================

    fn emit(&mut self, token: Token) -> Result<bool> {
        self.current = Some(token);
        Ok(true)
    }

    /// Emit a scalar and update what may follow it
    fn emit_value(&mut self, token: Token) -> Result<bool> {
        self.after_value();
        self.emit(token)
    }

    fn open(&mut self, frame: Frame) -> Result<bool> {
        if self.stack.len() >= self.options.max_depth {
            return Err(self.malformed(format!(
                "nesting deeper than {} levels",
                self.options.max_depth
            )));
        }
        self.pos += 1;
        self.stack.push(frame);
        match frame {
            Frame::Object => {
                self.expect = Expect::FirstKeyOrEnd;
                self.emit(Token::StartObject)
            }
            Frame::Array => {
                self.expect = Expect::FirstElementOrEnd;
                self.emit(Token::StartArray)
            }
        }
    }

    fn close(&mut self, token: Token) -> Result<bool> {
        self.pos += 1;
        self.stack.pop();
        self.emit_value(token)
    }

    fn after_value(&mut self) {
        self.expect = if self.stack.is_empty() {
            Expect::Done
        } else {
            Expect::CommaOrEnd
        };
    }

    // ========================================================================
    // Lexing
    // ========================================================================

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn newline(&mut self) {
        self.pos += 1;
        self.line += 1;
        self.line_start = self.pos;
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r') => self.pos += 1,
                Some(b'\n') => self.newline(),
                Some(b'/') => {
                    if self.options.comments == CommentHandling::Disallow {
                        self.token_start = self.position();
                        return Err(self.malformed("comments are not allowed"));
                    }
                    self.skip_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        self.token_start = self.position();
        match self.peek_at(1) {
            Some(b'/') => {
                self.pos += 2;
                while let Some(b) = self.peek() {
                    if b == b'\n' {
                        break;
                    }
                    self.pos += 1;
                }
                Ok(())
            }
            Some(b'*') => {
                self.pos += 2;
                loop {
                    match self.peek() {
                        None => return Err(self.unexpected_end("'*/' closing a block comment")),
                        Some(b'*') if self.peek_at(1) == Some(b'/') => {
                            self.pos += 2;
                            return Ok(());
                        }
                        Some(b'\n') => self.newline(),
                        Some(_) => self.pos += 1,
                    }
                }
            }
            None => Err(self.unexpected_end("'/' or '*' starting a comment")),
            Some(_) => Err(self.malformed("expected '/' or '*' after '/'")),
        }
    }

    fn lex_value(&mut self, byte: u8) -> Result<bool> {
        match byte {
            b'{' => self.open(Frame::Object),
            b'[' => self.open(Frame::Array),
            b'"' => {
                let text = self.lex_string()?;
                self.emit_value(Token::String(text))
            }
            b'-' | b'0'..=b'9' => {
                let number = self.lex_number()?;
                self.emit_value(Token::Number(number))
            }
            b if b.is_ascii_alphabetic() => {
                let token = self.lex_literal()?;
                self.emit_value(token)
            }
            _ => Err(self.malformed(format!("expected a value, found {}", describe(byte)))),
        }
    }

    fn lex_literal(&mut self) -> Result<Token> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphanumeric()) {
            self.pos += 1;
        }
        let word = &self.text[start..self.pos];

        if let Some((_, token)) = LITERALS.iter().find(|(lit, _)| *lit == word) {
            return Ok(token.clone());
        }
        if self.peek().is_none() && LITERALS.iter().any(|(lit, _)| lit.starts_with(word)) {
            return Err(self.unexpected_end("the rest of a literal"));
        }
        Err(self.malformed(format!("unexpected literal '{}'", word)))
    }

    fn lex_number(&mut self) -> Result<String> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.skip_digits(),
            None => return Err(self.unexpected_end("a digit")),
            Some(b) => return Err(self.malformed(format!("expected a digit, found {}", describe(b)))),
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.require_digits()?;
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            self.require_digits()?;
        }
        Ok(self.text[start..self.pos].to_string())
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn require_digits(&mut self) -> Result<()> {
        match self.peek() {
            Some(b) if b.is_ascii_digit() => {
                self.skip_digits();
                Ok(())
            }
            None => Err(self.unexpected_end("a digit")),
            Some(b) => Err(self.malformed(format!("expected a digit, found {}", describe(b)))),
        }
    }

    /// Lex a string starting at its opening quote
    fn lex_string(&mut self) -> Result<String> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            // Runs stop only on ASCII bytes, so both ends are char boundaries
            let run_start = self.pos;
            while let Some(b) = self.peek() {
                if b == b'"' || b == b'\\' || b < 0x20 {
                    break;
                }
                self.pos += 1;
            }
            out.push_str(&self.text[run_start..self.pos]);

            match self.peek() {
                None => return Err(self.unexpected_end("'\"' closing a string")),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let ch = self.lex_escape()?;
                    out.push(ch);
                }
                Some(b) => {
                    return Err(self.malformed(format!(
                        "unescaped control character 0x{:02x} in string",
                        b
                    )));
                }
            }
        }
    }

    fn lex_escape(&mut self) -> Result<char> {
        let Some(b) = self.peek() else {
            return Err(self.unexpected_end("an escape sequence"));
        };
        self.pos += 1;
        let ch = match b {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => return self.lex_unicode_escape(),
            other => {
                return Err(self.malformed(format!("invalid escape '\\{}'", other as char)));
            }
        };
        Ok(ch)
    }

    fn lex_unicode_escape(&mut self) -> Result<char> {
        let high = self.lex_hex4()?;
        let code = match high {
            0xD800..=0xDBFF => {
                if self.peek() != Some(b'\\') || self.peek_at(1) != Some(b'u') {
                    if self.peek().is_none() {
                        return Err(self.unexpected_end("a low surrogate escape"));
                    }
                    return Err(self.malformed("unpaired high surrogate in string"));
                }
                self.pos += 2;
                let low = self.lex_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.malformed(format!("invalid low surrogate \\u{:04x}", low)));
                }
                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(self.malformed("unpaired low surrogate in string")),
            _ => high,
        };
        char::from_u32(code)
            .ok_or_else(|| self.malformed(format!("invalid code point U+{:04X}", code)))
    }

    fn lex_hex4(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let Some(b) = self.peek() else {
                return Err(self.unexpected_end("four hex digits"));
            };
            let Some(digit) = (b as char).to_digit(16) else {
                return Err(self.malformed(format!("invalid hex digit {}", describe(b))));
            };
            value = (value << 4) | digit;
            self.pos += 1;
        }
        Ok(value)
    }
}

/// Describe a byte for error messages
fn describe(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        format!("'{}'", byte as char)
    } else {
        format!("byte 0x{:02x}", byte)
    }
}
