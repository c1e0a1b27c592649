//! JSON token writer
//!
//! Writes tokens straight to an [`io::Write`] sink with no internal
//! buffering; wrap the sink in a `BufWriter` if that matters. Commas,
//! colons and (optionally) indentation are inserted automatically. The
//! writer does not check token order: callers are trusted to emit a
//! well-formed sequence.

use std::io;

use crate::config::WriterOptions;
use crate::token::Token;
use crate::Result;

const INDENT: &[u8] = b"  ";

#[derive(Debug, Clone, Copy)]
struct Scope {
    members: usize,
}

pub struct Writer<W: io::Write> {
    sink: W,
    options: WriterOptions,
    scopes: Vec<Scope>,
    after_name: bool,
}

impl<W: io::Write> Writer<W> {
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, WriterOptions::default())
    }

    pub fn with_options(sink: W, options: WriterOptions) -> Self {
        Self {
            sink,
            options,
            scopes: Vec::new(),
            after_name: false,
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn write_start_object(&mut self) -> Result<()> {
        self.open(b'{')
    }

    pub fn write_end_object(&mut self) -> Result<()> {
        self.close(b'}')
    }

    pub fn write_start_array(&mut self) -> Result<()> {
        self.open(b'[')
    }

    pub fn write_end_array(&mut self) -> Result<()> {
        self.close(b']')
    }

    pub fn write_property_name(&mut self, name: &str) -> Result<()> {
        self.begin_member()?;
        write_escaped(&mut self.sink, name)?;
        let colon: &[u8] = if self.options.indented { b": " } else { b":" };
        self.sink.write_all(colon)?;
        self.after_name = true;
        Ok(())
    }

    /// Write a string value, always quoted
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.begin_value()?;
        write_escaped(&mut self.sink, value)?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_raw(if value { "true" } else { "false" })
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.write_raw("null")
    }

    /// Write a single token as read by [`Reader`](crate::Reader)
    pub fn write_token(&mut self, token: &Token) -> Result<()> {
        match token {
            Token::StartObject => self.write_start_object(),
            Token::EndObject => self.write_end_object(),
            Token::StartArray => self.write_start_array(),
            Token::EndArray => self.write_end_array(),
            Token::PropertyName(name) => self.write_property_name(name),
            Token::String(text) => self.write_string(text),
            Token::Number(lexeme) => self.write_raw(lexeme),
            Token::True => self.write_bool(true),
            Token::False => self.write_bool(false),
            Token::Null => self.write_null(),
        }
    }

    // ========================================================================
    // Separators
    // ========================================================================

    fn write_raw(&mut self, text: &str) -> Result<()> {
        self.begin_value()?;
        self.sink.write_all(text.as_bytes())?;
        Ok(())
    }

    fn open(&mut self, bracket: u8) -> Result<()> {
        self.begin_value()?;
        self.sink.write_all(&[bracket])?;
        self.scopes.push(Scope { members: 0 });
        Ok(())
    }

    fn close(&mut self, bracket: u8) -> Result<()> {
        let scope = self.scopes.pop().unwrap_or(Scope { members: 0 });
        if self.options.indented && scope.members > 0 {
            self.newline()?;
        }
        self.sink.write_all(&[bracket])?;
        Ok(())
    }

    /// Separator before a value; a value directly after a name needs none
    fn begin_value(&mut self) -> Result<()> {
        if self.after_name {
            self.after_name = false;
            return Ok(());
        }
        self.begin_member()
    }

    /// Comma and indentation before an array element or object member
    fn begin_member(&mut self) -> Result<()> {
        let Some(scope) = self.scopes.last_mut() else {
            return Ok(());
        };
        let first = scope.members == 0;
        scope.members += 1;
        if !first {
            self.sink.write_all(b",")?;
        }
        if self.options.indented {
            self.newline()?;
        }
        Ok(())
    }

    fn newline(&mut self) -> Result<()> {
        self.sink.write_all(b"\n")?;
        for _ in 0..self.scopes.len() {
            self.sink.write_all(INDENT)?;
        }
        Ok(())
    }
}

/// Write `text` as a quoted JSON string
fn write_escaped<W: io::Write>(sink: &mut W, text: &str) -> io::Result<()> {
    sink.write_all(b"\"")?;
    let bytes = text.as_bytes();
    let mut run_start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let escape: &[u8] = match b {
            b'"' => b"\\\"",
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            0x08 => b"\\b",
            0x0c => b"\\f",
            0x00..=0x1f => {
                sink.write_all(&bytes[run_start..i])?;
                write!(sink, "\\u{:04x}", b)?;
                run_start = i + 1;
                continue;
            }
            _ => continue,
        };
        sink.write_all(&bytes[run_start..i])?;
        sink.write_all(escape)?;
        run_start = i + 1;
    }
    sink.write_all(&bytes[run_start..])?;
    sink.write_all(b"\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;
    use serde_json::json;

    fn compact(f: impl FnOnce(&mut Writer<&mut Vec<u8>>) -> Result<()>) -> String {
        let mut out = Vec::new();
        let mut writer = Writer::new(&mut out);
        f(&mut writer).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// Re-emit every token of `text`
    fn replay(text: &str, options: WriterOptions) -> String {
        let mut out = Vec::new();
        {
            let mut reader = Reader::new(text);
            let mut writer = Writer::with_options(&mut out, options);
            while let Some(token) = reader.next_token().unwrap() {
                writer.write_token(&token).unwrap();
            }
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_object_separators() {
        let text = compact(|w| {
            w.write_start_object()?;
            w.write_property_name("a")?;
            w.write_string("1")?;
            w.write_property_name("b")?;
            w.write_start_array()?;
            w.write_bool(true)?;
            w.write_null()?;
            w.write_end_array()?;
            w.write_end_object()
        });
        assert_eq!(text, r#"{"a":"1","b":[true,null]}"#);
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(replay("{}", WriterOptions::COMPACT), "{}");
        assert_eq!(replay("[ ]", WriterOptions::COMPACT), "[]");
        assert_eq!(
            replay(r#"{"a": {}, "b": []}"#, WriterOptions::COMPACT),
            r#"{"a":{},"b":[]}"#
        );
        assert_eq!(replay(r#"{"a": {}}"#, WriterOptions::INDENTED), "{\n  \"a\": {}\n}");
    }

    #[test]
    fn test_escaping() {
        let text = compact(|w| w.write_string("q\"b\\n\nt\tc\u{1}é"));
        assert_eq!(text, r#""q\"b\\n\nt\tc\u0001é""#);
    }

    #[test]
    fn test_indented() {
        let text = replay(
            r#"{"parent": "block/cube", "textures": {"all": "x"}, "e": []}"#,
            WriterOptions::INDENTED,
        );
        assert_eq!(
            text,
            "{\n  \"parent\": \"block/cube\",\n  \"textures\": {\n    \"all\": \"x\"\n  },\n  \"e\": []\n}"
        );
    }

    #[test]
    fn test_write_token_preserves_number_lexeme() {
        assert_eq!(replay("[1.50e2, -0, 0.1]", WriterOptions::COMPACT), "[1.50e2,-0,0.1]");
    }

    #[test]
    fn test_output_parses_as_json() -> anyhow::Result<()> {
        let value = json!({"s": "line\nbreak \u{7f} \u{1f}", "n": [1, -2.5, 1e30], "o": {"k": null}});
        let text = replay(&serde_json::to_string(&value)?, WriterOptions::COMPACT);
        let parsed: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(parsed, value);
        Ok(())
    }

    struct FailingSink;

    impl io::Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_errors_pass_through() {
        let mut writer = Writer::new(FailingSink);
        match writer.write_start_object() {
            Err(crate::Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
