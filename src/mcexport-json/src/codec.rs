//! Codecs between token streams and Rust values
//!
//! A codec reads one value starting at the reader's current token and
//! leaves the reader on that value's last token. Writing emits the value's
//! tokens into a [`Writer`].
//!
//! - [`StructuralCodec`]: the default. Lifts the tokens into a
//!   `serde_json::Value` tree and goes through the type's serde impls.
//! - [`TolerantMapCodec`]: reads a [`StringMap`] directly from tokens,
//!   normalizing boolean and null values to strings.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::error::Category;
use serde_json::{Map, Number, Value};
use std::io;
use std::str::FromStr;

use crate::config::ReaderOptions;
use crate::reader::Reader;
use crate::string_map::{self, coerce, StringMap};
use crate::token::Token;
use crate::writer::Writer;
use crate::{Error, Result};

/// Which codec handles a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    /// Field-by-field through serde
    Structural,
    /// [`TolerantMapCodec`]
    TolerantMap,
}

impl CodecKind {
    pub fn name(&self) -> &'static str {
        match self {
            CodecKind::Structural => "structural",
            CodecKind::TolerantMap => "tolerant-map",
        }
    }
}

/// Paired read/write logic for one value type
pub trait Codec<T> {
    const KIND: CodecKind;

    /// Read a value starting at the reader's current token
    fn read(reader: &mut Reader<'_>) -> Result<T>;

    fn write<W: io::Write>(value: &T, writer: &mut Writer<W>) -> Result<()>;
}

// ============================================================================
// Tolerant map codec
// ============================================================================

/// Codec for [`StringMap`] values that tolerates `true`, `false` and `null`
pub struct TolerantMapCodec;

impl Codec<StringMap> for TolerantMapCodec {
    const KIND: CodecKind = CodecKind::TolerantMap;

    fn read(reader: &mut Reader<'_>) -> Result<StringMap> {
        match reader.current() {
            Some(Token::StartObject) => {}
            Some(other) => {
                return Err(reader.malformed(string_map::not_a_map(other.kind())));
            }
            None => return Err(reader.unexpected_end("'{' opening a string map")),
        }

        let mut map = StringMap::new();
        loop {
            let Some(token) = reader.next_token()? else {
                return Err(reader.unexpected_end("'}' closing a string map"));
            };
            let key = match token {
                Token::EndObject => return Ok(map),
                Token::PropertyName(name) => name,
                other => {
                    return Err(reader.malformed(format!(
                        "expected a property name, found {}",
                        other.kind()
                    )));
                }
            };

            let Some(token) = reader.next_token()? else {
                return Err(reader.unexpected_end("a string map value"));
            };
            let value = match token {
                Token::String(text) => text,
                other => {
                    let kind = other.kind();
                    let Some(text) = coerce(kind) else {
                        return Err(reader.malformed(string_map::unsupported_value(&key, kind)));
                    };
                    tracing::trace!(key = %key, source = %kind, "coerced non-string map value");
                    text.to_string()
                }
            };

            if map.contains_key(&key) {
                tracing::debug!(key = %key, "duplicate key in string map, keeping last value");
            }
            map.insert(key, value);
        }
    }

    fn write<W: io::Write>(map: &StringMap, writer: &mut Writer<W>) -> Result<()> {
        writer.write_start_object()?;
        for (key, value) in map.iter() {
            writer.write_property_name(key)?;
            writer.write_string(value)?;
        }
        writer.write_end_object()
    }
}

// ============================================================================
// Structural codec
// ============================================================================

/// Default codec for any serde type
pub struct StructuralCodec;

/// Strict JSON with no depth limit, for re-reading `serde_json` output
const REPLAY: ReaderOptions = ReaderOptions {
    max_depth: usize::MAX,
    ..ReaderOptions::STRICT
};

impl<T: Serialize + DeserializeOwned> Codec<T> for StructuralCodec {
    const KIND: CodecKind = CodecKind::Structural;

    /// A [`StringMap`] nested anywhere in `T` that rejects its input is
    /// reported as [`Error::MalformedDocument`] at the start of the value,
    /// the same as a top-level map
    fn read(reader: &mut Reader<'_>) -> Result<T> {
        let start = reader.token_position();
        let value = read_value(reader)?;
        serde_json::from_value(value).map_err(|e| {
            let reason = e.to_string();
            if e.classify() == Category::Data && string_map::is_rejection(&reason) {
                Error::malformed(start, reason)
            } else {
                Error::Structure(e)
            }
        })
    }

    /// Serializes with `serde_json` and replays the tokens, so numbers keep
    /// their serialized form (`f32` fields stay short)
    fn write<W: io::Write>(value: &T, writer: &mut Writer<W>) -> Result<()> {
        let text = serde_json::to_string(value)?;
        let mut tokens = Reader::with_options(&text, REPLAY);
        while let Some(token) = tokens.next_token()? {
            writer.write_token(&token)?;
        }
        tokens.finish()
    }
}

/// Read a complete value tree starting at the reader's current token
pub fn read_value(reader: &mut Reader<'_>) -> Result<Value> {
    let Some(token) = reader.take_current() else {
        return Err(reader.unexpected_end("a value"));
    };

    match token {
        Token::StartObject => {
            let mut members = Map::new();
            loop {
                let Some(token) = reader.next_token()? else {
                    return Err(reader.unexpected_end("'}' closing an object"));
                };
                match token {
                    Token::EndObject => return Ok(Value::Object(members)),
                    Token::PropertyName(name) => {
                        if !reader.advance()? {
                            return Err(reader.unexpected_end("a property value"));
                        }
                        let member = read_value(reader)?;
                        members.insert(name, member);
                    }
                    other => {
                        return Err(reader.malformed(format!(
                            "expected a property name, found {}",
                            other.kind()
                        )));
                    }
                }
            }
        }
        Token::StartArray => {
            let mut items = Vec::new();
            loop {
                if !reader.advance()? {
                    return Err(reader.unexpected_end("']' closing an array"));
                }
                if reader.current() == Some(&Token::EndArray) {
                    return Ok(Value::Array(items));
                }
                items.push(read_value(reader)?);
            }
        }
        Token::String(text) => Ok(Value::String(text)),
        Token::Number(lexeme) => Number::from_str(&lexeme)
            .map(Value::Number)
            .map_err(|_| reader.malformed(format!("number out of range: {}", lexeme))),
        Token::True => Ok(Value::Bool(true)),
        Token::False => Ok(Value::Bool(false)),
        Token::Null => Ok(Value::Null),
        other @ (Token::EndObject | Token::EndArray | Token::PropertyName(_)) => Err(
            Error::malformed(reader.token_position(), format!("expected a value, found {}", other.kind())),
        ),
    }
}
