//! JSON tokens produced by [`Reader`](crate::Reader) and consumed by
//! [`Writer`](crate::Writer).

use std::fmt;

/// A single lexical unit of a JSON document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    PropertyName(String),
    String(String),
    /// Number lexeme exactly as written in the source
    Number(String),
    True,
    False,
    Null,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::StartObject => TokenKind::StartObject,
            Token::EndObject => TokenKind::EndObject,
            Token::StartArray => TokenKind::StartArray,
            Token::EndArray => TokenKind::EndArray,
            Token::PropertyName(_) => TokenKind::PropertyName,
            Token::String(_) => TokenKind::String,
            Token::Number(_) => TokenKind::Number,
            Token::True => TokenKind::True,
            Token::False => TokenKind::False,
            Token::Null => TokenKind::Null,
        }
    }
}

/// Token discriminant without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    PropertyName,
    String,
    Number,
    True,
    False,
    Null,
}

impl TokenKind {
    /// Human-readable name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::StartObject => "'{'",
            TokenKind::EndObject => "'}'",
            TokenKind::StartArray => "'['",
            TokenKind::EndArray => "']'",
            TokenKind::PropertyName => "property name",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_kind() {
        assert_eq!(Token::PropertyName("a".into()).kind(), TokenKind::PropertyName);
        assert_eq!(Token::Number("1.5".into()).kind(), TokenKind::Number);
        assert_eq!(Token::Null.kind(), TokenKind::Null);
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenKind::EndObject.to_string(), "'}'");
        assert_eq!(TokenKind::True.to_string(), "true");
    }
}
