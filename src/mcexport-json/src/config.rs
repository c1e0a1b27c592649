//! Reader and writer configuration
//!
//! [`JsonOptions::DEFAULT`] is the policy every registry operation uses:
//! trailing commas accepted, comments skipped, compact output.

use serde::{Deserialize, Serialize};

/// How the reader treats `//` and `/* */` comments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentHandling {
    /// Treat comments as whitespace
    Skip,
    /// Reject any comment as malformed
    Disallow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Accept one comma directly before `}` or `]`
    pub allow_trailing_commas: bool,
    pub comments: CommentHandling,
    /// Maximum number of open objects and arrays
    pub max_depth: usize,
}

impl ReaderOptions {
    pub const LENIENT: ReaderOptions = ReaderOptions {
        allow_trailing_commas: true,
        comments: CommentHandling::Skip,
        max_depth: 64,
    };

    /// Plain RFC 8259 JSON: no trailing commas, no comments
    pub const STRICT: ReaderOptions = ReaderOptions {
        allow_trailing_commas: false,
        comments: CommentHandling::Disallow,
        max_depth: 64,
    };
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self::LENIENT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Two-space indentation with one member per line
    pub indented: bool,
}

impl WriterOptions {
    pub const COMPACT: WriterOptions = WriterOptions { indented: false };
    pub const INDENTED: WriterOptions = WriterOptions { indented: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    pub reader: ReaderOptions,
    pub writer: WriterOptions,
}

impl JsonOptions {
    pub const DEFAULT: JsonOptions = JsonOptions {
        reader: ReaderOptions::LENIENT,
        writer: WriterOptions::COMPACT,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lenient() {
        let opts = JsonOptions::default();
        assert_eq!(opts, JsonOptions::DEFAULT);
        assert!(opts.reader.allow_trailing_commas);
        assert_eq!(opts.reader.comments, CommentHandling::Skip);
        assert!(!opts.writer.indented);
    }

    #[test]
    fn test_partial_config_fills_defaults() -> anyhow::Result<()> {
        let opts: JsonOptions =
            serde_json::from_str(r#"{"reader": {"comments": "disallow"}, "writer": {"indented": true}}"#)?;
        assert_eq!(opts.reader.comments, CommentHandling::Disallow);
        assert!(opts.reader.allow_trailing_commas);
        assert_eq!(opts.reader.max_depth, 64);
        assert!(opts.writer.indented);
        Ok(())
    }
}
