//! # mcexport-json
//!
//! Lenient JSON reading and writing for mcexport asset records.
//!
//! Resource packs in the wild are not always well-behaved JSON. This crate
//! provides:
//! - A token [`Reader`] that accepts trailing commas and skips comments
//! - A token [`Writer`] producing compact or indented output
//! - [`StringMap`], a string-to-string map that tolerates `true`, `false`
//!   and `null` where strings are expected, and always writes strings back
//! - A closed [`registry`] of the record types that may be (de)serialized,
//!   each bound to the codec that handles it
//!
//! ## Example
//!
//! ```
//! use mcexport_json::{Model, StringMap};
//!
//! # fn main() -> Result<(), mcexport_json::Error> {
//! let model: Model = mcexport_json::from_str(
//!     r#"{
//!         // exported by a third-party pack
//!         "parent": "block/cube_all",
//!         "textures": { "all": "block/stone", "particle": null, },
//!     }"#,
//! )?;
//! assert_eq!(model.textures.get("particle"), Some(""));
//!
//! let map: StringMap = mcexport_json::from_str(r#"{"snowy": false}"#)?;
//! assert_eq!(mcexport_json::to_string(&map)?, r#"{"snowy":"false"}"#);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod reader;
pub mod records;
pub mod registry;
pub mod string_map;
pub mod token;
pub mod writer;

use std::fmt;

// Re-export commonly used items
#[doc(inline)]
pub use codec::{Codec, CodecKind, StructuralCodec, TolerantMapCodec};
#[doc(inline)]
pub use config::{CommentHandling, JsonOptions, ReaderOptions, WriterOptions};
#[doc(inline)]
pub use reader::Reader;
#[doc(inline)]
pub use records::{BlockState, Model, RegionInfo, TextureMeta, WorldInfo};
#[doc(inline)]
pub use registry::{
    binding_for, from_slice, from_str, record_type_by_name, to_string, to_string_pretty,
    to_writer, Binding, RecordType, Registered, Registry, BINDINGS, REGISTRY,
};
#[doc(inline)]
pub use string_map::StringMap;
#[doc(inline)]
pub use token::{Token, TokenKind};
#[doc(inline)]
pub use writer::Writer;

/// Location in a source document, 1-based. Columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors from reading or writing JSON documents
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed document at {position}: {reason}")]
    MalformedDocument { position: Position, reason: String },

    #[error("Unexpected end of input at {position}: expected {expected}")]
    UnexpectedEndOfInput {
        position: Position,
        expected: &'static str,
    },

    #[error("Invalid UTF-8 at byte {offset}")]
    Utf8 { offset: usize },

    #[error("Record structure error: {0}")]
    Structure(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(position: Position, reason: impl Into<String>) -> Self {
        Error::MalformedDocument {
            position,
            reason: reason.into(),
        }
    }

    /// True for every error caused by the shape of the input document.
    ///
    /// Covers lexical and token-order violations, unsupported map values,
    /// records whose fields do not fit their type, and invalid UTF-8.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::MalformedDocument { .. } | Error::Structure(_) | Error::Utf8 { .. }
        )
    }

    /// True when the input ended before the value was complete.
    pub fn is_unexpected_end(&self) -> bool {
        matches!(self, Error::UnexpectedEndOfInput { .. })
    }
}

/// Result type for JSON operations
pub type Result<T> = std::result::Result<T, Error>;
