//! Serialization registry
//!
//! The closed set of record types that may be read or written, the codec
//! bound to each, and the parsing policy applied to every document.
//!
//! Membership is fixed at compile time: [`Registered`] is sealed, and
//! [`BINDINGS`] is a const table. Adding a record type means adding a row
//! here and a line to the `register!` invocation below.
//!
//! Every registered type except [`StringMap`] goes through the structural
//! codec. `StringMap` values nested inside those records still normalize
//! booleans and nulls, and reject anything else as
//! [`Error::MalformedDocument`], because its serde impl applies the same
//! rule as [`TolerantMapCodec`].

use std::io;

use crate::codec::{Codec, CodecKind, StructuralCodec, TolerantMapCodec};
use crate::config::{JsonOptions, WriterOptions};
use crate::reader::Reader;
use crate::records::{BlockState, Model, RegionInfo, TextureMeta, WorldInfo};
use crate::string_map::StringMap;
use crate::writer::Writer;
use crate::{Error, Result};

/// UTF-8 byte-order mark
const BOM: &[u8] = b"\xEF\xBB\xBF";

// ============================================================================
// Binding table
// ============================================================================

/// Identity of a registered record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    WorldInfo,
    RegionInfo,
    Model,
    BlockState,
    TextureMeta,
    StringMap,
}

impl RecordType {
    pub const ALL: [RecordType; 6] = [
        RecordType::WorldInfo,
        RecordType::RegionInfo,
        RecordType::Model,
        RecordType::BlockState,
        RecordType::TextureMeta,
        RecordType::StringMap,
    ];

    pub fn name(&self) -> &'static str {
        binding_for(*self).name
    }
}

/// Association of a record type with its codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub record: RecordType,
    pub name: &'static str,
    pub codec: CodecKind,
}

/// All registered types and the codec handling each.
///
/// Rows are in `RecordType` declaration order.
pub const BINDINGS: &[Binding] = &[
    Binding {
        record: RecordType::WorldInfo,
        name: "WorldInfo",
        codec: CodecKind::Structural,
    },
    Binding {
        record: RecordType::RegionInfo,
        name: "RegionInfo",
        codec: CodecKind::Structural,
    },
    Binding {
        record: RecordType::Model,
        name: "Model",
        codec: CodecKind::Structural,
    },
    Binding {
        record: RecordType::BlockState,
        name: "BlockState",
        codec: CodecKind::Structural,
    },
    Binding {
        record: RecordType::TextureMeta,
        name: "TextureMeta",
        codec: CodecKind::Structural,
    },
    Binding {
        record: RecordType::StringMap,
        name: "StringMap",
        codec: CodecKind::TolerantMap,
    },
];

/// Get the binding for a record type
pub fn binding_for(record: RecordType) -> &'static Binding {
    &BINDINGS[record as usize]
}

/// Look up a record type by its name (`"Model"`, `"StringMap"`, ...)
pub fn record_type_by_name(name: &str) -> Option<RecordType> {
    BINDINGS.iter().find(|b| b.name == name).map(|b| b.record)
}

// ============================================================================
// Compile-time registration
// ============================================================================

mod sealed {
    pub trait Sealed {}
}

/// A type the registry can read and write.
///
/// Sealed: only the types listed in [`BINDINGS`] implement it.
pub trait Registered: Sized + sealed::Sealed {
    const RECORD: RecordType;
    type Codec: Codec<Self>;
}

macro_rules! register {
    ($($ty:ident => $codec:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Registered for $ty {
                const RECORD: RecordType = RecordType::$ty;
                type Codec = $codec;
            }
        )*
    };
}

register! {
    WorldInfo => StructuralCodec,
    RegionInfo => StructuralCodec,
    Model => StructuralCodec,
    BlockState => StructuralCodec,
    TextureMeta => StructuralCodec,
    StringMap => TolerantMapCodec,
}

// ============================================================================
// Registry
// ============================================================================

/// Entry point for reading and writing registered types
#[derive(Debug)]
pub struct Registry {
    options: JsonOptions,
}

/// The process-wide registry: trailing commas allowed, comments skipped
pub static REGISTRY: Registry = Registry {
    options: JsonOptions::DEFAULT,
};

impl Registry {
    pub fn global() -> &'static Registry {
        &REGISTRY
    }

    pub fn options(&self) -> &JsonOptions {
        &self.options
    }

    pub fn bindings(&self) -> &'static [Binding] {
        BINDINGS
    }

    /// Codec that handles `T`
    pub fn codec_for<T: Registered>(&self) -> CodecKind {
        <T::Codec as Codec<T>>::KIND
    }

    /// Decode one `T` from a complete document
    pub fn decode_str<T: Registered>(&self, text: &str) -> Result<T> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = Reader::with_options(text, self.options.reader);
        if !reader.advance()? {
            return Err(reader.unexpected_end("a JSON value"));
        }
        let value = <T::Codec as Codec<T>>::read(&mut reader)?;
        reader.finish()?;
        tracing::trace!(
            record = T::RECORD.name(),
            codec = self.codec_for::<T>().name(),
            bytes = text.len(),
            "decoded record"
        );
        Ok(value)
    }

    /// Decode one `T` from UTF-8 bytes, skipping a leading byte-order mark
    pub fn decode_slice<T: Registered>(&self, bytes: &[u8]) -> Result<T> {
        let (skipped, body) = match bytes.strip_prefix(BOM) {
            Some(rest) => (BOM.len(), rest),
            None => (0, bytes),
        };
        let text = std::str::from_utf8(body).map_err(|e| Error::Utf8 {
            offset: skipped + e.valid_up_to(),
        })?;
        self.decode_str(text)
    }

    /// Encode `value` into `sink` using the registry's writer options
    pub fn encode<T: Registered, W: io::Write>(&self, value: &T, sink: W) -> Result<()> {
        self.encode_with(value, sink, self.options.writer)
    }

    pub fn encode_to_string<T: Registered>(&self, value: &T) -> Result<String> {
        self.encode_string_with(value, self.options.writer)
    }

    pub fn encode_to_string_pretty<T: Registered>(&self, value: &T) -> Result<String> {
        self.encode_string_with(value, WriterOptions::INDENTED)
    }

    fn encode_with<T: Registered, W: io::Write>(
        &self,
        value: &T,
        sink: W,
        options: WriterOptions,
    ) -> Result<()> {
        let mut writer = Writer::with_options(sink, options);
        <T::Codec as Codec<T>>::write(value, &mut writer)?;
        writer.flush()?;
        tracing::trace!(record = T::RECORD.name(), "encoded record");
        Ok(())
    }

    fn encode_string_with<T: Registered>(&self, value: &T, options: WriterOptions) -> Result<String> {
        let mut out = Vec::new();
        self.encode_with(value, &mut out, options)?;
        String::from_utf8(out).map_err(|e| Error::Utf8 {
            offset: e.utf8_error().valid_up_to(),
        })
    }
}

// ============================================================================
// Convenience functions on the global registry
// ============================================================================

/// Decode a registered type from a string
pub fn from_str<T: Registered>(text: &str) -> Result<T> {
    REGISTRY.decode_str(text)
}

/// Decode a registered type from UTF-8 bytes
pub fn from_slice<T: Registered>(bytes: &[u8]) -> Result<T> {
    REGISTRY.decode_slice(bytes)
}

/// Encode a registered type as compact JSON
pub fn to_string<T: Registered>(value: &T) -> Result<String> {
    REGISTRY.encode_to_string(value)
}

/// Encode a registered type as indented JSON
pub fn to_string_pretty<T: Registered>(value: &T) -> Result<String> {
    REGISTRY.encode_to_string_pretty(value)
}

/// Encode a registered type into a sink
pub fn to_writer<T: Registered, W: io::Write>(sink: W, value: &T) -> Result<()> {
    REGISTRY.encode(value, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Variants;

    #[test]
    fn test_every_record_type_bound_once() {
        for record in RecordType::ALL {
            let count = BINDINGS.iter().filter(|b| b.record == record).count();
            assert_eq!(count, 1, "{:?} should have exactly one binding", record);
        }
        assert_eq!(BINDINGS.len(), RecordType::ALL.len());
    }

    #[test]
    fn test_bindings_in_declaration_order() {
        for record in RecordType::ALL {
            assert_eq!(binding_for(record).record, record);
        }
        assert_eq!(RecordType::TextureMeta.name(), "TextureMeta");
    }

    #[test]
    fn test_single_tolerant_binding() {
        let tolerant: Vec<_> = BINDINGS
            .iter()
            .filter(|b| b.codec == CodecKind::TolerantMap)
            .map(|b| b.record)
            .collect();
        assert_eq!(tolerant, vec![RecordType::StringMap]);
    }

    #[test]
    fn test_table_matches_registered_codecs() {
        fn check<T: Registered>() {
            let binding = binding_for(T::RECORD);
            assert_eq!(binding.codec, REGISTRY.codec_for::<T>(), "{:?}", T::RECORD);
        }
        check::<WorldInfo>();
        check::<RegionInfo>();
        check::<Model>();
        check::<BlockState>();
        check::<TextureMeta>();
        check::<StringMap>();
    }

    #[test]
    fn test_record_type_by_name() {
        assert_eq!(record_type_by_name("Model"), Some(RecordType::Model));
        assert_eq!(record_type_by_name("StringMap"), Some(RecordType::StringMap));
        assert_eq!(record_type_by_name("model"), None);
        assert_eq!(record_type_by_name("Chunk"), None);
    }

    #[test]
    fn test_global_policy() {
        let opts = Registry::global().options();
        assert!(opts.reader.allow_trailing_commas);
        assert_eq!(opts.reader.comments, crate::CommentHandling::Skip);
    }

    #[test]
    fn test_leniency_follows_options() -> anyhow::Result<()> {
        let text = "{\"a\": true, // flag\n}";
        assert_eq!(REGISTRY.decode_str::<StringMap>(text)?.get("a"), Some("true"));

        let strict = Registry {
            options: JsonOptions {
                reader: crate::ReaderOptions::STRICT,
                writer: WriterOptions::COMPACT,
            },
        };
        assert!(strict.decode_str::<StringMap>(text).unwrap_err().is_malformed());
        assert!(strict.decode_str::<StringMap>(r#"{"a": true,}"#).unwrap_err().is_malformed());
        assert!(strict.decode_str::<StringMap>(r#"{"a": true}"#).is_ok());
        Ok(())
    }

    #[test]
    fn test_string_map_mixed_values() -> anyhow::Result<()> {
        let map: StringMap = from_str(r#"{"a": "1", "b": true, "c": false, "d": null}"#)?;
        let expected: StringMap = [("a", "1"), ("b", "true"), ("c", "false"), ("d", "")]
            .into_iter()
            .collect();
        assert_eq!(map, expected);
        Ok(())
    }

    #[test]
    fn test_string_map_failures() {
        assert!(matches!(
            from_str::<StringMap>(r#"{"key": 5}"#),
            Err(Error::MalformedDocument { .. })
        ));
        assert!(matches!(
            from_str::<StringMap>(r#"{"key": "v""#),
            Err(Error::UnexpectedEndOfInput { .. })
        ));
        assert!(matches!(
            from_str::<StringMap>(""),
            Err(Error::UnexpectedEndOfInput { .. })
        ));
        assert!(matches!(
            from_str::<StringMap>(r#"{} {}"#),
            Err(Error::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_string_map_empty_and_duplicates() -> anyhow::Result<()> {
        assert!(from_str::<StringMap>("{}")?.is_empty());
        assert_eq!(to_string(&StringMap::new())?, "{}");

        let map: StringMap = from_str(r#"{"a": "1", "a": "2"}"#)?;
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a"), Some("2"));
        Ok(())
    }

    #[test]
    fn test_string_map_round_trip_is_stable() -> anyhow::Result<()> {
        let source = r##"{"up": "#top", "lit": true, "waterlogged": false, "extra": null}"##;
        let once = to_string(&from_str::<StringMap>(source)?)?;
        let twice = to_string(&from_str::<StringMap>(&once)?)?;
        assert_eq!(once, twice);
        assert_eq!(once, r##"{"up":"#top","lit":"true","waterlogged":"false","extra":""}"##);
        Ok(())
    }

    #[test]
    fn test_model_nested_textures_normalized() -> anyhow::Result<()> {
        let model: Model = from_str(
            r#"{
                // third-party pack quirk: null texture
                "parent": "block/cube_all",
                "textures": {"all": "block/stone", "particle": null, "overlay": false,},
                "elements": [],
            }"#,
        )?;
        assert_eq!(model.textures.get("all"), Some("block/stone"));
        assert_eq!(model.textures.get("particle"), Some(""));
        assert_eq!(model.textures.get("overlay"), Some("false"));

        let text = to_string(&model)?;
        assert_eq!(
            text,
            r##"{"parent":"block/cube_all","textures":{"all":"block/stone","particle":"","overlay":"false"}}"##
        );
        Ok(())
    }

    #[test]
    fn test_nested_map_rejections_are_malformed() {
        let err = from_str::<Model>(r#"{"textures": {"all": 1}}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }), "{err:?}");
        assert!(err.to_string().contains("'all'"));

        let err = from_str::<WorldInfo>(r#"{"name": "w", "gameRules": {"a": [1]}}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }), "{err:?}");

        let err = from_str::<WorldInfo>(r#"{"name": "w", "gameRules": 5}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }), "{err:?}");

        let err = from_str::<Model>("\n  {\"textures\": {\"all\": {}}}").unwrap_err();
        match err {
            Error::MalformedDocument { position, .. } => {
                assert_eq!(position, crate::Position { line: 2, column: 3 });
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_float_fields_keep_short_form() -> anyhow::Result<()> {
        let model: Model = from_str(
            r#"{"elements": [{"from": [0.1, 0, 0], "to": [1.3, 16, 16],
                "rotation": {"origin": [8, 8, 8], "axis": "y", "angle": 22.5}}]}"#,
        )?;
        let text = to_string(&model)?;
        assert_eq!(text, serde_json::to_string(&model)?);
        assert!(text.contains(r#""from":[0.1,0.0,0.0]"#), "{text}");
        assert!(text.contains(r#""to":[1.3,16.0,16.0]"#), "{text}");

        let pretty = to_string_pretty(&model)?;
        assert!(pretty.contains("0.1,"), "{pretty}");
        assert_eq!(from_str::<Model>(&pretty)?, model);
        Ok(())
    }

    #[test]
    fn test_block_state_with_comments() -> anyhow::Result<()> {
        let state: BlockState = from_str(
            r#"/* furnace */ {
                "variants": {
                    "facing=north,lit=false": {"model": "block/furnace"},
                    "facing=east,lit=false": {"model": "block/furnace", "y": 90}, // rotated
                }
            }"#,
        )?;
        assert_eq!(state.variants.len(), 2);
        match &state.variants["facing=east,lit=false"] {
            Variants::Single(model) => assert_eq!(model.y, 90),
            other => panic!("unexpected variants: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_world_info_round_trip() -> anyhow::Result<()> {
        let world: WorldInfo = from_str(
            r#"{"name": "Survival", "seed": -42, "spawn": [0, 64, 0],
                "gameRules": {"keepInventory": true},
                "regions": [{"x": 0, "z": -1, "chunkCount": 12}]}"#,
        )?;
        assert_eq!(world.game_rules.get("keepInventory"), Some("true"));
        assert_eq!(world.regions[0].file_name(), "r.0.-1.mca");

        let again: WorldInfo = from_str(&to_string(&world)?)?;
        assert_eq!(again, world);
        Ok(())
    }

    #[test]
    fn test_texture_meta_and_region() -> anyhow::Result<()> {
        let meta: TextureMeta = from_str(r#"{"animation": {"frametime": 2}, "texture": {"blur": true}}"#)?;
        assert_eq!(meta.animation.as_ref().map(|a| a.frametime), Some(2));
        assert_eq!(meta.texture.map(|t| t.blur), Some(true));

        let region: RegionInfo = from_str(r#"{"x": 5, "z": 6}"#)?;
        assert_eq!(region.chunk_count, 0);
        Ok(())
    }

    #[test]
    fn test_missing_required_field() {
        let err = from_str::<RegionInfo>(r#"{"x": 5}"#).unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }

    #[test]
    fn test_decode_slice_skips_bom() -> anyhow::Result<()> {
        let mut bytes = BOM.to_vec();
        bytes.extend_from_slice(br#"{"k": true}"#);
        let map: StringMap = from_slice(&bytes)?;
        assert_eq!(map.get("k"), Some("true"));
        Ok(())
    }

    #[test]
    fn test_decode_slice_invalid_utf8() {
        let err = from_slice::<StringMap>(b"{\"k\": \"\xff\"}").unwrap_err();
        assert!(matches!(err, Error::Utf8 { offset: 7 }));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_to_writer_and_pretty() -> anyhow::Result<()> {
        let map: StringMap = [("a", "1")].into_iter().collect();
        let mut out = Vec::new();
        to_writer(&mut out, &map)?;
        assert_eq!(out, br#"{"a":"1"}"#);

        assert_eq!(to_string_pretty(&map)?, "{\n  \"a\": \"1\"\n}");
        Ok(())
    }
}
