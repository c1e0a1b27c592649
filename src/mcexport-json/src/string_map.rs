//! String-to-string maps with tolerant value decoding
//!
//! Some third-party packs write `true`, `false` or `null` where a string is
//! expected (texture variables, game rules, block-state properties). Every
//! decode path into a [`StringMap`] normalizes those values with
//! [`coerce`], so callers only ever see strings:
//!
//! | source   | value     |
//! |----------|-----------|
//! | `"text"` | `"text"`  |
//! | `true`   | `"true"`  |
//! | `false`  | `"false"` |
//! | `null`   | `""`      |
//!
//! Anything else (numbers, arrays, objects) is rejected.

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use std::fmt;

use crate::token::TokenKind;

const NOT_A_MAP: &str = "expected '{' opening a string map";
const UNSUPPORTED_VALUE: &str = "unsupported value for key";

/// Normalized text for a boolean or null map value, `None` for any other kind
pub fn coerce(kind: TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::True => Some("true"),
        TokenKind::False => Some("false"),
        TokenKind::Null => Some(""),
        _ => None,
    }
}

pub(crate) fn not_a_map(found: TokenKind) -> String {
    format!("{NOT_A_MAP}, found {found}")
}

pub(crate) fn unsupported_value(key: &str, found: TokenKind) -> String {
    format!("{UNSUPPORTED_VALUE} '{key}': expected a string, boolean or null, found {found}")
}

/// True if `message` reports a string map rejecting its input.
///
/// Both the token codec and the serde impls below word their rejections
/// through [`not_a_map`] and [`unsupported_value`], so a structural decode
/// can recognize a nested map failure in a `serde_json` error.
pub(crate) fn is_rejection(message: &str) -> bool {
    message.contains(NOT_A_MAP) || message.contains(UNSUPPORTED_VALUE)
}

/// Ordered string-to-string map.
///
/// Keys are unique; inserting an existing key replaces its value and keeps
/// the key's original position. Equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringMap(IndexMap<String, String>);

impl StringMap {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    /// Insert a pair, returning the previous value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<IndexMap<String, String>> for StringMap {
    fn from(map: IndexMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StringMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for StringMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for StringMap {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a StringMap {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
// serde
// ============================================================================

impl Serialize for StringMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for StringMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(StringMapVisitor)
    }
}

struct StringMapVisitor;

impl StringMapVisitor {
    fn reject<E: de::Error>(found: TokenKind) -> Result<StringMap, E> {
        Err(E::custom(not_a_map(found)))
    }
}

impl<'de> Visitor<'de> for StringMapVisitor {
    type Value = StringMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object whose values are strings, booleans or null")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<StringMap, A::Error> {
        let mut map = StringMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, MapValue>()? {
            let text = match value {
                MapValue::Text(text) => text,
                MapValue::Coerced { text, from } => {
                    tracing::trace!(key = %key, source = %from, "coerced non-string map value");
                    text.to_string()
                }
                MapValue::Rejected(found) => {
                    return Err(de::Error::custom(unsupported_value(&key, found)));
                }
            };
            if map.contains_key(&key) {
                tracing::debug!(key = %key, "duplicate key in string map, keeping last value");
            }
            map.insert(key, text);
        }
        Ok(map)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<StringMap, E> {
        Self::reject(if v { TokenKind::True } else { TokenKind::False })
    }

    fn visit_i64<E: de::Error>(self, _v: i64) -> Result<StringMap, E> {
        Self::reject(TokenKind::Number)
    }

    fn visit_u64<E: de::Error>(self, _v: u64) -> Result<StringMap, E> {
        Self::reject(TokenKind::Number)
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> Result<StringMap, E> {
        Self::reject(TokenKind::Number)
    }

    fn visit_str<E: de::Error>(self, _v: &str) -> Result<StringMap, E> {
        Self::reject(TokenKind::String)
    }

    fn visit_unit<E: de::Error>(self) -> Result<StringMap, E> {
        Self::reject(TokenKind::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _seq: A) -> Result<StringMap, A::Error> {
        Self::reject(TokenKind::StartArray)
    }
}

/// A single map value, classified by [`coerce`]
enum MapValue {
    Text(String),
    Coerced { text: &'static str, from: TokenKind },
    Rejected(TokenKind),
}

impl MapValue {
    fn classify(kind: TokenKind) -> Self {
        match coerce(kind) {
            Some(text) => MapValue::Coerced { text, from: kind },
            None => MapValue::Rejected(kind),
        }
    }
}

impl<'de> Deserialize<'de> for MapValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MapValueVisitor)
    }
}

/// Accepts any value; rejection is left to [`StringMapVisitor`], which
/// knows the key
struct MapValueVisitor;

impl<'de> Visitor<'de> for MapValueVisitor {
    type Value = MapValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string, boolean or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MapValue, E> {
        Ok(MapValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<MapValue, E> {
        Ok(MapValue::Text(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<MapValue, E> {
        Ok(MapValue::classify(if v { TokenKind::True } else { TokenKind::False }))
    }

    fn visit_unit<E: de::Error>(self) -> Result<MapValue, E> {
        Ok(MapValue::classify(TokenKind::Null))
    }

    fn visit_none<E: de::Error>(self) -> Result<MapValue, E> {
        Ok(MapValue::classify(TokenKind::Null))
    }

    fn visit_i64<E: de::Error>(self, _v: i64) -> Result<MapValue, E> {
        Ok(MapValue::classify(TokenKind::Number))
    }

    fn visit_u64<E: de::Error>(self, _v: u64) -> Result<MapValue, E> {
        Ok(MapValue::classify(TokenKind::Number))
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> Result<MapValue, E> {
        Ok(MapValue::classify(TokenKind::Number))
    }

    // Containers are drained so the deserializer sees them fully consumed
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<MapValue, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(MapValue::classify(TokenKind::StartArray))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<MapValue, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(MapValue::classify(TokenKind::StartObject))
    }
}
