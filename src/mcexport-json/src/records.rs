//! Record types exchanged with the export pipeline
//!
//! These mirror the JSON shapes the exporter reads from resource packs and
//! writes next to exported worlds. Fields commonly missing from real files
//! default instead of failing; no further validation is done here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::string_map::StringMap;

// ============================================================================
// World data
// ============================================================================

/// World summary taken from `level.dat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_version: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<[i32; 3]>,
    /// Game rule values are strings in `level.dat`, though some tools write booleans
    #[serde(default)]
    pub game_rules: StringMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<RegionInfo>,
}

/// One exported `r.<x>.<z>.mca` region file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionInfo {
    pub x: i32,
    pub z: i32,
    #[serde(default)]
    pub chunk_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
}

impl RegionInfo {
    /// Region file name as written by the game
    pub fn file_name(&self) -> String {
        format!("r.{}.{}.mca", self.x, self.z)
    }
}

// ============================================================================
// Models
// ============================================================================

/// Block or item model (`assets/<ns>/models/**.json`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(
        default,
        rename = "ambientocclusion",
        skip_serializing_if = "Option::is_none"
    )]
    pub ambient_occlusion: Option<bool>,
    /// Texture variables (`"all": "block/stone"`, `"particle": "#all"`)
    #[serde(default, skip_serializing_if = "StringMap::is_empty")]
    pub textures: StringMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<Element>,
    /// Display transforms are passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<serde_json::Value>,
}

/// A cuboid inside a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub from: [f32; 3],
    pub to: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<ElementRotation>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub shade: bool,
    #[serde(default)]
    pub faces: IndexMap<String, Face>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRotation {
    pub origin: [f32; 3],
    pub axis: String,
    pub angle: f32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub rescale: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub texture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cullface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tintindex: Option<i32>,
}

// ============================================================================
// Block states
// ============================================================================

/// Block-state definition (`assets/<ns>/blockstates/*.json`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockState {
    /// Property string (`"facing=north,lit=true"`) -> model(s)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variants: IndexMap<String, Variants>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multipart: Vec<MultipartCase>,
}

/// One model reference or a weighted list of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variants {
    Single(ModelRef),
    Weighted(Vec<ModelRef>),
}

impl Variants {
    pub fn models(&self) -> &[ModelRef] {
        match self {
            Variants::Single(model) => std::slice::from_ref(model),
            Variants::Weighted(models) => models,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    pub model: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub x: i32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub y: i32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub uvlock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

/// Multipart case; `when` may hold `OR`/`AND` lists so it stays a raw value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipartCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<serde_json::Value>,
    pub apply: Variants,
}

// ============================================================================
// Texture metadata
// ============================================================================

/// Texture metadata (`*.png.mcmeta`)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextureMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<TextureProperties>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    #[serde(default, skip_serializing_if = "is_false")]
    pub interpolate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default = "default_frametime")]
    pub frametime: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Frame>,
}

/// Animation frame: a bare index or an index with its own duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Frame {
    Index(u32),
    Timed { index: u32, time: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextureProperties {
    #[serde(default)]
    pub blur: bool,
    #[serde(default)]
    pub clamp: bool,
}

fn default_true() -> bool {
    true
}

fn default_frametime() -> u32 {
    1
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_region_file_name() {
        let region = RegionInfo {
            x: -1,
            z: 3,
            chunk_count: 0,
            dimension: None,
        };
        assert_eq!(region.file_name(), "r.-1.3.mca");
    }

    #[test]
    fn test_model_defaults() -> anyhow::Result<()> {
        let model: Model = serde_json::from_value(json!({"parent": "block/cube_all"}))?;
        assert_eq!(model.parent.as_deref(), Some("block/cube_all"));
        assert!(model.textures.is_empty());
        assert!(model.elements.is_empty());
        assert_eq!(serde_json::to_value(&model)?, json!({"parent": "block/cube_all"}));
        Ok(())
    }

    #[test]
    fn test_element_shade_default() -> anyhow::Result<()> {
        let element: Element = serde_json::from_value(json!({
            "from": [0, 0, 0],
            "to": [16, 16, 16],
            "faces": {"north": {"texture": "#side", "cullface": "north"}}
        }))?;
        assert!(element.shade);
        assert_eq!(element.faces["north"].texture, "#side");
        Ok(())
    }

    #[test]
    fn test_variants_single_and_weighted() -> anyhow::Result<()> {
        let state: BlockState = serde_json::from_value(json!({
            "variants": {
                "": {"model": "block/stone"},
                "axis=x": [{"model": "block/log", "x": 90, "weight": 3}, {"model": "block/log_alt"}]
            }
        }))?;
        assert_eq!(state.variants[""].models().len(), 1);
        let weighted = state.variants["axis=x"].models();
        assert_eq!(weighted.len(), 2);
        assert_eq!(weighted[0].x, 90);
        assert_eq!(weighted[0].weight, Some(3));
        Ok(())
    }

    #[test]
    fn test_animation_frames() -> anyhow::Result<()> {
        let meta: TextureMeta = serde_json::from_value(json!({
            "animation": {"frames": [0, {"index": 1, "time": 4}]}
        }))?;
        let animation = meta.animation.expect("animation");
        assert_eq!(animation.frametime, 1);
        assert_eq!(
            animation.frames,
            vec![Frame::Index(0), Frame::Timed { index: 1, time: 4 }]
        );
        Ok(())
    }

    #[test]
    fn test_world_game_rules_tolerant() -> anyhow::Result<()> {
        let world: WorldInfo = serde_json::from_value(json!({
            "name": "Survival",
            "gameRules": {"doDaylightCycle": false, "randomTickSpeed": "3"}
        }))?;
        assert_eq!(world.game_rules.get("doDaylightCycle"), Some("false"));
        assert_eq!(world.game_rules.get("randomTickSpeed"), Some("3"));
        Ok(())
    }
}
