//! Data models for the asset library.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::generation::decode::{decode_list_value, lenient_string, parse_json};

// =============================================================================
// ASSET
// =============================================================================

/// Kind of a reusable visual element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Character,
    Scene,
    Prop,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [Self::Character, Self::Scene, Self::Prop];

    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Scene => "scene",
            Self::Prop => "prop",
        }
    }

    /// Parses a wire name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A character, scene or prop with a reusable image prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub description: String,
    pub prompt: String,
}

impl Asset {
    /// Creates an asset with a fresh id and empty text.
    pub fn new(kind: AssetKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            description: String::new(),
            prompt: String::new(),
        }
    }

    /// Builder: Set ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder: Set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: Set prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Reads a text field.
    pub fn field(&self, field: AssetField) -> &str {
        match field {
            AssetField::Name => &self.name,
            AssetField::Description => &self.description,
            AssetField::Prompt => &self.prompt,
        }
    }

    /// Replaces a text field. Returns whether it changed.
    pub fn set_field(&mut self, field: AssetField, value: impl Into<String>) -> bool {
        let value = value.into();
        let slot = match field {
            AssetField::Name => &mut self.name,
            AssetField::Description => &mut self.description,
            AssetField::Prompt => &mut self.prompt,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    /// One-line summary used as context in shot prompts.
    pub fn context_line(&self) -> String {
        format!("{}({}): {}", self.name, self.kind, self.prompt)
    }
}

/// Editable text fields of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetField {
    Name,
    Description,
    Prompt,
}

impl AssetField {
    /// Parses a camelCase wire key.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "name" => Some(Self::Name),
            "description" => Some(Self::Description),
            "prompt" => Some(Self::Prompt),
            _ => None,
        }
    }
}

// =============================================================================
// MODEL PAYLOADS
// =============================================================================

/// An asset as proposed by extraction. `kind` is kept as raw text so an
/// unknown type drops only this item.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratedAsset {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub prompt: String,
}

impl GeneratedAsset {
    /// Converts to an asset with a fresh id. Returns `None` for an unknown
    /// type.
    pub fn into_asset(self) -> Option<Asset> {
        let kind = AssetKind::parse(&self.kind)?;
        Some(
            Asset::new(kind, self.name)
                .with_description(self.description)
                .with_prompt(self.prompt),
        )
    }
}

/// Decodes an extraction reply (`{"assets": [...]}`) item by item. A bare
/// top-level array is accepted too.
pub fn decode_generated_assets(text: &str) -> Vec<Asset> {
    let Some(value) = parse_json(text) else {
        return Vec::new();
    };
    let list = match value {
        Value::Object(mut map) => map.remove("assets").unwrap_or_default(),
        other => other,
    };
    decode_list_value::<GeneratedAsset>(list)
        .into_iter()
        .filter_map(GeneratedAsset::into_asset)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(AssetKind::parse("Character"), Some(AssetKind::Character));
        assert_eq!(AssetKind::parse(" prop "), Some(AssetKind::Prop));
        assert_eq!(AssetKind::parse("vehicle"), None);
    }

    #[test]
    fn test_asset_wire_shape() {
        let asset = Asset::new(AssetKind::Scene, "Kitchen")
            .with_id("a1")
            .with_prompt("warm tungsten kitchen");
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["type"], "scene");
        assert_eq!(json["id"], "a1");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_context_line() {
        let asset = Asset::new(AssetKind::Character, "Mira").with_prompt("young chef, red apron");
        assert_eq!(asset.context_line(), "Mira(character): young chef, red apron");
    }

    #[test]
    fn test_set_field() {
        let mut asset = Asset::new(AssetKind::Prop, "Pot");
        assert!(asset.set_field(AssetField::Prompt, "copper pot"));
        assert!(!asset.set_field(AssetField::Prompt, "copper pot"));
        assert_eq!(asset.field(AssetField::Prompt), "copper pot");
        assert_eq!(AssetField::parse("description"), Some(AssetField::Description));
        assert_eq!(AssetField::parse("type"), None);
    }

    #[test]
    fn test_decode_extraction() {
        let assets = decode_generated_assets(
            r#"{"assets": [
                {"name": "Mira", "type": "character", "description": "chef", "prompt": "red apron"},
                {"name": "Truck", "type": "vehicle"},
                {"name": "Kitchen", "type": "SCENE", "prompt": "steam"},
                "junk"
            ]}"#,
        );
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].kind, AssetKind::Character);
        assert_eq!(assets[1].kind, AssetKind::Scene);
        assert_ne!(assets[0].id, assets[1].id);
    }

    #[test]
    fn test_decode_extraction_degrades() {
        assert!(decode_generated_assets("not json").is_empty());
        assert!(decode_generated_assets("{}").is_empty());
        assert_eq!(
            decode_generated_assets(r#"[{"name": "Pot", "type": "prop"}]"#).len(),
            1
        );
    }
}
