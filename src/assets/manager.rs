//! `AssetLibrary`: the ordered collection of extracted and hand-made assets.

use serde::Serialize;
use tracing::debug;

use crate::assets::model::{Asset, AssetField, AssetKind};
use crate::lang::Labels;

/// Ordered list of assets. Ids are unique.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct AssetLibrary {
    assets: Vec<Asset>,
}

impl AssetLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// All assets in order.
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Gets an asset by ID.
    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Whether an asset with this ID exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Assets of one kind, in order.
    pub fn of_kind(&self, kind: AssetKind) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(move |a| a.kind == kind)
    }

    /// Replaces every asset.
    pub fn replace_all(&mut self, assets: Vec<Asset>) {
        self.assets = assets;
        debug!(count = self.assets.len(), "asset library replaced");
    }

    /// Appends a blank asset named from the locale's label table. Returns its
    /// id.
    pub fn add(&mut self, kind: AssetKind, labels: &Labels) -> String {
        let name = match kind {
            AssetKind::Character => labels.new_character,
            AssetKind::Scene => labels.new_scene,
            AssetKind::Prop => labels.new_prop,
        };
        self.push(Asset::new(kind, name))
    }

    /// Appends an asset. Returns its id.
    pub fn push(&mut self, asset: Asset) -> String {
        let id = asset.id.clone();
        self.assets.push(asset);
        id
    }

    /// Deletes an asset. Returns whether one was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.assets.len();
        self.assets.retain(|a| a.id != id);
        before != self.assets.len()
    }

    /// Replaces one text field. Returns whether anything changed.
    pub fn update_field(&mut self, id: &str, field: AssetField, value: impl Into<String>) -> bool {
        match self.assets.iter_mut().find(|a| a.id == id) {
            Some(asset) => asset.set_field(field, value),
            None => false,
        }
    }

    /// `name(type): prompt` lines for every asset, newline separated.
    pub fn context(&self) -> String {
        self.assets
            .iter()
            .map(Asset::context_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Locale;

    #[test]
    fn test_add_uses_locale_names() {
        let mut library = AssetLibrary::new();
        let zh = library.add(AssetKind::Character, Locale::Zh.labels());
        let en = library.add(AssetKind::Prop, Locale::En.labels());
        assert_eq!(library.get(&zh).unwrap().name, "新角色");
        assert_eq!(library.get(&en).unwrap().name, "New Prop");
        assert!(library.get(&en).unwrap().prompt.is_empty());
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn test_remove_and_update() {
        let mut library = AssetLibrary::new();
        let id = library.add(AssetKind::Scene, Locale::En.labels());
        assert!(library.update_field(&id, AssetField::Prompt, "rain-soaked alley"));
        assert!(!library.update_field("missing", AssetField::Prompt, "x"));
        assert!(library.remove(&id));
        assert!(!library.remove(&id));
        assert!(library.is_empty());
    }

    #[test]
    fn test_replace_all_and_context() {
        let mut library = AssetLibrary::new();
        library.add(AssetKind::Prop, Locale::En.labels());
        library.replace_all(vec![
            Asset::new(AssetKind::Character, "Mira").with_prompt("red apron"),
            Asset::new(AssetKind::Scene, "Kitchen").with_prompt("steam"),
        ]);
        assert_eq!(library.len(), 2);
        assert_eq!(library.of_kind(AssetKind::Scene).count(), 1);
        assert_eq!(
            library.context(),
            "Mira(character): red apron\nKitchen(scene): steam"
        );
    }

    #[test]
    fn test_serializes_as_list() {
        let mut library = AssetLibrary::new();
        library.push(Asset::new(AssetKind::Prop, "Pot").with_id("p1"));
        let json = serde_json::to_value(&library).unwrap();
        assert_eq!(json[0]["id"], "p1");
    }
}
