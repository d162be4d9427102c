//! Data models for the storyboard.
//!
//! Field names serialize in camelCase to match the browser UI's `Shot` type.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::generation::decode::{lenient_opt_string, lenient_string, lenient_string_list};
use crate::lang::Labels;

// =============================================================================
// SHOT
// =============================================================================

/// One storyboard unit: cinematic metadata plus the prompts derived from it.
///
/// `shot_number` is owned by the containing `Storyboard` and always equals
/// the shot's 1-based position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Shot {
    pub id: String,
    pub shot_number: u32,
    /// Shot size (ECU, CU, MCU, MS, WS, ...). Free text.
    pub shot_type: String,
    pub duration: String,
    pub scene_name: String,
    pub location: String,
    /// Names of characters in frame. Plain strings, not asset ids.
    pub characters: Vec<String>,
    pub composition: String,
    pub action: String,
    pub dialogue: String,
    pub lighting: String,
    pub props: String,
    pub camera_movement: String,
    pub atmosphere: String,
    pub sound_effect: String,
    pub visual_prompt: String,
    pub video_prompt: String,
    pub transition_prompt: String,
    /// Set when a cinematic input changed after `visual_prompt` was written.
    pub is_stale: bool,
}

impl Shot {
    /// Creates an empty shot with the given ID and shot number.
    pub fn new(id: impl Into<String>, shot_number: u32) -> Self {
        Self {
            id: id.into(),
            shot_number,
            ..Default::default()
        }
    }

    /// Creates a shot with a fresh id and the locale's default cinematic
    /// values. Scene name and location carry over from `previous` when it
    /// has them.
    pub fn seeded(labels: &Labels, previous: Option<&Shot>) -> Self {
        let carry = |pick: fn(&Shot) -> &str, fallback: &str| {
            previous
                .map(pick)
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };
        Self {
            id: Uuid::new_v4().to_string(),
            shot_type: labels.default_shot_type.to_string(),
            duration: labels.default_duration.to_string(),
            scene_name: carry(|s| &s.scene_name, labels.default_scene_name),
            location: carry(|s| &s.location, labels.default_location),
            composition: labels.default_composition.to_string(),
            action: labels.default_action.to_string(),
            lighting: labels.default_lighting.to_string(),
            camera_movement: labels.default_camera_movement.to_string(),
            atmosphere: labels.default_atmosphere.to_string(),
            ..Default::default()
        }
    }

    /// Builder: Set action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Builder: Set dialogue.
    pub fn with_dialogue(mut self, dialogue: impl Into<String>) -> Self {
        self.dialogue = dialogue.into();
        self
    }

    /// Builder: Set shot type.
    pub fn with_shot_type(mut self, shot_type: impl Into<String>) -> Self {
        self.shot_type = shot_type.into();
        self
    }

    /// Builder: Set visual prompt.
    pub fn with_visual_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.visual_prompt = prompt.into();
        self
    }

    /// Reads a text field.
    pub fn field(&self, field: ShotField) -> &str {
        match field {
            ShotField::ShotType => &self.shot_type,
            ShotField::Duration => &self.duration,
            ShotField::SceneName => &self.scene_name,
            ShotField::Location => &self.location,
            ShotField::Composition => &self.composition,
            ShotField::Action => &self.action,
            ShotField::Dialogue => &self.dialogue,
            ShotField::Lighting => &self.lighting,
            ShotField::Props => &self.props,
            ShotField::CameraMovement => &self.camera_movement,
            ShotField::Atmosphere => &self.atmosphere,
            ShotField::SoundEffect => &self.sound_effect,
            ShotField::VisualPrompt => &self.visual_prompt,
            ShotField::VideoPrompt => &self.video_prompt,
            ShotField::TransitionPrompt => &self.transition_prompt,
        }
    }

    fn field_mut(&mut self, field: ShotField) -> &mut String {
        match field {
            ShotField::ShotType => &mut self.shot_type,
            ShotField::Duration => &mut self.duration,
            ShotField::SceneName => &mut self.scene_name,
            ShotField::Location => &mut self.location,
            ShotField::Composition => &mut self.composition,
            ShotField::Action => &mut self.action,
            ShotField::Dialogue => &mut self.dialogue,
            ShotField::Lighting => &mut self.lighting,
            ShotField::Props => &mut self.props,
            ShotField::CameraMovement => &mut self.camera_movement,
            ShotField::Atmosphere => &mut self.atmosphere,
            ShotField::SoundEffect => &mut self.sound_effect,
            ShotField::VisualPrompt => &mut self.visual_prompt,
            ShotField::VideoPrompt => &mut self.video_prompt,
            ShotField::TransitionPrompt => &mut self.transition_prompt,
        }
    }

    /// Replaces one text field and maintains `is_stale`.
    ///
    /// Returns whether the value or the staleness flag changed.
    pub fn set_field(&mut self, field: ShotField, value: impl Into<String>) -> bool {
        let value = value.into();
        let was_stale = self.is_stale;
        if field == ShotField::VisualPrompt {
            self.is_stale = false;
        }
        let slot = self.field_mut(field);
        if *slot == value {
            return was_stale != self.is_stale;
        }
        *slot = value;
        if field.feeds_visual_prompt() {
            self.mark_inputs_changed();
        }
        true
    }

    /// Replaces the character-name set: names are trimmed, blanks and
    /// duplicates dropped, first-appearance order kept.
    ///
    /// Returns whether the set changed.
    pub fn set_characters(&mut self, names: Vec<String>) -> bool {
        let mut unique: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim();
            if !name.is_empty() && !unique.iter().any(|n| n == name) {
                unique.push(name.to_string());
            }
        }
        if unique == self.characters {
            return false;
        }
        self.characters = unique;
        self.mark_inputs_changed();
        true
    }

    fn mark_inputs_changed(&mut self) {
        if !self.visual_prompt.is_empty() {
            self.is_stale = true;
        }
    }
}

// =============================================================================
// SHOT FIELD
// =============================================================================

/// The free-text fields of a shot that can be edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShotField {
    ShotType,
    Duration,
    SceneName,
    Location,
    Composition,
    Action,
    Dialogue,
    Lighting,
    Props,
    CameraMovement,
    Atmosphere,
    SoundEffect,
    VisualPrompt,
    VideoPrompt,
    TransitionPrompt,
}

impl ShotField {
    /// Every text field, in display order.
    pub const ALL: [ShotField; 15] = [
        Self::ShotType,
        Self::Duration,
        Self::SceneName,
        Self::Location,
        Self::Composition,
        Self::Action,
        Self::Dialogue,
        Self::Lighting,
        Self::Props,
        Self::CameraMovement,
        Self::Atmosphere,
        Self::SoundEffect,
        Self::VisualPrompt,
        Self::VideoPrompt,
        Self::TransitionPrompt,
    ];

    /// The camelCase key used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShotType => "shotType",
            Self::Duration => "duration",
            Self::SceneName => "sceneName",
            Self::Location => "location",
            Self::Composition => "composition",
            Self::Action => "action",
            Self::Dialogue => "dialogue",
            Self::Lighting => "lighting",
            Self::Props => "props",
            Self::CameraMovement => "cameraMovement",
            Self::Atmosphere => "atmosphere",
            Self::SoundEffect => "soundEffect",
            Self::VisualPrompt => "visualPrompt",
            Self::VideoPrompt => "videoPrompt",
            Self::TransitionPrompt => "transitionPrompt",
        }
    }

    /// Parses a camelCase wire key.
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == key)
    }

    /// Whether visual-prompt synthesis reads this field.
    pub fn feeds_visual_prompt(self) -> bool {
        matches!(
            self,
            Self::ShotType
                | Self::Composition
                | Self::Action
                | Self::Lighting
                | Self::Props
                | Self::CameraMovement
                | Self::Atmosphere
        )
    }
}

impl std::fmt::Display for ShotField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// MODEL PAYLOADS
// =============================================================================

/// A shot as proposed by the model during storyboard generation.
///
/// Ids and shot numbers the model proposes are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratedShot {
    #[serde(deserialize_with = "lenient_string")]
    pub shot_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(deserialize_with = "lenient_string")]
    pub scene_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_string_list")]
    pub characters: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub composition: String,
    #[serde(deserialize_with = "lenient_string")]
    pub action: String,
    #[serde(deserialize_with = "lenient_string")]
    pub dialogue: String,
    #[serde(deserialize_with = "lenient_string")]
    pub lighting: String,
    #[serde(deserialize_with = "lenient_string")]
    pub props: String,
    #[serde(deserialize_with = "lenient_string")]
    pub camera_movement: String,
    #[serde(deserialize_with = "lenient_string")]
    pub atmosphere: String,
    #[serde(deserialize_with = "lenient_string")]
    pub sound_effect: String,
    #[serde(deserialize_with = "lenient_string")]
    pub visual_prompt: String,
    #[serde(deserialize_with = "lenient_string")]
    pub video_prompt: String,
    #[serde(deserialize_with = "lenient_string")]
    pub transition_prompt: String,
}

impl GeneratedShot {
    /// Converts to a shot with a fresh id. The storyboard assigns the number.
    pub fn into_shot(self) -> Shot {
        let mut shot = Shot {
            id: Uuid::new_v4().to_string(),
            shot_number: 0,
            shot_type: self.shot_type,
            duration: self.duration,
            scene_name: self.scene_name,
            location: self.location,
            characters: Vec::new(),
            composition: self.composition,
            action: self.action,
            dialogue: self.dialogue,
            lighting: self.lighting,
            props: self.props,
            camera_movement: self.camera_movement,
            atmosphere: self.atmosphere,
            sound_effect: self.sound_effect,
            visual_prompt: self.visual_prompt,
            video_prompt: self.video_prompt,
            transition_prompt: self.transition_prompt,
            is_stale: false,
        };
        shot.set_characters(self.characters);
        shot.is_stale = false;
        shot
    }
}

/// Partial update returned by single-shot regeneration. Every key the model
/// returned is applied, blank text included; absent and null keys keep the
/// shot's current value.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ShotPatch {
    #[serde(deserialize_with = "lenient_opt_string")]
    pub shot_type: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub composition: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub lighting: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub camera_movement: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub props: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub atmosphere: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub action: Option<String>,
}

impl ShotPatch {
    /// The returned (field, value) pairs.
    pub fn entries(&self) -> Vec<(ShotField, &str)> {
        [
            (ShotField::ShotType, &self.shot_type),
            (ShotField::Composition, &self.composition),
            (ShotField::Lighting, &self.lighting),
            (ShotField::CameraMovement, &self.camera_movement),
            (ShotField::Props, &self.props),
            (ShotField::Atmosphere, &self.atmosphere),
            (ShotField::Action, &self.action),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }

    /// Whether the model returned no known key.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Overwrites the returned fields on `shot`. Returns the fields that
    /// actually changed.
    pub fn apply(&self, shot: &mut Shot) -> Vec<ShotField> {
        self.entries()
            .into_iter()
            .filter(|(field, value)| shot.set_field(*field, *value))
            .map(|(field, _)| field)
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
