//! AI-assisted actions and their two-phase lifecycle.
//!
//! `Workbench::begin` turns an [`AiAction`] into a [`PendingAction`] holding
//! the boundary request and a lock on its [`ActionTarget`]. The caller runs
//! the request however it likes and hands the result to
//! `Workbench::complete`, which applies it and reports an [`ActionOutcome`].

use serde::{Deserialize, Serialize};

use crate::generation::{GenerationRequest, SpeechClip};
use crate::storyboard::ShotField;
use crate::workflow::stage::Stage;

/// The entity an action locks. At most one action per target is
/// outstanding at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ActionTarget {
    /// Stage transitions and whole-collection regeneration.
    Workflow,
    Draft(String),
    Shot(String),
    Asset(String),
}

impl std::fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Workflow => f.write_str("workflow"),
            Self::Draft(id) => write!(f, "draft {id}"),
            Self::Shot(id) => write!(f, "shot {id}"),
            Self::Asset(id) => write!(f, "asset {id}"),
        }
    }
}

/// An AI-assisted mutation and the contract it applies on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AiAction {
    /// From Script: replace the storyboard with shots generated from the
    /// active draft, then move to Storyboard. From Storyboard: replace the
    /// asset library with assets extracted from the active draft, then move
    /// to Assets. From Assets or ImagePrompts: pure stage move.
    Advance { from: Stage },
    /// Replace the asset library from the active draft. No stage move.
    ExtractAssets,
    /// Continue the screenwriting chat. A script-like reply replaces the
    /// content of the draft that was active when the message was sent.
    #[serde(rename_all = "camelCase")]
    ChatScript { message: String },
    /// Patch the returned cinematic fields of one shot.
    #[serde(rename_all = "camelCase")]
    RegenerateShot { shot_id: String },
    /// Replace `visualPrompt` with one synthesized from the shot and the
    /// asset library.
    #[serde(rename_all = "camelCase")]
    SynthesizeVisualPrompt { shot_id: String },
    /// Replace `visualPrompt` with a revision following a director's note.
    #[serde(rename_all = "camelCase")]
    RefineVisualPrompt { shot_id: String, note: String },
    /// Replace one shot field with its translation.
    #[serde(rename_all = "camelCase")]
    TranslateShotField { shot_id: String, field: ShotField },
    /// Cache a preview still for the shot's visual prompt.
    #[serde(rename_all = "camelCase")]
    RenderPreview { shot_id: String },
    /// Read the shot's dialogue aloud. Nothing is stored.
    #[serde(rename_all = "camelCase")]
    SpeakDialogue { shot_id: String },
    /// Replace an asset's prompt with an enhanced one.
    #[serde(rename_all = "camelCase")]
    EnhanceAssetPrompt { asset_id: String },
    /// Replace an asset's prompt with its translation.
    #[serde(rename_all = "camelCase")]
    TranslateAssetPrompt { asset_id: String },
}

/// Why an action resolved without calling the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The text the action works from is blank.
    EmptyInput,
    /// The target shot or asset does not exist.
    TargetMissing,
    /// There is no stage after VideoPrompts.
    FinalStage,
}

/// How an action ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ActionOutcome {
    /// State was mutated according to the action's contract.
    Applied,
    /// Synthesized dialogue, handed back to the caller.
    Speech { clip: SpeechClip },
    /// The model returned nothing usable. State is unchanged.
    Empty,
    /// Resolved without calling the model.
    Skipped { reason: SkipReason },
    /// The target vanished while the call was in flight. The result was
    /// dropped.
    Discarded,
}

impl ActionOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied | Self::Speech { .. })
    }
}

/// An action that holds its target's lock and awaits a model result.
///
/// Not `Clone`: each pending action is completed or abandoned exactly once.
#[derive(Debug)]
pub struct PendingAction {
    pub(crate) ticket: u64,
    pub(crate) target: ActionTarget,
    pub(crate) action: AiAction,
    pub(crate) request: GenerationRequest,
}

impl PendingAction {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn target(&self) -> &ActionTarget {
        &self.target
    }

    pub fn action(&self) -> &AiAction {
        &self.action
    }

    /// The request to send across the generation boundary.
    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }
}

/// Result of `Workbench::begin`.
#[derive(Debug)]
pub enum Begun {
    /// The model must be called; complete or abandon the action afterwards.
    Pending(PendingAction),
    /// Finished synchronously; no lock is held.
    Resolved(ActionOutcome),
}
