//! `Workbench`: the state container behind the whole pipeline.
//!
//! It owns the current stage, the script drafts and chat history, the
//! storyboard and the asset library. Synchronous edits apply immediately and
//! publish events. AI-assisted edits go through `begin` / `complete` so the
//! model call itself never runs while the workbench is borrowed.

use std::collections::HashMap;

use paste::paste;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::assets::{decode_generated_assets, AssetField, AssetKind, AssetLibrary};
use crate::error::{GenerationError, StudioError, StudioResult};
use crate::generation::decode::{decode_list, decode_object};
use crate::generation::{
    prompts, ChatTurn, GenerationOutput, GenerationRequest, SpeechClip, TextRequest,
};
use crate::lang::{Labels, Locale, TranslationDirection};
use crate::script::{looks_like_script, Script};
use crate::storyboard::{GeneratedShot, Shot, ShotField, ShotPatch, Storyboard};
use crate::workflow::action::{
    ActionOutcome, ActionTarget, AiAction, Begun, PendingAction, SkipReason,
};
use crate::workflow::events::{EventBus, Notice, WorkflowEvent};
use crate::workflow::stage::Stage;

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Serializable view of the whole workbench.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkbenchSnapshot {
    pub stage: Stage,
    pub locale: Locale,
    pub busy: bool,
    pub in_flight: Vec<ActionTarget>,
    pub script: Script,
    pub chat: Vec<ChatTurn>,
    pub storyboard: Storyboard,
    pub assets: AssetLibrary,
    /// Ids of shots with a cached preview.
    pub previews: Vec<String>,
}

// =============================================================================
// MACROS
// =============================================================================

/// Generates `set_shot_<field>` for each listed text field.
macro_rules! shot_field_setters {
    ($($field:ident),* $(,)?) => {
        paste! {
            $(
                #[doc = concat!("Replaces `", stringify!($field), "` on one shot.")]
                pub fn [<set_shot_ $field>](&mut self, id: &str, value: impl Into<String>) -> bool {
                    self.update_shot_field(id, ShotField::[<$field:camel>], value)
                }
            )*
        }
    };
}

// =============================================================================
// WORKBENCH
// =============================================================================

/// The pipeline's single source of truth.
#[derive(Debug)]
pub struct Workbench {
    stage: Stage,
    locale: Locale,
    script: Script,
    chat: Vec<ChatTurn>,
    storyboard: Storyboard,
    assets: AssetLibrary,
    voice: Option<String>,
    in_flight: HashMap<u64, ActionTarget>,
    next_ticket: u64,
    events: EventBus,
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbench {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Creates a workbench in the default locale with one empty draft.
    pub fn new() -> Self {
        Self::with_locale(Locale::default())
    }

    /// Creates a workbench with one empty draft titled for `locale`.
    pub fn with_locale(locale: Locale) -> Self {
        Self {
            stage: Stage::default(),
            locale,
            script: Script::new(locale.labels().initial_draft_title),
            chat: Vec::new(),
            storyboard: Storyboard::new(),
            assets: AssetLibrary::new(),
            voice: None,
            in_flight: HashMap::new(),
            next_ticket: 1,
            events: EventBus::default(),
        }
    }

    /// Builder: Set the voice used for dialogue speech.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Receives every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    /// Serializable copy of the current state.
    pub fn snapshot(&self) -> WorkbenchSnapshot {
        let mut previews: Vec<String> = self.storyboard.previews().keys().cloned().collect();
        previews.sort();
        WorkbenchSnapshot {
            stage: self.stage,
            locale: self.locale,
            busy: self.is_busy(),
            in_flight: self.in_flight(),
            script: self.script.clone(),
            chat: self.chat.clone(),
            storyboard: self.storyboard.clone(),
            assets: self.assets.clone(),
            previews,
        }
    }

    // =========================================================================
    // STAGE & LOCALE
    // =========================================================================

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Moves to any stage. Nothing is validated or destroyed.
    pub fn set_stage(&mut self, stage: Stage) {
        if self.stage == stage {
            return;
        }
        let from = self.stage;
        self.stage = stage;
        info!(from = ?from, to = ?stage, "stage changed");
        self.events.publish(WorkflowEvent::StageChanged { from, to: stage });
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Label table for the current locale.
    pub fn labels(&self) -> &'static Labels {
        self.locale.labels()
    }

    /// Switches the label table. Existing content is not touched.
    pub fn set_locale(&mut self, locale: Locale) {
        if self.locale == locale {
            return;
        }
        self.locale = locale;
        self.events.publish(WorkflowEvent::LocaleChanged { locale });
    }

    pub fn toggle_locale(&mut self) -> Locale {
        self.set_locale(self.locale.toggled());
        self.locale
    }

    // =========================================================================
    // SCRIPT
    // =========================================================================

    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Screenwriting chat turns, oldest first.
    pub fn chat_history(&self) -> &[ChatTurn] {
        &self.chat
    }

    /// Makes `id` the active draft. Unknown ids are ignored.
    pub fn select_draft(&mut self, id: &str) -> bool {
        let changed = self.script.select(id);
        if changed {
            self.publish_script_changed(id.to_string());
        }
        changed
    }

    /// Replaces the active draft's content.
    pub fn update_script(&mut self, content: impl Into<String>) {
        self.script.update_content(content);
        let id = self.script.current_draft_id().to_string();
        self.publish_script_changed(id);
    }

    /// Appends an empty draft titled "Draft N". It is not selected.
    pub fn create_draft(&mut self) -> String {
        let title = self.labels().draft_title(self.script.len() + 1);
        let id = self.script.create(title);
        self.publish_script_changed(id.clone());
        id
    }

    fn publish_script_changed(&self, draft_id: String) {
        self.events.publish(WorkflowEvent::ScriptChanged { draft_id });
    }

    // =========================================================================
    // STORYBOARD
    // =========================================================================

    pub fn storyboard(&self) -> &Storyboard {
        &self.storyboard
    }

    /// Appends a shot seeded from the last one. Returns its id.
    pub fn insert_shot(&mut self) -> String {
        let selected = self.storyboard.selected_id().map(str::to_string);
        let id = self.storyboard.push_seeded(self.locale.labels());
        debug!(shot_id = %id, "shot appended");
        self.after_shots_changed(selected);
        id
    }

    /// Inserts a shot directly after `after_id`. `None` if it does not exist.
    pub fn insert_shot_after(&mut self, after_id: &str) -> Option<String> {
        let selected = self.storyboard.selected_id().map(str::to_string);
        let id = self
            .storyboard
            .insert_seeded_after(after_id, self.locale.labels())?;
        debug!(shot_id = %id, after = %after_id, "shot inserted");
        self.after_shots_changed(selected);
        Some(id)
    }

    /// Deletes a shot, renumbers the rest and repairs the selection.
    pub fn remove_shot(&mut self, id: &str) -> bool {
        let selected = self.storyboard.selected_id().map(str::to_string);
        if !self.storyboard.remove(id) {
            return false;
        }
        debug!(shot_id = %id, remaining = self.storyboard.len(), "shot removed");
        self.after_shots_changed(selected);
        true
    }

    /// Moves a shot to `index` and renumbers.
    pub fn move_shot(&mut self, id: &str, index: usize) -> bool {
        if !self.storyboard.move_to(id, index) {
            return false;
        }
        self.events.publish(WorkflowEvent::ShotsChanged);
        true
    }

    pub fn select_shot(&mut self, id: &str) -> bool {
        let changed = self.storyboard.select(id);
        if changed {
            self.events.publish(WorkflowEvent::SelectionChanged {
                shot_id: Some(id.to_string()),
            });
        }
        changed
    }

    /// Replaces one text field of one shot.
    pub fn update_shot_field(&mut self, id: &str, field: ShotField, value: impl Into<String>) -> bool {
        let changed = self.storyboard.update_field(id, field, value);
        if changed {
            self.publish_shot_changed(id);
        }
        changed
    }

    /// Replaces the character-name set of one shot.
    pub fn set_shot_characters(&mut self, id: &str, names: Vec<String>) -> bool {
        let changed = self.storyboard.set_characters(id, names);
        if changed {
            self.publish_shot_changed(id);
        }
        changed
    }

    /// Replaces `shot_type` on one shot.
    pub fn set_shot_type(&mut self, id: &str, value: impl Into<String>) -> bool {
        self.update_shot_field(id, ShotField::ShotType, value)
    }

    shot_field_setters!(
        duration,
        scene_name,
        location,
        composition,
        action,
        dialogue,
        lighting,
        props,
        camera_movement,
        atmosphere,
        sound_effect,
        visual_prompt,
        video_prompt,
        transition_prompt,
    );

    fn after_shots_changed(&self, previous_selection: Option<String>) {
        self.events.publish(WorkflowEvent::ShotsChanged);
        let selection = self.storyboard.selected_id().map(str::to_string);
        if selection != previous_selection {
            self.events
                .publish(WorkflowEvent::SelectionChanged { shot_id: selection });
        }
    }

    fn publish_shot_changed(&self, id: &str) {
        self.events.publish(WorkflowEvent::ShotChanged {
            shot_id: id.to_string(),
        });
    }

    // =========================================================================
    // ASSETS
    // =========================================================================

    pub fn assets(&self) -> &AssetLibrary {
        &self.assets
    }

    /// Appends a blank asset with the locale's default name.
    pub fn add_asset(&mut self, kind: AssetKind) -> String {
        let id = self.assets.add(kind, self.locale.labels());
        debug!(asset_id = %id, kind = %kind, "asset added");
        self.events.publish(WorkflowEvent::AssetsChanged);
        id
    }

    /// Deletes an asset. Shots naming it are left alone.
    pub fn remove_asset(&mut self, id: &str) -> bool {
        let removed = self.assets.remove(id);
        if removed {
            debug!(asset_id = %id, "asset removed");
            self.events.publish(WorkflowEvent::AssetsChanged);
        }
        removed
    }

    pub fn update_asset_field(&mut self, id: &str, field: AssetField, value: impl Into<String>) -> bool {
        let changed = self.assets.update_field(id, field, value);
        if changed {
            self.publish_asset_changed(id);
        }
        changed
    }

    fn publish_asset_changed(&self, id: &str) {
        self.events.publish(WorkflowEvent::AssetChanged {
            asset_id: id.to_string(),
        });
    }

    // =========================================================================
    // BUSY TRACKING
    // =========================================================================

    /// Whether any AI action is outstanding.
    pub fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Whether an AI action holds `target`.
    pub fn is_target_busy(&self, target: &ActionTarget) -> bool {
        self.in_flight.values().any(|t| t == target)
    }

    /// Targets with an outstanding action, in ticket order.
    pub fn in_flight(&self) -> Vec<ActionTarget> {
        let mut tickets: Vec<(&u64, &ActionTarget)> = self.in_flight.iter().collect();
        tickets.sort_by_key(|(ticket, _)| **ticket);
        tickets.into_iter().map(|(_, target)| target.clone()).collect()
    }

    fn acquire(&mut self, target: ActionTarget) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight.insert(ticket, target.clone());
        self.events
            .publish(WorkflowEvent::BusyChanged { target, busy: true });
        ticket
    }

    fn release(&mut self, ticket: u64) -> StudioResult<ActionTarget> {
        let target = self
            .in_flight
            .remove(&ticket)
            .ok_or(StudioError::StaleTicket(ticket))?;
        self.events.publish(WorkflowEvent::BusyChanged {
            target: target.clone(),
            busy: false,
        });
        Ok(target)
    }

    // =========================================================================
    // AI ACTIONS
    // =========================================================================

    /// Starts an AI action.
    ///
    /// Returns `Busy` if another action holds the same target. Actions that
    /// need no model call (pure stage moves, blank inputs, missing targets)
    /// resolve immediately without taking a lock.
    pub fn begin(&mut self, action: AiAction) -> StudioResult<Begun> {
        let target = self.target_of(&action);
        if self.is_target_busy(&target) {
            return Err(StudioError::busy(target));
        }

        let request = match self.prepare(&action) {
            Prepared::Request(request) => request,
            Prepared::Move(next) => {
                self.set_stage(next);
                return Ok(Begun::Resolved(ActionOutcome::Applied));
            }
            Prepared::Resolved(outcome) => {
                debug!(action = ?action, outcome = ?outcome, "action resolved without a model call");
                return Ok(Begun::Resolved(outcome));
            }
        };

        if let AiAction::ChatScript { message } = &action {
            self.chat.push(ChatTurn::user(message.clone()));
        }

        let ticket = self.acquire(target.clone());
        debug!(ticket, target = %target, operation = ?request.operation(), "action started");
        Ok(Begun::Pending(PendingAction {
            ticket,
            target,
            action,
            request,
        }))
    }

    /// Finishes an action with the model's result.
    ///
    /// A result for a target that no longer exists is dropped, success or
    /// failure. Otherwise a failure mutates nothing and is returned after a
    /// notice is published, and a success applies the action's contract.
    pub fn complete(
        &mut self,
        pending: PendingAction,
        result: Result<GenerationOutput, GenerationError>,
    ) -> StudioResult<ActionOutcome> {
        let PendingAction {
            ticket,
            target,
            action,
            ..
        } = pending;
        self.release(ticket)?;

        if !self.target_exists(&target) {
            debug!(ticket, target = %target, "target vanished; discarding result");
            return Ok(ActionOutcome::Discarded);
        }

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                warn!(ticket, target = %target, error = %e, "generation failed");
                let message = format!("{}: {}", self.labels().generation_failed, e);
                self.events
                    .publish(WorkflowEvent::Notice(Notice::error(Some(target), message)));
                return Err(e.into());
            }
        };

        let outcome = self.apply(&action, &target, output)?;
        match &outcome {
            ActionOutcome::Empty => {
                warn!(ticket, target = %target, "model returned nothing usable");
                let message = self.labels().nothing_generated;
                self.events
                    .publish(WorkflowEvent::Notice(Notice::warning(Some(target), message)));
            }
            other => info!(ticket, target = %target, outcome = ?other, "action completed"),
        }
        Ok(outcome)
    }

    /// Releases an action's lock without applying anything.
    pub fn abandon(&mut self, pending: PendingAction) -> StudioResult<()> {
        let target = self.release(pending.ticket)?;
        debug!(ticket = pending.ticket, target = %target, "action abandoned");
        Ok(())
    }

    fn target_of(&self, action: &AiAction) -> ActionTarget {
        match action {
            AiAction::Advance { .. } | AiAction::ExtractAssets => ActionTarget::Workflow,
            AiAction::ChatScript { .. } => {
                ActionTarget::Draft(self.script.current_draft_id().to_string())
            }
            AiAction::RegenerateShot { shot_id }
            | AiAction::SynthesizeVisualPrompt { shot_id }
            | AiAction::RefineVisualPrompt { shot_id, .. }
            | AiAction::TranslateShotField { shot_id, .. }
            | AiAction::RenderPreview { shot_id }
            | AiAction::SpeakDialogue { shot_id } => ActionTarget::Shot(shot_id.clone()),
            AiAction::EnhanceAssetPrompt { asset_id } | AiAction::TranslateAssetPrompt { asset_id } => {
                ActionTarget::Asset(asset_id.clone())
            }
        }
    }

    fn target_exists(&self, target: &ActionTarget) -> bool {
        match target {
            ActionTarget::Workflow => true,
            ActionTarget::Draft(id) => self.script.contains(id),
            ActionTarget::Shot(id) => self.storyboard.contains(id),
            ActionTarget::Asset(id) => self.assets.contains(id),
        }
    }

    /// Validates an action and builds its request.
    fn prepare(&self, action: &AiAction) -> Prepared {
        use Prepared::Resolved;

        let content = self.script.current_draft().content.as_str();
        let needs_script = |request: fn(&str) -> TextRequest| {
            if content.trim().is_empty() {
                Resolved(ActionOutcome::skipped(SkipReason::EmptyInput))
            } else {
                Prepared::text(request(content))
            }
        };

        match action {
            AiAction::Advance { from } => match from {
                Stage::Script => needs_script(prompts::storyboard),
                Stage::Storyboard => needs_script(prompts::extract_assets),
                Stage::Assets | Stage::ImagePrompts | Stage::VideoPrompts => match from.next() {
                    Some(next) => Prepared::Move(next),
                    None => Resolved(ActionOutcome::skipped(SkipReason::FinalStage)),
                },
            },
            AiAction::ExtractAssets => needs_script(prompts::extract_assets),
            AiAction::ChatScript { message } => {
                if message.trim().is_empty() {
                    Resolved(ActionOutcome::skipped(SkipReason::EmptyInput))
                } else {
                    Prepared::text(prompts::script_chat(&self.chat, message))
                }
            }
            AiAction::RegenerateShot { shot_id } => self.with_shot(shot_id, |shot, wb| {
                Prepared::text(prompts::regenerate_shot(shot, &wb.script.current_draft().content))
            }),
            AiAction::SynthesizeVisualPrompt { shot_id } => self.with_shot(shot_id, |shot, wb| {
                Prepared::text(prompts::visual_prompt(shot, &wb.assets))
            }),
            AiAction::RefineVisualPrompt { shot_id, note } => self.with_shot(shot_id, |shot, _| {
                if note.trim().is_empty() {
                    Resolved(ActionOutcome::skipped(SkipReason::EmptyInput))
                } else {
                    Prepared::text(prompts::refine_visual_prompt(shot, note))
                }
            }),
            AiAction::TranslateShotField { shot_id, field } => {
                self.with_shot(shot_id, |shot, _| Prepared::translate(shot.field(*field)))
            }
            AiAction::RenderPreview { shot_id } => self.with_shot(shot_id, |shot, _| {
                if shot.visual_prompt.trim().is_empty() {
                    Resolved(ActionOutcome::skipped(SkipReason::EmptyInput))
                } else {
                    Prepared::Request(GenerationRequest::Image(prompts::preview_image(
                        &shot.visual_prompt,
                    )))
                }
            }),
            AiAction::SpeakDialogue { shot_id } => self.with_shot(shot_id, |shot, wb| {
                if shot.dialogue.trim().is_empty() {
                    Resolved(ActionOutcome::skipped(SkipReason::EmptyInput))
                } else {
                    Prepared::Request(GenerationRequest::Audio(prompts::speech(
                        &shot.dialogue,
                        wb.voice.as_deref(),
                    )))
                }
            }),
            AiAction::EnhanceAssetPrompt { asset_id } => match self.assets.get(asset_id) {
                None => Resolved(ActionOutcome::skipped(SkipReason::TargetMissing)),
                Some(asset) if asset.prompt.trim().is_empty() => {
                    Resolved(ActionOutcome::skipped(SkipReason::EmptyInput))
                }
                Some(asset) => Prepared::text(prompts::enhance_asset_prompt(asset)),
            },
            AiAction::TranslateAssetPrompt { asset_id } => match self.assets.get(asset_id) {
                None => Resolved(ActionOutcome::skipped(SkipReason::TargetMissing)),
                Some(asset) => Prepared::translate(&asset.prompt),
            },
        }
    }

    fn with_shot(
        &self,
        shot_id: &str,
        build: impl FnOnce(&Shot, &Self) -> Prepared,
    ) -> Prepared {
        match self.storyboard.shot(shot_id) {
            Some(shot) => build(shot, self),
            None => Prepared::Resolved(ActionOutcome::skipped(SkipReason::TargetMissing)),
        }
    }

    /// Applies a successful result according to the action's contract.
    fn apply(
        &mut self,
        action: &AiAction,
        target: &ActionTarget,
        output: GenerationOutput,
    ) -> StudioResult<ActionOutcome> {
        let outcome = match action {
            AiAction::Advance { from: Stage::Script } => {
                let shots: Vec<_> = decode_list::<GeneratedShot>(&expect_text(output)?)
                    .into_iter()
                    .map(GeneratedShot::into_shot)
                    .collect();
                if shots.is_empty() {
                    return Ok(ActionOutcome::Empty);
                }
                self.replace_storyboard(shots);
                self.set_stage(Stage::Storyboard);
                ActionOutcome::Applied
            }
            AiAction::Advance { from: Stage::Storyboard } | AiAction::ExtractAssets => {
                let assets = decode_generated_assets(&expect_text(output)?);
                if assets.is_empty() {
                    return Ok(ActionOutcome::Empty);
                }
                let count = assets.len();
                self.assets.replace_all(assets);
                self.events
                    .publish(WorkflowEvent::AssetsReplaced { asset_count: count });
                if matches!(action, AiAction::Advance { .. }) {
                    self.set_stage(Stage::Assets);
                }
                ActionOutcome::Applied
            }
            AiAction::Advance { .. } => ActionOutcome::Applied,
            AiAction::ChatScript { .. } => {
                let reply = expect_text(output)?;
                let reply = reply.trim();
                if reply.is_empty() {
                    return Ok(ActionOutcome::Empty);
                }
                self.chat.push(ChatTurn::model(reply));
                if let ActionTarget::Draft(draft_id) = target {
                    if looks_like_script(reply) && self.script.set_content(draft_id, reply) {
                        self.publish_script_changed(draft_id.clone());
                    }
                }
                ActionOutcome::Applied
            }
            AiAction::RegenerateShot { shot_id } => {
                let patch: ShotPatch = decode_object(&expect_text(output)?);
                if patch.is_empty() {
                    return Ok(ActionOutcome::Empty);
                }
                if let Some(changed) = self.storyboard.apply_patch(shot_id, &patch) {
                    debug!(shot_id = %shot_id, fields = ?changed, "shot regenerated");
                    self.publish_shot_changed(shot_id);
                }
                ActionOutcome::Applied
            }
            AiAction::SynthesizeVisualPrompt { shot_id } | AiAction::RefineVisualPrompt { shot_id, .. } => {
                self.replace_shot_text(shot_id, ShotField::VisualPrompt, output)?
            }
            AiAction::TranslateShotField { shot_id, field } => {
                self.replace_shot_text(shot_id, *field, output)?
            }
            AiAction::RenderPreview { shot_id } => match output {
                GenerationOutput::Image(Some(image)) if !image.data.is_empty() => {
                    self.storyboard.set_preview(shot_id, image);
                    self.events.publish(WorkflowEvent::PreviewReady {
                        shot_id: shot_id.clone(),
                    });
                    ActionOutcome::Applied
                }
                GenerationOutput::Image(_) => ActionOutcome::Empty,
                _ => return Err(wrong_modality("image")),
            },
            AiAction::SpeakDialogue { .. } => match output {
                GenerationOutput::Audio(Some(pcm)) if !pcm.is_empty() => ActionOutcome::Speech {
                    clip: SpeechClip::new(pcm),
                },
                GenerationOutput::Audio(_) => ActionOutcome::Empty,
                _ => return Err(wrong_modality("audio")),
            },
            AiAction::EnhanceAssetPrompt { asset_id } | AiAction::TranslateAssetPrompt { asset_id } => {
                let text = expect_text(output)?;
                let text = text.trim();
                if text.is_empty() {
                    return Ok(ActionOutcome::Empty);
                }
                self.assets.update_field(asset_id, AssetField::Prompt, text);
                self.publish_asset_changed(asset_id);
                ActionOutcome::Applied
            }
        };
        Ok(outcome)
    }

    fn replace_storyboard(&mut self, shots: Vec<Shot>) {
        let previous = self.storyboard.selected_id().map(str::to_string);
        self.storyboard.replace_all(shots);
        info!(shots = self.storyboard.len(), "storyboard replaced");
        self.events.publish(WorkflowEvent::StoryboardReplaced {
            shot_count: self.storyboard.len(),
        });
        let selection = self.storyboard.selected_id().map(str::to_string);
        if selection != previous {
            self.events
                .publish(WorkflowEvent::SelectionChanged { shot_id: selection });
        }
    }

    fn replace_shot_text(
        &mut self,
        shot_id: &str,
        field: ShotField,
        output: GenerationOutput,
    ) -> StudioResult<ActionOutcome> {
        let text = expect_text(output)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(ActionOutcome::Empty);
        }
        self.storyboard.update_field(shot_id, field, text);
        self.publish_shot_changed(shot_id);
        Ok(ActionOutcome::Applied)
    }
}

// =============================================================================
// INTERNAL HELPERS
// =============================================================================

/// What `prepare` decided.
enum Prepared {
    Request(GenerationRequest),
    /// Pure stage move, no model call.
    Move(Stage),
    Resolved(ActionOutcome),
}

impl Prepared {
    fn text(request: TextRequest) -> Self {
        Self::Request(GenerationRequest::Text(request))
    }

    /// Translation request, or a no-op for blank text.
    fn translate(text: &str) -> Self {
        match TranslationDirection::for_text(text) {
            Some(direction) => Self::text(prompts::translate(text, direction)),
            None => Self::Resolved(ActionOutcome::skipped(SkipReason::EmptyInput)),
        }
    }
}

fn expect_text(output: GenerationOutput) -> StudioResult<String> {
    match output {
        GenerationOutput::Text(text) => Ok(text),
        _ => Err(wrong_modality("text")),
    }
}

fn wrong_modality(expected: &str) -> StudioError {
    GenerationError::invalid_payload(format!("expected {expected} output")).into()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Asset;
    use crate::generation::{Operation, PreviewImage};

    const THREE_SHOTS: &str = r#"[
        {"shotNumber": 9, "shotType": "WS", "sceneName": "Kitchen", "action": "Mira enters"},
        {"shotType": "MS", "action": "Mira chops onions", "dialogue": "Almost there"},
        {"shotType": "CU", "action": "Mira tastes the soup"}
    ]"#;

    const TWO_ASSETS: &str = r#"{"assets": [
        {"name": "Mira", "type": "character", "description": "chef", "prompt": "red apron"},
        {"name": "Kitchen", "type": "scene", "description": "", "prompt": "steam"}
    ]}"#;

    fn text(reply: &str) -> Result<GenerationOutput, GenerationError> {
        Ok(GenerationOutput::Text(reply.to_string()))
    }

    fn pending(begun: Begun) -> PendingAction {
        match begun {
            Begun::Pending(pending) => pending,
            Begun::Resolved(outcome) => panic!("expected a pending action, got {outcome:?}"),
        }
    }

    fn resolved(begun: Begun) -> ActionOutcome {
        match begun {
            Begun::Resolved(outcome) => outcome,
            Begun::Pending(p) => panic!("expected a resolved action, got {:?}", p.request()),
        }
    }

    fn drain(rx: &mut broadcast::Receiver<WorkflowEvent>) -> Vec<WorkflowEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    /// A workbench already advanced to the storyboard with three shots.
    fn with_storyboard() -> Workbench {
        let mut wb = Workbench::with_locale(Locale::En);
        wb.update_script("INT. KITCHEN - DAY. Mira cooks.");
        let p = pending(wb.begin(AiAction::Advance { from: Stage::Script }).unwrap());
        wb.complete(p, text(THREE_SHOTS)).unwrap();
        wb
    }

    fn shot_id(wb: &Workbench, index: usize) -> String {
        wb.storyboard().shots()[index].id.clone()
    }

    #[test]
    fn test_initial_state() {
        let wb = Workbench::new();
        assert_eq!(wb.stage(), Stage::Script);
        assert_eq!(wb.locale(), Locale::Zh);
        assert_eq!(wb.script().len(), 1);
        assert_eq!(wb.script().current_draft().title, "初始剧本");
        assert!(wb.script().current_draft().content.is_empty());
        assert!(wb.storyboard().is_empty());
        assert!(wb.assets().is_empty());
        assert!(!wb.is_busy());
    }

    #[test]
    fn test_create_draft_is_not_selected() {
        let mut wb = Workbench::new();
        let first = wb.script().current_draft_id().to_string();
        let id = wb.create_draft();
        assert_eq!(wb.script().len(), 2);
        assert_eq!(wb.script().draft(&id).unwrap().title, "剧本 2");
        assert_eq!(wb.script().current_draft_id(), first);
        assert!(wb.select_draft(&id));
        assert!(!wb.select_draft("missing"));
        assert_eq!(wb.script().current_draft_id(), id);
    }

    #[test]
    fn test_set_stage_jumps_anywhere() {
        let mut wb = Workbench::new();
        let mut rx = wb.subscribe();
        wb.set_stage(Stage::VideoPrompts);
        assert_eq!(wb.stage(), Stage::VideoPrompts);
        assert!(wb.storyboard().is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![WorkflowEvent::StageChanged {
                from: Stage::Script,
                to: Stage::VideoPrompts
            }]
        );
    }

    #[test]
    fn test_advance_with_empty_script_is_skipped() {
        let mut wb = Workbench::new();
        wb.update_script("   ");
        let outcome = resolved(wb.begin(AiAction::Advance { from: Stage::Script }).unwrap());
        assert_eq!(outcome, ActionOutcome::skipped(SkipReason::EmptyInput));
        assert!(!wb.is_busy());
        assert_eq!(wb.stage(), Stage::Script);
    }

    #[test]
    fn test_advance_from_script_replaces_storyboard() {
        let mut wb = Workbench::with_locale(Locale::En);
        wb.update_script("INT. KITCHEN - DAY. Mira cooks.");
        let p = pending(wb.begin(AiAction::Advance { from: Stage::Script }).unwrap());
        assert_eq!(p.target(), &ActionTarget::Workflow);
        assert_eq!(p.request().operation(), Operation::Storyboard);
        assert!(wb.is_busy());

        let outcome = wb.complete(p, text(THREE_SHOTS)).unwrap();
        assert_eq!(outcome, ActionOutcome::Applied);
        assert_eq!(wb.stage(), Stage::Storyboard);
        assert!(!wb.is_busy());

        let numbers: Vec<u32> = wb.storyboard().shots().iter().map(|s| s.shot_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(wb.storyboard().selected_id(), Some(shot_id(&wb, 0).as_str()));
    }

    #[test]
    fn test_advance_failure_leaves_state_then_retry_succeeds() {
        let mut wb = with_storyboard();
        wb.set_stage(Stage::Script);
        let before = wb.snapshot();
        let mut rx = wb.subscribe();

        let p = pending(wb.begin(AiAction::Advance { from: Stage::Script }).unwrap());
        let err = wb
            .complete(p, Err(GenerationError::backend("network down")))
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(wb.snapshot(), before);
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            WorkflowEvent::Notice(n) if n.level == crate::workflow::events::NoticeLevel::Error
        )));

        let p = pending(wb.begin(AiAction::Advance { from: Stage::Script }).unwrap());
        wb.complete(p, text(r#"[{"action": "fresh"}]"#)).unwrap();
        assert_eq!(wb.stage(), Stage::Storyboard);
        assert_eq!(wb.storyboard().len(), 1);
        assert_eq!(wb.storyboard().shots()[0].action, "fresh");
    }

    #[test]
    fn test_empty_generation_is_not_applied() {
        let mut wb = with_storyboard();
        wb.set_stage(Stage::Script);
        let before = wb.snapshot();
        let mut rx = wb.subscribe();

        for reply in ["[]", "{not json", "```json\n[]\n```"] {
            let p = pending(wb.begin(AiAction::Advance { from: Stage::Script }).unwrap());
            assert_eq!(wb.complete(p, text(reply)).unwrap(), ActionOutcome::Empty);
        }
        assert_eq!(wb.snapshot(), before);
        let notices = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, WorkflowEvent::Notice(_)))
            .count();
        assert_eq!(notices, 3);
    }

    #[test]
    fn test_advance_from_storyboard_extracts_assets() {
        let mut wb = with_storyboard();
        let p = pending(wb.begin(AiAction::Advance { from: Stage::Storyboard }).unwrap());
        assert_eq!(p.request().operation(), Operation::ExtractAssets);
        wb.complete(p, text(TWO_ASSETS)).unwrap();
        assert_eq!(wb.stage(), Stage::Assets);
        assert_eq!(wb.assets().len(), 2);
    }

    #[test]
    fn test_pure_stage_moves() {
        let mut wb = Workbench::new();
        wb.set_stage(Stage::Assets);
        let outcome = resolved(wb.begin(AiAction::Advance { from: Stage::Assets }).unwrap());
        assert_eq!(outcome, ActionOutcome::Applied);
        assert_eq!(wb.stage(), Stage::ImagePrompts);
        resolved(wb.begin(AiAction::Advance { from: Stage::ImagePrompts }).unwrap());
        assert_eq!(wb.stage(), Stage::VideoPrompts);
        let outcome = resolved(wb.begin(AiAction::Advance { from: Stage::VideoPrompts }).unwrap());
        assert_eq!(outcome, ActionOutcome::skipped(SkipReason::FinalStage));
        assert!(!wb.is_busy());
    }

    #[test]
    fn test_extracting_twice_discards_first_result() {
        let mut wb = with_storyboard();
        let p = pending(wb.begin(AiAction::ExtractAssets).unwrap());
        wb.complete(p, text(TWO_ASSETS)).unwrap();
        let first_ids: Vec<String> = wb.assets().assets().iter().map(|a| a.id.clone()).collect();

        let p = pending(wb.begin(AiAction::ExtractAssets).unwrap());
        wb.complete(
            p,
            text(r#"{"assets": [{"name": "Pot", "type": "prop", "prompt": "copper"}]}"#),
        )
        .unwrap();

        assert_eq!(wb.assets().len(), 1);
        assert_eq!(wb.assets().assets()[0].name, "Pot");
        assert!(first_ids.iter().all(|id| !wb.assets().contains(id)));
        assert_eq!(wb.stage(), Stage::Storyboard, "extraction alone does not move");
    }

    #[test]
    fn test_same_target_is_busy_other_targets_are_not() {
        let mut wb = with_storyboard();
        let first = shot_id(&wb, 0);
        let second = shot_id(&wb, 1);

        let held = pending(
            wb.begin(AiAction::SynthesizeVisualPrompt {
                shot_id: first.clone(),
            })
            .unwrap(),
        );
        let err = wb
            .begin(AiAction::TranslateShotField {
                shot_id: first.clone(),
                field: ShotField::Action,
            })
            .unwrap_err();
        assert!(matches!(err, StudioError::Busy { target } if target == ActionTarget::Shot(first.clone())));

        let other = pending(
            wb.begin(AiAction::RegenerateShot {
                shot_id: second.clone(),
            })
            .unwrap(),
        );
        // Plain edits are never blocked.
        assert!(wb.set_shot_dialogue(&first, "Wait!"));
        assert_eq!(wb.in_flight().len(), 2);

        wb.abandon(held).unwrap();
        wb.abandon(other).unwrap();
        assert!(!wb.is_busy());
        assert!(wb
            .begin(AiAction::SynthesizeVisualPrompt { shot_id: first })
            .is_ok());
    }

    #[test]
    fn test_workflow_actions_are_exclusive() {
        let mut wb = with_storyboard();
        let held = pending(wb.begin(AiAction::Advance { from: Stage::Storyboard }).unwrap());

        let again = wb.begin(AiAction::Advance { from: Stage::Storyboard }).unwrap_err();
        assert!(matches!(again, StudioError::Busy { target } if target == ActionTarget::Workflow));
        let extract = wb.begin(AiAction::ExtractAssets).unwrap_err();
        assert!(matches!(extract, StudioError::Busy { target } if target == ActionTarget::Workflow));
        assert_eq!(wb.in_flight(), vec![ActionTarget::Workflow]);

        // Shot-level work is not blocked by a workflow action.
        let first = shot_id(&wb, 0);
        let shot = pending(wb.begin(AiAction::RegenerateShot { shot_id: first }).unwrap());
        wb.abandon(shot).unwrap();

        assert_eq!(wb.complete(held, text(TWO_ASSETS)).unwrap(), ActionOutcome::Applied);
        assert_eq!(wb.stage(), Stage::Assets);
        assert!(wb.begin(AiAction::ExtractAssets).is_ok());
    }

    #[test]
    fn test_asset_actions_are_exclusive_per_asset() {
        let mut wb = Workbench::with_locale(Locale::En);
        let mira = wb.add_asset(AssetKind::Character);
        let kitchen = wb.add_asset(AssetKind::Scene);
        wb.update_asset_field(&mira, AssetField::Prompt, "young chef");
        wb.update_asset_field(&kitchen, AssetField::Prompt, "steamy kitchen");

        let held = pending(wb.begin(AiAction::EnhanceAssetPrompt { asset_id: mira.clone() }).unwrap());
        let err = wb
            .begin(AiAction::TranslateAssetPrompt { asset_id: mira.clone() })
            .unwrap_err();
        assert!(matches!(err, StudioError::Busy { target } if target == ActionTarget::Asset(mira.clone())));

        let other = pending(wb.begin(AiAction::TranslateAssetPrompt { asset_id: kitchen }).unwrap());
        wb.abandon(other).unwrap();
        wb.abandon(held).unwrap();
        assert!(wb.begin(AiAction::TranslateAssetPrompt { asset_id: mira }).is_ok());
    }

    #[test]
    fn test_late_completion_after_delete_is_discarded() {
        let mut wb = with_storyboard();
        let doomed = shot_id(&wb, 1);
        let p = pending(
            wb.begin(AiAction::SynthesizeVisualPrompt {
                shot_id: doomed.clone(),
            })
            .unwrap(),
        );
        assert!(wb.remove_shot(&doomed));
        let before = wb.snapshot();

        let outcome = wb.complete(p, text("35mm, steam")).unwrap();
        assert_eq!(outcome, ActionOutcome::Discarded);
        assert!(!wb.is_busy());
        assert_eq!(wb.snapshot().storyboard, before.storyboard);

        let p = pending(
            wb.begin(AiAction::SynthesizeVisualPrompt {
                shot_id: shot_id(&wb, 0),
            })
            .unwrap(),
        );
        wb.remove_shot(&shot_id(&wb, 0));
        let outcome = wb.complete(p, Err(GenerationError::backend("late"))).unwrap();
        assert_eq!(outcome, ActionOutcome::Discarded);
    }

    #[test]
    fn test_unknown_ticket_is_stale() {
        let mut wb = with_storyboard();
        let forged = PendingAction {
            ticket: 999,
            target: ActionTarget::Workflow,
            action: AiAction::ExtractAssets,
            request: GenerationRequest::Text(prompts::extract_assets("x")),
        };
        assert!(matches!(
            wb.complete(forged, text(TWO_ASSETS)),
            Err(StudioError::StaleTicket(999))
        ));
        assert!(wb.assets().is_empty());
    }

    #[test]
    fn test_action_on_missing_target_is_skipped() {
        let mut wb = with_storyboard();
        let outcome = resolved(
            wb.begin(AiAction::RegenerateShot {
                shot_id: "missing".into(),
            })
            .unwrap(),
        );
        assert_eq!(outcome, ActionOutcome::skipped(SkipReason::TargetMissing));
        let outcome = resolved(
            wb.begin(AiAction::EnhanceAssetPrompt {
                asset_id: "missing".into(),
            })
            .unwrap(),
        );
        assert_eq!(outcome, ActionOutcome::skipped(SkipReason::TargetMissing));
    }

    #[test]
    fn test_regenerate_patches_only_returned_fields() {
        let mut wb = with_storyboard();
        let id = shot_id(&wb, 1);
        wb.set_shot_duration(&id, "3s");
        wb.set_shot_visual_prompt(&id, "medium shot, onions");

        let p = pending(wb.begin(AiAction::RegenerateShot { shot_id: id.clone() }).unwrap());
        let outcome = wb
            .complete(p, text(r#"{"shotType": "CU", "action": "Tears as Mira chops"}"#))
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Applied);

        let shot = wb.storyboard().shot(&id).unwrap();
        assert_eq!(shot.shot_type, "CU");
        assert_eq!(shot.action, "Tears as Mira chops");
        assert_eq!(shot.dialogue, "Almost there");
        assert_eq!(shot.duration, "3s");
        assert!(shot.is_stale);

        let p = pending(wb.begin(AiAction::SynthesizeVisualPrompt { shot_id: id.clone() }).unwrap());
        wb.complete(p, text("  close-up, tears, 85mm  ")).unwrap();
        let shot = wb.storyboard().shot(&id).unwrap();
        assert_eq!(shot.visual_prompt, "close-up, tears, 85mm");
        assert!(!shot.is_stale);
    }

    #[test]
    fn test_translate_routes_by_cjk_and_skips_blank() {
        let mut wb = with_storyboard();
        let id = shot_id(&wb, 0);

        let outcome = resolved(
            wb.begin(AiAction::TranslateShotField {
                shot_id: id.clone(),
                field: ShotField::VideoPrompt,
            })
            .unwrap(),
        );
        assert_eq!(outcome, ActionOutcome::skipped(SkipReason::EmptyInput));

        wb.set_shot_video_prompt(&id, "slow dolly in");
        let p = pending(
            wb.begin(AiAction::TranslateShotField {
                shot_id: id.clone(),
                field: ShotField::VideoPrompt,
            })
            .unwrap(),
        );
        let GenerationRequest::Text(request) = p.request() else {
            panic!("translation is a text request");
        };
        assert!(request.prompt.contains("into Simplified Chinese"));
        wb.complete(p, text("缓慢推镜")).unwrap();
        assert_eq!(wb.storyboard().shot(&id).unwrap().video_prompt, "缓慢推镜");

        let p = pending(
            wb.begin(AiAction::TranslateShotField {
                shot_id: id,
                field: ShotField::VideoPrompt,
            })
            .unwrap(),
        );
        let GenerationRequest::Text(request) = p.request() else {
            panic!("translation is a text request");
        };
        assert!(request.prompt.contains("into English"));
    }

    #[test]
    fn test_refine_needs_a_note() {
        let mut wb = with_storyboard();
        let id = shot_id(&wb, 0);
        let outcome = resolved(
            wb.begin(AiAction::RefineVisualPrompt {
                shot_id: id.clone(),
                note: " ".into(),
            })
            .unwrap(),
        );
        assert_eq!(outcome, ActionOutcome::skipped(SkipReason::EmptyInput));

        let p = pending(
            wb.begin(AiAction::RefineVisualPrompt {
                shot_id: id.clone(),
                note: "more rain".into(),
            })
            .unwrap(),
        );
        wb.complete(p, text("rain-soaked window, 35mm")).unwrap();
        assert_eq!(
            wb.storyboard().shot(&id).unwrap().visual_prompt,
            "rain-soaked window, 35mm"
        );
    }

    #[test]
    fn test_preview_lifecycle() {
        let mut wb = with_storyboard();
        let id = shot_id(&wb, 0);
        let outcome = resolved(wb.begin(AiAction::RenderPreview { shot_id: id.clone() }).unwrap());
        assert_eq!(outcome, ActionOutcome::skipped(SkipReason::EmptyInput));

        wb.set_shot_visual_prompt(&id, "wide, dusk");
        let p = pending(wb.begin(AiAction::RenderPreview { shot_id: id.clone() }).unwrap());
        let GenerationRequest::Image(request) = p.request() else {
            panic!("previews are image requests");
        };
        assert!(request.prompt.ends_with(": wide, dusk"));
        let image = PreviewImage::new("image/png", vec![1, 2, 3]);
        let outcome = wb.complete(p, Ok(GenerationOutput::Image(Some(image)))).unwrap();
        assert_eq!(outcome, ActionOutcome::Applied);
        assert!(wb.storyboard().preview(&id).is_some());
        assert_eq!(wb.snapshot().previews, vec![id.clone()]);

        let p = pending(wb.begin(AiAction::RenderPreview { shot_id: id.clone() }).unwrap());
        let outcome = wb.complete(p, Ok(GenerationOutput::Image(None))).unwrap();
        assert_eq!(outcome, ActionOutcome::Empty);
        assert!(wb.storyboard().preview(&id).is_some(), "old preview kept");

        wb.remove_shot(&id);
        assert!(wb.snapshot().previews.is_empty());
    }

    #[test]
    fn test_speak_dialogue_returns_clip() {
        let mut wb = with_storyboard().with_voice("Kore");
        let silent = shot_id(&wb, 0);
        let talking = shot_id(&wb, 1);

        let outcome = resolved(wb.begin(AiAction::SpeakDialogue { shot_id: silent }).unwrap());
        assert_eq!(outcome, ActionOutcome::skipped(SkipReason::EmptyInput));

        let p = pending(wb.begin(AiAction::SpeakDialogue { shot_id: talking }).unwrap());
        let GenerationRequest::Audio(request) = p.request() else {
            panic!("speech is an audio request");
        };
        assert_eq!(request.text, "Almost there");
        assert_eq!(request.voice.as_deref(), Some("Kore"));

        let outcome = wb
            .complete(p, Ok(GenerationOutput::Audio(Some(vec![0; 4800]))))
            .unwrap();
        let ActionOutcome::Speech { clip } = outcome else {
            panic!("expected speech");
        };
        assert_eq!(clip.sample_count(), 2400);
    }

    #[test]
    fn test_wrong_output_modality_is_an_error() {
        let mut wb = with_storyboard();
        let p = pending(
            wb.begin(AiAction::SynthesizeVisualPrompt {
                shot_id: shot_id(&wb, 0),
            })
            .unwrap(),
        );
        assert!(wb.complete(p, Ok(GenerationOutput::Image(None))).is_err());
        assert!(!wb.is_busy());
    }

    #[test]
    fn test_chat_writes_to_draft_active_at_send() {
        let mut wb = Workbench::with_locale(Locale::En);
        let original = wb.script().current_draft_id().to_string();
        let p = pending(
            wb.begin(AiAction::ChatScript {
                message: "A chef story".into(),
            })
            .unwrap(),
        );
        assert_eq!(wb.chat_history().len(), 1);

        let other = wb.create_draft();
        wb.select_draft(&other);

        let reply = "INT. KITCHEN - DAY\nMira cooks.";
        assert_eq!(wb.complete(p, text(reply)).unwrap(), ActionOutcome::Applied);
        assert_eq!(wb.script().draft(&original).unwrap().content, reply);
        assert!(wb.script().draft(&other).unwrap().content.is_empty());
        assert_eq!(wb.chat_history().len(), 2);
        assert_eq!(wb.chat_history()[1], ChatTurn::model(reply));
    }

    #[test]
    fn test_chat_small_talk_does_not_touch_draft() {
        let mut wb = Workbench::with_locale(Locale::En);
        wb.update_script("kept");
        let p = pending(wb.begin(AiAction::ChatScript { message: "hi".into() }).unwrap());
        wb.complete(p, text("Hello! What story shall we write?")).unwrap();
        assert_eq!(wb.script().current_draft().content, "kept");

        let outcome = resolved(wb.begin(AiAction::ChatScript { message: "  ".into() }).unwrap());
        assert_eq!(outcome, ActionOutcome::skipped(SkipReason::EmptyInput));
        assert_eq!(wb.chat_history().len(), 2);
    }

    #[test]
    fn test_chat_failure_keeps_user_turn_only() {
        let mut wb = Workbench::new();
        let p = pending(wb.begin(AiAction::ChatScript { message: "idea".into() }).unwrap());
        assert!(wb.complete(p, Err(GenerationError::api(500, "oops"))).is_err());
        assert_eq!(wb.chat_history(), &[ChatTurn::user("idea")]);
    }

    #[test]
    fn test_asset_actions() {
        let mut wb = Workbench::with_locale(Locale::En);
        let id = wb.add_asset(AssetKind::Character);
        assert_eq!(wb.assets().get(&id).unwrap().name, "New Character");

        let outcome = resolved(wb.begin(AiAction::EnhanceAssetPrompt { asset_id: id.clone() }).unwrap());
        assert_eq!(outcome, ActionOutcome::skipped(SkipReason::EmptyInput));

        wb.update_asset_field(&id, AssetField::Prompt, "young chef");
        let p = pending(wb.begin(AiAction::EnhanceAssetPrompt { asset_id: id.clone() }).unwrap());
        wb.complete(p, text("young chef, red apron, soft key light")).unwrap();
        assert_eq!(
            wb.assets().get(&id).unwrap().prompt,
            "young chef, red apron, soft key light"
        );

        let p = pending(wb.begin(AiAction::TranslateAssetPrompt { asset_id: id.clone() }).unwrap());
        wb.remove_asset(&id);
        assert_eq!(
            wb.complete(p, text("年轻厨师")).unwrap(),
            ActionOutcome::Discarded
        );
    }

    #[test]
    fn test_removing_asset_leaves_shot_names() {
        let mut wb = with_storyboard();
        let shot = shot_id(&wb, 0);
        let p = pending(wb.begin(AiAction::ExtractAssets).unwrap());
        wb.complete(p, text(TWO_ASSETS)).unwrap();
        wb.set_shot_characters(&shot, vec!["Mira".into()]);

        let mira: Asset = wb.assets().assets()[0].clone();
        wb.remove_asset(&mira.id);
        assert_eq!(wb.storyboard().shot(&shot).unwrap().characters, vec!["Mira"]);
    }

    #[test]
    fn test_shot_list_events_and_selection() {
        let mut wb = with_storyboard();
        let first = shot_id(&wb, 0);
        let mut rx = wb.subscribe();

        assert!(wb.remove_shot(&first));
        let events = drain(&mut rx);
        assert_eq!(events[0], WorkflowEvent::ShotsChanged);
        assert_eq!(
            events[1],
            WorkflowEvent::SelectionChanged {
                shot_id: Some(shot_id(&wb, 0))
            }
        );

        let appended = wb.insert_shot();
        assert_eq!(wb.storyboard().shot(&appended).unwrap().shot_number, 3);
        assert_eq!(wb.storyboard().shot(&appended).unwrap().scene_name, "New Scene");
        let after = wb.insert_shot_after(&shot_id(&wb, 0)).unwrap();
        assert_eq!(wb.storyboard().position(&after), Some(1));
        assert!(wb.move_shot(&appended, 0));
        assert_eq!(wb.storyboard().shots()[0].shot_number, 1);

        for id in wb.storyboard().shots().iter().map(|s| s.id.clone()).collect::<Vec<_>>() {
            wb.remove_shot(&id);
        }
        assert_eq!(wb.storyboard().selected_id(), None);
    }

    #[test]
    fn test_generated_field_setters() {
        let mut wb = with_storyboard();
        let id = shot_id(&wb, 0);
        assert!(wb.set_shot_type(&id, "ECU"));
        assert!(wb.set_shot_camera_movement(&id, "Handheld"));
        assert!(wb.set_shot_transition_prompt(&id, "Match cut to steam"));
        assert!(!wb.set_shot_sound_effect("missing", "sizzle"));
        let shot = wb.storyboard().shot(&id).unwrap();
        assert_eq!(shot.shot_type, "ECU");
        assert_eq!(shot.camera_movement, "Handheld");
        assert_eq!(shot.transition_prompt, "Match cut to steam");
    }

    #[test]
    fn test_clearing_staleness_is_published() {
        let mut wb = with_storyboard();
        let id = shot_id(&wb, 0);
        wb.set_shot_visual_prompt(&id, "35mm, steam");
        wb.set_shot_lighting(&id, "Hard noon sun");
        assert!(wb.storyboard().shot(&id).unwrap().is_stale);

        let mut rx = wb.subscribe();
        assert!(wb.set_shot_visual_prompt(&id, "35mm, steam"));
        assert!(!wb.storyboard().shot(&id).unwrap().is_stale);
        assert_eq!(drain(&mut rx), vec![WorkflowEvent::ShotChanged { shot_id: id.clone() }]);

        assert!(!wb.set_shot_visual_prompt(&id, "35mm, steam"));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_locale_switch_only_changes_labels() {
        let mut wb = with_storyboard();
        let before = wb.snapshot();
        assert_eq!(wb.toggle_locale(), Locale::Zh);
        assert_eq!(wb.labels().stage_script, "剧本创作");
        assert_eq!(wb.snapshot().storyboard, before.storyboard);
        assert_eq!(wb.snapshot().script, before.script);
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let wb = with_storyboard();
        let json = serde_json::to_value(wb.snapshot()).unwrap();
        assert_eq!(json["stage"], "STORYBOARD");
        assert_eq!(json["locale"], "en");
        assert_eq!(json["busy"], false);
        assert_eq!(json["storyboard"]["shots"][2]["shotNumber"], 3);
        assert!(json["script"]["currentDraftId"].is_string());
    }
}
