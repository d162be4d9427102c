//! Request builders for every AI action.
//!
//! Schemas use the OpenAPI subset accepted by the hosted model
//! (`"type": "ARRAY" | "OBJECT" | "STRING" | "NUMBER"`).

use serde_json::{json, Map, Value};

use crate::assets::{Asset, AssetLibrary};
use crate::generation::{ChatTurn, ImageRequest, Operation, SpeechRequest, TextRequest};
use crate::lang::TranslationDirection;
use crate::storyboard::Shot;

/// Characters of script text sent as context when regenerating one shot.
pub const SCRIPT_CONTEXT_CHARS: usize = 1000;

/// Aspect ratio of every preview frame.
pub const PREVIEW_ASPECT_RATIO: &str = "16:9";

/// Prefixed to the visual prompt when rendering a preview.
pub const PREVIEW_PREAMBLE: &str = "High-quality cinematic movie frame, professional lighting";

const SCREENWRITER_INSTRUCTION: &str = "You are a professional film and short-drama director and \
screenwriter. Turn the user's idea into a complete, properly formatted screenplay.";

const CINEMATOGRAPHER_INSTRUCTION: &str = "You are a master cinematographer and AI prompt \
engineer. Create highly descriptive, visual, and professional film-style prompts.";

const REFINE_INSTRUCTION: &str = "Refine the visual prompt based on the director's specific \
feedback while maintaining cinematic quality.";

// =============================================================================
// SCHEMA HELPERS
// =============================================================================

fn string() -> Value {
    json!({ "type": "STRING" })
}

fn array(items: Value) -> Value {
    json!({ "type": "ARRAY", "items": items })
}

fn object(properties: &[(&str, Value)]) -> Value {
    let properties: Map<String, Value> = properties
        .iter()
        .map(|(key, schema)| (key.to_string(), schema.clone()))
        .collect();
    json!({ "type": "OBJECT", "properties": properties })
}

fn shot_list_schema() -> Value {
    array(object(&[
        ("shotNumber", json!({ "type": "NUMBER" })),
        ("shotType", string()),
        ("duration", string()),
        ("sceneName", string()),
        ("location", string()),
        ("characters", array(string())),
        ("action", string()),
        ("dialogue", string()),
        ("composition", string()),
        ("lighting", string()),
        ("cameraMovement", string()),
        ("props", string()),
        ("atmosphere", string()),
        ("soundEffect", string()),
        ("visualPrompt", string()),
        ("videoPrompt", string()),
        ("transitionPrompt", string()),
    ]))
}

fn shot_patch_schema() -> Value {
    object(&[
        ("shotType", string()),
        ("composition", string()),
        ("lighting", string()),
        ("cameraMovement", string()),
        ("props", string()),
        ("atmosphere", string()),
        (
            "action",
            json!({ "type": "STRING", "description": "A more detailed, visual description of the action" }),
        ),
    ])
}

fn asset_list_schema() -> Value {
    object(&[(
        "assets",
        array(object(&[
            ("name", string()),
            (
                "type",
                json!({ "type": "STRING", "enum": ["character", "scene", "prop"] }),
            ),
            ("description", string()),
            ("prompt", string()),
        ])),
    )])
}

/// The first `max_chars` characters of `text`, on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn or_pending(value: &str) -> &str {
    if value.trim().is_empty() {
        "TBD"
    } else {
        value
    }
}

// =============================================================================
// SCRIPT
// =============================================================================

/// Continues the screenwriting conversation with `message`.
pub fn script_chat(history: &[ChatTurn], message: &str) -> TextRequest {
    TextRequest::new(Operation::ScriptChat, message)
        .with_history(history.to_vec())
        .with_system_instruction(SCREENWRITER_INSTRUCTION)
}

/// Breaks a script down into a full shot list.
pub fn storyboard(script: &str) -> TextRequest {
    let prompt = format!(
        "Break the following script down into a detailed storyboard. Every shot must include \
shot type, action, composition, lighting, camera movement, props and atmosphere.\n\nScript:\n{script}"
    );
    TextRequest::new(Operation::Storyboard, prompt).with_schema(shot_list_schema())
}

/// Extracts the characters, scenes and props of a script.
pub fn extract_assets(script: &str) -> TextRequest {
    let prompt = format!(
        "Extract the core characters, scenes and props from this script, each with a short \
description and a reusable image-generation prompt.\n\nScript:\n{script}"
    );
    TextRequest::new(Operation::ExtractAssets, prompt).with_schema(asset_list_schema())
}

// =============================================================================
// SHOTS
// =============================================================================

/// Asks for a professional rework of one shot's cinematic fields.
pub fn regenerate_shot(shot: &Shot, script: &str) -> TextRequest {
    let prompt = format!(
        "Using the script as context, polish this storyboard shot.\n\
Current shot:\n- Action: {action}\n- Shot type: {shot_type}\n\n\
Script context: {context}...\n\n\
Task: match this action with the most professional shot type, composition, lighting and \
camera movement so it reads like a feature film.",
        action = shot.action,
        shot_type = or_pending(&shot.shot_type),
        context = truncate_chars(script, SCRIPT_CONTEXT_CHARS),
    );
    TextRequest::new(Operation::RegenerateShot, prompt).with_schema(shot_patch_schema())
}

/// Fuses a shot's cinematic fields and the asset library into one
/// English image prompt.
pub fn visual_prompt(shot: &Shot, assets: &AssetLibrary) -> TextRequest {
    let characters = if shot.characters.is_empty() {
        String::new()
    } else {
        format!("- Characters: {}\n", shot.characters.join(", "))
    };
    let prompt = format!(
        "Fuse the following storyboard parameters into one extremely detailed, cinematic \
English image-generation prompt.\n\
Shot:\n\
- Shot Type: {shot_type}\n\
- Action: {action}\n\
- Composition: {composition}\n\
- Lighting: {lighting}\n\
- Movement Context: {movement}\n\
- Props: {props}\n\
- Atmosphere: {atmosphere}\n\
{characters}\n\
Asset library:\n{assets}\n\n\
Requirements:\n\
1. Include concrete camera parameters (e.g. 35mm lens, f/2.8, cinematic lighting).\n\
2. Keep it visual and faithful to the action.\n\
3. Output English only.\n\
4. No explanations.",
        shot_type = shot.shot_type,
        action = shot.action,
        composition = shot.composition,
        lighting = shot.lighting,
        movement = shot.camera_movement,
        props = shot.props,
        atmosphere = shot.atmosphere,
        assets = assets.context(),
    );
    TextRequest::new(Operation::VisualPrompt, prompt)
        .with_system_instruction(CINEMATOGRAPHER_INSTRUCTION)
}

/// Compact shot summary sent alongside a refine request.
pub fn refine_context(shot: &Shot) -> String {
    format!(
        "Action: {}, Shot: {}, Lighting: {}",
        shot.action, shot.shot_type, shot.lighting
    )
}

/// Revises a shot's visual prompt according to a director's note.
pub fn refine_visual_prompt(shot: &Shot, note: &str) -> TextRequest {
    let prompt = format!(
        "Current: {}\nDirector's Idea: {}\nContext: {}",
        shot.visual_prompt,
        note,
        refine_context(shot)
    );
    TextRequest::new(Operation::RefinePrompt, prompt).with_system_instruction(REFINE_INSTRUCTION)
}

/// Renders a preview still for a visual prompt.
pub fn preview_image(visual_prompt: &str) -> ImageRequest {
    ImageRequest {
        operation: Operation::PreviewImage,
        prompt: format!("{PREVIEW_PREAMBLE}: {visual_prompt}"),
        aspect_ratio: PREVIEW_ASPECT_RATIO.to_string(),
    }
}

/// Reads a line of dialogue aloud.
pub fn speech(text: &str, voice: Option<&str>) -> SpeechRequest {
    SpeechRequest {
        operation: Operation::Speech,
        text: text.to_string(),
        voice: voice.map(str::to_string),
    }
}

// =============================================================================
// SHARED
// =============================================================================

/// Translates `text` in the given direction.
pub fn translate(text: &str, direction: TranslationDirection) -> TextRequest {
    let prompt = format!(
        "Translate the following text into {}. Output ONLY the translated result:\n\n{}",
        direction.target_language(),
        text
    );
    TextRequest::new(Operation::Translate, prompt)
}

/// Improves an asset's image prompt.
pub fn enhance_asset_prompt(asset: &Asset) -> TextRequest {
    TextRequest::new(
        Operation::EnhanceAssetPrompt,
        format!("Enhance prompt for {}: {}", asset.kind, asset.prompt),
    )
}
