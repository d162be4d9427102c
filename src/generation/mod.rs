//! The generation boundary: a stateless request/response adapter to the
//! external model service.
//!
//! - `decode`: defensive parsing of structured (JSON) replies
//! - `media`: image and speech payloads
//! - `prompts`: request builders for every AI action in the workbench
//! - `stub`: scripted in-memory backend for tests and offline demos
//! - `gemini`: HTTP backend for the hosted Gemini API (feature `gemini`)

pub mod decode;
pub mod media;
pub mod prompts;
pub mod stub;

#[cfg(feature = "gemini")]
pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GenerationResult;

pub use media::{PreviewImage, SpeechClip};
pub use stub::StubBackend;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiBackend, GeminiConfig};

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// What a request is for. Carried on the wire so backends and logs can tell
/// calls apart; it never changes how a request is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    ScriptChat,
    Storyboard,
    RegenerateShot,
    VisualPrompt,
    RefinePrompt,
    Translate,
    EnhanceAssetPrompt,
    ExtractAssets,
    PreviewImage,
    Speech,
}

/// Output modality of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
}

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of a multi-turn conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    /// A user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    /// A model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Text generation, optionally constrained to a JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRequest {
    pub operation: Operation,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl TextRequest {
    /// Creates a plain text request.
    pub fn new(operation: Operation, prompt: impl Into<String>) -> Self {
        Self {
            operation,
            prompt: prompt.into(),
            history: Vec::new(),
            system_instruction: None,
            response_schema: None,
        }
    }

    /// Builder: Set system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Builder: Require JSON output matching `schema`.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Builder: Set prior conversation turns.
    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    /// Whether the reply is expected to be JSON.
    pub fn is_structured(&self) -> bool {
        self.response_schema.is_some()
    }
}

/// Image generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub operation: Operation,
    pub prompt: String,
    pub aspect_ratio: String,
}

/// Speech synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    pub operation: Operation,
    pub text: String,
    /// Prebuilt voice name; the backend's default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// Any request the workbench can send across the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modality", rename_all = "lowercase")]
pub enum GenerationRequest {
    Text(TextRequest),
    Image(ImageRequest),
    Audio(SpeechRequest),
}

impl GenerationRequest {
    /// The operation this request performs.
    pub fn operation(&self) -> Operation {
        match self {
            Self::Text(r) => r.operation,
            Self::Image(r) => r.operation,
            Self::Audio(r) => r.operation,
        }
    }

    /// The requested output modality.
    pub fn modality(&self) -> Modality {
        match self {
            Self::Text(_) => Modality::Text,
            Self::Image(_) => Modality::Image,
            Self::Audio(_) => Modality::Audio,
        }
    }
}

/// A successful boundary reply. `None` payloads mean the model produced
/// nothing, which callers treat as an empty result rather than a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutput {
    Text(String),
    Image(Option<PreviewImage>),
    Audio(Option<Vec<u8>>),
}

// =============================================================================
// BACKEND TRAIT
// =============================================================================

/// The external model service. Calls are independent and stateless, and any
/// of them may fail.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Generates text (JSON text when the request carries a schema).
    async fn generate_text(&self, request: &TextRequest) -> GenerationResult<String>;

    /// Generates an image.
    async fn generate_image(&self, request: &ImageRequest) -> GenerationResult<Option<PreviewImage>>;

    /// Synthesizes speech as raw PCM.
    async fn generate_speech(&self, request: &SpeechRequest) -> GenerationResult<Option<Vec<u8>>>;

    /// Routes a request to the method for its modality.
    async fn execute(&self, request: &GenerationRequest) -> GenerationResult<GenerationOutput> {
        match request {
            GenerationRequest::Text(r) => self.generate_text(r).await.map(GenerationOutput::Text),
            GenerationRequest::Image(r) => self.generate_image(r).await.map(GenerationOutput::Image),
            GenerationRequest::Audio(r) => self.generate_speech(r).await.map(GenerationOutput::Audio),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_request_builder() {
        let request = TextRequest::new(Operation::Storyboard, "break this down")
            .with_system_instruction("You are a director.")
            .with_schema(serde_json::json!({ "type": "ARRAY" }));
        assert!(request.is_structured());
        assert_eq!(request.system_instruction.as_deref(), Some("You are a director."));
    }

    #[test]
    fn test_request_wire_shape() {
        let request = GenerationRequest::Text(TextRequest::new(Operation::Translate, "hello"));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["modality"], "text");
        assert_eq!(json["operation"], "translate");
        assert_eq!(json["prompt"], "hello");
        assert!(json.get("responseSchema").is_none());
        assert!(json.get("history").is_none());

        let request = GenerationRequest::Image(ImageRequest {
            operation: Operation::PreviewImage,
            prompt: "frame".into(),
            aspect_ratio: "16:9".into(),
        });
        assert_eq!(request.modality(), Modality::Image);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["aspectRatio"], "16:9");
    }

    #[test]
    fn test_chat_turn_constructors() {
        assert_eq!(ChatTurn::user("hi").role, ChatRole::User);
        assert_eq!(ChatTurn::model("hello").role, ChatRole::Model);
    }
}
