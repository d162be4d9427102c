//! HTTP backend for the hosted Gemini `generateContent` API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GenerationError, GenerationResult};
use crate::generation::media::decode_base64;
use crate::generation::{
    ChatRole, GenerationBackend, ImageRequest, Operation, PreviewImage, SpeechRequest, TextRequest,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Kore";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// CONFIG
// =============================================================================

/// Connection settings for [`GeminiBackend`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub speech_model: String,
    pub voice: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Creates a config with default models and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads `GEMINI_API_KEY` (or `API_KEY`) plus the optional
    /// `GEMINI_BASE_URL` and `GEMINI_*_MODEL` overrides.
    pub fn from_env() -> GenerationResult<Self> {
        let api_key = env_var("GEMINI_API_KEY")
            .or_else(|| env_var("API_KEY"))
            .ok_or(GenerationError::MissingApiKey)?;
        let mut config = Self::new(api_key);
        if let Some(url) = env_var("GEMINI_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(model) = env_var("GEMINI_TEXT_MODEL") {
            config.text_model = model;
        }
        if let Some(model) = env_var("GEMINI_IMAGE_MODEL") {
            config.image_model = model;
        }
        if let Some(model) = env_var("GEMINI_SPEECH_MODEL") {
            config.speech_model = model;
        }
        Ok(config)
    }

    /// Builder: Set base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: Set text model.
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    /// Builder: Set image model.
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Builder: Set speech model.
    pub fn with_speech_model(mut self, model: impl Into<String>) -> Self {
        self.speech_model = model.into();
        self
    }

    /// Builder: Set default voice.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Builder: Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.into()),
                inline_data: None,
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    /// All text parts of the first candidate, concatenated.
    fn text(&self) -> String {
        self.parts().filter_map(|p| p.text.as_deref()).collect()
    }

    /// The first inline binary part of the first candidate.
    fn inline_data(&self) -> Option<&InlineData> {
        self.parts().find_map(|p| p.inline_data.as_ref())
    }
}

fn text_body(request: &TextRequest) -> GenerateContentRequest {
    let mut contents: Vec<Content> = request
        .history
        .iter()
        .map(|turn| {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Model => "model",
            };
            Content::text(Some(role), turn.text.clone())
        })
        .collect();
    contents.push(Content::text(Some("user"), request.prompt.clone()));

    let generation_config = request.response_schema.as_ref().map(|schema| GenerationConfig {
        response_mime_type: Some("application/json".to_string()),
        response_schema: Some(schema.clone()),
        ..Default::default()
    });

    GenerateContentRequest {
        contents,
        system_instruction: request
            .system_instruction
            .as_ref()
            .map(|s| Content::text(None, s.clone())),
        generation_config,
    }
}

fn image_body(request: &ImageRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::text(None, request.prompt.clone())],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            image_config: Some(serde_json::json!({ "aspectRatio": request.aspect_ratio })),
            ..Default::default()
        }),
    }
}

fn speech_body(request: &SpeechRequest, voice: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::text(None, request.text.clone())],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_modalities: Some(vec!["AUDIO".to_string()]),
            speech_config: Some(serde_json::json!({
                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
            })),
            ..Default::default()
        }),
    }
}

// =============================================================================
// BACKEND
// =============================================================================

/// [`GenerationBackend`] backed by the Gemini REST API.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Creates a backend. Fails if the API key is empty or not a valid
    /// header value.
    pub fn new(config: GeminiConfig) -> GenerationResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }
        let mut headers = header::HeaderMap::new();
        let mut key = header::HeaderValue::from_str(&config.api_key)
            .map_err(|e| GenerationError::backend(format!("invalid API key: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// Creates a backend from environment variables.
    pub fn from_env() -> GenerationResult<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// POST {base}/models/{model}:generateContent
    async fn generate_content(
        &self,
        model: &str,
        operation: Operation,
        body: &GenerateContentRequest,
    ) -> GenerationResult<GenerateContentResponse> {
        let url = format!("{}/models/{}:generateContent", self.config.base_url, model);
        debug!(model, ?operation, "sending generateContent");
        let resp = self.client.post(&url).json(body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            warn!(model, ?operation, status, "generateContent failed");
            return Err(GenerationError::Api { status, message });
        }

        resp.json().await.map_err(Into::into)
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_text(&self, request: &TextRequest) -> GenerationResult<String> {
        let response = self
            .generate_content(&self.config.text_model, request.operation, &text_body(request))
            .await?;
        Ok(response.text())
    }

    async fn generate_image(&self, request: &ImageRequest) -> GenerationResult<Option<PreviewImage>> {
        let response = self
            .generate_content(&self.config.image_model, request.operation, &image_body(request))
            .await?;
        response
            .inline_data()
            .map(|inline| {
                let mime = if inline.mime_type.is_empty() {
                    "image/png"
                } else {
                    inline.mime_type.as_str()
                };
                PreviewImage::from_base64(mime, &inline.data)
            })
            .transpose()
    }

    async fn generate_speech(&self, request: &SpeechRequest) -> GenerationResult<Option<Vec<u8>>> {
        let voice = request.voice.as_deref().unwrap_or(&self.config.voice);
        let response = self
            .generate_content(
                &self.config.speech_model,
                request.operation,
                &speech_body(request, voice),
            )
            .await?;
        response
            .inline_data()
            .map(|inline| decode_base64(&inline.data))
            .transpose()
    }
}
