//! Binary payloads returned by image and speech generation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, GenerationResult};

/// Sample rate of the speech model's PCM output.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

// =============================================================================
// IMAGES
// =============================================================================

/// A generated still, held in memory for the session only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewImage {
    pub mime_type: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl PreviewImage {
    /// Creates an image from raw bytes.
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Decodes a base64 payload as returned on the wire.
    pub fn from_base64(mime_type: impl Into<String>, encoded: &str) -> GenerationResult<Self> {
        Ok(Self::new(mime_type, decode_base64(encoded)?))
    }

    /// `data:` URL suitable for an `<img src>`.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

// =============================================================================
// SPEECH
// =============================================================================

/// Synthesized speech: mono 16-bit little-endian PCM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechClip {
    pub sample_rate: u32,
    #[serde(with = "base64_bytes")]
    pub pcm: Vec<u8>,
}

impl SpeechClip {
    /// Wraps raw PCM bytes at the speech model's sample rate.
    pub fn new(pcm: Vec<u8>) -> Self {
        Self {
            sample_rate: SPEECH_SAMPLE_RATE,
            pcm,
        }
    }

    /// Samples normalized to [-1.0, 1.0). A trailing odd byte is ignored.
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.pcm
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
    }

    /// Number of whole samples.
    pub fn sample_count(&self) -> usize {
        self.pcm.len() / 2
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.sample_count() as f64 / self.sample_rate as f64
    }
}

/// Decodes standard base64, mapping failures to `InvalidPayload`.
pub fn decode_base64(encoded: &str) -> GenerationResult<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| GenerationError::invalid_payload(e.to_string()))
}

/// Decodes a payload that may be absent. `None` stays `None`; a corrupt
/// payload is an error, never silently dropped.
pub fn decode_optional_base64(encoded: Option<&str>) -> GenerationResult<Option<Vec<u8>>> {
    encoded.map(decode_base64).transpose()
}

/// Serializes byte buffers as base64 strings so snapshots stay JSON-friendly.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
