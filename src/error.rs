//! Error types for the workbench and the generation boundary.

use thiserror::Error;

use crate::workflow::ActionTarget;

/// Result type alias for workbench operations.
pub type StudioResult<T> = Result<T, StudioError>;

/// Result type alias for calls across the generation boundary.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Errors surfaced by workbench operations.
///
/// None of these leave a collection partially mutated: every mutation either
/// applies as a single replace of the affected entity or not at all.
#[derive(Error, Debug)]
pub enum StudioError {
    /// The model call behind an AI action failed. Prior state is untouched.
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Another AI action already holds the target.
    #[error("{target} already has an action in progress")]
    Busy { target: ActionTarget },

    /// A completion arrived for a ticket the workbench is not tracking.
    #[error("Stale ticket: {0}")]
    StaleTicket(u64),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StudioError {
    /// Creates a Busy error.
    pub fn busy(target: ActionTarget) -> Self {
        Self::Busy { target }
    }

    /// Creates a Serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Whether retrying the same action later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Generation(_) | Self::Busy { .. })
    }
}

/// Failures of the external model service.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Transport failure.
    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// No API key was configured.
    #[error("Missing API key")]
    MissingApiKey,

    /// A binary payload could not be decoded.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Any other backend failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl GenerationError {
    /// Creates an Api error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates an InvalidPayload error.
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    /// Creates a Backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
