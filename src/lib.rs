//! Cine Workbench - film pre-production from script to per-shot prompts.
//!
//! The workbench carries one project through four authoring stages, each
//! assisted by a generative model:
//!
//! - **Script**: drafts written by hand or through a screenwriting chat
//! - **Storyboard**: an ordered, densely numbered list of shots
//! - **Assets**: characters, scenes and props extracted from the script
//! - **Image / video prompts**: per-shot visual prompts, previews and dialogue audio
//!
//! All model calls cross one boundary, [`GenerationBackend`]. Enable the
//! `gemini` feature for the hosted HTTP backend, or script replies with
//! [`StubBackend`] for offline use.
//!
//! # Example
//!
//! ```rust
//! use cine_workbench::generation::Operation;
//! use cine_workbench::{ActionOutcome, Stage, StubBackend, Studio};
//!
//! # tokio_test_block(async {
//! let backend = StubBackend::new()
//!     .with_text(Operation::Storyboard, r#"[{"action": "A gull lands."}]"#);
//! let studio = Studio::with_backend(backend);
//!
//! // Synchronous edits go straight to the workbench.
//! studio.workbench().await.update_script("EXT. HARBOR - DAWN");
//!
//! // AI actions run through the backend and apply on success.
//! assert_eq!(studio.advance().await.unwrap(), ActionOutcome::Applied);
//! let snapshot = studio.snapshot().await;
//! assert_eq!(snapshot.stage, Stage::Storyboard);
//! assert_eq!(snapshot.storyboard.shots()[0].shot_number, 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod assets;
pub mod error;
pub mod generation;
pub mod lang;
pub mod script;
pub mod storyboard;
pub mod workflow;

// Re-exports for convenience
pub use assets::{Asset, AssetKind, AssetLibrary};
pub use error::{GenerationError, GenerationResult, StudioError, StudioResult};
pub use generation::{GenerationBackend, GenerationOutput, GenerationRequest, StubBackend};
pub use lang::Locale;
pub use script::{Script, ScriptDraft};
pub use storyboard::{Shot, ShotField, Storyboard};
pub use workflow::{
    ActionOutcome, ActionTarget, AiAction, Begun, EventBus, Notice, PendingAction, Stage, Studio,
    Workbench, WorkbenchSnapshot, WorkflowEvent,
};

#[cfg(feature = "gemini")]
pub use generation::{GeminiBackend, GeminiConfig};

#[cfg(feature = "wasm")]
pub use workflow::JsWorkbench;
