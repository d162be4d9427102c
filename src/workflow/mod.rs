//! Workflow orchestration: the stage machine, AI-assisted actions and the
//! change feed.
//!
//! [`Workbench`] owns all session state and is driven synchronously;
//! [`Studio`] shares one across tasks and runs actions against a
//! [`GenerationBackend`](crate::generation::GenerationBackend).

pub mod action;
pub mod events;
pub mod manager;
pub mod stage;
pub mod studio;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use action::{ActionOutcome, ActionTarget, AiAction, Begun, PendingAction, SkipReason};
pub use events::{EventBus, Notice, NoticeLevel, WorkflowEvent};
pub use manager::{Workbench, WorkbenchSnapshot};
pub use stage::Stage;
pub use studio::Studio;

#[cfg(feature = "wasm")]
pub use wasm::JsWorkbench;
