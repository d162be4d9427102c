//! Script drafts.
//!
//! - `model`: `ScriptDraft` and the script-detection heuristic used by chat
//! - `manager`: `Script`, the draft collection with its one active draft

pub mod manager;
pub mod model;

pub use manager::Script;
pub use model::*;
