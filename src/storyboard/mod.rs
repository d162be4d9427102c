//! Storyboard module: the ordered shot list.
//!
//! This module provides:
//! - `model`: `Shot`, `ShotField`, and the model payloads `GeneratedShot` / `ShotPatch`
//! - `manager`: `Storyboard` with insert/remove/reorder, selection and previews

pub mod manager;
pub mod model;

pub use manager::Storyboard;
pub use model::*;
