//! Asset library: characters, scenes and props extracted from the script.

pub mod manager;
pub mod model;

pub use manager::AssetLibrary;
pub use model::*;
