//! `Storyboard`: the ordered shot list, the shot selection, and the
//! session-only preview images keyed by shot id.
//!
//! Invariants held after every mutation:
//! - `shots[i].shot_number == i + 1`
//! - the selection is `None` iff the list is empty, otherwise it names a shot
//!   that exists
//! - every preview key names a shot that exists

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::generation::PreviewImage;
use crate::lang::Labels;
use crate::storyboard::model::{Shot, ShotField, ShotPatch};

/// Ordered collection of shots.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Storyboard {
    shots: Vec<Shot>,
    selected_shot_id: Option<String>,
    #[serde(skip)]
    previews: HashMap<String, PreviewImage>,
}

impl Storyboard {
    /// Creates an empty storyboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storyboard from `shots`, renumbered by position.
    pub fn from_shots(shots: Vec<Shot>) -> Self {
        let mut storyboard = Self::new();
        storyboard.replace_all(shots);
        storyboard
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Shots in order.
    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    /// Number of shots.
    pub fn len(&self) -> usize {
        self.shots.len()
    }

    /// Whether there are no shots.
    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    /// Gets a shot by ID.
    pub fn shot(&self, id: &str) -> Option<&Shot> {
        self.shots.iter().find(|s| s.id == id)
    }

    /// Whether a shot with this ID exists.
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// 0-based position of a shot.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.shots.iter().position(|s| s.id == id)
    }

    /// ID of the selected shot.
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_shot_id.as_deref()
    }

    /// The selected shot.
    pub fn selected(&self) -> Option<&Shot> {
        self.selected_id().and_then(|id| self.shot(id))
    }

    /// Preview image rendered for a shot, if any.
    pub fn preview(&self, id: &str) -> Option<&PreviewImage> {
        self.previews.get(id)
    }

    /// All cached previews keyed by shot id.
    pub fn previews(&self) -> &HashMap<String, PreviewImage> {
        &self.previews
    }

    // =========================================================================
    // COLLECTION OPERATIONS
    // =========================================================================

    /// Replaces every shot. Previews are dropped and the selection moves to
    /// the first shot.
    pub fn replace_all(&mut self, shots: Vec<Shot>) {
        self.shots = shots;
        self.previews.clear();
        self.selected_shot_id = None;
        self.renumber();
        self.repair_selection();
        debug!(count = self.shots.len(), "storyboard replaced");
    }

    /// Appends a seeded shot after the last one. Returns its id.
    pub fn push_seeded(&mut self, labels: &Labels) -> String {
        let shot = Shot::seeded(labels, self.shots.last());
        let id = shot.id.clone();
        self.shots.push(shot);
        self.renumber();
        self.repair_selection();
        id
    }

    /// Inserts a seeded shot directly after `after_id`, copying its scene
    /// and location. Returns `None` if `after_id` does not exist.
    pub fn insert_seeded_after(&mut self, after_id: &str, labels: &Labels) -> Option<String> {
        let index = self.position(after_id)?;
        let shot = Shot::seeded(labels, Some(&self.shots[index]));
        let id = shot.id.clone();
        self.shots.insert(index + 1, shot);
        self.renumber();
        self.repair_selection();
        Some(id)
    }

    /// Deletes a shot and renumbers the rest. A selection pointing at the
    /// removed shot moves to the first remaining shot, or clears.
    ///
    /// Returns whether a shot was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            debug!(shot_id = %id, "ignoring removal of unknown shot");
            return false;
        };
        self.shots.remove(index);
        self.previews.remove(id);
        if self.selected_shot_id.as_deref() == Some(id) {
            self.selected_shot_id = None;
        }
        self.renumber();
        self.repair_selection();
        true
    }

    /// Moves a shot to `index` (clamped to the list). Returns whether the
    /// shot exists.
    pub fn move_to(&mut self, id: &str, index: usize) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        let shot = self.shots.remove(from);
        let to = index.min(self.shots.len());
        self.shots.insert(to, shot);
        self.renumber();
        true
    }

    /// Selects a shot. Unknown ids are ignored. Returns whether the
    /// selection changed.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.contains(id) || self.selected_shot_id.as_deref() == Some(id) {
            return false;
        }
        self.selected_shot_id = Some(id.to_string());
        true
    }

    // =========================================================================
    // SHOT OPERATIONS
    // =========================================================================

    /// Replaces one text field of one shot. Returns whether anything changed.
    pub fn update_field(&mut self, id: &str, field: ShotField, value: impl Into<String>) -> bool {
        match self.shot_mut(id) {
            Some(shot) => shot.set_field(field, value),
            None => false,
        }
    }

    /// Replaces the character-name set of one shot.
    pub fn set_characters(&mut self, id: &str, names: Vec<String>) -> bool {
        match self.shot_mut(id) {
            Some(shot) => shot.set_characters(names),
            None => false,
        }
    }

    /// Merges a regeneration patch into one shot. Returns the changed fields,
    /// or `None` if the shot does not exist.
    pub fn apply_patch(&mut self, id: &str, patch: &ShotPatch) -> Option<Vec<ShotField>> {
        self.shot_mut(id).map(|shot| patch.apply(shot))
    }

    /// Caches a preview for an existing shot. Returns false if the shot is
    /// gone.
    pub fn set_preview(&mut self, id: &str, image: PreviewImage) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.previews.insert(id.to_string(), image);
        true
    }

    // =========================================================================
    // INTERNAL HELPERS
    // =========================================================================

    fn shot_mut(&mut self, id: &str) -> Option<&mut Shot> {
        self.shots.iter_mut().find(|s| s.id == id)
    }

    fn renumber(&mut self) {
        for (index, shot) in self.shots.iter_mut().enumerate() {
            shot.shot_number = index as u32 + 1;
        }
    }

    fn repair_selection(&mut self) {
        let valid = self
            .selected_shot_id
            .as_deref()
            .is_some_and(|id| self.contains(id));
        if !valid {
            self.selected_shot_id = self.shots.first().map(|s| s.id.clone());
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
