//! The `Script` aggregate: an unordered set of drafts with exactly one active.
//!
//! The draft list is never empty. It is seeded with one draft at construction
//! and no operation removes drafts, so the invariant holds by construction.

use serde::Serialize;
use tracing::debug;

use crate::script::model::ScriptDraft;

/// Collection of script drafts plus the id of the active one.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    current_draft_id: String,
    drafts: Vec<ScriptDraft>,
}

impl Script {
    /// Creates a script holding a single empty draft, which is active.
    pub fn new(initial_title: impl Into<String>) -> Self {
        Self::from_draft(ScriptDraft::new(initial_title))
    }

    /// Creates a script whose only draft is `draft`.
    pub fn from_draft(draft: ScriptDraft) -> Self {
        Self {
            current_draft_id: draft.id.clone(),
            drafts: vec![draft],
        }
    }

    /// All drafts in creation order.
    pub fn drafts(&self) -> &[ScriptDraft] {
        &self.drafts
    }

    /// Number of drafts (always at least one).
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Gets a draft by ID.
    pub fn draft(&self, id: &str) -> Option<&ScriptDraft> {
        self.drafts.iter().find(|d| d.id == id)
    }

    /// Whether a draft with this ID exists.
    pub fn contains(&self, id: &str) -> bool {
        self.draft(id).is_some()
    }

    /// The active draft. Falls back to the first draft if the stored id no
    /// longer resolves.
    pub fn current_draft(&self) -> &ScriptDraft {
        self.draft(&self.current_draft_id)
            .unwrap_or(&self.drafts[0])
    }

    /// ID of the active draft, resolved the same way as `current_draft`.
    pub fn current_draft_id(&self) -> &str {
        &self.current_draft().id
    }

    /// Makes `id` the active draft. Unknown ids are ignored.
    ///
    /// Returns whether the selection changed.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            debug!(draft_id = %id, "ignoring selection of unknown draft");
            return false;
        }
        if self.current_draft_id == id {
            return false;
        }
        self.current_draft_id = id.to_string();
        true
    }

    /// Replaces the content of the active draft. Other drafts are untouched.
    pub fn update_content(&mut self, content: impl Into<String>) {
        let id = self.current_draft_id().to_string();
        self.set_content(&id, content);
    }

    /// Replaces the content of a specific draft.
    ///
    /// Returns false if the draft does not exist.
    pub fn set_content(&mut self, id: &str, content: impl Into<String>) -> bool {
        match self.drafts.iter_mut().find(|d| d.id == id) {
            Some(draft) => {
                draft.content = content.into();
                true
            }
            None => false,
        }
    }

    /// Appends a new empty draft without selecting it. Returns its id.
    pub fn create(&mut self, title: impl Into<String>) -> String {
        let draft = ScriptDraft::new(title);
        let id = draft.id.clone();
        self.drafts.push(draft);
        id
    }
}
