//! Data models for script drafts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum reply length (in characters) that counts as a script on its own.
const SCRIPT_REPLY_MIN_CHARS: usize = 200;

// =============================================================================
// SCRIPT DRAFT
// =============================================================================

/// One saved version of the free-text script.
///
/// Only `content` ever changes after creation, and it is always replaced
/// wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScriptDraft {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ScriptDraft {
    /// Creates an empty draft with a fresh id, stamped now.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Builder: Set content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Builder: Set id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Whether a chat reply should be taken as script text rather than
/// conversation: a scene marker (`场`, `INT.`, `EXT.`) or a long reply.
pub fn looks_like_script(reply: &str) -> bool {
    reply.contains('场')
        || reply.contains("INT.")
        || reply.contains("EXT.")
        || reply.chars().count() > SCRIPT_REPLY_MIN_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_new_is_empty() {
        let draft = ScriptDraft::new("Initial Draft");
        assert_eq!(draft.title, "Initial Draft");
        assert!(draft.content.is_empty());
        assert!(!draft.id.is_empty());
        assert_ne!(draft.id, ScriptDraft::new("Initial Draft").id);
    }

    #[test]
    fn test_draft_serializes_camel_case() {
        let draft = ScriptDraft::new("t").with_id("d-1").with_content("INT. KITCHEN");
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["id"], "d-1");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_looks_like_script() {
        assert!(looks_like_script("INT. KITCHEN - DAY. Mira cooks."));
        assert!(looks_like_script("EXT. ROOFTOP - NIGHT"));
        assert!(looks_like_script("第一场 厨房 日 内"));
        assert!(looks_like_script(&"a".repeat(201)));
        assert!(!looks_like_script("Do you want a happy or sad ending?"));
        // Counted in characters, not bytes.
        assert!(!looks_like_script(&"好".repeat(100)));
    }
}
