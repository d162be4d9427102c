//! The five linear workflow stages.

use serde::{Deserialize, Serialize};

use crate::lang::Labels;

/// Workflow stage. Order is fixed; moving between stages never destroys
/// data and any stage may be navigated to directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Script,
    Storyboard,
    Assets,
    ImagePrompts,
    VideoPrompts,
}

impl Stage {
    /// Every stage, in workflow order.
    pub const ALL: [Stage; 5] = [
        Self::Script,
        Self::Storyboard,
        Self::Assets,
        Self::ImagePrompts,
        Self::VideoPrompts,
    ];

    /// 0-based position in the workflow.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The following stage, or `None` from the last one.
    pub fn next(self) -> Option<Stage> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Display label in the given table.
    pub fn label(self, labels: &Labels) -> &'static str {
        match self {
            Self::Script => labels.stage_script,
            Self::Storyboard => labels.stage_storyboard,
            Self::Assets => labels.stage_assets,
            Self::ImagePrompts => labels.stage_image_prompts,
            Self::VideoPrompts => labels.stage_video_prompts,
        }
    }
}
