//! Language helpers: the CJK heuristic behind every translate action, and the
//! two fixed label tables used for static UI strings and seeded defaults.

use serde::{Deserialize, Serialize};

/// Returns true if `text` contains any character from the CJK Unified
/// Ideographs block (U+4E00..=U+9FFF).
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4E00}'..='\u{9FFF}').contains(&c))
}

/// Target of a translate action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TranslationDirection {
    ToEnglish,
    ToChinese,
}

impl TranslationDirection {
    /// Picks the direction for `text`: text that currently reads as Chinese
    /// goes to English, anything else goes to Chinese. Blank text yields
    /// `None` and must not reach the model.
    pub fn for_text(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            None
        } else if contains_cjk(text) {
            Some(Self::ToEnglish)
        } else {
            Some(Self::ToChinese)
        }
    }

    /// Human-readable name of the target language, used inside prompts.
    pub fn target_language(self) -> &'static str {
        match self {
            Self::ToEnglish => "English",
            Self::ToChinese => "Simplified Chinese",
        }
    }
}

/// UI locale. Selects the label table only; generated content language is
/// controlled per field by [`TranslationDirection`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

impl Locale {
    /// The other locale.
    pub fn toggled(self) -> Self {
        match self {
            Self::Zh => Self::En,
            Self::En => Self::Zh,
        }
    }

    /// Static label table for this locale.
    pub fn labels(self) -> &'static Labels {
        match self {
            Self::Zh => &ZH,
            Self::En => &EN,
        }
    }
}

/// Fixed string table for one locale.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Labels {
    pub stage_script: &'static str,
    pub stage_storyboard: &'static str,
    pub stage_assets: &'static str,
    pub stage_image_prompts: &'static str,
    pub stage_video_prompts: &'static str,

    pub initial_draft_title: &'static str,
    pub draft_title_prefix: &'static str,

    pub new_character: &'static str,
    pub new_scene: &'static str,
    pub new_prop: &'static str,

    pub default_scene_name: &'static str,
    pub default_location: &'static str,
    pub default_shot_type: &'static str,
    pub default_duration: &'static str,
    pub default_composition: &'static str,
    pub default_action: &'static str,
    pub default_lighting: &'static str,
    pub default_camera_movement: &'static str,
    pub default_atmosphere: &'static str,

    pub empty_storyboard: &'static str,
    pub empty_assets: &'static str,
    pub no_dialogue: &'static str,
    pub processing: &'static str,
    pub generation_failed: &'static str,
    pub nothing_generated: &'static str,
}

impl Labels {
    /// Title for the `n`th draft.
    pub fn draft_title(&self, n: usize) -> String {
        format!("{} {}", self.draft_title_prefix, n)
    }
}

static ZH: Labels = Labels {
    stage_script: "剧本创作",
    stage_storyboard: "分镜脚本",
    stage_assets: "角色资产",
    stage_image_prompts: "分镜出图",
    stage_video_prompts: "视频制作",

    initial_draft_title: "初始剧本",
    draft_title_prefix: "剧本",

    new_character: "新角色",
    new_scene: "新场景",
    new_prop: "新道具",

    default_scene_name: "新场景",
    default_location: "室内",
    default_shot_type: "MCU",
    default_duration: "2s",
    default_composition: "中央构图",
    default_action: "新镜头动作描述...",
    default_lighting: "自然光",
    default_camera_movement: "静态",
    default_atmosphere: "写实",

    empty_storyboard: "暂无分镜，请先从剧本生成",
    empty_assets: "资产库为空",
    no_dialogue: "（本镜头无对白）",
    processing: "处理中...",
    generation_failed: "生成失败，请重试",
    nothing_generated: "AI 未返回任何内容",
};

static EN: Labels = Labels {
    stage_script: "Script",
    stage_storyboard: "Storyboard",
    stage_assets: "Assets",
    stage_image_prompts: "Image Concept",
    stage_video_prompts: "Video Prod",

    initial_draft_title: "Initial Draft",
    draft_title_prefix: "Draft",

    new_character: "New Character",
    new_scene: "New Scene",
    new_prop: "New Prop",

    default_scene_name: "New Scene",
    default_location: "Interior",
    default_shot_type: "MCU",
    default_duration: "2s",
    default_composition: "Centered",
    default_action: "Describe the new shot...",
    default_lighting: "Natural light",
    default_camera_movement: "Static",
    default_atmosphere: "Realistic",

    empty_storyboard: "No shots yet. Generate them from the script first.",
    empty_assets: "The asset library is empty",
    no_dialogue: "(No dialogue in this shot)",
    processing: "Processing...",
    generation_failed: "Generation failed, please retry",
    nothing_generated: "The model returned nothing",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_cjk() {
        assert!(contains_cjk("一个男人"));
        assert!(contains_cjk("close-up of 米拉"));
        assert!(!contains_cjk("a wide shot at dusk"));
        assert!(!contains_cjk(""));
        // Hiragana and Hangul are outside the ideograph block.
        assert!(!contains_cjk("ひらがな"));
        assert!(!contains_cjk("한국어"));
    }

    #[test]
    fn test_direction_routes_by_content() {
        assert_eq!(
            TranslationDirection::for_text("Mira stirs the pot"),
            Some(TranslationDirection::ToChinese)
        );
        assert_eq!(
            TranslationDirection::for_text("米拉在搅拌锅"),
            Some(TranslationDirection::ToEnglish)
        );
        assert_eq!(
            TranslationDirection::for_text("35mm lens, 雨夜"),
            Some(TranslationDirection::ToEnglish)
        );
    }

    #[test]
    fn test_direction_blank_is_noop() {
        assert_eq!(TranslationDirection::for_text(""), None);
        assert_eq!(TranslationDirection::for_text("  \n"), None);
    }

    #[test]
    fn test_locale_toggle_and_labels() {
        assert_eq!(Locale::default(), Locale::Zh);
        assert_eq!(Locale::Zh.toggled(), Locale::En);
        assert_eq!(Locale::En.toggled().toggled(), Locale::En);
        assert_eq!(Locale::En.labels().stage_script, "Script");
        assert_eq!(Locale::En.labels().draft_title(3), "Draft 3");
        assert_eq!(Locale::Zh.labels().draft_title(2), "剧本 2");
    }
}
