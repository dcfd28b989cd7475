//! Feature configuration
//!
//! A flat mapping of named flags read from the external settings store. Keys
//! use the store's camelCase names so exported settings decode unchanged.
//! Unknown keys are kept in [`FeatureConfig::extra`] so modules registered by
//! third parties can still be gated by name. The store also holds non-flag
//! values (`theme`, `kbModifier`, `customCSS`, ...); those are kept verbatim
//! and never read as flags.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::errors::ConfigError;

/// Rules used by the post filter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterRules {
    /// Title keywords (case-insensitive substring match)
    pub keywords: Vec<String>,
    /// Link domains (substring match)
    pub domains: Vec<String>,
    /// Communities (case-insensitive exact match)
    pub subreddits: Vec<String>,
    /// Authors (case-insensitive exact match)
    pub users: Vec<String>,
    /// Flair text (case-insensitive substring match)
    pub flairs: Vec<String>,
    /// Hide posts marked NSFW
    pub hide_nsfw: bool,
}

impl FilterRules {
    /// Whether no rule is configured
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
            && self.domains.is_empty()
            && self.subreddits.is_empty()
            && self.users.is_empty()
            && self.flairs.is_empty()
            && !self.hide_nsfw
    }
}

/// Feature flags and tuning knobs for the enrichment pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureConfig {
    /// Infinite pagination
    pub never_ending_reddit: bool,
    /// Pause pagination after this many pages (0 = never)
    pub ner_pause_after_pages: u32,
    /// Minimum spacing between scroll-triggered checks
    pub ner_scroll_interval_ms: u64,
    /// Load the next page when closer than this to the bottom
    pub ner_distance_threshold: u32,

    /// Per-comment and page-wide collapse controls
    pub collapse_child_comments: bool,
    /// Hide all child comments after the first pass
    pub collapse_child_comments_default: bool,
    /// Controls on nested comments too, not only top-level ones
    pub collapse_child_comments_nested: bool,
    /// "Hide all" also collapses every nested comment with children
    pub collapse_child_comments_hide_nested: bool,

    /// Post filtering
    pub post_filtering: bool,
    /// Rules used by the post filter
    pub filters: FilterRules,
    /// Promoted-content suppression
    pub ad_blocker: bool,
    /// Comment depth attributes
    pub comment_depth_indicators: bool,
    /// Collapse comments from moderation bots
    pub hide_auto_moderator: bool,
    /// Inline "continue this thread" expansion
    pub expand_continue_thread: bool,

    /// Delay between the first full pass and the safety guard
    pub safety_guard_delay_ms: u64,
    /// Stylesheet-hidden share of items treated as a safety violation
    pub safety_hidden_ratio: f64,

    /// Settings not known to this crate, flags and otherwise
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            never_ending_reddit: true,
            ner_pause_after_pages: 0,
            ner_scroll_interval_ms: 300,
            ner_distance_threshold: 1000,
            collapse_child_comments: true,
            collapse_child_comments_default: false,
            collapse_child_comments_nested: false,
            collapse_child_comments_hide_nested: false,
            post_filtering: true,
            filters: FilterRules::default(),
            ad_blocker: false,
            comment_depth_indicators: true,
            hide_auto_moderator: true,
            expand_continue_thread: true,
            safety_guard_delay_ms: 1000,
            safety_hidden_ratio: 0.9,
            extra: BTreeMap::new(),
        }
    }
}

impl FeatureConfig {
    /// Decode TOML settings
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validated()
    }

    /// Decode JSON settings (the settings-export format)
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&self.safety_hidden_ratio) || self.safety_hidden_ratio == 0.0 {
            return Err(ConfigError::Invalid {
                key: "safetyHiddenRatio".to_string(),
                message: format!("must be in (0, 1], got {}", self.safety_hidden_ratio),
            });
        }
        Ok(self)
    }

    /// Resolve a boolean flag by its external key.
    ///
    /// Unknown keys, and unknown keys holding anything but `true`, resolve to
    /// `false`.
    pub fn flag(&self, key: &str) -> bool {
        match key {
            "neverEndingReddit" => self.never_ending_reddit,
            "collapseChildComments" => self.collapse_child_comments,
            "collapseChildCommentsDefault" => self.collapse_child_comments_default,
            "collapseChildCommentsNested" => self.collapse_child_comments_nested,
            "collapseChildCommentsHideNested" => self.collapse_child_comments_hide_nested,
            "postFiltering" => self.post_filtering,
            "adBlocker" => self.ad_blocker,
            "commentDepthIndicators" => self.comment_depth_indicators,
            "hideAutoModerator" => self.hide_auto_moderator,
            "expandContinueThread" => self.expand_continue_thread,
            other => matches!(self.extra.get(other), Some(Value::Bool(true))),
        }
    }

    /// Set a flag by its external key; unknown keys land in `extra`
    pub fn set_flag(&mut self, key: &str, value: bool) {
        match key {
            "neverEndingReddit" => self.never_ending_reddit = value,
            "collapseChildComments" => self.collapse_child_comments = value,
            "collapseChildCommentsDefault" => self.collapse_child_comments_default = value,
            "collapseChildCommentsNested" => self.collapse_child_comments_nested = value,
            "collapseChildCommentsHideNested" => self.collapse_child_comments_hide_nested = value,
            "postFiltering" => self.post_filtering = value,
            "adBlocker" => self.ad_blocker = value,
            "commentDepthIndicators" => self.comment_depth_indicators = value,
            "hideAutoModerator" => self.hide_auto_moderator = value,
            "expandContinueThread" => self.expand_continue_thread = value,
            other => {
                self.extra.insert(other.to_string(), Value::Bool(value));
            }
        }
    }

    /// Builder-style [`FeatureConfig::set_flag`]
    pub fn with_flag(mut self, key: &str, value: bool) -> Self {
        self.set_flag(key, value);
        self
    }

    /// Scroll observer spacing
    pub fn scroll_interval(&self) -> Duration {
        Duration::from_millis(self.ner_scroll_interval_ms)
    }

    /// Safety guard delay
    pub fn safety_guard_delay(&self) -> Duration {
        Duration::from_millis(self.safety_guard_delay_ms)
    }
}
