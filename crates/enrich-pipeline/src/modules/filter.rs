//! Post filtering by title keyword, domain, community, flair, author and NSFW
//! flag.
//!
//! A keyword written as `/pattern/` is a case-insensitive regular expression;
//! any other keyword is a case-insensitive substring.

use enrich_core::{attrs, ContentTree, Display, FeatureConfig, FilterRules, NodeId, NodeKind};

use regex::{Regex, RegexBuilder};

use crate::errors::ModuleError;
use crate::module::EnrichmentModule;
use crate::registry::ModuleId;

/// Hides matching posts inline and tags them with [`attrs::HIDDEN_MARKER`].
#[derive(Debug, Clone, Default)]
pub struct FilterModule {
    rules: FilterRules,
    keywords: Vec<Keyword>,
}

#[derive(Debug, Clone)]
enum Keyword {
    Substring(String),
    Pattern(Regex),
}

impl Keyword {
    /// `None` for blank keywords and patterns that do not compile
    fn compile(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        let Some(pattern) = raw
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        else {
            return Some(Self::Substring(raw.to_lowercase()));
        };
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(regex) => Some(Self::Pattern(regex)),
            Err(error) => {
                tracing::warn!(keyword = raw, error = %error, "Ignoring invalid keyword pattern");
                None
            }
        }
    }

    fn matches(&self, title: &str) -> bool {
        match self {
            Self::Substring(needle) => title.to_lowercase().contains(needle.as_str()),
            Self::Pattern(regex) => regex.is_match(title),
        }
    }
}

impl FilterModule {
    /// Module identifier
    pub const ID: ModuleId = ModuleId::new("filter");

    /// Create a filter with explicit rules
    pub fn new(rules: FilterRules) -> Self {
        let keywords = rules
            .keywords
            .iter()
            .map(String::as_str)
            .filter_map(Keyword::compile)
            .collect();
        Self { rules, keywords }
    }

    /// Active rules
    pub fn rules(&self) -> &FilterRules {
        &self.rules
    }

    /// Name of the first rule the post matches, if any
    pub fn matching_rule(&self, tree: &dyn ContentTree, node: NodeId) -> Option<&'static str> {
        let rules = &self.rules;
        let attr = |key| tree.get_attribute(node, key);

        if rules.hide_nsfw && attr(attrs::NSFW) == Some("true") {
            return Some("nsfw");
        }
        if let Some(title) = attr(attrs::TITLE) {
            if self.keywords.iter().any(|kw| kw.matches(title)) {
                return Some("keyword");
            }
        }
        if let Some(domain) = attr(attrs::DOMAIN) {
            if rules.domains.iter().any(|d| !d.is_empty() && domain.contains(d.as_str())) {
                return Some("domain");
            }
        }
        if let Some(subreddit) = attr(attrs::SUBREDDIT) {
            if rules.subreddits.iter().any(|s| s.eq_ignore_ascii_case(subreddit)) {
                return Some("subreddit");
            }
        }
        if let Some(flair) = attr(attrs::FLAIR) {
            let flair = flair.to_lowercase();
            if rules
                .flairs
                .iter()
                .any(|f| !f.is_empty() && flair.contains(&f.to_lowercase()))
            {
                return Some("flair");
            }
        }
        if let Some(author) = attr(attrs::AUTHOR) {
            if rules.users.iter().any(|u| u.eq_ignore_ascii_case(author)) {
                return Some("user");
            }
        }
        None
    }
}

impl EnrichmentModule for FilterModule {
    fn id(&self) -> ModuleId {
        Self::ID
    }

    fn feature(&self) -> &'static str {
        "postFiltering"
    }

    fn configure(&mut self, config: &FeatureConfig) {
        *self = Self::new(config.filters.clone());
    }

    fn process(&mut self, tree: &mut dyn ContentTree, node: NodeId) -> Result<(), ModuleError> {
        if tree.kind(node) != Some(NodeKind::Post) || self.rules.is_empty() {
            return Ok(());
        }
        if let Some(rule) = self.matching_rule(&*tree, node) {
            tracing::debug!(node = ?node, rule, "Filtering post");
            tree.set_inline_display(node, Display::None)?;
            tree.set_attribute(node, attrs::HIDDEN_MARKER, "1")?;
        }
        Ok(())
    }
}
