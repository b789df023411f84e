use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PRIORITY: i64 = 50;
pub const MIN_PRIORITY: i64 = 0;
pub const MAX_PRIORITY: i64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum FilterAction {
    /// Remove matching fields.
    Delete,
    /// Remove every field of the target.
    DeleteAll,
    /// Restore matching fields (only narrows output after a delete rule).
    Keep,
    /// Leave the whole target as it is.
    KeepAll,
}

impl FilterAction {
    /// Global actions act on the whole collection and ignore `match_value`.
    pub fn is_global(self) -> bool {
        matches!(self, FilterAction::DeleteAll | FilterAction::KeepAll)
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterAction::Delete => "delete",
            FilterAction::DeleteAll => "delete_all",
            FilterAction::Keep => "keep",
            FilterAction::KeepAll => "keep_all",
        }
    }
}

impl fmt::Display for FilterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum FilterTarget {
    Headers,
    QueryParams,
    FormData,
    JsonBody,
}

impl FilterTarget {
    /// Every target, in the order the engine processes them.
    pub const ALL: [FilterTarget; 4] = [
        FilterTarget::Headers,
        FilterTarget::QueryParams,
        FilterTarget::FormData,
        FilterTarget::JsonBody,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterTarget::Headers => "headers",
            FilterTarget::QueryParams => "query_params",
            FilterTarget::FormData => "form_data",
            FilterTarget::JsonBody => "json_body",
        }
    }
}

impl fmt::Display for FilterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-sensitive equality.
    Exact,
    Contains,
    StartsWith,
    EndsWith,
    /// Case-insensitive regular expression.
    Regex,
}

impl MatchMode {
    pub fn label(self) -> &'static str {
        match self {
            MatchMode::Exact => "exact",
            MatchMode::Contains => "contains",
            MatchMode::StartsWith => "starts_with",
            MatchMode::EndsWith => "ends_with",
            MatchMode::Regex => "regex",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A stored filter rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRule {
    pub id: String,
    pub name: String,
    pub action: FilterAction,
    pub target: FilterTarget,
    pub match_mode: MatchMode,
    /// Ignored for global actions.
    #[serde(default)]
    pub match_value: String,
    /// Higher runs first; valid range is 0..=100.
    pub priority: i64,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilterRule {
    /// Replace the authored fields with `draft`, keeping id and creation time.
    pub fn apply_draft(&mut self, draft: RuleDraft) {
        self.name = draft.name;
        self.action = draft.action;
        self.target = draft.target;
        self.match_mode = draft.match_mode;
        self.match_value = draft.match_value;
        self.priority = draft.priority;
        self.enabled = draft.enabled;
        self.description = draft.description;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Short human label used in validation messages.
    pub fn display_name(&self) -> String {
        format!("\"{}\" ({})", self.name, self.id)
    }
}

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

fn default_enabled() -> bool {
    true
}

/// A rule without its runtime identity: what users author and what export files carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDraft {
    pub name: String,
    pub action: FilterAction,
    pub target: FilterTarget,
    pub match_mode: MatchMode,
    #[serde(default)]
    pub match_value: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RuleDraft {
    pub fn new(
        name: impl Into<String>,
        action: FilterAction,
        target: FilterTarget,
        match_mode: MatchMode,
        match_value: impl Into<String>,
        priority: i64,
    ) -> Self {
        Self {
            name: name.into(),
            action,
            target,
            match_mode,
            match_value: match_value.into(),
            priority,
            enabled: true,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Give the draft a fresh id and timestamps.
    pub fn into_rule(self) -> FilterRule {
        let now = Utc::now();
        FilterRule {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            action: self.action,
            target: self.target,
            match_mode: self.match_mode,
            match_value: self.match_value,
            priority: self.priority,
            enabled: self.enabled,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&FilterRule> for RuleDraft {
    fn from(rule: &FilterRule) -> Self {
        Self {
            name: rule.name.clone(),
            action: rule.action,
            target: rule.target,
            match_mode: rule.match_mode,
            match_value: rule.match_value.clone(),
            priority: rule.priority,
            enabled: rule.enabled,
            description: rule.description.clone(),
        }
    }
}
