use regex::{Regex, RegexBuilder};

use super::model::MatchMode;

/// Compile a rule pattern the way the matcher does (case-insensitive).
pub fn compile_pattern(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// A pattern prepared once and tested against many field names.
#[derive(Debug, Clone)]
pub enum FieldMatcher {
    Exact(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Regex(Regex),
    /// Empty patterns and regexes that fail to compile.
    Never,
}

impl FieldMatcher {
    pub fn new(pattern: &str, mode: MatchMode) -> Self {
        if pattern.is_empty() {
            return Self::Never;
        }
        match mode {
            MatchMode::Exact => Self::Exact(pattern.to_string()),
            MatchMode::Contains => Self::Contains(pattern.to_lowercase()),
            MatchMode::StartsWith => Self::StartsWith(pattern.to_lowercase()),
            MatchMode::EndsWith => Self::EndsWith(pattern.to_lowercase()),
            MatchMode::Regex => match compile_pattern(pattern) {
                Ok(re) => Self::Regex(re),
                Err(err) => {
                    tracing::debug!(pattern, error = %err, "invalid regex never matches");
                    Self::Never
                }
            },
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(p) => name == p,
            Self::Contains(p) => name.to_lowercase().contains(p.as_str()),
            Self::StartsWith(p) => name.to_lowercase().starts_with(p.as_str()),
            Self::EndsWith(p) => name.to_lowercase().ends_with(p.as_str()),
            Self::Regex(re) => re.is_match(name),
            Self::Never => false,
        }
    }
}

/// Decide whether `field_name` matches `pattern` under `mode`. Never fails.
pub fn is_match(field_name: &str, pattern: &str, mode: MatchMode) -> bool {
    FieldMatcher::new(pattern, mode).matches(field_name)
}
