//! Rule import/export documents.
//!
//! ```json
//! { "version": "1.0", "rules": [ { "name": "...", "action": "delete", ... } ], "settings": {} }
//! ```
//!
//! Exported rules carry no `id`, `createdAt` or `updatedAt`; those are
//! regenerated on import.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{FilterRule, RuleDraft};
use super::validator::{validate_rules, ValidationReport};
use crate::error::{Result, ScrubError};

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleExport {
    pub version: String,
    pub rules: Vec<RuleDraft>,
    /// Application settings, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Imported rules replace the existing set.
    #[default]
    Replace,
    /// Imported rules are appended after the existing set.
    Merge,
}

/// A validated rule set ready to be saved.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub rules: Vec<FilterRule>,
    pub imported: usize,
    pub settings: Option<Value>,
    pub report: ValidationReport,
}

/// Serialize `rules` as a pretty-printed export document.
pub fn export_rules(rules: &[FilterRule], settings: Option<Value>) -> Result<String> {
    let export = RuleExport {
        version: EXPORT_VERSION.to_string(),
        rules: rules.iter().map(RuleDraft::from).collect(),
        settings,
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Parse an export document, reporting every malformed rule by index.
pub fn parse_export(json: &str) -> Result<RuleExport> {
    let value: Value = serde_json::from_str(json)?;
    let Some(object) = value.as_object() else {
        return Err(ScrubError::InvalidRules(
            "export document must be a JSON object".to_string(),
        ));
    };

    let version = match object.get("version") {
        Some(Value::String(v)) if !v.trim().is_empty() => v.clone(),
        _ => {
            return Err(ScrubError::InvalidRules(
                "export document is missing a \"version\" string".to_string(),
            ))
        }
    };

    let Some(raw_rules) = object.get("rules").and_then(Value::as_array) else {
        return Err(ScrubError::InvalidRules(
            "export document is missing a \"rules\" array".to_string(),
        ));
    };

    let mut rules = Vec::with_capacity(raw_rules.len());
    let mut problems = Vec::new();
    for (idx, raw) in raw_rules.iter().enumerate() {
        match serde_json::from_value::<RuleDraft>(raw.clone()) {
            Ok(draft) => rules.push(draft),
            Err(err) => problems.push(format!("rules[{idx}]: {err}")),
        }
    }
    if !problems.is_empty() {
        return Err(ScrubError::InvalidRules(problems.join("; ")));
    }

    Ok(RuleExport {
        version,
        rules,
        settings: object.get("settings").cloned(),
    })
}

/// Build the rule set that importing `json` would produce. Nothing is
/// returned unless the whole resulting set validates.
pub fn import_rules(json: &str, existing: &[FilterRule], mode: ImportMode) -> Result<ImportOutcome> {
    let export = parse_export(json)?;
    let imported: Vec<FilterRule> = export.rules.into_iter().map(RuleDraft::into_rule).collect();
    let count = imported.len();

    let rules = match mode {
        ImportMode::Replace => imported,
        ImportMode::Merge => existing.iter().cloned().chain(imported).collect(),
    };

    let report = validate_rules(&rules);
    if !report.is_valid {
        return Err(ScrubError::InvalidRules(report.errors.join("; ")));
    }

    tracing::info!(imported = count, total = rules.len(), ?mode, "rules imported");
    Ok(ImportOutcome {
        rules,
        imported: count,
        settings: export.settings,
        report,
    })
}
