//! Authoring-time checks for single rules and whole rule sets.
//!
//! Errors make a rule set unusable and must block saving or importing it.
//! Warnings point out rules that conflict or will never have a visible
//! effect; they do not block anything.

use std::collections::HashMap;

use serde::Serialize;

use super::matcher::compile_pattern;
use super::model::{FilterAction, FilterRule, FilterTarget, MatchMode, MAX_PRIORITY, MIN_PRIORITY};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.is_valid = false;
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn absorb(&mut self, prefix: &str, other: ValidationReport) {
        for e in other.errors {
            self.error(format!("{prefix}: {e}"));
        }
        for w in other.warnings {
            self.warning(format!("{prefix}: {w}"));
        }
    }
}

/// Structural checks on one rule.
pub fn validate_rule(rule: &FilterRule) -> ValidationReport {
    let mut report = ValidationReport::new();

    if rule.name.trim().is_empty() {
        report.error("name must not be empty");
    }

    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&rule.priority) {
        report.error(format!(
            "priority {} is outside {MIN_PRIORITY}..={MAX_PRIORITY}",
            rule.priority
        ));
    }

    match rule.action {
        FilterAction::Delete | FilterAction::Keep => {
            if rule.match_value.is_empty() {
                report.error(format!("match value is required for {}", rule.action));
            }
        }
        FilterAction::DeleteAll | FilterAction::KeepAll => {
            if !rule.match_value.is_empty() {
                report.warning(format!(
                    "match value \"{}\" is ignored by {}",
                    rule.match_value, rule.action
                ));
            }
        }
    }

    if rule.match_mode == MatchMode::Regex && !rule.match_value.is_empty() {
        if let Err(err) = compile_pattern(&rule.match_value) {
            report.error(format!("invalid regex \"{}\": {err}", rule.match_value));
        }
    }

    report
}

/// Per-rule checks plus duplicate ids and global-rule conflicts per target.
pub fn validate_rules(rules: &[FilterRule]) -> ValidationReport {
    let mut report = ValidationReport::new();

    for rule in rules {
        report.absorb(&format!("Rule {}", rule.display_name()), validate_rule(rule));
    }

    check_duplicate_ids(rules, &mut report);

    for target in FilterTarget::ALL {
        check_target_conflicts(rules, target, &mut report);
    }

    report
}

fn check_duplicate_ids(rules: &[FilterRule], report: &mut ValidationReport) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for rule in rules {
        let count = counts.entry(rule.id.as_str()).or_insert(0);
        if *count == 0 {
            order.push(rule.id.as_str());
        }
        *count += 1;
    }

    let duplicated: Vec<&str> = order.into_iter().filter(|id| counts[id] > 1).collect();
    if !duplicated.is_empty() {
        report.error(format!("Duplicate rule IDs: {}", duplicated.join(", ")));
    }
}

/// Enabled rules for `target`, highest priority first, ties in list order.
fn enabled_by_priority(rules: &[FilterRule], target: FilterTarget) -> Vec<&FilterRule> {
    let mut selected: Vec<&FilterRule> = rules
        .iter()
        .filter(|r| r.enabled && r.target == target)
        .collect();
    selected.sort_by(|a, b| b.priority.cmp(&a.priority));
    selected
}

fn check_target_conflicts(rules: &[FilterRule], target: FilterTarget, report: &mut ValidationReport) {
    let ordered = enabled_by_priority(rules, target);

    let delete_alls: Vec<&FilterRule> = ordered
        .iter()
        .copied()
        .filter(|r| r.action == FilterAction::DeleteAll)
        .collect();
    let keep_alls: Vec<&FilterRule> = ordered
        .iter()
        .copied()
        .filter(|r| r.action == FilterAction::KeepAll)
        .collect();

    for group in [&delete_alls, &keep_alls] {
        if group.len() > 1 {
            let winner = group[0];
            report.warning(format!(
                "{} {} rules target {}; {} (priority {}) wins",
                group.len(),
                winner.action,
                target,
                winner.display_name(),
                winner.priority
            ));
        }
    }

    if let (Some(delete_all), Some(keep_all)) = (delete_alls.first(), keep_alls.first()) {
        if delete_all.priority == keep_all.priority {
            let first = ordered
                .iter()
                .find(|r| r.action.is_global())
                .map(|r| r.display_name())
                .unwrap_or_default();
            report.warning(format!(
                "delete_all {} and keep_all {} on {} share priority {}; {} wins because it is listed first",
                delete_all.display_name(),
                keep_all.display_name(),
                target,
                delete_all.priority,
                first
            ));
        } else {
            let (winner, loser) = if delete_all.priority > keep_all.priority {
                (delete_all, keep_all)
            } else {
                (keep_all, delete_all)
            };
            report.warning(format!(
                "{} {} (priority {}) dominates {} {} (priority {}) on {}",
                winner.action,
                winner.display_name(),
                winner.priority,
                loser.action,
                loser.display_name(),
                loser.priority,
                target
            ));
        }
    }

    let Some(global) = ordered.iter().find(|r| r.action.is_global()) else {
        return;
    };
    for rule in ordered.iter().filter(|r| !r.action.is_global()) {
        if rule.priority <= global.priority {
            report.warning(format!(
                "{} {} (priority {}) is shadowed by {} {} (priority {}) on {} and will have no visible effect",
                rule.action,
                rule.display_name(),
                rule.priority,
                global.action,
                global.display_name(),
                global.priority,
                target
            ));
        }
    }
}
