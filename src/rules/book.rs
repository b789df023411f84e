use serde_json::Value;

use super::model::{FilterRule, RuleDraft};
use super::templates::find_template;
use super::transfer::{export_rules, import_rules, ImportMode, ImportOutcome};
use super::validator::{validate_rules, ValidationReport};
use crate::error::{Result, ScrubError};
use crate::store::RuleStore;

/// Rule management on top of a [`RuleStore`].
///
/// Every mutation validates the resulting rule set first and saves nothing
/// when it has errors. Warnings are returned to the caller.
pub struct RuleBook<S: RuleStore> {
    store: S,
}

impl<S: RuleStore> RuleBook<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn rules(&self) -> Result<Vec<FilterRule>> {
        self.store.load_rules()
    }

    pub fn get(&self, id: &str) -> Result<FilterRule> {
        self.rules()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ScrubError::RuleNotFound(id.to_string()))
    }

    /// Validate the rules currently in the store.
    pub fn validate(&self) -> Result<ValidationReport> {
        Ok(validate_rules(&self.rules()?))
    }

    pub fn add(&mut self, draft: RuleDraft) -> Result<(FilterRule, ValidationReport)> {
        let rule = draft.into_rule();
        let mut rules = self.rules()?;
        rules.push(rule.clone());
        let report = self.commit(&rules)?;
        tracing::info!(rule = %rule.id, name = %rule.name, "rule added");
        Ok((rule, report))
    }

    pub fn update(&mut self, id: &str, draft: RuleDraft) -> Result<(FilterRule, ValidationReport)> {
        self.modify(id, |rule| rule.apply_draft(draft))
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(FilterRule, ValidationReport)> {
        self.modify(id, |rule| {
            rule.enabled = enabled;
            rule.touch();
        })
    }

    pub fn remove(&mut self, id: &str) -> Result<FilterRule> {
        let mut rules = self.rules()?;
        let Some(idx) = rules.iter().position(|r| r.id == id) else {
            return Err(ScrubError::RuleNotFound(id.to_string()));
        };
        let removed = rules.remove(idx);
        self.store.save_rules(&rules)?;
        tracing::info!(rule = %removed.id, "rule removed");
        Ok(removed)
    }

    pub fn import(&mut self, json: &str, mode: ImportMode) -> Result<ImportOutcome> {
        let existing = self.rules()?;
        let outcome = import_rules(json, &existing, mode)?;
        self.store.save_rules(&outcome.rules)?;
        Ok(outcome)
    }

    pub fn export(&self, settings: Option<Value>) -> Result<String> {
        export_rules(&self.rules()?, settings)
    }

    /// Append the rules of a built-in template.
    pub fn install_template(&mut self, name: &str) -> Result<(Vec<FilterRule>, ValidationReport)> {
        let template = find_template(name)
            .ok_or_else(|| ScrubError::InvalidArgs(format!("Unknown template: {name}")))?;
        let added: Vec<FilterRule> = template
            .rules()
            .into_iter()
            .map(RuleDraft::into_rule)
            .collect();
        let mut rules = self.rules()?;
        rules.extend(added.iter().cloned());
        let report = self.commit(&rules)?;
        tracing::info!(template = template.name, rules = added.len(), "template installed");
        Ok((added, report))
    }

    fn modify<F>(&mut self, id: &str, change: F) -> Result<(FilterRule, ValidationReport)>
    where
        F: FnOnce(&mut FilterRule),
    {
        let mut rules = self.rules()?;
        let Some(rule) = rules.iter_mut().find(|r| r.id == id) else {
            return Err(ScrubError::RuleNotFound(id.to_string()));
        };
        change(rule);
        let updated = rule.clone();
        let report = self.commit(&rules)?;
        tracing::info!(rule = %updated.id, "rule updated");
        Ok((updated, report))
    }

    fn commit(&mut self, rules: &[FilterRule]) -> Result<ValidationReport> {
        let report = validate_rules(rules);
        if !report.is_valid {
            return Err(ScrubError::InvalidRules(report.errors.join("; ")));
        }
        self.store.save_rules(rules)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::RuleBook;
    use crate::error::ScrubError;
    use crate::rules::{FilterAction, FilterTarget, ImportMode, MatchMode, RuleDraft};
    use crate::store::{MemoryStore, RuleStore};

    fn draft(value: &str, priority: i64) -> RuleDraft {
        RuleDraft::new(
            format!("drop {value}"),
            FilterAction::Delete,
            FilterTarget::Headers,
            MatchMode::Exact,
            value,
            priority,
        )
    }

    #[test]
    fn add_update_toggle_remove() {
        let mut book = RuleBook::new(MemoryStore::new());
        let (rule, report) = book.add(draft("cookie", 50)).expect("add");
        assert!(report.is_valid);

        let (updated, _) = book.update(&rule.id, draft("x-token", 60)).expect("update");
        assert_eq!(updated.id, rule.id);
        assert_eq!(updated.match_value, "x-token");

        let (disabled, _) = book.set_enabled(&rule.id, false).expect("disable");
        assert!(!disabled.enabled);
        assert!(!book.get(&rule.id).expect("get").enabled);

        book.remove(&rule.id).expect("remove");
        assert!(book.rules().expect("rules").is_empty());
    }

    #[test]
    fn invalid_rules_are_not_saved() {
        let mut book = RuleBook::new(MemoryStore::new());
        let err = book.add(draft("", 50)).unwrap_err();
        assert!(matches!(err, ScrubError::InvalidRules(_)));
        assert!(book.store().load_rules().expect("load").is_empty());

        let (rule, _) = book.add(draft("a", 50)).expect("add");
        let bad = RuleDraft { priority: 500, ..draft("a", 50) };
        assert!(book.update(&rule.id, bad).is_err());
        assert_eq!(book.get(&rule.id).expect("get").priority, 50);
    }

    #[test]
    fn warnings_do_not_block() {
        let mut book = RuleBook::new(MemoryStore::new());
        book.add(RuleDraft::new("wipe", FilterAction::DeleteAll, FilterTarget::Headers, MatchMode::Exact, "", 60))
            .expect("add wipe");
        let (_, report) = book.add(draft("a", 10)).expect("add shadowed");
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(book.rules().expect("rules").len(), 2);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut book = RuleBook::new(MemoryStore::new());
        assert!(matches!(book.remove("nope"), Err(ScrubError::RuleNotFound(_))));
        assert!(matches!(book.set_enabled("nope", true), Err(ScrubError::RuleNotFound(_))));
    }

    #[test]
    fn export_then_import_replaces() {
        let mut book = RuleBook::new(MemoryStore::new());
        book.add(draft("a", 10)).expect("add");
        book.add(draft("b", 20)).expect("add");
        let text = book.export(None).expect("export");

        let mut other = RuleBook::new(MemoryStore::new());
        other.add(draft("z", 1)).expect("add");
        let outcome = other.import(&text, ImportMode::Replace).expect("import");
        assert_eq!(outcome.imported, 2);
        let names: Vec<String> = other.rules().expect("rules").into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["drop a", "drop b"]);
    }

    #[test]
    fn failed_import_keeps_existing_rules() {
        let mut book = RuleBook::new(MemoryStore::new());
        book.add(draft("a", 10)).expect("add");
        let bad = r#"{"version":"1.0","rules":[{"name":"","action":"delete","target":"headers","matchMode":"exact","matchValue":"x"}]}"#;
        assert!(book.import(bad, ImportMode::Replace).is_err());
        assert_eq!(book.rules().expect("rules").len(), 1);
    }

    #[test]
    fn installs_templates() {
        let mut book = RuleBook::new(MemoryStore::new());
        let (added, report) = book.install_template("tracking-params").expect("install");
        assert_eq!(added.len(), 2);
        assert!(report.warnings.is_empty());
        assert!(book.install_template("nope").is_err());
    }
}
