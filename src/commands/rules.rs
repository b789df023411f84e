use std::fs;
use std::path::{Path, PathBuf};

use crate::db::SqliteStore;
use crate::error::{Result, ScrubError};
use crate::rules::{
    parse_export, templates, validate_rules, FilterAction, FilterRule, FilterTarget, ImportMode,
    MatchMode, RuleBook, RuleDraft, ValidationReport,
};

use super::util::{open_store, print_json, read_file};

/// Field overrides for `rules update`; unset fields keep their value.
#[derive(Clone, Debug, Default)]
pub struct RuleEdit {
    pub name: Option<String>,
    pub action: Option<FilterAction>,
    pub target: Option<FilterTarget>,
    pub match_mode: Option<MatchMode>,
    pub match_value: Option<String>,
    pub priority: Option<i64>,
    pub description: Option<String>,
}

impl RuleEdit {
    pub fn apply(self, mut draft: RuleDraft) -> RuleDraft {
        if let Some(value) = self.name {
            draft.name = value;
        }
        if let Some(value) = self.action {
            draft.action = value;
        }
        if let Some(value) = self.target {
            draft.target = value;
        }
        if let Some(value) = self.match_mode {
            draft.match_mode = value;
        }
        if let Some(value) = self.match_value {
            draft.match_value = value;
        }
        if let Some(value) = self.priority {
            draft.priority = value;
        }
        if let Some(value) = self.description {
            draft.description = if value.is_empty() { None } else { Some(value) };
        }
        draft
    }
}

fn open_book(database: &Path) -> Result<RuleBook<SqliteStore>> {
    Ok(RuleBook::new(open_store(database)?))
}

fn print_warnings(report: &ValidationReport) {
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
}

pub fn run_rules_list(database: &Path, json: bool) -> Result<()> {
    let rules = open_book(database)?.rules()?;
    if json {
        return print_json(&rules);
    }
    if rules.is_empty() {
        println!("No rules defined.");
        return Ok(());
    }
    print!("{}", format_rule_table(&rules));
    Ok(())
}

pub fn format_rule_table(rules: &[FilterRule]) -> String {
    let mut out = format!(
        "{:<36}  {:>3}  {:<3}  {:<10}  {:<12}  {:<11}  {:<20}  {}\n",
        "ID", "PRI", "ON", "ACTION", "TARGET", "MODE", "VALUE", "NAME"
    );
    for rule in rules {
        out.push_str(&format!(
            "{:<36}  {:>3}  {:<3}  {:<10}  {:<12}  {:<11}  {:<20}  {}\n",
            rule.id,
            rule.priority,
            if rule.enabled { "yes" } else { "no" },
            rule.action.label(),
            rule.target.label(),
            rule.match_mode.label(),
            rule.match_value,
            rule.name
        ));
    }
    out
}

pub fn run_rules_add(database: &Path, draft: RuleDraft) -> Result<()> {
    let mut book = open_book(database)?;
    let (rule, report) = book.add(draft)?;
    print_warnings(&report);
    println!("Added rule {}", rule.display_name());
    Ok(())
}

pub fn run_rules_update(database: &Path, id: &str, edit: RuleEdit) -> Result<()> {
    let mut book = open_book(database)?;
    let current = book.get(id)?;
    let draft = edit.apply(RuleDraft::from(&current));
    let (rule, report) = book.update(id, draft)?;
    print_warnings(&report);
    println!("Updated rule {}", rule.display_name());
    Ok(())
}

pub fn run_rules_remove(database: &Path, id: &str) -> Result<()> {
    let removed = open_book(database)?.remove(id)?;
    println!("Removed rule {}", removed.display_name());
    Ok(())
}

pub fn run_rules_set_enabled(database: &Path, id: &str, enabled: bool) -> Result<()> {
    let (rule, report) = open_book(database)?.set_enabled(id, enabled)?;
    print_warnings(&report);
    let state = if enabled { "Enabled" } else { "Disabled" };
    println!("{state} rule {}", rule.display_name());
    Ok(())
}

/// Print the validation report for the stored rules, or for an export file.
pub fn run_rules_validate(database: &Path, file: Option<&Path>, json: bool) -> Result<()> {
    let report = match file {
        Some(path) => {
            let export = parse_export(&read_file(path)?)?;
            let rules: Vec<FilterRule> = export.rules.into_iter().map(RuleDraft::into_rule).collect();
            validate_rules(&rules)
        }
        None => open_book(database)?.validate()?,
    };

    if json {
        print_json(&report)?;
    } else {
        for error in &report.errors {
            println!("error: {error}");
        }
        for warning in &report.warnings {
            println!("warning: {warning}");
        }
        if report.is_valid && report.warnings.is_empty() {
            println!("Rules are valid.");
        }
    }

    if report.is_valid {
        Ok(())
    } else {
        Err(ScrubError::InvalidRules(format!(
            "{} error(s)",
            report.errors.len()
        )))
    }
}

pub fn run_rules_import(database: &Path, file: &Path, mode: ImportMode) -> Result<()> {
    let json = read_file(file)?;
    let outcome = open_book(database)?.import(&json, mode)?;
    print_warnings(&outcome.report);
    println!(
        "Imported {} rule(s); {} rule(s) stored",
        outcome.imported,
        outcome.rules.len()
    );
    Ok(())
}

pub fn run_rules_export(database: &Path, output: Option<PathBuf>) -> Result<()> {
    let text = open_book(database)?.export(None)?;
    match output {
        Some(path) => {
            fs::write(&path, format!("{text}\n"))?;
            eprintln!("Exported rules to {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

pub fn run_rules_templates() -> Result<()> {
    for template in templates() {
        println!("{:<16}  {}", template.name, template.description);
    }
    Ok(())
}

pub fn run_rules_template(database: &Path, name: &str) -> Result<()> {
    let (added, report) = open_book(database)?.install_template(name)?;
    print_warnings(&report);
    println!("Installed template {name} ({} rule(s))", added.len());
    Ok(())
}
