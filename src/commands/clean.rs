use std::path::{Path, PathBuf};

use crate::command::{parse, CommandBuilder};
use crate::error::{Result, ScrubError};
use crate::pipeline::{clean_command, CleanOutcome};
use crate::rules::{import_rules, FilterEngine, FilterRule, ImportMode};
use crate::store::{HistoryEntry, HistoryStore, RuleStore};

use super::util::{open_store, print_json, read_file, InputSource, OutputFormat};

pub struct CleanOptions {
    pub input: InputSource,
    /// Use the rules of this export file instead of the stored ones.
    pub rules_file: Option<PathBuf>,
    pub format: OutputFormat,
    pub multiline: bool,
    pub record_history: bool,
    pub max_entries: usize,
}

pub fn run_clean(database: &Path, options: &CleanOptions) -> Result<()> {
    let input = options.input.read()?;
    let outcome = clean(database, &input, options)?;

    match options.format {
        OutputFormat::Text => {
            for warning in &outcome.warnings {
                eprintln!("warning: {warning}");
            }
            println!("{}", outcome.output);
        }
        OutputFormat::Json => print_json(&outcome)?,
    }
    Ok(())
}

/// Clean `input` with the configured rules and record it in history.
pub fn clean(database: &Path, input: &str, options: &CleanOptions) -> Result<CleanOutcome> {
    let rules = match &options.rules_file {
        Some(path) => load_rules_file(path)?,
        None => open_store(database)?.load_rules()?,
    };

    let engine = FilterEngine::with_rules(&rules);
    let builder = CommandBuilder::new().multiline(options.multiline);
    let outcome = clean_command(input, &engine, &builder);
    if !outcome.has_url() {
        return Err(ScrubError::InvalidArgs(
            "No URL found in the input command".to_string(),
        ));
    }

    if options.record_history {
        let mut store = open_store(database)?;
        record(&mut store, input, &outcome, options.max_entries)?;
    }
    Ok(outcome)
}

pub fn record<H: HistoryStore>(
    store: &mut H,
    input: &str,
    outcome: &CleanOutcome,
    max_entries: usize,
) -> Result<()> {
    store.record(&HistoryEntry::new(input, outcome))?;
    let pruned = store.prune(max_entries)?;
    if pruned > 0 {
        tracing::debug!(pruned, "history pruned");
    }
    Ok(())
}

fn load_rules_file(path: &Path) -> Result<Vec<FilterRule>> {
    let json = read_file(path)?;
    let outcome = import_rules(&json, &[], ImportMode::Replace)?;
    for warning in &outcome.report.warnings {
        tracing::warn!("{warning}");
    }
    Ok(outcome.rules)
}

/// Print the parsed request as JSON without filtering.
pub fn run_parse(input: &InputSource) -> Result<()> {
    let request = parse(&input.read()?);
    print_json(&request)
}
