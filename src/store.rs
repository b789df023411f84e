//! Collaborator interfaces for rule persistence and history, plus an
//! in-memory implementation.
//!
//! Stores are constructed by the caller and passed in explicitly; see
//! [`crate::db::SqliteStore`] for the on-disk implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pipeline::CleanOutcome;
use crate::rules::FilterRule;

pub trait RuleStore {
    fn load_rules(&self) -> Result<Vec<FilterRule>>;

    /// Replace the stored rule set with `rules`, in order.
    fn save_rules(&mut self, rules: &[FilterRule]) -> Result<()>;
}

/// One recorded filtering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub created_at: DateTime<Utc>,
    pub input: String,
    pub output: String,
    pub applied_rules: Vec<String>,
}

impl HistoryEntry {
    pub fn new(input: impl Into<String>, outcome: &CleanOutcome) -> Self {
        Self {
            created_at: Utc::now(),
            input: input.into(),
            output: outcome.output.clone(),
            applied_rules: outcome.applied_rules.clone(),
        }
    }
}

pub trait HistoryStore {
    fn record(&mut self, entry: &HistoryEntry) -> Result<()>;

    /// Most recent entries first.
    fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Drop all but the newest `keep` entries, returning how many were removed.
    fn prune(&mut self, keep: usize) -> Result<usize>;

    fn clear(&mut self) -> Result<usize>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rules: Vec<FilterRule>,
    history: Vec<HistoryEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<FilterRule>) -> Self {
        Self {
            rules,
            history: Vec::new(),
        }
    }
}

impl RuleStore for MemoryStore {
    fn load_rules(&self) -> Result<Vec<FilterRule>> {
        Ok(self.rules.clone())
    }

    fn save_rules(&mut self, rules: &[FilterRule]) -> Result<()> {
        self.rules = rules.to_vec();
        Ok(())
    }
}

impl HistoryStore for MemoryStore {
    fn record(&mut self, entry: &HistoryEntry) -> Result<()> {
        self.history.push(entry.clone());
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        Ok(self.history.iter().rev().take(limit).cloned().collect())
    }

    fn prune(&mut self, keep: usize) -> Result<usize> {
        let excess = self.history.len().saturating_sub(keep);
        self.history.drain(..excess);
        Ok(excess)
    }

    fn clear(&mut self) -> Result<usize> {
        let removed = self.history.len();
        self.history.clear();
        Ok(removed)
    }
}
