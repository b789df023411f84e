mod reader;
mod schema;
mod writer;

use std::fs;
use std::path::Path;

use rusqlite::Connection;

pub use reader::*;
pub use schema::*;
pub use writer::*;

use crate::error::Result;
use crate::rules::FilterRule;
use crate::store::{HistoryEntry, HistoryStore, RuleStore};

/// SQLite-backed rule and history store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened rule database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn history_len(&self) -> Result<usize> {
        count_history(&self.conn)
    }
}

impl RuleStore for SqliteStore {
    fn load_rules(&self) -> Result<Vec<FilterRule>> {
        let rules = load_rules(&self.conn)?;
        tracing::debug!(rules = rules.len(), "rules loaded");
        Ok(rules)
    }

    fn save_rules(&mut self, rules: &[FilterRule]) -> Result<()> {
        let tx = self.conn.transaction()?;
        replace_rules(&tx, rules)?;
        tx.commit()?;
        tracing::debug!(rules = rules.len(), "rules saved");
        Ok(())
    }
}

impl HistoryStore for SqliteStore {
    fn record(&mut self, entry: &HistoryEntry) -> Result<()> {
        insert_history(&self.conn, entry)
    }

    fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        load_history(&self.conn, limit)
    }

    fn prune(&mut self, keep: usize) -> Result<usize> {
        prune_history(&self.conn, keep)
    }

    fn clear(&mut self) -> Result<usize> {
        clear_history(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStore;
    use crate::rules::{FilterAction, FilterTarget, MatchMode, RuleDraft};
    use crate::store::{HistoryEntry, HistoryStore, RuleStore};
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn rules_round_trip_in_order() {
        let mut store = SqliteStore::open_in_memory().expect("store");
        let rules = vec![
            RuleDraft::new("b", FilterAction::DeleteAll, FilterTarget::JsonBody, MatchMode::Exact, "", 5)
                .into_rule(),
            RuleDraft::new("a", FilterAction::Keep, FilterTarget::JsonBody, MatchMode::EndsWith, "_id", 60)
                .with_description("ids stay")
                .disabled()
                .into_rule(),
        ];
        store.save_rules(&rules).expect("save");
        let loaded = store.load_rules().expect("load");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, rules[0].id);
        assert_eq!(loaded[1].match_mode, MatchMode::EndsWith);
        assert_eq!(loaded[1].description.as_deref(), Some("ids stay"));
        assert!(!loaded[1].enabled);
        assert_eq!(
            loaded[1].created_at.timestamp_millis(),
            rules[1].created_at.timestamp_millis()
        );

        store.save_rules(&rules[1..]).expect("save subset");
        assert_eq!(store.load_rules().expect("load").len(), 1);
    }

    #[test]
    fn history_is_newest_first_and_prunable() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("nested").join("scrub.db");
        let mut store = SqliteStore::open(&path).expect("store");
        for i in 0..5 {
            store
                .record(&HistoryEntry {
                    created_at: Utc::now(),
                    input: format!("in {i}"),
                    output: format!("out {i}"),
                    applied_rules: vec![format!("rule-{i}")],
                })
                .expect("record");
        }
        let recent = store.recent(2).expect("recent");
        assert_eq!(recent[0].input, "in 4");
        assert_eq!(recent[1].applied_rules, vec!["rule-3".to_string()]);

        assert_eq!(store.prune(3).expect("prune"), 2);
        assert_eq!(store.history_len().expect("len"), 3);
        assert_eq!(store.clear().expect("clear"), 3);
        assert!(path.exists());
    }

    #[test]
    fn corrupt_history_timestamp_is_an_error() {
        let store = SqliteStore::open_in_memory().expect("store");
        store
            .conn
            .execute(
                "INSERT INTO history (created_at, input, output, applied_rules) VALUES ('yesterday', 'in', 'out', '[]')",
                [],
            )
            .expect("insert");
        let err = store.recent(10).unwrap_err().to_string();
        assert!(err.contains("invalid created_at 'yesterday'"), "{err}");
    }
}
