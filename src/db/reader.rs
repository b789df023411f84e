use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rusqlite::Connection;

use crate::error::{Result, ScrubError};
use crate::rules::{FilterAction, FilterRule, FilterTarget, MatchMode};
use crate::store::HistoryEntry;

/// A `rules` row as stored, before enum and timestamp decoding.
#[derive(Debug, Clone)]
struct RuleRow {
    id: String,
    name: String,
    action: String,
    target: String,
    match_mode: String,
    match_value: String,
    priority: i64,
    enabled: bool,
    description: Option<String>,
    created_at: String,
    updated_at: String,
}

fn parse_enum<T: ValueEnum>(id: &str, column: &str, raw: &str) -> Result<T> {
    T::from_str(raw, true).map_err(|_| {
        ScrubError::InvalidRules(format!("stored rule {id} has unknown {column} '{raw}'"))
    })
}

fn parse_timestamp(id: &str, column: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|err| {
            ScrubError::InvalidRules(format!("stored rule {id} has invalid {column} '{raw}': {err}"))
        })
}

impl RuleRow {
    fn into_rule(self) -> Result<FilterRule> {
        Ok(FilterRule {
            action: parse_enum::<FilterAction>(&self.id, "action", &self.action)?,
            target: parse_enum::<FilterTarget>(&self.id, "target", &self.target)?,
            match_mode: parse_enum::<MatchMode>(&self.id, "match_mode", &self.match_mode)?,
            created_at: parse_timestamp(&self.id, "created_at", &self.created_at)?,
            updated_at: parse_timestamp(&self.id, "updated_at", &self.updated_at)?,
            id: self.id,
            name: self.name,
            match_value: self.match_value,
            priority: self.priority,
            enabled: self.enabled,
            description: self.description,
        })
    }
}

/// Load all rules in their stored order.
pub fn load_rules(conn: &Connection) -> Result<Vec<FilterRule>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, action, target, match_mode, match_value, priority, enabled, description, created_at, updated_at
         FROM rules ORDER BY position, rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(RuleRow {
            id: row.get(0)?,
            name: row.get(1)?,
            action: row.get(2)?,
            target: row.get(3)?,
            match_mode: row.get(4)?,
            match_value: row.get(5)?,
            priority: row.get(6)?,
            enabled: row.get(7)?,
            description: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    })?;

    let mut rules = Vec::new();
    for row in rows {
        rules.push(row?.into_rule()?);
    }
    Ok(rules)
}

/// Load up to `limit` history entries, newest first.
pub fn load_history(conn: &Connection, limit: usize) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT created_at, input, output, applied_rules FROM history ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit as i64], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (created_at, input, output, applied_rules) = row?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|err| {
                ScrubError::InvalidRules(format!(
                    "history entry has invalid created_at '{created_at}': {err}"
                ))
            })?;
        entries.push(HistoryEntry {
            created_at,
            input,
            output,
            applied_rules: serde_json::from_str(&applied_rules)?,
        });
    }
    Ok(entries)
}

/// Number of stored history entries.
pub fn count_history(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
    Ok(count as usize)
}
