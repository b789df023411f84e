use rusqlite::{params, Connection};

use crate::error::Result;
use crate::rules::FilterRule;
use crate::store::HistoryEntry;

/// Replace the whole rule set. Run inside a transaction so a failed save
/// leaves the previous set in place.
pub fn replace_rules(conn: &Connection, rules: &[FilterRule]) -> Result<()> {
    conn.execute("DELETE FROM rules", [])?;
    let mut insert = conn.prepare(
        "INSERT INTO rules (id, position, name, action, target, match_mode, match_value, priority, enabled, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;
    for (position, rule) in rules.iter().enumerate() {
        insert.execute(params![
            rule.id,
            position as i64,
            rule.name,
            rule.action.label(),
            rule.target.label(),
            rule.match_mode.label(),
            rule.match_value,
            rule.priority,
            rule.enabled,
            rule.description,
            rule.created_at.to_rfc3339(),
            rule.updated_at.to_rfc3339(),
        ])?;
    }
    Ok(())
}

/// Append one history entry.
pub fn insert_history(conn: &Connection, entry: &HistoryEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO history (created_at, input, output, applied_rules) VALUES (?1, ?2, ?3, ?4)",
        params![
            entry.created_at.to_rfc3339(),
            entry.input,
            entry.output,
            serde_json::to_string(&entry.applied_rules)?,
        ],
    )?;
    Ok(())
}

/// Keep only the newest `keep` history rows.
pub fn prune_history(conn: &Connection, keep: usize) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM history WHERE id NOT IN (SELECT id FROM history ORDER BY id DESC LIMIT ?1)",
        params![keep as i64],
    )?;
    Ok(removed)
}

pub fn clear_history(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM history", [])?)
}
