use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = r#"
-- Filter rules, kept in authoring order
CREATE TABLE IF NOT EXISTS rules (
    id TEXT PRIMARY KEY,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    action TEXT NOT NULL,
    target TEXT NOT NULL,
    match_mode TEXT NOT NULL,
    match_value TEXT NOT NULL DEFAULT '',
    priority INTEGER NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    description TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- One row per cleaned command
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY,
    created_at TEXT NOT NULL,
    input TEXT NOT NULL,
    output TEXT NOT NULL,
    applied_rules TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_rules_position ON rules(position);
CREATE INDEX IF NOT EXISTS idx_history_created_at ON history(created_at);
"#;

/// Create all tables and indexes if they do not exist yet.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
