//! SQL migration definitions for the compdef definitions database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: definitions keyed by store coordinates",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Serialized definitions, one row per store coordinates
CREATE TABLE IF NOT EXISTS definitions (
    store_key     TEXT PRIMARY KEY,
    coordinates   TEXT NOT NULL,
    tool          TEXT NOT NULL,
    tool_version  TEXT NOT NULL,
    body          BLOB NOT NULL,
    stored_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_definitions_coordinates ON definitions(coordinates);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
