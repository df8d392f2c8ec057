//! SQL DDL for initializing the database schema.

/// SQLite schema includes:
/// - `processed_articles` table (one row per successfully dispatched entry id)
/// - `secrets` table (key/value store for rotating credentials)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Dedup ledger
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS processed_articles (
    id TEXT PRIMARY KEY NOT NULL,
    processed_at TEXT NOT NULL -- RFC3339
);

-- ---------------------------------------------------------------------------
-- Credential store
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS secrets (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL -- RFC3339
);
"#;
