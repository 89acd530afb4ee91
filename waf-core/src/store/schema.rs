//! Table definitions for a tenant database.
//!
//! Every tenant database carries the same schema; which tables are
//! populated depends on whether the tenant is the global store or a
//! per-route store (spec.md §3 "Ownership" — only the global store's
//! `routes` table and `users` table are ever written to).

use super::database::Database;
use crate::error::WafResult;

pub fn ensure_schema(db: &Database) -> WafResult<()> {
    db.execute_batch(
        "CREATE TABLE IF NOT EXISTS rules (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            enabled INTEGER NOT NULL,
            action TEXT NOT NULL,
            expression_json TEXT NOT NULL DEFAULT '[]',
            tags_json TEXT NOT NULL DEFAULT '[]',
            priority INTEGER NOT NULL,
            trigger_alert INTEGER NOT NULL DEFAULT 0,
            block_http_code INTEGER,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS routes (
            id TEXT PRIMARY KEY,
            incoming_host TEXT NOT NULL UNIQUE,
            origin_type TEXT NOT NULL,
            origin_url TEXT,
            origin_service_name TEXT,
            enabled INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS error_pages (
            http_code INTEGER PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            content_type TEXT NOT NULL,
            body TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS audit_log (
            id TEXT PRIMARY KEY,
            actor TEXT NOT NULL,
            action TEXT NOT NULL,
            detail TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_every_table() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        // Re-running must be idempotent.
        ensure_schema(&db).unwrap();
        for table in ["rules", "routes", "error_pages", "users", "audit_log"] {
            let exists: Option<String> = db
                .query_one(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(exists, Some(table.to_string()));
        }
    }
}
