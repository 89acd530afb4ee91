//! Thread-safe SQLite connection wrapper.
//!
//! Grounded in the teacher's `router-api/src/module/database.rs::Database`,
//! generalized to open an arbitrary path instead of a single hardcoded
//! `/tmp/gwrs/data/core` file — each tenant gets its own database file
//! (spec.md §4.5).

use rusqlite::{Connection, Result as SqliteResult};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{WafError, WafResult};

/// A cloneable, thread-safe handle to one tenant's SQLite connection.
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (creating if absent) the database file at `path`, creating any
    /// missing parent directories first.
    pub fn open(path: &Path) -> WafResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let connection = Connection::open(path)?;
        connection.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Opens an in-memory database, used by tests.
    pub fn open_in_memory() -> WafResult<Self> {
        let connection = Connection::open_in_memory()?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    pub fn execute<P>(&self, sql: &str, params: P) -> WafResult<usize>
    where
        P: rusqlite::Params,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|_| WafError::Internal("database connection poisoned".to_string()))?;
        Ok(conn.execute(sql, params)?)
    }

    pub fn execute_batch(&self, sql: &str) -> WafResult<()> {
        let conn = self
            .connection
            .lock()
            .map_err(|_| WafError::Internal("database connection poisoned".to_string()))?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn query<T, F, P>(&self, sql: &str, params: P, f: F) -> WafResult<Vec<T>>
    where
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
        P: rusqlite::Params,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|_| WafError::Internal("database connection poisoned".to_string()))?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, f)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub fn query_one<T, F, P>(&self, sql: &str, params: P, f: F) -> WafResult<Option<T>>
    where
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
        P: rusqlite::Params,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|_| WafError::Internal("database connection poisoned".to_string()))?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query_map(params, f)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn transaction<T, F>(&self, f: F) -> WafResult<T>
    where
        F: FnOnce(&Connection) -> SqliteResult<T>,
    {
        let mut conn = self
            .connection
            .lock()
            .map_err(|_| WafError::Internal("database connection poisoned".to_string()))?;
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_and_round_trips() {
        let db = Database::open_in_memory().unwrap();
        db.execute("CREATE TABLE t (id TEXT PRIMARY KEY, name TEXT NOT NULL)", [])
            .unwrap();
        db.execute("INSERT INTO t (id, name) VALUES (?1, ?2)", ["1", "a"]).unwrap();
        let rows: Vec<String> = db
            .query("SELECT name FROM t WHERE id = ?1", ["1"], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, vec!["a".to_string()]);
    }
}
