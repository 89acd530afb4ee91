//! Administrator audit trail (spec.md §6 "every configuration write is
//! audited"). Distinct from the C9 decision logger: this records *who
//! changed what configuration*, not request outcomes.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::database::Database;
use crate::error::WafResult;

#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub actor: String,
    pub action: String,
    pub detail: String,
}

/// Sink for audit records. The default implementation writes to the
/// tenant's own `audit_log` table; tests substitute an in-memory sink.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditRecord) -> WafResult<()>;
}

impl AuditSink for Database {
    fn record(&self, entry: AuditRecord) -> WafResult<()> {
        self.execute(
            "INSERT INTO audit_log (id, actor, action, detail) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![Uuid::new_v4().to_string(), entry.actor, entry.action, entry.detail],
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AuditLogRow {
    pub id: String,
    pub actor: String,
    pub action: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

pub fn list(db: &Database, limit: usize) -> WafResult<Vec<AuditLogRow>> {
    db.query(
        "SELECT id, actor, action, detail, created_at FROM audit_log ORDER BY created_at DESC LIMIT ?1",
        [limit as i64],
        |row| {
            let created_at_str: String = row.get(4)?;
            let created_at = DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());
            Ok(AuditLogRow {
                id: row.get(0)?,
                actor: row.get(1)?,
                action: row.get(2)?,
                detail: row.get(3)?,
                created_at,
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::ensure_schema;

    #[test]
    fn records_and_lists() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        db.record(AuditRecord {
            actor: "admin".to_string(),
            action: "rule.create".to_string(),
            detail: "rule-1".to_string(),
        })
        .unwrap();
        let rows = list(&db, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].action, "rule.create");
    }
}
