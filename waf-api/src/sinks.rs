//! The [`EventSink`] the control plane wires into the pipeline's event bus:
//! every terminal decision is persisted to the global store's own
//! `audit_log` table, tagged with a synthetic `decision.*` actor so it is
//! distinguishable from administrator-driven audit rows.

use waf_core::events::{DecisionEvent, EventSink};
use waf_core::store::{audit::AuditRecord, Database};

pub struct AuditDecisionSink {
    db: Database,
}

impl AuditDecisionSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl EventSink for AuditDecisionSink {
    fn emit(&self, event: DecisionEvent) {
        use waf_core::store::audit::AuditSink;
        let detail = format!(
            "{} {} host={} context={} rule={:?} status={}",
            event.method, event.url, event.host, event.context, event.matched_rule_id, event.http_status
        );
        if let Err(e) = self.db.record(AuditRecord {
            actor: "decision-engine".to_string(),
            action: format!("decision.{}", event.action.as_str().to_lowercase()),
            detail,
        }) {
            log::error!("failed to persist decision event: {e}");
        }
    }
}
