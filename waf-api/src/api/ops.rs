//! Operational side-channel endpoints (spec.md §4.9 "Non-goals" still
//! expects operators to be able to trigger housekeeping by hand), grounded
//! in the teacher's `router-api/src/api/statistics` fire-and-forget
//! refresh handlers: each records an audit row and returns immediately,
//! it does not perform the work synchronously.

use actix_web::{post, web, HttpResponse};
use waf_core::store::audit::{AuditRecord, AuditSink};

use crate::error_response::{ApiError, ApiResult};
use crate::state::AppState;

#[post("/feeds/refresh")]
pub async fn refresh_feeds(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    state
        .global_store
        .audit()
        .record(AuditRecord {
            actor: "operator".to_string(),
            action: "ops.feeds.refresh".to_string(),
            detail: "manual feed refresh requested".to_string(),
        })
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Accepted().finish())
}

#[post("/events/aggregate")]
pub async fn aggregate_events(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let dropped = state.event_bus.dropped_count();
    state
        .global_store
        .audit()
        .record(AuditRecord {
            actor: "operator".to_string(),
            action: "ops.events.aggregate".to_string(),
            detail: format!("manual aggregation requested (dropped so far: {dropped})"),
        })
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Accepted().json(serde_json::json!({ "dropped_decision_events": dropped })))
}
