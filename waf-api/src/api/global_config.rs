//! Read-only snapshot of global-tier configuration (spec.md §6 "operators
//! can inspect the effective global configuration in one call").

use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::error_response::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
struct GlobalConfig {
    rule_count: usize,
    route_count: usize,
    error_page_count: usize,
}

#[get("/global/config")]
pub async fn get(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let snapshot = state.global_store.snapshot().map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(GlobalConfig {
        rule_count: snapshot.rules.len(),
        route_count: snapshot.routes.len(),
        error_page_count: snapshot.error_pages.len(),
    }))
}
