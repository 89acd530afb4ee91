//! CRUD for a tenant's rule set — mounted both under `/api/v1/global/rules`
//! (the global store) and `/api/v1/routes/{route_id}/rules` (a route's own
//! store). Grounded in the teacher's
//! `router-api/src/api/settings/gateway_{get,list,set,queries}.rs` CRUD
//! shape.

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use waf_core::model::Rule;
use waf_core::store::TenantStore;

use crate::error_response::{ApiError, ApiResult};
use crate::state::AppState;

fn list_impl(store: &TenantStore) -> ApiResult<HttpResponse> {
    let rules = store.list_rules().map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(rules))
}

fn get_impl(store: &TenantStore, id: &str) -> ApiResult<HttpResponse> {
    let rule = store.get_rule(id).map_err(ApiError::from)?;
    match rule {
        Some(rule) => Ok(HttpResponse::Ok().json(rule)),
        None => Err(ApiError(waf_core::WafError::NotFound(format!("rule {id}")))),
    }
}

fn create_impl(store: &TenantStore, rule: Rule) -> ApiResult<HttpResponse> {
    store.create_rule(&rule).map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(rule))
}

fn update_impl(store: &TenantStore, rule: Rule) -> ApiResult<HttpResponse> {
    store.update_rule(&rule).map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(rule))
}

fn delete_impl(store: &TenantStore, id: &str) -> ApiResult<HttpResponse> {
    store.delete_rule(id).map_err(ApiError::from)?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub ordered_ids: Vec<String>,
}

fn reorder_impl(store: &TenantStore, body: ReorderRequest) -> ApiResult<HttpResponse> {
    store.reorder_rules(&body.ordered_ids).map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(store.list_rules().map_err(ApiError::from)?))
}

// -- Global store routes -------------------------------------------------

#[get("/global/rules")]
pub async fn list_global(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    list_impl(&state.global_store)
}

#[get("/global/rules/{id}")]
pub async fn get_global(state: web::Data<AppState>, id: web::Path<String>) -> ApiResult<HttpResponse> {
    get_impl(&state.global_store, &id)
}

#[post("/global/rules")]
pub async fn create_global(state: web::Data<AppState>, rule: web::Json<Rule>) -> ApiResult<HttpResponse> {
    create_impl(&state.global_store, rule.into_inner())
}

#[put("/global/rules/{id}")]
pub async fn update_global(
    state: web::Data<AppState>,
    id: web::Path<String>,
    rule: web::Json<Rule>,
) -> ApiResult<HttpResponse> {
    let mut rule = rule.into_inner();
    rule.id = id.into_inner();
    update_impl(&state.global_store, rule)
}

#[delete("/global/rules/{id}")]
pub async fn delete_global(state: web::Data<AppState>, id: web::Path<String>) -> ApiResult<HttpResponse> {
    delete_impl(&state.global_store, &id)
}

#[post("/global/rules/reorder")]
pub async fn reorder_global(state: web::Data<AppState>, body: web::Json<ReorderRequest>) -> ApiResult<HttpResponse> {
    reorder_impl(&state.global_store, body.into_inner())
}

// -- Per-route store routes -----------------------------------------------

#[get("/routes/{route_id}/rules")]
pub async fn list_route(state: web::Data<AppState>, route_id: web::Path<String>) -> ApiResult<HttpResponse> {
    let store = state.route_store(&route_id).map_err(ApiError::from)?;
    list_impl(&store)
}

#[get("/routes/{route_id}/rules/{id}")]
pub async fn get_route(state: web::Data<AppState>, path: web::Path<(String, String)>) -> ApiResult<HttpResponse> {
    let (route_id, id) = path.into_inner();
    let store = state.route_store(&route_id).map_err(ApiError::from)?;
    get_impl(&store, &id)
}

#[post("/routes/{route_id}/rules")]
pub async fn create_route(
    state: web::Data<AppState>,
    route_id: web::Path<String>,
    rule: web::Json<Rule>,
) -> ApiResult<HttpResponse> {
    let store = state.route_store(&route_id).map_err(ApiError::from)?;
    create_impl(&store, rule.into_inner())
}

#[put("/routes/{route_id}/rules/{id}")]
pub async fn update_route(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    rule: web::Json<Rule>,
) -> ApiResult<HttpResponse> {
    let (route_id, id) = path.into_inner();
    let store = state.route_store(&route_id).map_err(ApiError::from)?;
    let mut rule = rule.into_inner();
    rule.id = id;
    update_impl(&store, rule)
}

#[delete("/routes/{route_id}/rules/{id}")]
pub async fn delete_route(state: web::Data<AppState>, path: web::Path<(String, String)>) -> ApiResult<HttpResponse> {
    let (route_id, id) = path.into_inner();
    let store = state.route_store(&route_id).map_err(ApiError::from)?;
    delete_impl(&store, &id)
}

#[post("/routes/{route_id}/rules/reorder")]
pub async fn reorder_route(
    state: web::Data<AppState>,
    route_id: web::Path<String>,
    body: web::Json<ReorderRequest>,
) -> ApiResult<HttpResponse> {
    let store = state.route_store(&route_id).map_err(ApiError::from)?;
    reorder_impl(&store, body.into_inner())
}
