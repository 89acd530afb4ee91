//! CRUD for the route directory (spec.md §4.6, §3 "Ownership" — routes live
//! only in the global store). Grounded in the teacher's
//! `router-api/src/api/settings/gateway_queries.rs` CRUD shape.

use actix_web::{delete, get, post, put, web, HttpResponse};
use waf_core::model::Route;

use crate::error_response::{ApiError, ApiResult};
use crate::state::AppState;

#[get("/routes")]
pub async fn list(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let routes = state.global_store.list_routes().map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(routes))
}

#[get("/routes/{id}")]
pub async fn get(state: web::Data<AppState>, id: web::Path<String>) -> ApiResult<HttpResponse> {
    match state.global_store.get_route(&id).map_err(ApiError::from)? {
        Some(route) => Ok(HttpResponse::Ok().json(route)),
        None => Err(ApiError(waf_core::WafError::NotFound(format!("route {id}")))),
    }
}

#[post("/routes")]
pub async fn create(state: web::Data<AppState>, route: web::Json<Route>) -> ApiResult<HttpResponse> {
    let route = route.into_inner();
    state.global_store.put_route(&route).map_err(ApiError::from)?;
    // Opening the route's own store up front ensures its schema exists
    // before the first request is ever routed to it.
    state.route_store(&route.id).map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(route))
}

#[put("/routes/{id}")]
pub async fn update(state: web::Data<AppState>, id: web::Path<String>, route: web::Json<Route>) -> ApiResult<HttpResponse> {
    let mut route = route.into_inner();
    route.id = id.into_inner();
    state.global_store.put_route(&route).map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(route))
}

#[delete("/routes/{id}")]
pub async fn delete(state: web::Data<AppState>, id: web::Path<String>) -> ApiResult<HttpResponse> {
    state.global_store.delete_route(&id).map_err(ApiError::from)?;
    Ok(HttpResponse::NoContent().finish())
}
