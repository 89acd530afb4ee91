//! CRUD for global-store custom block-response bodies (spec.md §3, §4.7
//! "block_decision always reads the global store's error pages").

use actix_web::{delete, get, post, web, HttpResponse};
use waf_core::model::ErrorPage;

use crate::error_response::{ApiError, ApiResult};
use crate::state::AppState;

#[get("/global/error-pages")]
pub async fn list(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let pages = state.global_store.list_error_pages().map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(pages))
}

#[post("/global/error-pages")]
pub async fn put(state: web::Data<AppState>, page: web::Json<ErrorPage>) -> ApiResult<HttpResponse> {
    let page = page.into_inner();
    state.global_store.put_error_page(&page).map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(page))
}

#[delete("/global/error-pages/{http_code}")]
pub async fn delete(state: web::Data<AppState>, http_code: web::Path<u16>) -> ApiResult<HttpResponse> {
    state
        .global_store
        .delete_error_page(http_code.into_inner())
        .map_err(ApiError::from)?;
    Ok(HttpResponse::NoContent().finish())
}
