//! Administrator accounts and session login, mirroring the teacher's
//! `router-api/src/api/users/handlers` module: a public login endpoint plus
//! role-gated CRUD behind the JWT middleware.

use actix_web::{delete, get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use waf_core::store::{Role, User};

use crate::auth::token::{self, AuthConfig};
use crate::auth::Claims;
use crate::error_response::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[post("/users/login")]
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> ApiResult<HttpResponse> {
    let user = state
        .global_store
        .get_user_by_username(&body.username)
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError(waf_core::WafError::Unauthorized("invalid username or password".to_string())))?;

    if !user.verify_password(&body.password) {
        return Err(ApiError(waf_core::WafError::Unauthorized(
            "invalid username or password".to_string(),
        )));
    }

    let config = AuthConfig::default();
    let token = token::generate_token(&user, &config)
        .map_err(|e| ApiError(waf_core::WafError::Internal(format!("failed to sign token: {e}"))))?;

    Ok(HttpResponse::Ok().json(LoginResponse { token, user }))
}

#[get("/users")]
pub async fn list(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let users = state.global_store.list_users().map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(users))
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

#[post("/users/admin")]
pub async fn create(state: web::Data<AppState>, body: web::Json<CreateUserRequest>) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let user = User::new(body.username, body.email, &body.password, Role::from(body.role.as_str()));
    state.global_store.insert_user(&user).map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(user))
}

#[get("/users/{id}")]
pub async fn get(state: web::Data<AppState>, id: web::Path<String>, claims: web::ReqData<Claims>) -> ApiResult<HttpResponse> {
    if !token::can_modify_user(&claims.sub, &claims.role, &id) {
        return Err(ApiError(waf_core::WafError::Forbidden(
            "cannot view another user's account".to_string(),
        )));
    }
    match state.global_store.get_user(&id).map_err(ApiError::from)? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(ApiError(waf_core::WafError::NotFound(format!("user {id}")))),
    }
}

#[delete("/users/admin/{id}")]
pub async fn delete(state: web::Data<AppState>, id: web::Path<String>) -> ApiResult<HttpResponse> {
    state.global_store.delete_user(&id).map_err(ApiError::from)?;
    Ok(HttpResponse::NoContent().finish())
}
