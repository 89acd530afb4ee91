//! Maps [`waf_core::WafError`] onto HTTP status codes at the actix-web
//! boundary (spec.md §7).

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use waf_core::WafError;

/// Newtype so this crate can implement the foreign `ResponseError` trait
/// for the foreign `WafError` type.
#[derive(Debug)]
pub struct ApiError(pub WafError);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<WafError> for ApiError {
    fn from(err: WafError) -> Self {
        ApiError(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            WafError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            WafError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            WafError::Forbidden(_) => StatusCode::FORBIDDEN,
            WafError::NotFound(_) => StatusCode::NOT_FOUND,
            WafError::Conflict(_) => StatusCode::CONFLICT,
            WafError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            WafError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            WafError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.0.to_string() }))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
