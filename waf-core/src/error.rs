//! Error taxonomy shared by every component of the core (spec.md §7).
//!
//! Mirrors the shape of the teacher's `module::database::DatabaseError`:
//! a flat `thiserror` enum with `#[from]` conversions from the lower-level
//! errors each component actually produces, so `?` composes across module
//! boundaries without manual mapping.

use thiserror::Error;

/// The closed set of error kinds the core ever produces. The control plane
/// (`waf-api`) maps each variant to an HTTP status code; the hot path never
/// lets one of these escape past the pipeline orchestrator (spec.md §7
/// "Propagation policy").
#[derive(Debug, Error)]
pub enum WafError {
    /// Schema violation, unknown field, or a request body that doesn't
    /// parse into the expected shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown rule, route, or error-page id.
    #[error("not found: {0}")]
    NotFound(String),

    /// Priority collision or duplicate host.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing or invalid administrator session.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but insufficient role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Origin unreachable, non-2xx/3xx from upstream, or misconfigured
    /// origin (unknown service name / missing URL).
    #[error("upstream error: {0}")]
    UpstreamError(String),

    /// A suspension point exceeded the request's deadline.
    #[error("timeout")]
    Timeout,

    /// Persistence or other unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for WafError {
    fn from(err: rusqlite::Error) -> Self {
        WafError::Internal(format!("sqlite error: {err}"))
    }
}

impl From<std::io::Error> for WafError {
    fn from(err: std::io::Error) -> Self {
        WafError::Internal(format!("io error: {err}"))
    }
}

impl From<serde_json::Error> for WafError {
    fn from(err: serde_json::Error) -> Self {
        WafError::InvalidInput(format!("json error: {err}"))
    }
}

/// Result alias used throughout `waf-core`.
pub type WafResult<T> = Result<T, WafError>;
