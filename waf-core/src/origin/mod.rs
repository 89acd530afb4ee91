//! C8 — the origin dispatcher (spec.md §4.8).
//!
//! A route's `origin_type` selects one of two forwarding strategies:
//! `url` goes out over plain HTTP via `reqwest` (the teacher's own
//! `router-core` proxies at the transport layer through `pingora`, which is
//! out of scope here per spec.md's "no transport-layer implementation"
//! non-goal); `service` forwards to an in-process [`OriginService`]
//! resolved from a [`ServiceRegistry`], loosely in the spirit of the
//! teacher's `service::registry` module but a plain synchronous lookup
//! instead of a Redis-backed watcher, since there is no external control
//! signal to watch for here.

mod registry;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::field::RawRequest;
use crate::model::{OriginType, Route};

pub use registry::{OriginService, ServiceRegistry};

/// The response an origin returned, carried back up through the pipeline
/// orchestrator untouched (spec.md §4.8 "the dispatcher does not interpret
/// the origin's response").
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Why a dispatch attempt did not produce an [`OriginResponse`]. Distinct
/// from a genuine upstream failure: a misconfigured origin (unknown
/// service, missing URL) is a configuration error in this route, not a
/// network condition, and the orchestrator reports it differently
/// (spec.md §4.8 "synthesize 500 ... emit ORIGIN_MISCONFIG").
#[derive(Debug, Clone)]
pub enum DispatchError {
    Misconfigured(String),
    Unreachable(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Misconfigured(detail) => write!(f, "misconfigured origin: {detail}"),
            DispatchError::Unreachable(detail) => write!(f, "unreachable origin: {detail}"),
        }
    }
}

/// Forwards `request` to the origin named by `route`, using `registry` for
/// service-type origins.
pub async fn dispatch(
    route: &Route,
    request: &RawRequest,
    registry: &ServiceRegistry,
    timeout: Duration,
) -> Result<OriginResponse, DispatchError> {
    match route.origin_type {
        OriginType::Url => {
            let base = route
                .origin_url
                .as_deref()
                .ok_or_else(|| DispatchError::Misconfigured(format!("route {} has no origin_url", route.id)))?;
            dispatch_url(base, request, timeout).await
        }
        OriginType::Service => {
            let name = route.origin_service_name.as_deref().ok_or_else(|| {
                DispatchError::Misconfigured(format!("route {} has no origin_service_name", route.id))
            })?;
            let service = registry
                .get(name)
                .ok_or_else(|| DispatchError::Misconfigured(format!("unknown origin service {name}")))?;
            service
                .dispatch(request)
                .await
                .map_err(|e| DispatchError::Unreachable(e.to_string()))
        }
    }
}

async fn dispatch_url(base: &str, request: &RawRequest, timeout: Duration) -> Result<OriginResponse, DispatchError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DispatchError::Unreachable(format!("failed to build http client: {e}")))?;

    let url = format!("{}{}", base.trim_end_matches('/'), request.url);
    let method = reqwest::Method::from_bytes(request.method.as_bytes())
        .map_err(|_| DispatchError::Unreachable(format!("invalid method {}", request.method)))?;

    let mut builder = client.request(method, &url);
    for (name, value) in request.headers.iter() {
        builder = builder.header(name, value);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| DispatchError::Unreachable(format!("origin request failed: {e}")))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
        .collect();
    let body = response
        .bytes()
        .await
        .map_err(|e| DispatchError::Unreachable(format!("failed to read origin body: {e}")))?
        .to_vec();

    Ok(OriginResponse { status, headers, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::HeaderMap;
    use std::collections::HashMap as Map;

    fn req() -> RawRequest {
        RawRequest {
            method: "GET".to_string(),
            url: "/health".to_string(),
            headers: HeaderMap::new(),
            meta: Map::new(),
        }
    }

    #[tokio::test]
    async fn dispatch_fails_gracefully_for_unresolvable_host() {
        let route = Route {
            id: "r1".to_string(),
            incoming_host: "api.example.com".to_string(),
            origin_type: OriginType::Url,
            origin_url: Some("http://origin.invalid.test".to_string()),
            origin_service_name: None,
            enabled: true,
        };
        let registry = ServiceRegistry::new();
        let result = dispatch(&route, &req(), &registry, Duration::from_millis(200)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn dispatch_rejects_unknown_service() {
        let route = Route {
            id: "r1".to_string(),
            incoming_host: "api.example.com".to_string(),
            origin_type: OriginType::Service,
            origin_url: None,
            origin_service_name: Some("missing".to_string()),
            enabled: true,
        };
        let registry = ServiceRegistry::new();
        let result = dispatch(&route, &req(), &registry, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(DispatchError::Misconfigured(_))));
    }

    #[tokio::test]
    async fn dispatch_reports_missing_origin_url_as_misconfigured() {
        let route = Route {
            id: "r1".to_string(),
            incoming_host: "api.example.com".to_string(),
            origin_type: OriginType::Url,
            origin_url: None,
            origin_service_name: None,
            enabled: true,
        };
        let registry = ServiceRegistry::new();
        let result = dispatch(&route, &req(), &registry, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(DispatchError::Misconfigured(_))));
    }
}
