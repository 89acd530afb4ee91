//! In-process registry of named origin services, resolved by a route's
//! `origin_service_name` (spec.md §3, §4.8).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::WafResult;
use crate::field::RawRequest;

use super::OriginResponse;

/// A named, in-process origin a route can forward to without leaving the
/// host process — e.g. a loopback admin API, or a test double.
#[async_trait]
pub trait OriginService: Send + Sync {
    async fn dispatch(&self, request: &RawRequest) -> WafResult<OriginResponse>;
}

/// Maps service names to their [`OriginService`] implementation.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Arc<dyn OriginService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, service: Arc<dyn OriginService>) {
        self.services.insert(name.into(), service);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn OriginService>> {
        self.services.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl OriginService for Echo {
        async fn dispatch(&self, _request: &RawRequest) -> WafResult<OriginResponse> {
            Ok(OriginResponse {
                status: 200,
                headers: HashMap::new(),
                body: b"ok".to_vec(),
            })
        }
    }

    #[tokio::test]
    async fn registers_and_resolves_by_name() {
        let mut registry = ServiceRegistry::new();
        registry.register("echo", Arc::new(Echo));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("missing").is_none());
    }
}
