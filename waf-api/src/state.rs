//! Shared application state injected into every handler via
//! `web::Data<AppState>`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use waf_core::events::EventBus;
use waf_core::eval::RegexCache;
use waf_core::origin::ServiceRegistry;
use waf_core::pipeline::Pipeline;
use waf_core::store::TenantStore;

use crate::sinks::AuditDecisionSink;

pub struct AppState {
    pub global_store: Arc<TenantStore>,
    pub pipeline: Arc<Pipeline>,
    pub event_bus: Arc<EventBus>,
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(data_dir: PathBuf, event_channel_capacity: usize, default_deadline: Duration) -> waf_core::WafResult<Self> {
        let global_store = Arc::new(TenantStore::open(&data_dir, waf_common::GLOBAL_TENANT_ID)?);
        global_store.bootstrap_default_admin()?;

        let event_bus = Arc::new(EventBus::spawn(
            event_channel_capacity,
            Arc::new(AuditDecisionSink::new(global_store.audit().clone())),
        ));

        let pipeline = Arc::new(Pipeline::new(
            global_store.clone(),
            data_dir.clone(),
            Arc::new(RegexCache::default()),
            Arc::new(ServiceRegistry::new()),
            event_bus.clone(),
            default_deadline,
        ));

        Ok(Self {
            global_store,
            pipeline,
            event_bus,
            data_dir,
        })
    }

    /// Opens (or returns the already-cached handle to) the per-route
    /// tenant store. Unlike the pipeline's own internal cache, this always
    /// opens a fresh handle since the configuration API is low-traffic
    /// compared to the hot path and correctness matters more than avoiding
    /// a repeated `TenantStore::open`.
    pub fn route_store(&self, route_id: &str) -> waf_core::WafResult<TenantStore> {
        TenantStore::open(&self.data_dir, route_id)
    }
}
