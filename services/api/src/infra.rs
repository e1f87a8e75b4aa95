use metrics_exporter_prometheus::PrometheusHandle;
use mindful_track::engagement::{EngagementService, InMemoryEngagementStore, ServiceSettings};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type InMemoryEngagementService = EngagementService<InMemoryEngagementStore>;

/// Service backed by a fresh process-local store.
pub(crate) fn in_memory_service(settings: ServiceSettings) -> Arc<InMemoryEngagementService> {
    let store = Arc::new(InMemoryEngagementStore::new());
    Arc::new(EngagementService::new(store, settings))
}
