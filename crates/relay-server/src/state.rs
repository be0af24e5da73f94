//! Shared application state for the axum server.

use std::sync::Arc;

use relay_core::{MetricsRegistry, Orchestrator, RelaySettings};

/// Shared state accessible by all API handlers.
pub struct AppStateInner {
    pub settings: RelaySettings,
    pub orchestrator: Orchestrator,
    pub metrics: Arc<MetricsRegistry>,
}

pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    pub fn new(
        settings: RelaySettings,
        orchestrator: Orchestrator,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            settings,
            orchestrator,
            metrics,
        }
    }
}
