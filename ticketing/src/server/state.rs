//! Application state for the HTTP server.

use crate::app::TicketingService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::fmt;

/// State shared by every handler. Cloning shares the underlying store.
#[derive(Clone)]
pub struct AppState {
    /// Ticketing commands and queries
    pub service: TicketingService,
    /// Prometheus renderer; `/metrics` answers 404 without one
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state without a metrics exporter.
    #[must_use]
    pub const fn new(service: TicketingService) -> Self {
        Self {
            service,
            metrics: None,
        }
    }

    /// Serve Prometheus metrics from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
