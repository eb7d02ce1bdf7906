//! Business metrics for Momenta.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `momenta_bookings_total{tier}` - Bookings created
//! - `momenta_claims_total{status}` - Claim transitions by resulting status
//! - `momenta_tickets_confirmed_total` - Seats consumed by approvals
//! - `momenta_oversell_clamped_total` - Seats approved beyond the remaining count
//! - `momenta_notifications_total{outcome}` - Notifications by delivery outcome
//! - `momenta_persistence_failures_total` - Commands rolled back because their write failed
//!
//! ## Gauges
//! - `momenta_seats_remaining{event,tier}` - Remaining seats after the last inventory change

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Metrics setup errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The Prometheus recorder could not be installed
    #[error("failed to install Prometheus recorder: {0}")]
    Install(String),
}

/// Install the Prometheus recorder and describe the business metrics.
///
/// The returned handle renders the text exposition served at `/metrics`.
///
/// # Errors
///
/// Returns [`MetricsError::Install`] if a global recorder is already installed.
pub fn install_prometheus() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;
    register_business_metrics();
    Ok(handle)
}

/// Register metric descriptions with the installed recorder.
pub fn register_business_metrics() {
    describe_counter!("momenta_bookings_total", "Bookings created, by tier");
    describe_counter!(
        "momenta_claims_total",
        "Payment claim transitions, by resulting status (pending, completed, failed, refunded)"
    );
    describe_counter!(
        "momenta_tickets_confirmed_total",
        "Seats taken off the inventory by approved claims"
    );
    describe_counter!(
        "momenta_oversell_clamped_total",
        "Seats approved after the tier counter had already reached zero"
    );
    describe_counter!(
        "momenta_notifications_total",
        "Customer notifications, by outcome (delivered, failed, skipped, dropped)"
    );
    describe_counter!(
        "momenta_persistence_failures_total",
        "Commands rolled back because their changes could not be written"
    );
    describe_gauge!(
        "momenta_seats_remaining",
        "Remaining seats per event and tier after the most recent inventory change"
    );

    tracing::info!("Business metrics registered");
}
