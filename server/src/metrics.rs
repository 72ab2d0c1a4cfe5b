//! Prometheus metrics for observability and monitoring.
//!
//! Installs the global `metrics` recorder and serves its rendering on a
//! dedicated listener, apart from the API.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `bookings_confirmed_total` - Bookings admitted
//! - `bookings_cancelled_total` - Bookings cancelled
//! - `bookings_rejected_total{operation,reason}` - Refused book/cancel requests
//! - `reviews_created_total` - Reviews stored
//! - `booking_store_transient_errors_total{kind}` - Lock timeouts and retryable database failures
//!
//! ## Histograms
//! - `booking_unit_of_work_duration_seconds{operation}` - Time inside a reservation transaction

use axum::{Router, routing::get};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
    /// Failed to bind HTTP server
    #[error("Failed to bind metrics server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Prometheus metrics server.
///
/// Exposes metrics on `GET /metrics` for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Install the recorder and start serving `/metrics` in the background.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be installed or the listener cannot bind.
    pub async fn start(&mut self) -> Result<(), MetricsError> {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;
        // Descriptions only reach the recorder installed above.
        register_metrics();

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let render_handle = handle.clone();
        let app = Router::new().route(
            "/metrics",
            get(move || {
                let handle = render_handle.clone();
                async move { handle.render() }
            }),
        );

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Metrics server failed");
            }
        });

        tracing::info!(
            addr = %self.addr,
            "Metrics server started - available at http://{}/metrics",
            self.addr
        );
        self.handle = Some(handle);
        Ok(())
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if server hasn't been started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!("bookings_confirmed_total", "Total number of bookings admitted");
    describe_counter!(
        "bookings_cancelled_total",
        "Total number of bookings cancelled"
    );
    describe_counter!(
        "bookings_rejected_total",
        "Total number of refused book and cancel requests by reason"
    );
    describe_counter!("reviews_created_total", "Total number of reviews stored");
    describe_counter!(
        "booking_store_transient_errors_total",
        "Lock timeouts, serialization failures and deadlocks reported by the store"
    );
    describe_histogram!(
        "booking_unit_of_work_duration_seconds",
        "Time spent inside a reservation transaction"
    );
}
