//! Observability utilities for the EZBuy matcher.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Goods/matching-specific metric helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, GoodsMetrics};
//!
//! init_metrics();
//! GoodsMetrics::record_ingest(10, 8, 2);
//! ```

pub mod goods;

pub use goods::{GoodsMetrics, OperationTimer};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use tracing::{info, warn};

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder without an HTTP listener.
///
/// Returns `None` when another recorder is already installed (e.g. the
/// exporter from [`serve_metrics`]).
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Some(handle);
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            register_metric_descriptions();
            info!("Prometheus metrics recorder initialized");
            Some(METRICS_HANDLE.get_or_init(|| handle))
        }
        Err(e) => {
            warn!(error = %e, "Metrics recorder not installed");
            None
        }
    }
}

/// Install the recorder together with a scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn serve_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    register_metric_descriptions();
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    describe_counter!("goods_ingested_total", "Goods submitted for ingest by outcome");
    describe_counter!("goods_operations_total", "Goods store operations by type");
    describe_counter!("goods_purged_total", "Goods removed by purge");
    describe_histogram!("goods_search_hits", "Hits returned per shopping-list search");
    describe_histogram!(
        "goods_operation_duration_seconds",
        "Goods operation duration in seconds"
    );

    describe_counter!("item_refresh_runs_total", "Item-info refresh passes");
    describe_counter!("item_posts_added_total", "Posts appended to item documents");
    describe_gauge!("items_tracked", "Item documents seen in the last refresh");

    describe_counter!("match_runs_total", "Matching passes over the item collection");
    describe_counter!(
        "match_clients_notified_total",
        "Client notifications produced by matching"
    );
    describe_counter!(
        "match_malformed_documents_total",
        "Item documents skipped as malformed"
    );
    describe_gauge!("match_clients_last_run", "Clients notified in the last run");

    describe_counter!("scheduled_jobs_total", "Scheduled jobs by status");
    describe_histogram!(
        "scheduled_job_duration_seconds",
        "Scheduled job duration in seconds"
    );
}
