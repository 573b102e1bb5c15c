//! Goods ingest, search, and matching metrics.

use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Goods metrics recorder
pub struct GoodsMetrics;

impl GoodsMetrics {
    // =========================================================================
    // Store Operations
    // =========================================================================

    /// Record an ingest batch
    pub fn record_ingest(submitted: usize, inserted: usize, duplicates: usize) {
        counter!("goods_ingested_total", "outcome" => "inserted").increment(inserted as u64);
        counter!("goods_ingested_total", "outcome" => "duplicate").increment(duplicates as u64);

        tracing::debug!(submitted, inserted, duplicates, "Recorded ingest batch");
    }

    /// Record a shopping-list search
    pub fn record_search(keywords: usize, hits: usize) {
        counter!("goods_operations_total", "operation" => "search").increment(1);
        histogram!("goods_search_hits").record(hits as f64);

        tracing::debug!(keywords, hits, "Recorded search");
    }

    /// Record a bulk removal
    pub fn record_purge(deleted: u64) {
        counter!("goods_operations_total", "operation" => "purge").increment(1);
        counter!("goods_purged_total").increment(deleted);
    }

    // =========================================================================
    // Item Info / Matching
    // =========================================================================

    /// Record an item-info refresh pass
    pub fn record_refresh(items_scanned: usize, posts_added: usize) {
        counter!("item_refresh_runs_total").increment(1);
        counter!("item_posts_added_total").increment(posts_added as u64);
        gauge!("items_tracked").set(items_scanned as f64);
    }

    /// Record a matching pass over the item collection
    pub fn record_match(items: usize, clients_notified: usize, malformed: usize) {
        counter!("match_runs_total").increment(1);
        counter!("match_clients_notified_total").increment(clients_notified as u64);
        if malformed > 0 {
            counter!("match_malformed_documents_total").increment(malformed as u64);
        }
        gauge!("match_clients_last_run").set(clients_notified as f64);

        tracing::debug!(items, clients_notified, malformed, "Recorded match run");
    }

    /// Record a failed scheduled job
    pub fn record_job_failed(job: &str) {
        counter!("scheduled_jobs_total", "job" => job.to_string(), "status" => "failed")
            .increment(1);
    }

    /// Record a completed scheduled job
    pub fn record_job_completed(job: &str, duration_secs: f64) {
        counter!("scheduled_jobs_total", "job" => job.to_string(), "status" => "completed")
            .increment(1);
        histogram!("scheduled_job_duration_seconds", "job" => job.to_string())
            .record(duration_secs);
    }
}

/// Timer guard for operation durations.
///
/// Records the duration when `stop()` is called or when dropped.
pub struct OperationTimer {
    start: Instant,
    operation: &'static str,
    stopped: bool,
}

impl OperationTimer {
    /// Start a new timer for an operation
    pub fn new(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
            stopped: false,
        }
    }

    /// Stop the timer and record the duration. Returns duration in milliseconds.
    pub fn stop(&mut self) -> u64 {
        if self.stopped {
            return 0;
        }
        self.stopped = true;

        let duration = self.start.elapsed();
        histogram!("goods_operation_duration_seconds", "operation" => self.operation)
            .record(duration.as_secs_f64());

        duration.as_millis() as u64
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if !self.stopped {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_stops_once() {
        let mut timer = OperationTimer::new("test");
        let _ = timer.stop();
        assert_eq!(timer.stop(), 0);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        GoodsMetrics::record_ingest(3, 2, 1);
        GoodsMetrics::record_search(2, 5);
        GoodsMetrics::record_match(4, 1, 0);
    }
}
