//! Prometheus instrumentation (§10.4): batch commits, prefix scans, backend
//! gets/sets/deletes, and registry registrations.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

const LATENCY_BUCKETS: &[f64] = &[0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0];

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    /// Committed batches, by outcome (`ok`/`failed`).
    pub static ref BATCH_COMMITS: IntCounterVec = IntCounterVec::new(
        Opts::new("storage_batch_commits_total", "Batch commits by outcome"),
        &["outcome"]
    ).unwrap();

    pub static ref BATCH_COMMIT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("storage_batch_commit_duration_seconds", "Batch commit duration")
            .buckets(LATENCY_BUCKETS.to_vec())
    ).unwrap();

    /// Counter rollbacks after a failed commit (§4.3).
    pub static ref COUNTER_ROLLBACKS: IntCounter =
        IntCounter::new("storage_counter_rollbacks_total", "txCount rollbacks after a failed commit").unwrap();

    /// Prefix scans by index family (e.g. "addr", "logs_topic0", "time").
    pub static ref PREFIX_SCANS: IntCounterVec = IntCounterVec::new(
        Opts::new("storage_prefix_scans_total", "Prefix scans by index family"),
        &["family"]
    ).unwrap();

    pub static ref PREFIX_SCAN_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("storage_prefix_scan_duration_seconds", "Prefix scan duration by index family")
            .buckets(LATENCY_BUCKETS.to_vec()),
        &["family"]
    ).unwrap();

    /// Backend-level get/set/delete counters, by namespace (meta/data/index).
    pub static ref BACKEND_GETS: IntCounterVec = IntCounterVec::new(
        Opts::new("storage_backend_gets_total", "Backend get() calls by namespace"),
        &["namespace"]
    ).unwrap();

    pub static ref BACKEND_SETS: IntCounterVec = IntCounterVec::new(
        Opts::new("storage_backend_sets_total", "Backend set() calls by namespace"),
        &["namespace"]
    ).unwrap();

    pub static ref BACKEND_DELETES: IntCounterVec = IntCounterVec::new(
        Opts::new("storage_backend_deletes_total", "Backend delete() calls by namespace"),
        &["namespace"]
    ).unwrap();

    pub static ref OPEN_COLUMN_FAMILIES: IntGauge =
        IntGauge::new("storage_open_column_families", "Number of open column families").unwrap();

    pub static ref BACKEND_REGISTRATIONS: IntCounter =
        IntCounter::new("storage_backend_registrations_total", "Backend types registered into the registry").unwrap();
}

/// Register every metric into [`REGISTRY`]. Idempotent in practice because
/// it runs once at process start; a second call would fail on duplicate
/// registration, matching Prometheus's own contract.
pub fn register_all() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(BATCH_COMMITS.clone()))?;
    REGISTRY.register(Box::new(BATCH_COMMIT_DURATION.clone()))?;
    REGISTRY.register(Box::new(COUNTER_ROLLBACKS.clone()))?;
    REGISTRY.register(Box::new(PREFIX_SCANS.clone()))?;
    REGISTRY.register(Box::new(PREFIX_SCAN_DURATION.clone()))?;
    REGISTRY.register(Box::new(BACKEND_GETS.clone()))?;
    REGISTRY.register(Box::new(BACKEND_SETS.clone()))?;
    REGISTRY.register(Box::new(BACKEND_DELETES.clone()))?;
    REGISTRY.register(Box::new(OPEN_COLUMN_FAMILIES.clone()))?;
    REGISTRY.register(Box::new(BACKEND_REGISTRATIONS.clone()))?;
    Ok(())
}

/// Gather metrics in Prometheus text exposition format. Wiring this to an
/// HTTP `/metrics` endpoint is the embedding caller's responsibility.
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer).expect("prometheus encoding is infallible for valid metric families");
    String::from_utf8(buffer).expect("prometheus text encoder always emits valid UTF-8")
}

pub fn record_batch_commit(outcome: &str, duration_secs: f64) {
    BATCH_COMMITS.with_label_values(&[outcome]).inc();
    BATCH_COMMIT_DURATION.observe(duration_secs);
}

pub fn record_counter_rollback() {
    COUNTER_ROLLBACKS.inc();
}

pub fn record_prefix_scan(family: &str, duration_secs: f64) {
    PREFIX_SCANS.with_label_values(&[family]).inc();
    PREFIX_SCAN_DURATION.with_label_values(&[family]).observe(duration_secs);
}

pub fn record_backend_get(namespace: &str) {
    BACKEND_GETS.with_label_values(&[namespace]).inc();
}

pub fn record_backend_set(namespace: &str) {
    BACKEND_SETS.with_label_values(&[namespace]).inc();
}

pub fn record_backend_delete(namespace: &str) {
    BACKEND_DELETES.with_label_values(&[namespace]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gather_includes_registered_metric_names() {
        let registry = Registry::new();
        let counter = IntCounter::new("storage_backend_registrations_total", "test").unwrap();
        registry.register(Box::new(counter.clone())).unwrap();
        counter.inc();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&registry.gather(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("storage_backend_registrations_total"));
    }

    #[test]
    fn record_helpers_do_not_panic() {
        record_batch_commit("ok", 0.001);
        record_counter_rollback();
        record_prefix_scan("addr", 0.0002);
        record_backend_get("data");
        record_backend_set("meta");
        record_backend_delete("index");
    }
}
