//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_sync_polls_total` (counter): long-poll rounds by outcome
//! - `config_sync_refreshes_total` (counter): namespace refreshes by namespace, outcome
//! - `config_sync_entries_created_total` (counter): cache misses that built a loader
//! - `config_sync_cache_entries` (gauge): cached namespaces
//! - `config_sync_active_generation` (gauge): latest poll-loop generation
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install a Prometheus recorder with a scrape endpoint on `addr`.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_poll(outcome: &'static str) {
    counter!("config_sync_polls_total", "outcome" => outcome).increment(1);
}

pub fn record_refresh(namespace: &str, success: bool) {
    let outcome = if success { "ok" } else { "failed" };
    counter!(
        "config_sync_refreshes_total",
        "namespace" => namespace.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_entry_created() {
    counter!("config_sync_entries_created_total").increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("config_sync_cache_entries").set(entries as f64);
}

pub fn record_generation(generation: u64) {
    gauge!("config_sync_active_generation").set(generation as f64);
}
