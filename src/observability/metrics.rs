//! Metrics collection and exposition.
//!
//! # Metrics
//! - `signer_requests_total` (counter): `/sign` requests by outcome and failing stage
//! - `signer_broadcasts_total` (counter): node verdicts (accepted, rejected, transport_error)
//! - `signer_request_duration_seconds` (histogram): successful requests by transfer type
//! - `signer_account_locks` (gauge): accounts with an active or queued request
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::signing::error::Stage;

/// Install the Prometheus recorder with a scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(outcome: &'static str, stage: Option<Stage>) {
    let stage = stage.map_or("none", Stage::as_str);
    ::metrics::counter!("signer_requests_total", "outcome" => outcome, "stage" => stage).increment(1);
}

pub fn record_broadcast(result: &'static str) {
    ::metrics::counter!("signer_broadcasts_total", "result" => result).increment(1);
}

pub fn record_duration(kind: &'static str, start: Instant) {
    ::metrics::histogram!("signer_request_duration_seconds", "type" => kind).record(start.elapsed().as_secs_f64());
}

pub fn set_account_locks(count: usize) {
    ::metrics::gauge!("signer_account_locks").set(count as f64);
}
