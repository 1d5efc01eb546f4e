// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_gauge};

/// Register all Attune metric descriptions.
///
/// Called once at startup after a recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "attune_jobs_total",
        "Analysis jobs that reached a terminal outcome"
    );
    describe_gauge!("attune_jobs_active", "Analysis jobs currently being polled");
    describe_counter!("attune_sessions_finalized_total", "Sessions finalized");
    describe_counter!(
        "attune_segments_indexed_total",
        "Segments written to the context index"
    );
}

/// Record a job reaching a terminal outcome (`succeeded`, `failed`, `timeout`, `unexpected`).
pub fn record_job(provider: &str, outcome: &'static str) {
    metrics::counter!("attune_jobs_total", "provider" => provider.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn set_active_jobs(count: usize) {
    metrics::gauge!("attune_jobs_active").set(count as f64);
}

pub fn record_session_finalized() {
    metrics::counter!("attune_sessions_finalized_total").increment(1);
}

pub fn record_segment_indexed(content_type: &str) {
    metrics::counter!("attune_segments_indexed_total", "content_type" => content_type.to_string())
        .increment(1);
}
