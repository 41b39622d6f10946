// SPDX-FileCopyrightText: 2026 Memohome Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. Nothing is exported unless the embedding
//! application installs a recorder.

use metrics::{describe_counter, describe_histogram};

/// Register all memory metric descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("memohome_memory_added_total", "Memory units persisted");
    describe_counter!(
        "memohome_summary_fallback_total",
        "Memory units stored with the raw-text fallback summary"
    );
    describe_counter!("memohome_memory_searches_total", "Semantic memory searches");
    describe_histogram!(
        "memohome_memory_search_results",
        "Number of hits returned per search"
    );
    describe_histogram!(
        "memohome_model_call_seconds",
        "Latency of summarization and embedding calls in seconds"
    );
}

/// Record a persisted unit. `fallback` is true when the raw-text summary was used.
pub fn record_memory_added(fallback: bool) {
    let summary = if fallback { "fallback" } else { "model" };
    metrics::counter!("memohome_memory_added_total", "summary" => summary).increment(1);
}

pub fn record_summary_fallback() {
    metrics::counter!("memohome_summary_fallback_total").increment(1);
}

/// Record a completed search and the number of hits it returned.
pub fn record_search(results: usize) {
    metrics::counter!("memohome_memory_searches_total").increment(1);
    metrics::histogram!("memohome_memory_search_results").record(results as f64);
}

/// Record the latency of a model call. `capability` is `summarize` or `embed`.
pub fn record_model_call(capability: &'static str, seconds: f64) {
    metrics::histogram!("memohome_model_call_seconds", "capability" => capability).record(seconds);
}
