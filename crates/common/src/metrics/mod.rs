//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all BrokerForge metrics
pub const METRICS_PREFIX: &str = "brokerforge";

/// SLO-aligned histogram buckets for request latency (in seconds).
/// Host resolution sits on every storefront request, so the low end
/// matters: P50 < 10ms, P99 < 100ms for resolution.
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms - resolution P50 target
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms - resolution P99 target
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Buckets for provider API calls (external HTTP, typically slower)
pub const PROVIDER_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    15.00,  // 15s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Host resolution metrics
    describe_counter!(
        format!("{}_resolutions_total", METRICS_PREFIX),
        Unit::Count,
        "Total host resolutions by outcome"
    );

    describe_histogram!(
        format!("{}_resolution_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Host resolution latency in seconds"
    );

    // Provisioning metrics
    describe_counter!(
        format!("{}_zone_events_total", METRICS_PREFIX),
        Unit::Count,
        "Zone lifecycle events (created, activated, failed, deleted)"
    );

    // Provider metrics
    describe_counter!(
        format!("{}_provider_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Total external provider API calls"
    );

    describe_histogram!(
        format!("{}_provider_call_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "External provider API call latency in seconds"
    );

    // Database metrics
    describe_gauge!(
        format!("{}_db_connections_active", METRICS_PREFIX),
        Unit::Count,
        "Active database connections"
    );

    // Cache metrics
    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a host resolution
pub fn record_resolution(duration_secs: f64, outcome: &'static str) {
    counter!(
        format!("{}_resolutions_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        format!("{}_resolution_duration_seconds", METRICS_PREFIX),
        "outcome" => outcome
    )
    .record(duration_secs);
}

/// Helper to record a zone lifecycle event
pub fn record_zone_event(event: &'static str) {
    counter!(
        format!("{}_zone_events_total", METRICS_PREFIX),
        "event" => event
    )
    .increment(1);
}

/// Helper to record an external provider API call
pub fn record_provider_call(duration_secs: f64, provider: &str, operation: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_provider_calls_total", METRICS_PREFIX),
        "provider" => provider.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_provider_call_duration_seconds", METRICS_PREFIX),
        "provider" => provider.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        // Resolution SLO targets present
        assert!(LATENCY_BUCKETS.contains(&0.010));
        assert!(LATENCY_BUCKETS.contains(&0.100));
    }

    #[test]
    fn test_provider_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in PROVIDER_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_provider_call_metrics() {
        record_provider_call(0.25, "dns", "create_zone", true);
        record_provider_call(1.5, "platform", "replace_domains", false);
        // Just verify it runs without panic
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("GET", "/v2/resolve");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(200);
        // Just verify it runs without panic
    }
}
