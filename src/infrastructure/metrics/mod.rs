//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Rate limit rejections by policy
//! - Recurring job executions and durations
//! - Audit events written and failed, email deliveries
//! - Database connection pool gauges

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

const NAMESPACE: &str = "netrock";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Requests rejected by the rate limiter
pub static RATE_LIMITED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rate_limited_total", "Requests rejected by rate limiting").namespace(NAMESPACE),
        &["policy"],
    )
    .expect("Failed to create RATE_LIMITED_TOTAL metric")
});

/// Recurring job executions by outcome
pub static JOB_EXECUTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("job_executions_total", "Recurring job executions").namespace(NAMESPACE),
        &["job", "status"],
    )
    .expect("Failed to create JOB_EXECUTIONS_TOTAL metric")
});

pub static JOB_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0];
    HistogramVec::new(
        HistogramOpts::new("job_duration_seconds", "Recurring job duration in seconds")
            .namespace(NAMESPACE)
            .buckets(buckets),
        &["job"],
    )
    .expect("Failed to create JOB_DURATION_SECONDS metric")
});

/// Audit rows written, by action
pub static AUDIT_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("audit_events_total", "Audit events written").namespace(NAMESPACE),
        &["action"],
    )
    .expect("Failed to create AUDIT_EVENTS_TOTAL metric")
});

/// Audit rows that could not be written
pub static AUDIT_WRITE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("audit_write_failures_total", "Audit events that failed to persist")
            .namespace(NAMESPACE),
    )
    .expect("Failed to create AUDIT_WRITE_FAILURES_TOTAL metric")
});

pub static EMAILS_SENT_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("emails_sent_total", "Transactional emails by outcome").namespace(NAMESPACE),
        &["template", "status"],
    )
    .expect("Failed to create EMAILS_SENT_TOTAL metric")
});

/// Database connection pool stats
pub static DB_POOL_CONNECTIONS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("db_pool_connections", "Database connection pool statistics")
            .namespace(NAMESPACE),
        &["state"], // "idle", "active", "max"
    )
    .expect("Failed to create DB_POOL_CONNECTIONS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(RATE_LIMITED_TOTAL.clone()),
        Box::new(JOB_EXECUTIONS_TOTAL.clone()),
        Box::new(JOB_DURATION_SECONDS.clone()),
        Box::new(AUDIT_EVENTS_TOTAL.clone()),
        Box::new(AUDIT_WRITE_FAILURES_TOTAL.clone()),
        Box::new(EMAILS_SENT_TOTAL.clone()),
        Box::new(DB_POOL_CONNECTIONS.clone()),
    ];

    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            tracing::error!(error = %e, "Failed to register metric");
        }
    }
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

pub fn record_rate_limited(policy: &str) {
    RATE_LIMITED_TOTAL.with_label_values(&[policy]).inc();
}

pub fn record_job_execution(job: &str, status: &str, duration_secs: f64) {
    JOB_EXECUTIONS_TOTAL.with_label_values(&[job, status]).inc();
    JOB_DURATION_SECONDS
        .with_label_values(&[job])
        .observe(duration_secs);
}

pub fn record_audit_event(action: &str) {
    AUDIT_EVENTS_TOTAL.with_label_values(&[action]).inc();
}

pub fn record_audit_failure() {
    AUDIT_WRITE_FAILURES_TOTAL.inc();
}

pub fn record_email(template: &str, delivered: bool) {
    let status = if delivered { "sent" } else { "failed" };
    EMAILS_SENT_TOTAL.with_label_values(&[template, status]).inc();
}

/// Helper to update database pool stats
pub fn update_db_pool_stats(idle: u32, active: u32, max: u32) {
    DB_POOL_CONNECTIONS
        .with_label_values(&["idle"])
        .set(idle as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["active"])
        .set(active as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["max"])
        .set(max as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_metrics_are_exported() {
        record_http_request("GET", "/api/v1/contacts", 200, 0.01);
        record_job_execution("expired-email-token-cleanup", "Succeeded", 0.2);
        record_rate_limited("auth");

        let output = gather_metrics();
        assert!(output.contains("netrock_http_requests_total"));
        assert!(output.contains("netrock_job_executions_total"));
        assert!(output.contains(r#"policy="auth""#));
    }
}
