//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `ledger_records_created_total` - Credential records appended
//! - `ledger_records_skipped_total` - Issuance requests for an email already present
//! - `ledger_append_failures_total` - Appends that failed with an I/O or encoding error
//! - `ledger_malformed_lines_total` - Lines skipped while loading the ledger
//! - `ledger_append_duration_seconds` - Histogram of append latencies

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
///
/// Collectors live on a private registry, so several ledgers (and tests) can
/// each own one without clashing in the process-wide default registry.
#[derive(Clone)]
pub struct Metrics {
    /// Records appended
    pub records_created: IntCounter,

    /// Issuance requests answered from the index
    pub records_skipped: IntCounter,

    /// Failed appends
    pub append_failures: IntCounter,

    /// Malformed lines seen on load
    pub malformed_lines: IntCounter,

    /// Append duration histogram
    pub append_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("records_created", &self.records_created.get())
            .field("records_skipped", &self.records_skipped.get())
            .field("append_failures", &self.append_failures.get())
            .field("malformed_lines", &self.malformed_lines.get())
            .finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let records_created = IntCounter::new(
            "ledger_records_created_total",
            "Total number of credential records appended",
        )?;
        registry.register(Box::new(records_created.clone()))?;

        let records_skipped = IntCounter::new(
            "ledger_records_skipped_total",
            "Total number of issuance requests for emails already in the ledger",
        )?;
        registry.register(Box::new(records_skipped.clone()))?;

        let append_failures = IntCounter::new(
            "ledger_append_failures_total",
            "Total number of failed ledger appends",
        )?;
        registry.register(Box::new(append_failures.clone()))?;

        let malformed_lines = IntCounter::new(
            "ledger_malformed_lines_total",
            "Total number of unparseable ledger lines skipped on load",
        )?;
        registry.register(Box::new(malformed_lines.clone()))?;

        let append_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_append_duration_seconds",
                "Histogram of append latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500]),
        )?;
        registry.register(Box::new(append_duration.clone()))?;

        Ok(Self {
            records_created,
            records_skipped,
            append_failures,
            malformed_lines,
            append_duration,
            registry,
        })
    }

    /// Record a successful append
    pub fn record_created(&self, duration_seconds: f64) {
        self.records_created.inc();
        self.append_duration.observe(duration_seconds);
    }

    /// Record an issuance skipped because the email exists
    pub fn record_skipped(&self) {
        self.records_skipped.inc();
    }

    /// Record a failed append
    pub fn record_append_failure(&self) {
        self.append_failures.inc();
    }

    /// Record malformed lines found on load
    pub fn record_malformed_lines(&self, count: usize) {
        self.malformed_lines.inc_by(count as u64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn encode_text(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.records_created.get(), 0);
        assert_eq!(metrics.records_skipped.get(), 0);
    }

    #[test]
    fn test_independent_registries() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.record_created(0.001);
        assert_eq!(first.records_created.get(), 1);
        assert_eq!(second.records_created.get(), 0);
    }

    #[test]
    fn test_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.record_skipped();
        metrics.record_skipped();
        metrics.record_append_failure();
        metrics.record_malformed_lines(3);

        assert_eq!(metrics.records_skipped.get(), 2);
        assert_eq!(metrics.append_failures.get(), 1);
        assert_eq!(metrics.malformed_lines.get(), 3);
    }

    #[test]
    fn test_encode_text() {
        let metrics = Metrics::new().unwrap();
        metrics.record_created(0.002);
        let text = metrics.encode_text().unwrap();
        assert!(text.contains("ledger_records_created_total 1"));
        assert!(text.contains("ledger_append_duration_seconds_bucket"));
    }
}
