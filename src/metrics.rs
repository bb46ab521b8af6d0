// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for zone builds.
//!
//! All metrics use the `cmdb_dnsa_` prefix. dnsa is a short-lived command, so
//! instead of serving `/metrics` the registry is written in text exposition
//! format to a file for the node-exporter textfile collector.
//!
//! # Example
//!
//! ```rust,no_run
//! use dnsa::metrics::{record_zone_build, write_textfile, ZoneSide, BuildResult};
//! use std::path::Path;
//!
//! record_zone_build(ZoneSide::Forward, BuildResult::Built, std::time::Duration::from_millis(40));
//! write_textfile(Path::new("/var/lib/node_exporter/dnsa.prom")).ok();
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use crate::bind9::writer;
use crate::constants::METRICS_NAMESPACE;
use crate::dns_errors::Result;

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Build Metrics
// ============================================================================

/// Zone builds by side and result
///
/// Labels:
/// - `side`: `forward` or `reverse`
/// - `result`: `built`, `unchanged`, `invalid`, `error`
pub static ZONE_BUILDS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_zone_builds_total"),
        "Total number of zone builds by side and result",
    );
    let counter = CounterVec::new(opts, &["side", "result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of zone builds in seconds
pub static ZONE_BUILD_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_zone_build_duration_seconds"),
        "Duration of zone builds in seconds by side",
    )
    .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["side"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// PTR records changed by reverse-zone reconciliation
///
/// Labels:
/// - `action`: `added` or `removed`
pub static PTR_RECORDS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_ptr_records_total"),
        "Total number of PTR records added or removed by reconciliation",
    );
    let counter = CounterVec::new(opts, &["action"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// External Process Metrics
// ============================================================================

/// Zone checker verdicts
///
/// Labels:
/// - `verdict`: `valid`, `invalid`, `unavailable`
pub static CHECKER_VERDICTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_checker_verdicts_total"),
        "Total number of zone checker runs by verdict",
    );
    let counter = CounterVec::new(opts, &["verdict"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Nameserver reloads
///
/// Labels:
/// - `status`: `success`, `failure`, `skipped`
pub static RELOADS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reloads_total"),
        "Total number of nameserver reload attempts by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Which kind of zone a build was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSide {
    Forward,
    Reverse,
}

impl ZoneSide {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
        }
    }
}

/// How a zone build ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildResult {
    Built,
    Unchanged,
    Invalid,
    Error,
}

impl BuildResult {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Built => "built",
            Self::Unchanged => "unchanged",
            Self::Invalid => "invalid",
            Self::Error => "error",
        }
    }
}

/// Record a finished zone build
pub fn record_zone_build(side: ZoneSide, result: BuildResult, duration: Duration) {
    ZONE_BUILDS_TOTAL
        .with_label_values(&[side.as_str(), result.as_str()])
        .inc();
    ZONE_BUILD_DURATION_SECONDS
        .with_label_values(&[side.as_str()])
        .observe(duration.as_secs_f64());
}

/// Record the outcome of a reverse-zone reconciliation
pub fn record_ptr_changes(added: usize, removed: usize) {
    #[allow(clippy::cast_precision_loss)]
    {
        PTR_RECORDS_TOTAL
            .with_label_values(&["added"])
            .inc_by(added as f64);
        PTR_RECORDS_TOTAL
            .with_label_values(&["removed"])
            .inc_by(removed as f64);
    }
}

/// Record a zone checker verdict (`valid`, `invalid` or `unavailable`)
pub fn record_checker_verdict(verdict: &str) {
    CHECKER_VERDICTS_TOTAL.with_label_values(&[verdict]).inc();
}

/// Record a reload attempt (`success`, `failure` or `skipped`)
pub fn record_reload(status: &str) {
    RELOADS_TOTAL.with_label_values(&[status]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

/// Write all metrics to `path`, replacing it atomically.
///
/// # Errors
/// Returns a file error if the textfile cannot be written. Encoding failures
/// are written as an empty file.
pub fn write_textfile(path: &Path) -> Result<()> {
    let text = gather_metrics().unwrap_or_default();
    writer::write_atomic(path, &text)
}
