//! Metrics for the scraper.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed with [`init`].

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::fmt;
use tracing::info;

use crate::error::{Result, ScraperError};

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Serial number normalizer
    SerialNoRecognized,
    SerialNoUnrecognized,

    // HTTP requests made by source clients
    SourcesRequestsSuccess,
    SourcesRequestsError,
    SourcesRequestDuration,

    // Lookup outcomes per source
    LookupHits,
    LookupMisses,
    LookupFailures,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SerialNoRecognized => "jav_serial_no_recognized_total",
            MetricName::SerialNoUnrecognized => "jav_serial_no_unrecognized_total",

            MetricName::SourcesRequestsSuccess => "jav_sources_requests_success_total",
            MetricName::SourcesRequestsError => "jav_sources_requests_error_total",
            MetricName::SourcesRequestDuration => "jav_sources_request_duration_seconds",

            MetricName::LookupHits => "jav_lookup_hits_total",
            MetricName::LookupMisses => "jav_lookup_misses_total",
            MetricName::LookupFailures => "jav_lookup_failures_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            SerialNoRecognized,
            SerialNoUnrecognized,
            SourcesRequestsSuccess,
            SourcesRequestsError,
            SourcesRequestDuration,
            LookupHits,
            LookupMisses,
            LookupFailures,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Calling it again is a no-op.
pub fn init() -> Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ScraperError::Config(format!("Failed to install Prometheus recorder: {e}")))?;
    let _ = METRICS_HANDLE.set(handle);
    info!("Metrics system initialized");
    Ok(())
}

/// Prometheus text exposition, if the recorder is installed
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod serial_no {
    use super::MetricName;

    pub fn recognized(recognizer: &'static str) {
        ::metrics::counter!(MetricName::SerialNoRecognized.as_str(), "recognizer" => recognizer).increment(1);
    }

    pub fn unrecognized() {
        ::metrics::counter!(MetricName::SerialNoUnrecognized.as_str()).increment(1);
    }
}

pub mod sources {
    use super::MetricName;

    /// Record a successful request
    pub fn request_success() {
        ::metrics::counter!(MetricName::SourcesRequestsSuccess.as_str()).increment(1);
    }

    /// Record a failed request
    pub fn request_error() {
        ::metrics::counter!(MetricName::SourcesRequestsError.as_str()).increment(1);
    }

    /// Record request duration
    pub fn request_duration(secs: f64) {
        ::metrics::histogram!(MetricName::SourcesRequestDuration.as_str()).record(secs);
    }
}

pub mod lookup {
    use super::MetricName;

    pub fn hit(source: &'static str) {
        ::metrics::counter!(MetricName::LookupHits.as_str(), "source" => source).increment(1);
    }

    pub fn miss(source: &'static str) {
        ::metrics::counter!(MetricName::LookupMisses.as_str(), "source" => source).increment(1);
    }

    pub fn failure(source: &'static str) {
        ::metrics::counter!(MetricName::LookupFailures.as_str(), "source" => source).increment(1);
    }
}
