//! Observability infrastructure for the classification service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, predictions by model and label, errors, load state)
//! - Structured JSON logging with tracing

use crate::models::{ModelVariant, PredictionResult};
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServingMetricsInner> = OnceLock::new();

struct ServingMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    prediction_errors_total: IntCounterVec,
    models_loaded: IntGauge,
    dataset_pages_total: IntCounterVec,
}

impl ServingMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "fermix_prediction_latency_seconds",
                "Time spent on prediction requests with an object body, rejected ones included",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "fermix_predictions_total",
                "Predictions served by model variant and predicted label",
                &["model", "label"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter_vec!(
                "fermix_prediction_errors_total",
                "Rejected or failed prediction requests by error kind",
                &["kind"]
            )
            .expect("Failed to register prediction_errors_total"),

            models_loaded: register_int_gauge!(
                "fermix_models_loaded",
                "1 when the model cache is loaded, 0 otherwise"
            )
            .expect("Failed to register models_loaded"),

            dataset_pages_total: register_int_counter_vec!(
                "fermix_dataset_pages_total",
                "Dataset pages served by table",
                &["table"]
            )
            .expect("Failed to register dataset_pages_total"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ServingMetrics {
    _private: (),
}

impl Default for ServingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServingMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServingMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServingMetricsInner {
        GLOBAL_METRICS.get_or_init(ServingMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, variant: ModelVariant, label: &str) {
        self.inner()
            .predictions_total
            .with_label_values(&[variant.as_str(), label])
            .inc();
    }

    pub fn inc_prediction_errors(&self, kind: &str) {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn set_models_loaded(&self, loaded: bool) {
        self.inner().models_loaded.set(i64::from(loaded));
    }

    pub fn inc_dataset_pages(&self, sample: bool) {
        let table = if sample { "sample" } else { "full" };
        self.inner()
            .dataset_pages_total
            .with_label_values(&[table])
            .inc();
    }
}

/// Structured logger for service events
///
/// Emits event-tagged records for startup, model loading, predictions
/// and shutdown.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, models_dir: &str, port: u16) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            models_dir = %models_dir,
            port = port,
            "Classification API starting"
        );
    }

    pub fn log_models_loaded(&self, n_features: usize, created_utc: &str) {
        info!(
            event = "models_loaded",
            service = %self.service,
            n_features = n_features,
            created_utc = %created_utc,
            "Models loaded successfully"
        );
    }

    pub fn log_load_failure(&self, error: &str) {
        warn!(
            event = "models_load_failed",
            service = %self.service,
            error = %error,
            "Models failed to load. Prediction endpoint will not work."
        );
    }

    pub fn log_prediction(&self, result: &PredictionResult, supplied: usize) {
        info!(
            event = "prediction_served",
            service = %self.service,
            model = %result.model_used,
            predicted_class = result.predicted_class,
            predicted_label = %result.predicted_label,
            confidence = result.confidence,
            supplied_features = supplied,
            "Prediction served"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Classification API shutting down"
        );
    }
}
