// Prometheus metrics for the Gradeline API

use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntGauge, Opts, Registry, TextEncoder,
};

lazy_static! {
    // Global registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Gradings completed (counter with language and verdict labels)
    pub static ref GRADINGS_COMPLETED: CounterVec = CounterVec::new(
        Opts::new("gradeline_gradings_total", "Total number of graded submissions"),
        &["language", "status"]
    )
    .expect("metric can be created");

    // End-to-end grading time, judge round trips and polling included
    pub static ref GRADING_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "gradeline_grading_duration_ms",
            "Grading time in milliseconds"
        )
        .buckets(vec![500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0, 60000.0]),
        &["language"]
    )
    .expect("metric can be created");

    // Sample runs against visible test cases
    pub static ref SAMPLE_RUNS: CounterVec = CounterVec::new(
        Opts::new("gradeline_sample_runs_total", "Total sample runs"),
        &["language"]
    )
    .expect("metric can be created");

    // Reference solution validations
    pub static ref REFERENCE_VALIDATIONS: CounterVec = CounterVec::new(
        Opts::new("gradeline_reference_validations_total", "Total reference solution checks"),
        &["outcome"]
    )
    .expect("metric can be created");

    // Requests answered with an error
    pub static ref REQUESTS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("gradeline_requests_rejected_total", "Total requests rejected"),
        &["reason"]
    )
    .expect("metric can be created");

    // Judge API keys currently rate-limited
    pub static ref CREDENTIALS_EXHAUSTED: IntGauge = IntGauge::new(
        "gradeline_credentials_exhausted",
        "Judge API keys currently marked as rate-limited"
    )
    .expect("metric can be created");
}

/// Initialize metrics registry
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(GRADINGS_COMPLETED.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(GRADING_DURATION.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(SAMPLE_RUNS.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(REFERENCE_VALIDATIONS.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(REQUESTS_REJECTED.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(CREDENTIALS_EXHAUSTED.clone()))
        .expect("collector can be registered");
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record a finished grading
pub fn record_grading(language: &str, status: &str, duration_ms: f64) {
    GRADINGS_COMPLETED.with_label_values(&[language, status]).inc();
    GRADING_DURATION.with_label_values(&[language]).observe(duration_ms);
}

/// Record a sample run
pub fn record_sample_run(language: &str) {
    SAMPLE_RUNS.with_label_values(&[language]).inc();
}

/// Record a reference solution check
pub fn record_reference_validation(outcome: &str) {
    REFERENCE_VALIDATIONS.with_label_values(&[outcome]).inc();
}

/// Record a rejected request
pub fn record_request_rejected(reason: &str) {
    REQUESTS_REJECTED.with_label_values(&[reason]).inc();
}

/// Mirror the credential pool into the exhausted-keys gauge
pub fn update_credentials_exhausted(count: usize) {
    CREDENTIALS_EXHAUSTED.set(count as i64);
}
