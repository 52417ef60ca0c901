use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all analysis server metrics
const PREFIX: &str = "affect_analysis";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.1, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Analysis Metrics
    pub static ref ANALYSIS_OUTCOMES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_analysis_outcomes_total"),
            "Analyze calls by outcome (cached, analyzed or error kind)"
        ),
        &["outcome"]
    ).expect("Failed to create analysis_outcomes_total metric");

    pub static ref ANALYSIS_STAGE_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_analysis_stage_duration_seconds"),
            "Duration of each analysis pipeline stage in seconds"
        )
        .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
        &["stage"]
    ).expect("Failed to create analysis_stage_duration_seconds metric");

    pub static ref ANALYSIS_RECORDS: Gauge = Gauge::new(
        format!("{PREFIX}_analysis_records"),
        "Number of stored analysis records"
    ).expect("Failed to create analysis_records metric");

    // Mood Metrics
    pub static ref MOOD_PREDICTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_mood_predictions_total"), "Mood predictions by status"),
        &["status"]
    ).expect("Failed to create mood_predictions_total metric");

    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(ANALYSIS_OUTCOMES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ANALYSIS_STAGE_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(ANALYSIS_RECORDS.clone()));
    let _ = REGISTRY.register(Box::new(MOOD_PREDICTIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record how an analyze call ended
pub fn record_analysis_outcome(outcome: &str) {
    ANALYSIS_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
    if outcome == "analyzed" {
        ANALYSIS_RECORDS.inc();
    }
}

/// Record the duration of one pipeline stage
pub fn record_stage_duration(stage: &str, duration: Duration) {
    ANALYSIS_STAGE_DURATION_SECONDS
        .with_label_values(&[stage])
        .observe(duration.as_secs_f64());
}

pub fn set_analysis_records(count: usize) {
    ANALYSIS_RECORDS.set(count as f64);
}

/// Record a mood prediction
pub fn record_mood_prediction(status: &str) {
    MOOD_PREDICTIONS_TOTAL.with_label_values(&[status]).inc();
}

/// Groups request paths so that track ids don't create one label per track.
pub fn categorize_endpoint(path: &str) -> &'static str {
    if path.starts_with("/v1/analysis/analyze") || path.starts_with("/v1/analysis/track/") {
        "analyze"
    } else if path.starts_with("/v1/analysis/mood") {
        "mood"
    } else if path == "/" {
        "home"
    } else {
        "other"
    }
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    // RSS is reported in kB
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<f64>() {
                            PROCESS_MEMORY_BYTES.set(kb * 1024.0);
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
