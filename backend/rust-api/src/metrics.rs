use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Generation pipeline metrics
    pub static ref GENERATION_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "generation_requests_total",
        "Total number of question generation requests",
        &["outcome"]
    )
    .unwrap();

    pub static ref GENERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "generation_duration_seconds",
        "Question generation round-trip duration in seconds",
        &["outcome"],
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]
    )
    .unwrap();

    pub static ref QUESTIONS_GENERATED_TOTAL: IntCounter = register_int_counter!(
        "questions_generated_total",
        "Total number of questions that survived validation"
    )
    .unwrap();

    pub static ref QUESTIONS_DISCARDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "questions_discarded_total",
        "Total number of generated records dropped by the validator",
        &["reason"]
    )
    .unwrap();

    // Business Metrics
    pub static ref SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sessions_total",
        "Total number of practice sessions",
        &["status"]
    )
    .unwrap();

    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "sessions_active",
        "Number of sessions currently held in the registry"
    )
    .unwrap();

    pub static ref ANSWERS_RECORDED_TOTAL: IntCounter = register_int_counter!(
        "answers_recorded_total",
        "Total number of answers recorded"
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // Just verify that all metrics are properly registered
        let _ = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .get();
        let _ = GENERATION_REQUESTS_TOTAL.with_label_values(&["ok"]).get();
    }

    #[test]
    fn test_render_metrics() {
        // Increment a counter to ensure we have some data
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let result = render_metrics();
        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.contains("http_requests_total"));
    }
}
