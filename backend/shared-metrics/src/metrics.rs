use error_stack::ResultExt;
use lazy_static::lazy_static;
use prometheus::{
    self, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec, TextEncoder,
};

const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

lazy_static! {
    /// Inbound requests on either service's HTTP surface.
    pub static ref http_server_requests_total: IntCounterVec = register_int_counter_vec!(
        "http_server_requests_total",
        "Total number of inbound HTTP requests received",
        &["method", "route"]
    )
    .unwrap();

    pub static ref http_server_requests_successful: IntCounterVec = register_int_counter_vec!(
        "http_server_requests_successful",
        "Total number of inbound HTTP requests completed with a 2xx status",
        &["method", "route"]
    )
    .unwrap();

    pub static ref http_server_request_latency: HistogramVec = register_histogram_vec!(
        "http_server_request_latency_seconds",
        "Inbound request latency in seconds",
        &["method", "route"],
        LATENCY_BUCKETS.to_vec()
    )
    .unwrap();

    /// Outbound calls: M's calls to the signer, S's calls to M and to the
    /// tokenization network.
    pub static ref external_service_api_calls_latency: HistogramVec = register_histogram_vec!(
        "external_service_api_calls_latency_seconds",
        "Latency of external service API calls",
        &["endpoint", "method"],
        LATENCY_BUCKETS.to_vec()
    )
    .unwrap();

    pub static ref external_service_total_api_calls: IntCounterVec = register_int_counter_vec!(
        "external_service_total_api_calls",
        "Total number of external service API calls",
        &["endpoint", "method"]
    )
    .unwrap();

    pub static ref external_service_api_calls_errors: IntCounterVec = register_int_counter_vec!(
        "external_service_api_calls_errors",
        "Total number of errors in external service API calls",
        &["endpoint", "method", "error"]
    )
    .unwrap();

    /// Step-up / risk decisions, split by the branch taken (spec §4.2 step 3).
    pub static ref step_up_decisions_total: IntCounterVec = register_int_counter_vec!(
        "step_up_decisions_total",
        "Total number of risk adjudication decisions",
        &["decision"]
    )
    .unwrap();
}

pub async fn metrics_handler() -> error_stack::Result<String, MetricsError> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode(&metric_families, &mut buffer)
        .change_context(MetricsError::EncodingError)?;
    String::from_utf8(buffer).change_context(MetricsError::Utf8Error)
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Error encoding metrics")]
    EncodingError,
    #[error("Error converting metrics to utf8")]
    Utf8Error,
}
