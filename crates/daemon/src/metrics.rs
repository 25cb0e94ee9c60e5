//! Prometheus request metrics, exposed in text format on `GET /metrics`.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `habit_requests_total` | Counter | `method`, `status` |
//! | `habit_request_latency_seconds` | Histogram | `method` |

use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Latency buckets in seconds.
pub const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("failed to encode metrics: {0}")]
    Encoding(String),
}

/// Request counter and latency histogram on a private registry.
///
/// Cheap to clone; clones record into the same registry.
#[derive(Clone)]
pub struct RequestMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_latency: HistogramVec,
}

impl RequestMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("habit_requests_total", "Total number of HTTP requests"),
            &["method", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_latency = HistogramVec::new(
            HistogramOpts::new(
                "habit_request_latency_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["method"],
        )?;
        registry.register(Box::new(request_latency.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_latency,
        })
    }

    pub fn observe(&self, method: &str, status: u16, latency_secs: f64) {
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[method, status.as_str()])
            .inc();
        self.request_latency
            .with_label_values(&[method])
            .observe(latency_secs);
    }

    /// Sum of the request counter over all label values.
    pub fn requests_total(&self) -> u64 {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == "habit_requests_total")
            .flat_map(|family| family.get_metric())
            .map(|m| m.get_counter().get_value() as u64)
            .sum()
    }

    /// Prometheus text exposition of every registered metric.
    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }
}

/// Middleware counting every request and timing it.
pub async fn track_requests(
    State(metrics): State<RequestMetrics>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().as_str().to_owned();
    let started = Instant::now();
    let resp = next.run(req).await;
    metrics.observe(
        &method,
        resp.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    resp
}
