//! Prometheus metrics for the Lua code bot.
//!
//! Exposes:
//! - `lua_code_bot_generation_duration_seconds` (histogram)
//! - `lua_code_bot_generation_total` (counter with outcome)
//! - `lua_code_bot_generation_inflight` (gauge)
//! - process metrics via `process` collector

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use once_cell::sync::Lazy;
use prometheus::process_collector::ProcessCollector;
use prometheus::{
    default_registry, register_histogram_vec, register_int_counter_vec, register_int_gauge_vec,
    Encoder, HistogramVec, IntCounterVec, IntGaugeVec, TextEncoder,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Outcome label for a finished generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Empty,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Empty => "empty",
            Outcome::Error => "error",
        }
    }
}

static PROCESS_COLLECTOR: Lazy<()> = Lazy::new(|| {
    if let Err(err) = default_registry().register(Box::new(ProcessCollector::for_self())) {
        warn!("Failed to register process collector: {}", err);
    }
});

static GENERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    // Exponential buckets from 100ms up to ~100 seconds.
    let buckets =
        prometheus::exponential_buckets(0.1, 2.0, 11).expect("failed to create histogram buckets");
    register_histogram_vec!(
        "lua_code_bot_generation_duration_seconds",
        "Gemini generation duration in seconds",
        &["command"],
        buckets
    )
    .expect("failed to register generation duration histogram")
});

static GENERATION_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "lua_code_bot_generation_total",
        "Total generations by outcome",
        &["command", "outcome"]
    )
    .expect("failed to register generation counter")
});

static GENERATION_INFLIGHT: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "lua_code_bot_generation_inflight",
        "Number of in-flight generations",
        &["command"]
    )
    .expect("failed to register inflight gauge")
});

fn init_collectors() {
    Lazy::force(&PROCESS_COLLECTOR);
    Lazy::force(&GENERATION_DURATION);
    Lazy::force(&GENERATION_TOTAL);
    Lazy::force(&GENERATION_INFLIGHT);
}

/// Increment the in-flight gauge for a command.
pub fn record_generation_start(command: &'static str) {
    init_collectors();
    GENERATION_INFLIGHT.with_label_values(&[command]).inc();
}

/// Record a finished generation with its duration and outcome.
pub fn record_generation_result(command: &'static str, duration: Duration, outcome: Outcome) {
    init_collectors();
    GENERATION_INFLIGHT.with_label_values(&[command]).dec();
    GENERATION_DURATION
        .with_label_values(&[command])
        .observe(duration.as_secs_f64());
    GENERATION_TOTAL
        .with_label_values(&[command, outcome.as_str()])
        .inc();
}

fn plain_response(status: StatusCode, body: Full<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
}

async fn metrics_response() -> Result<Response<Full<Bytes>>, Infallible> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", err);
        return Ok(plain_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            Full::from("encode error"),
        ));
    }

    let mut response = plain_response(StatusCode::OK, Full::from(buffer));
    if let Ok(content_type) = hyper::header::HeaderValue::from_str(encoder.format_type()) {
        response
            .headers_mut()
            .insert(hyper::header::CONTENT_TYPE, content_type);
    }
    Ok(response)
}

async fn handle_request(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    match req.uri().path() {
        "/metrics" => metrics_response().await,
        _ => Ok(plain_response(StatusCode::NOT_FOUND, Full::new(Bytes::new()))),
    }
}

async fn serve(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Prometheus metrics endpoint started");

    loop {
        let (stream, peer) = listener.accept().await?;
        let service = service_fn(handle_request);
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                warn!(?peer, "Metrics connection error: {}", err);
            }
        });
    }
}

/// Spawn the metrics HTTP endpoint on the given address.
pub fn spawn_metrics_server(addr: SocketAddr) {
    init_collectors();
    tokio::spawn(async move {
        if let Err(err) = serve(addr).await {
            error!(%addr, "Metrics server failed: {}", err);
        }
    });
}
