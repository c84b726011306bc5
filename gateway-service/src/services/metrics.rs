use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static SIGN_IN_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ROUTE_DECISIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static UNKNOWN_ROUTES_TOTAL: OnceLock<IntCounter> = OnceLock::new();

/// Register the gateway collectors. Safe to call more than once; only the
/// first call has an effect. Failures are logged and leave metrics disabled.
pub fn init_metrics() {
    if REGISTRY.get().is_some() {
        return;
    }
    if let Err(e) = try_init_metrics() {
        tracing::error!(error = %e, "Failed to initialize metrics; continuing without them");
    }
}

fn try_init_metrics() -> Result<(), prometheus::Error> {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("gateway_http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;
    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "gateway_http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )?;
    let sign_in_total = IntCounterVec::new(
        Opts::new("gateway_sign_in_total", "Sign-in attempts by outcome"),
        &["outcome"],
    )?;
    let route_decisions = IntCounterVec::new(
        Opts::new("gateway_route_decisions_total", "Route authorization decisions"),
        &["decision"],
    )?;
    let unknown_routes = IntCounter::new(
        "gateway_unknown_routes_total",
        "Page requests that matched no route group and fell to the default policy",
    )?;

    registry.register(Box::new(requests_total.clone()))?;
    registry.register(Box::new(request_duration.clone()))?;
    registry.register(Box::new(sign_in_total.clone()))?;
    registry.register(Box::new(route_decisions.clone()))?;
    registry.register(Box::new(unknown_routes.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = SIGN_IN_TOTAL.set(sign_in_total);
    let _ = ROUTE_DECISIONS_TOTAL.set(route_decisions);
    let _ = UNKNOWN_ROUTES_TOTAL.set(unknown_routes);
    Ok(())
}

pub fn record_sign_in(outcome: &str) {
    if let Some(counter) = SIGN_IN_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_route_decision(decision: &str) {
    if let Some(counter) = ROUTE_DECISIONS_TOTAL.get() {
        counter.with_label_values(&[decision]).inc();
    }
}

pub fn record_unknown_route() {
    if let Some(counter) = UNKNOWN_ROUTES_TOTAL.get() {
        counter.inc();
    }
}

pub fn get_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        tracing::error!("Metrics registry not initialized");
        return "# Metrics registry not initialized\n".to_string();
    };

    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&registry.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return format!("# Failed to encode metrics: {}\n", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to UTF-8: {}", e);
        format!("# Failed to convert metrics to UTF-8: {}\n", e)
    })
}
