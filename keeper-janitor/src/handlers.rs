use std::future::ready;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Router};
use keeper_common::client::ClientProvider;
use metrics_exporter_prometheus::PrometheusHandle;

pub fn app(provider: Arc<ClientProvider>, metrics: Option<PrometheusHandle>) -> Router {
    let router = Router::new()
        .route("/", get(index))
        .route("/_liveness", get(liveness))
        .route("/_readiness", get(readiness))
        .with_state(provider);

    match metrics {
        Some(handle) => router.route("/metrics", get(move || ready(handle.render()))),
        None => router,
    }
}

pub async fn index() -> &'static str {
    "job lease keeper janitor"
}

async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Ready once the cluster client has been built.
async fn readiness(State(provider): State<Arc<ClientProvider>>) -> StatusCode {
    if provider.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
