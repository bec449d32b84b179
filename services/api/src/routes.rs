use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use realtor_finance::calculator::{calculator_router, CalculatorState};
use serde_json::json;

pub(crate) fn with_calculator_routes(state: CalculatorState) -> axum::Router {
    calculator_router(state)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use realtor_finance::calculator::{
        ExchangeRateProvider, RateRegistry, StaticExchangeRateSource,
    };
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        let exchange = ExchangeRateProvider::new(
            Arc::new(StaticExchangeRateSource::new(1000.0)),
            Duration::from_millis(50),
            1000.0,
        );
        let calculator = CalculatorState::new(Arc::new(RateRegistry::builtin()), Arc::new(exchange));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_calculator_routes(calculator).layer(Extension(state))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app(true).oneshot(get("/health")).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_tracks_listener_flag() {
        let response = app(false).oneshot(get("/ready")).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(true).oneshot(get("/ready")).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn calculator_routes_are_mounted() {
        let response = app(true)
            .oneshot(get("/calculator/provincias"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
