use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::calculator::exchange::{
    ExchangeRateError, ExchangeRateProvider, ExchangeRateSource, StaticExchangeRateSource,
};
use crate::calculator::registry::RateRegistry;
use crate::calculator::router::{calculator_router, CalculatorState};

pub(super) struct OfflineSource;

#[async_trait]
impl ExchangeRateSource for OfflineSource {
    async fn fetch(&self) -> Result<f64, ExchangeRateError> {
        Err(ExchangeRateError::Unavailable("network unreachable".to_string()))
    }
}

pub(super) fn state_with_source(source: Arc<dyn ExchangeRateSource>) -> CalculatorState {
    let exchange = ExchangeRateProvider::new(source, Duration::from_millis(50), 1000.0);
    CalculatorState::new(Arc::new(RateRegistry::builtin()), Arc::new(exchange))
}

pub(super) fn state() -> CalculatorState {
    state_with_source(Arc::new(StaticExchangeRateSource::new(1200.0)))
}

pub(super) fn router() -> axum::Router {
    calculator_router(state())
}

pub(super) fn offline_router() -> axum::Router {
    calculator_router(state_with_source(Arc::new(OfflineSource)))
}

pub(super) fn json_post(uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

pub(super) fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn scenario_a_payload() -> Value {
    serde_json::json!({
        "saleAmount": 1_000_000,
        "commissionRate": 3,
        "operationType": "A",
        "isIndependent": true,
        "province": "caba",
        "ivaRate": 21,
        "iibbRate": 1.5,
        "stampRate": 1.5,
        "otherRate": 1
    })
}
