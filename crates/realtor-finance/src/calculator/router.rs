use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use super::commission::{
    CommissionPipeline, CommissionRequest, CommissionResult, StampDutyRequest, StampDutyResult,
};
use super::error::CalculationError;
use super::exchange::{CurrencyDisplay, ExchangeQuote, ExchangeRateProvider};
use super::mortgage::{AmortizationEngine, MortgageRequest, MortgageResult};
use super::registry::{BankRate, Province, RateRegistry};
use crate::error::AppError;

/// Shared, read-only collaborators handed to every calculator handler.
#[derive(Clone)]
pub struct CalculatorState {
    pub registry: Arc<RateRegistry>,
    pub pipeline: Arc<CommissionPipeline>,
    pub engine: AmortizationEngine,
    pub exchange: Arc<ExchangeRateProvider>,
}

impl CalculatorState {
    pub fn new(registry: Arc<RateRegistry>, exchange: Arc<ExchangeRateProvider>) -> Self {
        Self {
            registry,
            pipeline: Arc::new(CommissionPipeline::default()),
            engine: AmortizationEngine,
            exchange,
        }
    }
}

/// Mortgage schedule plus its peso restatement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageResponse {
    #[serde(flatten)]
    pub result: MortgageResult,
    pub display: CurrencyDisplay,
}

/// JSON body extractor whose rejections use the calculator's structured error body.
pub struct CalculatorJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for CalculatorJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let message = rejection.body_text();
                debug!(error = %message, "request body rejected");
                Err(CalculationError::MalformedRequest { message }.into())
            }
        }
    }
}

/// Router builder exposing the calculator and reference-table endpoints.
pub fn calculator_router(state: CalculatorState) -> Router {
    Router::new()
        .route("/calculator/provincias", get(provinces_handler))
        .route("/calculator/commission", post(commission_handler))
        .route("/calculator/taxes", post(taxes_handler))
        .route("/calculator/mortgage", post(mortgage_handler))
        .route("/calculator/exchange-rate", get(exchange_rate_handler))
        .route("/admin/rates", get(bank_rates_handler))
        .with_state(state)
}

pub(crate) async fn provinces_handler(State(state): State<CalculatorState>) -> Json<Vec<Province>> {
    Json(state.registry.provinces().to_vec())
}

pub(crate) async fn bank_rates_handler(State(state): State<CalculatorState>) -> Json<Vec<BankRate>> {
    Json(state.registry.bank_rates().to_vec())
}

pub(crate) async fn commission_handler(
    State(state): State<CalculatorState>,
    CalculatorJson(request): CalculatorJson<CommissionRequest>,
) -> Result<Json<CommissionResult>, AppError> {
    let result = state.pipeline.calculate(&state.registry, &request)?;
    Ok(Json(result))
}

pub(crate) async fn taxes_handler(
    State(state): State<CalculatorState>,
    CalculatorJson(request): CalculatorJson<StampDutyRequest>,
) -> Result<Json<StampDutyResult>, AppError> {
    let result = state.pipeline.stamp_duty(&state.registry, &request)?;
    Ok(Json(result))
}

pub(crate) async fn mortgage_handler(
    State(state): State<CalculatorState>,
    CalculatorJson(request): CalculatorJson<MortgageRequest>,
) -> Result<Json<MortgageResponse>, AppError> {
    let result = state.engine.simulate(&state.registry, &request)?;
    let quote = state.exchange.current_rate().await;
    let display = CurrencyDisplay::for_mortgage(&result, &quote);

    info!(
        installments = result.installments,
        rate_origin = ?quote.origin,
        "mortgage simulated"
    );

    Ok(Json(MortgageResponse { result, display }))
}

pub(crate) async fn exchange_rate_handler(State(state): State<CalculatorState>) -> Json<ExchangeQuote> {
    Json(state.exchange.current_rate().await)
}
