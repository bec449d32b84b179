use metrics_exporter_prometheus::PrometheusHandle;
use realtor_finance::calculator::{
    CalculatorState, ExchangeRateProvider, OperationType, RateRegistry,
};
use realtor_finance::config::AppConfig;
use realtor_finance::error::AppError;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Registry and exchange provider are built once here and never mutated afterwards.
pub(crate) fn build_calculator_state(config: &AppConfig) -> Result<CalculatorState, AppError> {
    let registry = RateRegistry::from_config(&config.registry)?;
    let exchange = ExchangeRateProvider::from_config(&config.exchange);
    Ok(CalculatorState::new(Arc::new(registry), Arc::new(exchange)))
}

pub(crate) fn parse_operation_type(raw: &str) -> Result<OperationType, String> {
    match raw.trim() {
        "A" | "a" => Ok(OperationType::Registered),
        "B" | "b" => Ok(OperationType::Unregistered),
        other => Err(format!(
            "unknown operation type '{other}' (expected A for registered or B for unregistered)"
        )),
    }
}
