use crate::cli::ServeArgs;
use crate::infra::{build_calculator_state, AppState};
use crate::routes::with_calculator_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use realtor_finance::config::AppConfig;
use realtor_finance::error::AppError;
use realtor_finance::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let calculator = build_calculator_state(&config)?;
    info!(
        provinces = calculator.registry.provinces().len(),
        banks = calculator.registry.bank_rates().len(),
        exchange_disabled = config.exchange.disabled,
        "rate registry frozen"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_calculator_routes(calculator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "realtor finance service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
