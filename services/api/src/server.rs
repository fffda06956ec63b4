use crate::cli::ServeArgs;
use crate::infra::{AppState, PricingState};
use crate::routes::with_pricing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rate_card::acquisition::{
    builtin, refresh_in_background, spawn_auto_refresh, AcquisitionChain, BuiltinSource,
    LoadedTable, RateTableSource, RateTableStore,
};
use rate_card::config::AppConfig;
use rate_card::error::AppError;
use rate_card::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let chain = Arc::new(AcquisitionChain::from_config(&config.rate_table));
    let store = Arc::new(RateTableStore::new(LoadedTable::new(
        builtin::rate_table(),
        BuiltinSource.name(),
    )));
    if let Err(error) = refresh_in_background(store.clone(), chain.clone()).await {
        warn!(%error, "initial rate table load failed; serving the built-in table");
    }

    let refresher = config.rate_table.auto_refresh.then(|| {
        spawn_auto_refresh(
            store.clone(),
            chain.clone(),
            config.rate_table.refresh_interval,
        )
    });

    let pricing = Arc::new(PricingState::new(store, chain, config.rate_table.mode));
    let app = with_pricing_routes(pricing)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, mode = %config.rate_table.mode, "rate card service ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = refresher {
        handle.abort();
    }
    info!("rate card service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
