use std::sync::Arc;

use anyhow::Context;

use hireflow_api::app::{AppServices, build_app};
use hireflow_infra::AppConfig;
use hireflow_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    hireflow_observability::init(LogFormat::for_production(config.environment.is_production()));
    tracing::info!(?config, "starting hireflow api");
    if config.uses_dev_jwt_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let bind_addr = config.bind_addr;
    let services = AppServices::from_config(config)
        .await
        .context("failed to initialise services")?;
    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
