use anyhow::Context;

use orgadmin_api::app::{build_app, services::build_services};
use orgadmin_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    orgadmin_observability::init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr;
    tracing::info!(?config, "configuration loaded");

    let services = build_services(config).await?;
    if let Some(report) = &services.seed {
        tracing::info!(super_admin = %report.user_id, "seed data in place");
    }

    let app = build_app(services.state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
