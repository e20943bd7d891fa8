use anyhow::Context;

use libcat_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    libcat_observability::init();

    let config = AppConfig::from_env().inspect_err(|e| {
        tracing::error!("invalid configuration: {e}");
    })?;

    let app = libcat_api::app::bootstrap(&config)
        .await
        .inspect_err(|e| tracing::error!("storage initialisation failed: {e}"))
        .context("storage initialisation failed")?;

    libcat_api::server::serve(app, &config.server).await
}
