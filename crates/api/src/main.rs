use std::sync::Arc;

use anyhow::Context;

use wareflow_api::app::{AppServices, build_app};
use wareflow_infra::{AppConfig, SqliteCatalogStore, seed_demo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    wareflow_observability::init(config.log_format);

    let store = SqliteCatalogStore::connect(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("failed to open database at {}", config.database_url))?;
    store
        .bootstrap_schema()
        .await
        .context("failed to create catalog schema")?;
    let store = Arc::new(store);

    if config.seed_demo {
        seed_demo(Arc::clone(&store))
            .await
            .context("failed to seed demo data")?;
    }

    let services = Arc::new(AppServices::from_config(store, &config));
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
