//! PubLog Gateway - HTTP API for the dataset service
//!
//! Settings come from the environment; see [`Settings::from_env`].

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use publog_core::Catalog;
use publog_gateway::{create_router, GatewayState, Settings};
use publog_service::PublogService;
use publog_store::SqliteStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,publog=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PubLog Gateway");

    let Settings { gateway, service } = Settings::from_env();
    tracing::info!(
        listen_addr = %gateway.listen_addr,
        data_dir = %service.data_dir.display(),
        db_path = %service.db_path.display(),
        init_priority = gateway.init_priority,
        "Settings loaded"
    );

    let catalog = Catalog::publog(&service.data_dir);
    catalog.validate()?;
    tracing::info!(datasets = catalog.len(), "Catalog ready");

    let store = SqliteStore::shared(&service.db_path)?;
    let service = Arc::new(PublogService::new(store, Arc::new(catalog), service));

    if gateway.init_priority {
        let loader = Arc::clone(&service);
        let report =
            tokio::task::spawn_blocking(move || loader.indexer().initialize(false, true)).await?;
        tracing::info!(
            indexed = report.indexed,
            total = report.total,
            "Priority tier initialized"
        );
    }

    let listen_addr = gateway.listen_addr.clone();
    let app = create_router(GatewayState::new(service, gateway));

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
