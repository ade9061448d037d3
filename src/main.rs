use clap::Parser;
use composite_search::config::NodeConfig;
use composite_search::index::catalog::IndexCatalog;
use composite_search::index::ingest::load_directory;
use composite_search::search::registry::SearchRegistry;
use composite_search::server::build_router;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!("Starting search node on {}", config.bind);

    // 1. Index layer:
    let catalog = Arc::new(IndexCatalog::with_remote_policy(
        config.remote_timeout(),
        config.remote_attempts,
    ));

    for index_spec in &config.indexes {
        let index = catalog.local_or_create(&index_spec.name);
        let loaded = load_directory(&index, &index_spec.dir).await?;
        tracing::info!(
            "Index '{}': {} document(s), {} term(s)",
            index_spec.name,
            loaded,
            index.term_count()
        );
    }

    // 2. Search registry:
    let registry = SearchRegistry::new(catalog.clone());

    // 3. HTTP Router:
    let app = build_router(catalog, registry.clone());

    // 4. Start HTTP server:
    tracing::info!("HTTP server listening on {}", config.bind);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    registry.clear();
    tracing::info!("Search node stopped");

    Ok(())
}
