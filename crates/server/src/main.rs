use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mulearr_core::{
    create_authenticator, load_config, validate_config, Authenticator, CategoryLookup,
    DownloadController, HashIdentityStore, HttpBackendClient, MuleBackend, SearchGateway,
    SqliteHashStore, StaticCategories,
};
use mulearr_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("mulearr v{}", VERSION);

    // Determine config path
    let config_path = std::env::var("MULEARR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Hash mappings are the only durable state; without them nothing works.
    let hash_store = Arc::new(
        SqliteHashStore::new(&config.database.path).context("Failed to open hash store")?,
    );
    info!("Hash store initialized");

    match hash_store.purge_older_than(config.database.purge_after_days) {
        Ok(0) => {}
        Ok(purged) => info!(
            purged = purged,
            days = config.database.purge_after_days,
            "Purged stale hash mappings"
        ),
        Err(e) => warn!(error = %e, "Failed to purge stale hash mappings"),
    }

    // Backend bridge
    let backend = Arc::new(
        HttpBackendClient::new(config.backend.clone()).context("Failed to create backend client")?,
    );
    if backend.probe().await {
        info!("Connected to backend at {}", config.backend.url);
    } else {
        warn!(
            "Backend at {} is not reachable yet, will retry on demand",
            config.backend.url
        );
    }
    let backend: Arc<dyn MuleBackend> = backend;

    let categories: Arc<dyn CategoryLookup> =
        Arc::new(StaticCategories::from_config(&config.downloads));
    info!(
        "Configured {} download categories",
        config.downloads.categories.len()
    );

    let controller = Arc::new(DownloadController::new(
        Arc::clone(&backend),
        hash_store.clone() as Arc<dyn HashIdentityStore>,
        categories,
        config.downloads.default_category_id,
        config.downloads.save_path.clone(),
    ));

    let gateway = Arc::new(SearchGateway::new(Arc::clone(&backend), &config.search));
    info!(
        "Search gateway: min interval {}ms, cache ttl {}ms",
        config.search.min_interval_ms, config.search.cache_ttl_ms
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);

    let state = Arc::new(AppState::new(
        config,
        authenticator,
        controller,
        gateway,
        hash_store,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
