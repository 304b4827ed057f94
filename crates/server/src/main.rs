use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidfetch_core::{
    load_config, validate_config, Extractor, JobOrchestrator, JobRegistry, MetadataFetcher,
    PageMetadataFetcher, RetentionManager, UrlPolicy, YtDlpExtractor,
};
use vidfetch_server::{create_router, AppState};

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

    // Determine config path
    let config_path = std::env::var("VIDFETCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Scratch directory: {:?}", config.retention.scratch_dir);
    info!("yt-dlp binary: {:?}", config.extractor.ytdlp_path);

    let policy = UrlPolicy::new(&config.urls);

    let metadata: Arc<dyn MetadataFetcher> = Arc::new(
        PageMetadataFetcher::new(&config.metadata, policy.clone())
            .context("Failed to create metadata fetcher")?,
    );
    let extractor: Arc<dyn Extractor> = Arc::new(YtDlpExtractor::new(config.extractor.clone()));
    info!("Using extractor: {}", extractor.name());

    // Retention: post-serve removal and periodic sweep
    let retention = Arc::new(RetentionManager::new(config.retention.clone()));
    retention.start().await;
    info!("Retention manager started");

    // Orchestrator
    let orchestrator = Arc::new(JobOrchestrator::new(
        config.orchestrator.clone(),
        config.retention.scratch_dir.clone(),
        policy,
        Arc::new(JobRegistry::new()),
        metadata,
        extractor,
    ));
    orchestrator.start().await;
    info!("Job orchestrator started");

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&orchestrator),
        Arc::clone(&retention),
    ));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    orchestrator.stop().await;
    retention.stop().await;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
