//! Serve command implementation

use crate::api::{create_router, AppState};
use crate::cli::ServeArgs;
use crate::config::{LogFormat, YakulintConfig};
use crate::dictionary::StaticDictionary;
use crate::gateway::build_gateway;
use crate::pipeline::{start_workers, CheckQueue, WorkerContext};
use crate::realtime::CheckEvents;
use crate::store::{MemoryCheckStore, MemoryDirectory};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ServeArgs,
) -> Result<YakulintConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        YakulintConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        YakulintConfig::default()
    };

    // Apply environment variable overrides
    config = config.with_env_overrides();

    // Apply CLI overrides (highest priority)
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.mock_provider {
        config.provider.mock = true;
    }

    Ok(config)
}

/// Initialize tracing based on configuration
pub fn init_tracing(
    config: &crate::config::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = config.filter_directives();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // Warn if content logging is enabled
    if config.enable_content_logging {
        eprintln!(
            "WARNING: Content logging is enabled. Submitted ad copy will appear in the logs."
        );
        eprintln!("         This may include unpublished marketing material. Use only for debugging.");
    }

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load and merge configuration
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;

    tracing::info!("Starting yakulint server");
    tracing::debug!(?config, "Loaded configuration");

    // 3. Wire up the pipeline collaborators. The in-memory store and the
    // permissive directory are the bundled defaults; production setups
    // swap them behind the same traits.
    let store = Arc::new(MemoryCheckStore::new());
    let directory = Arc::new(MemoryDirectory::permissive());
    let dictionary = Arc::new(StaticDictionary::new());
    let gateway = Arc::new(build_gateway(&config.provider));
    let queue = Arc::new(CheckQueue::new(config.queue.clone()));
    let events = CheckEvents::new();

    // 4. Start the worker pool
    let cancel_token = CancellationToken::new();
    let worker_ctx = Arc::new(WorkerContext {
        store: store.clone(),
        dictionary,
        gateway: gateway.clone(),
        events: events.clone(),
        queue: queue.clone(),
        config: config.worker.clone(),
    });
    let worker_handles = start_workers(worker_ctx, cancel_token.clone());

    // 5. Build API router
    let config_arc = Arc::new(config.clone());
    let state = Arc::new(AppState::new(
        config_arc,
        store,
        directory,
        queue,
        events,
        gateway,
    ));
    let app = create_router(state);

    // 6. Bind and serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %addr, "yakulint API server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    // 7. Cleanup: let in-flight checks finish; queued checks stay pending
    // and are re-submitted by the operator or picked up on restart.
    tracing::info!("Waiting for workers to stop");
    for handle in worker_handles {
        handle.await?;
    }

    tracing::info!("yakulint server stopped");
    Ok(())
}
