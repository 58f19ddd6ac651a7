//! Duel arena HTTP server.
mod config;
mod routes;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use duel_runtime::{Arena, FileTreeStore, MemoryTreeStore, TracingNotifier};

use config::{ServerConfig, StoreLocation};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from_env()?;
    let _log_guard = setup_logging(&config)?;

    let duel = config.duel_config()?;
    let abilities = config.abilities()?;
    tracing::info!(
        "Loaded duel config: {} rounds, tolerance {}, {} abilities",
        duel.max_rounds,
        duel.matchmaking.synergy_tolerance,
        abilities.len()
    );

    let builder = Arena::builder()
        .duel_config(duel)
        .abilities(abilities)
        .notifier(TracingNotifier);
    let builder = match &config.store {
        StoreLocation::Memory => builder.store(MemoryTreeStore::new()),
        StoreLocation::File(path) => builder.store(
            FileTreeStore::open(path)
                .with_context(|| format!("Failed to open store {}", path.display()))?,
        ),
    };
    let arena = builder.build().await?;
    tracing::info!("Store: {}", config.store);

    let resumed = arena.resume().await?;
    if resumed > 0 {
        tracing::info!("Resumed {} matches", resumed);
    }

    let app = routes::router(arena.handle())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    arena.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

/// Logs to stderr, and to a daily-rolling file when `LOG_DIR` is set.
///
/// The returned guard must stay alive for the file writer to flush.
fn setup_logging(config: &ServerConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "duel-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let Some(dir) = &config.log_dir {
        tracing::info!("Log file: {}/duel-server.log", dir.display());
    }
    Ok(guard)
}
