mod artifacts;
mod config;
mod errors;
mod interview;
mod models;
mod provider;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::artifacts::sweeper::spawn_sweeper;
use crate::artifacts::{ArtifactStore, FsArtifactStore, MemoryArtifactStore};
use crate::config::{AudioStoreKind, Config};
use crate::provider::OpenAiProvider;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a missing API key or invalid values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the speech/text provider
    let provider = Arc::new(OpenAiProvider::new(config.provider.clone())?);
    info!(
        "Provider initialized (model: {}, tts: {}/{}, stt: {})",
        provider.completion_model(),
        config.provider.tts_model,
        config.provider.tts_voice,
        config.provider.transcription_model
    );

    // Initialize the audio artifact store
    let artifacts: Arc<dyn ArtifactStore> = match config.audio_store {
        AudioStoreKind::Filesystem => Arc::new(FsArtifactStore::new(&config.audio_dir).await?),
        AudioStoreKind::Memory => {
            info!("Audio artifacts kept in memory");
            Arc::new(MemoryArtifactStore::new())
        }
    };

    // Evict audio that was never fetched
    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweeper(
        artifacts.clone(),
        config.audio_ttl,
        config.sweep_interval,
        shutdown.clone(),
    );

    // Build app state
    let state = AppState {
        provider,
        artifacts,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    sweeper.await?;
    info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM and cancels background work.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
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
                tracing::warn!("Failed to listen for SIGTERM: {e}");
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

    info!("Shutdown signal received");
    token.cancel();
}
