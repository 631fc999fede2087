//! DriveSync
//!
//! Runs the control loop against the configured telemetry link and output
//! sink, with the status/input API alongside.

use anyhow::{Context, Result};
use ds_server::{api, config::Config, control, sinks, state};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting DriveSync");

    let config = Config::load().context("failed to load configuration")?;
    let (state, endpoints) = state::AppState::new(config.input_queue);

    let link = ds_adapters::create_link(&config.link);
    let sink = sinks::create_sink(&config.sink).context("failed to create output sink")?;
    let control = control::ControlLoop::new(
        link,
        sink,
        control::ControlOptions {
            source: config.source,
            read_chunk: config.read_chunk,
        },
        Duration::ZERO,
    );

    let cancel = CancellationToken::new();
    tokio::spawn(watch_signals(cancel.clone()));

    let api_task = match &config.api {
        Some(api_config) => {
            let listener = tokio::net::TcpListener::bind(&api_config.bind)
                .await
                .with_context(|| format!("failed to bind API on {}", api_config.bind))?;
            info!("API listening on http://{}", api_config.bind);

            let app = api::create_router(state.clone());
            let shutdown = cancel.clone();
            Some(tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown.cancelled_owned())
                    .await
            }))
        }
        None => None,
    };

    let result = control::run(control, endpoints, config.tick_hz, cancel.clone()).await;

    if let Some(task) = api_task {
        match task.await {
            Ok(Err(e)) => error!("API server error: {}", e),
            Err(e) => error!("API task failed: {}", e),
            Ok(Ok(())) => {}
        }
    }

    info!("DriveSync stopped");
    result
}

/// Cancel on SIGINT or SIGTERM
async fn watch_signals(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
    cancel.cancel();
}
