use anyhow::{Context, Result};
use axum::Router;
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::{app_state::AppState, middleware};

/// Installs the global subscriber. `RUST_LOG` overrides the default `info`.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Loads `.env` when present. A missing file is not an error.
pub fn init_env() {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            tracing::warn!("Failed to load .env file: {err}");
        }
    }
}

/// Applies the shared layers, binds the configured port and serves until
/// Ctrl+C or SIGTERM.
pub async fn bootstrap(service_name: &str, app: Router<AppState>, state: AppState) -> Result<()> {
    let mut app = app
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    if !state.config.is_production() {
        app = app.layer(axum::middleware::from_fn(middleware::expose_error_detail));
    }

    let addr = format!("0.0.0.0:{}", state.config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("{service_name} listening on {addr}");

    axum::serve(listener, app.with_state(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("{service_name} stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("ctrl_c signal received"),
        _ = terminate => tracing::info!("terminate signal received"),
    }
}
