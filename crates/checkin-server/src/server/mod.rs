//! Axum-based HTTP server.
//!
//! Four routes sit in front of the ledger and the session authority:
//! - `GET /`: history and check-in form, or the login form
//! - `POST /post`: record a check-in
//! - `POST /login`: start a session
//! - `POST /logout`: end a session

mod cookie;
mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use checkin_core::{LedgerStore, SessionAuthority};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};

pub use error::AppError;

/// Maximum request body size (16KB). Forms here are a few fields.
pub const MAX_BODY_SIZE: usize = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerStore>,
    pub sessions: Arc<SessionAuthority>,
}

impl AppState {
    pub fn new(ledger: LedgerStore, sessions: SessionAuthority) -> Self {
        Self {
            ledger: Arc::new(ledger),
            sessions: Arc::new(sessions),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/post", post(handlers::check_in))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM.
pub async fn run(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

// ============================================================================
// Tests
// ============================================================================
