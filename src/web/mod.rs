//! HTTP API for DASTD.
//!
//! Serves the scan endpoints plus a small operational surface. All state
//! lives in `AppContext`; handlers stay thin over `ScanService`.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/dast/submit` - Accept a scan job
//! - `GET /api/v1/dast/status/{job_id}` - Poll a job
//! - `POST /api/v1/dast/cancel/{job_id}` - Request cancellation
//! - `GET /api/v1/status` - Daemon info
//! - `GET /health` - Liveness probe

mod handlers;

pub use handlers::DaemonStatus;

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use tokio::sync::broadcast;

use crate::context::AppContext;

/// Build the API router. Exposed so tests can serve it on an ephemeral port.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/status", get(handlers::daemon_status))
        .route("/api/v1/dast/submit", post(handlers::submit_scan))
        .route("/api/v1/dast/status/{job_id}", get(handlers::scan_status))
        .route("/api/v1/dast/cancel/{job_id}", post(handlers::cancel_scan))
        .with_state(ctx)
}

/// Web server for the scan API.
pub struct WebServer {
    bind_addr: SocketAddr,
    ctx: AppContext,
    shutdown_tx: broadcast::Sender<()>,
}

impl WebServer {
    /// Create a new web server bound to the given address.
    pub fn new(ctx: AppContext, bind_addr: SocketAddr) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            bind_addr,
            ctx,
            shutdown_tx,
        }
    }

    /// Start the web server. Runs until shutdown() is called.
    pub async fn start(&self) -> anyhow::Result<()> {
        let app = router(self.ctx.clone());

        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "HTTP API listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Signal the server to shut down gracefully.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
