//! Optional localhost diagnostics endpoint.
//!
//! Enabled with `--profile`: serves a JSON runtime snapshot so an operator
//! can confirm the daemon is alive and has processed events. Failures here
//! are logged and never affect distribution.

use crate::constants;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Shared runtime counters, written by the dispatch loop.
#[derive(Debug)]
pub struct DaemonStatus {
    started_at: DateTime<Utc>,
    watched: Vec<PathBuf>,
    action_count: usize,
    runs_completed: AtomicU64,
    last_run_ms: AtomicU64,
}

/// Point-in-time view served by the endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub started_at: DateTime<Utc>,
    pub watched: Vec<String>,
    pub actions: usize,
    pub runs_completed: u64,
    pub last_run_ms: u64,
}

impl DaemonStatus {
    pub fn new(watched: Vec<PathBuf>, action_count: usize) -> Arc<Self> {
        Arc::new(Self {
            started_at: Utc::now(),
            watched,
            action_count,
            runs_completed: AtomicU64::new(0),
            last_run_ms: AtomicU64::new(0),
        })
    }

    /// Record one completed distribution run.
    pub fn record_run(&self, elapsed: Duration) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        self.last_run_ms
            .store(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            started_at: self.started_at,
            watched: self
                .watched
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            actions: self.action_count,
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            last_run_ms: self.last_run_ms.load(Ordering::Relaxed),
        }
    }
}

/// Start the diagnostics listener in the background.
pub fn spawn(status: Arc<DaemonStatus>) {
    tokio::spawn(async move {
        if let Err(e) = serve(status).await {
            error!(error = %e, "introspection endpoint failed");
        }
    });
}

async fn serve(status: Arc<DaemonStatus>) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/status", get(status_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(status);
    let listener = tokio::net::TcpListener::bind(constants::STATUS_ADDR).await?;
    info!(addr = constants::STATUS_ADDR, "introspection endpoint listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn status_handler(State(status): State<Arc<DaemonStatus>>) -> Json<StatusSnapshot> {
    Json(status.snapshot())
}
