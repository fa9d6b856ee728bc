//! Execution backends for scan jobs.
//!
//! A backend drives exactly one job from queued to a terminal status,
//! writing every transition through the registry. The daemon picks one
//! backend at startup and keeps it for its whole lifetime.

mod delegated;
mod local;

pub use delegated::DelegatedExecutor;
pub use local::LocalExecutor;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::AppConfig;
use crate::core::models::ScanTool;
use crate::core::queue::SimulatedQueue;
use crate::core::registry::JobRegistry;

/// Which backend runs submitted scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// Simulated scan inside the daemon process
    Local,
    /// Hand off to a task queue and watch for the worker's result
    Delegated,
}

impl ExecutorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Delegated => "delegated",
        }
    }
}

/// Trait for scan execution backends.
///
/// The returned future is spawned by the service. `Err` means the backend
/// could not produce a report; the caller records the job as failed. A job
/// that was cancelled underneath the backend is not an error.
pub trait ScanExecutor: Send + Sync {
    fn execute(
        &self,
        registry: JobRegistry,
        job_id: String,
        target: String,
        tool: ScanTool,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// Factory function to create the executor selected by config.
pub fn create_executor(config: &AppConfig) -> Arc<dyn ScanExecutor> {
    match config.executor {
        ExecutorKind::Local => Arc::new(LocalExecutor::new(Duration::from_millis(
            config.step_delay_ms,
        ))),
        ExecutorKind::Delegated => {
            // TODO: swap in a redis-backed client once the worker fleet is deployed
            info!(
                broker_url = %config.broker_url,
                "delegated execution uses the in-process simulated queue"
            );
            Arc::new(DelegatedExecutor::new(
                Arc::new(SimulatedQueue::default()),
                Duration::from_millis(config.poll_interval_ms),
            ))
        }
    }
}
