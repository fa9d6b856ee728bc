use anyhow::{Context, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use super::ScanExecutor;
use crate::core::models::ScanTool;
use crate::core::queue::QueueClient;
use crate::core::registry::JobRegistry;

/// Hands the scan to a queue worker and watches for its result.
///
/// The watcher wakes at a fixed interval, checks for cancellation first and
/// then polls the broker. A cancelled job stops the watcher immediately; a
/// worker result that arrives later is dropped by the registry.
pub struct DelegatedExecutor {
    queue: Arc<dyn QueueClient>,
    poll_interval: Duration,
}

impl DelegatedExecutor {
    pub fn new(queue: Arc<dyn QueueClient>, poll_interval: Duration) -> Self {
        Self {
            queue,
            poll_interval,
        }
    }
}

impl ScanExecutor for DelegatedExecutor {
    fn execute(
        &self,
        registry: JobRegistry,
        job_id: String,
        target: String,
        tool: ScanTool,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        let queue = Arc::clone(&self.queue);
        let poll_interval = self.poll_interval;

        Box::pin(async move {
            if !registry.mark_running(&job_id).await {
                debug!(job_id = %job_id, "job no longer queued, skipping handoff");
                return Ok(());
            }

            let handle = queue
                .enqueue(&target, tool)
                .await
                .context("broker rejected the scan task")?;
            info!(job_id = %job_id, tool = tool.as_str(), "scan handed to queue worker");

            loop {
                if registry.is_cancelled(&job_id).await {
                    info!(job_id = %job_id, "stopped watching cancelled job");
                    return Ok(());
                }

                match handle.poll().await.context("queue worker failed")? {
                    Some(report) => {
                        if registry.complete(&job_id, report).await {
                            info!(job_id = %job_id, "queue worker finished scan");
                        } else {
                            info!(job_id = %job_id, "worker result arrived after cancellation, dropped");
                        }
                        return Ok(());
                    }
                    None => sleep(poll_interval).await,
                }
            }
        })
    }
}
