use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use super::ScanExecutor;
use crate::core::models::{ScanReport, ScanTool};
use crate::core::registry::JobRegistry;

/// Runs the scan in-process with simulated work.
///
/// Ten fixed steps, one progress tick each. The registry refuses ticks once
/// the job left running, so every tick doubles as a cancellation checkpoint
/// and the loop stops at the first refusal.
pub struct LocalExecutor {
    step_delay: Duration,
}

impl LocalExecutor {
    pub fn new(step_delay: Duration) -> Self {
        Self { step_delay }
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl ScanExecutor for LocalExecutor {
    fn execute(
        &self,
        registry: JobRegistry,
        job_id: String,
        target: String,
        tool: ScanTool,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        let step_delay = self.step_delay;

        Box::pin(async move {
            if !registry.mark_running(&job_id).await {
                debug!(job_id = %job_id, "job no longer queued, skipping run");
                return Ok(());
            }
            info!(job_id = %job_id, tool = tool.as_str(), "local scan started");

            for step in 1..=10u8 {
                if !registry.advance(&job_id, step * 10).await {
                    info!(job_id = %job_id, "local scan halted mid-run");
                    return Ok(());
                }
                sleep(step_delay).await;
            }

            let report = ScanReport::simulated(tool, &target);
            if registry.complete(&job_id, report).await {
                info!(job_id = %job_id, "local scan completed");
            } else {
                info!(job_id = %job_id, "scan finished after cancellation, report dropped");
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{JobStatus, ScanJob};

    #[tokio::test]
    async fn test_local_run_completes_with_report() {
        let registry = JobRegistry::new();
        let job = ScanJob::new("https://example.com", ScanTool::Zap);
        let id = registry.insert(job).await;

        let executor = LocalExecutor::new(Duration::from_millis(1));
        executor
            .execute(
                registry.clone(),
                id.clone(),
                "https://example.com".to_string(),
                ScanTool::Zap,
            )
            .await
            .unwrap();

        let snap = registry.snapshot(&id).await.unwrap();
        assert_eq!(snap.status, JobStatus::Completed);
        assert_eq!(snap.progress, 100);
        assert_eq!(snap.result.unwrap().summary.high, 1);
    }

    #[tokio::test]
    async fn test_local_run_skips_job_cancelled_while_queued() {
        let registry = JobRegistry::new();
        let job = ScanJob::new("https://example.com", ScanTool::Zap);
        let id = registry.insert(job).await;
        registry.cancel(&id).await.unwrap();

        let executor = LocalExecutor::new(Duration::from_millis(1));
        executor
            .execute(
                registry.clone(),
                id.clone(),
                "https://example.com".to_string(),
                ScanTool::Zap,
            )
            .await
            .unwrap();

        let snap = registry.snapshot(&id).await.unwrap();
        assert_eq!(snap.status, JobStatus::Cancelled);
        assert_eq!(snap.progress, 0);
        assert!(snap.result.is_none());
    }
}
