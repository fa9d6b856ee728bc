//! Submit/Status/Cancel over the job registry.

use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use super::executor::ScanExecutor;
use super::models::{CancelError, JobSnapshot, ScanJob, ScanTool};
use super::registry::JobRegistry;

/// Front door for scan jobs.
///
/// Owns the registry and the executor picked at startup, and spawns one
/// execution task per submitted job. Execution faults never reach the
/// caller; they are logged and the job lands in failed.
#[derive(Clone)]
pub struct ScanService {
    registry: JobRegistry,
    executor: Arc<dyn ScanExecutor>,
    tasks: TaskTracker,
}

impl ScanService {
    pub fn new(executor: Arc<dyn ScanExecutor>) -> Self {
        Self {
            registry: JobRegistry::new(),
            executor,
            tasks: TaskTracker::new(),
        }
    }

    /// Accept a scan and start it in the background. Returns the job id
    /// right away; callers poll `status` for progress.
    pub async fn submit(&self, target: impl Into<String>, tool: ScanTool) -> String {
        let job = ScanJob::new(target, tool);
        let target = job.target.clone();
        let id = self.registry.insert(job).await;
        info!(job_id = %id, target_url = %target, tool = tool.as_str(), "scan submitted");

        let run = self
            .executor
            .execute(self.registry.clone(), id.clone(), target, tool);
        let registry = self.registry.clone();
        let job_id = id.clone();
        self.tasks.spawn(async move {
            if let Err(err) = run.await {
                error!(job_id = %job_id, error = %err, "scan execution failed");
                registry.fail(&job_id).await;
            }
        });

        id
    }

    /// Current snapshot of a job, terminal ones included.
    pub async fn status(&self, job_id: &str) -> Option<JobSnapshot> {
        self.registry.snapshot(job_id).await
    }

    /// Request cancellation of a queued or running job.
    pub async fn cancel(&self, job_id: &str) -> Result<(), CancelError> {
        self.registry.cancel(job_id).await?;
        info!(job_id = %job_id, "scan cancelled");
        Ok(())
    }

    /// Total number of jobs accepted since startup.
    pub async fn job_count(&self) -> usize {
        self.registry.job_count().await
    }

    /// Jobs currently queued or running.
    pub async fn active_count(&self) -> usize {
        self.registry.active_count().await
    }

    /// Wait until every spawned execution task has settled. Used on
    /// shutdown and by tests that need a quiescent service.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor::LocalExecutor;
    use crate::core::models::JobStatus;
    use std::time::Duration;

    fn service_with_step(step_delay: Duration) -> ScanService {
        ScanService::new(Arc::new(LocalExecutor::new(step_delay)))
    }

    #[tokio::test]
    async fn test_submit_returns_live_pollable_job() {
        let service = service_with_step(Duration::from_millis(50));
        let id = service.submit("https://example.com", ScanTool::Zap).await;
        assert!(!id.is_empty());

        let snap = service.status(&id).await.unwrap();
        assert!(matches!(
            snap.status,
            JobStatus::Queued | JobStatus::Running
        ));
        assert!(snap.progress < 100);
        assert!(snap.result.is_none());

        service.drain().await;
        let snap = service.status(&id).await.unwrap();
        assert_eq!(snap.status, JobStatus::Completed);
        assert_eq!(snap.progress, 100);
        assert!(snap.result.is_some());
        assert_eq!(service.job_count().await, 1);
        assert_eq!(service.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_right_after_submit_sticks() {
        let service = service_with_step(Duration::from_millis(200));
        let id = service.submit("https://example.com", ScanTool::Zap).await;
        service.cancel(&id).await.unwrap();

        // The spawned runner must not revive the job
        service.drain().await;
        let snap = service.status(&id).await.unwrap();
        assert_eq!(snap.status, JobStatus::Cancelled);
        assert!(snap.result.is_none());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_reported_as_missing() {
        let service = service_with_step(Duration::from_millis(1));
        assert!(service.status("no-such-job").await.is_none());
        assert_eq!(
            service.cancel("no-such-job").await,
            Err(CancelError::NotFound)
        );
    }
}
