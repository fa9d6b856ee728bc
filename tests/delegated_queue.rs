//! Integration tests for the delegated execution path.
//!
//! The real broker is out of scope, so these tests exercise the watcher
//! against the simulated queue plus two misbehaving stand-ins: a worker
//! that fails mid-scan and a broker that refuses the handoff entirely.

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use dastd::core::executor::DelegatedExecutor;
use dastd::core::models::{JobSnapshot, JobStatus, ScanReport, ScanTool};
use dastd::core::queue::{QueueClient, SimulatedQueue, TaskHandle};
use dastd::core::service::ScanService;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};

fn delegated_service(queue: Arc<dyn QueueClient>, poll_ms: u64) -> ScanService {
    ScanService::new(Arc::new(DelegatedExecutor::new(
        queue,
        Duration::from_millis(poll_ms),
    )))
}

/// Poll until the job reaches a terminal status.
async fn wait_terminal(service: &ScanService, job_id: &str) -> JobSnapshot {
    timeout(Duration::from_secs(5), async {
        loop {
            let snap = service.status(job_id).await.expect("job disappeared");
            if snap.status.is_terminal() {
                return snap;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timeout waiting for terminal status")
}

/// Worker that blows up shortly after accepting the task.
struct FailingQueue;

struct FailingTask {
    ready_at: Instant,
}

#[async_trait]
impl QueueClient for FailingQueue {
    async fn enqueue(&self, _target: &str, _tool: ScanTool) -> Result<Box<dyn TaskHandle>> {
        Ok(Box::new(FailingTask {
            ready_at: Instant::now() + Duration::from_millis(30),
        }))
    }
}

#[async_trait]
impl TaskHandle for FailingTask {
    async fn poll(&self) -> Result<Option<ScanReport>> {
        if Instant::now() >= self.ready_at {
            Err(anyhow!("worker container exited with code 137"))
        } else {
            Ok(None)
        }
    }
}

/// Broker that cannot be reached at all.
struct UnreachableQueue;

#[async_trait]
impl QueueClient for UnreachableQueue {
    async fn enqueue(&self, _target: &str, _tool: ScanTool) -> Result<Box<dyn TaskHandle>> {
        bail!("connection refused")
    }
}

#[tokio::test]
async fn test_delegated_scan_completes_with_worker_report() {
    let queue = Arc::new(SimulatedQueue::new(Duration::from_millis(50)));
    let service = delegated_service(queue, 10);

    let id = service.submit("https://example.com", ScanTool::Zap).await;

    let snap = wait_terminal(&service, &id).await;
    assert_eq!(snap.status, JobStatus::Completed);
    assert_eq!(snap.progress, 100);

    let report = snap.result.expect("completed job carries a report");
    assert_eq!(report.summary.high, 1);
    assert_eq!(report.findings[0].url, "https://example.com");
}

#[tokio::test]
async fn test_delegated_scan_has_no_step_progress() {
    let queue = Arc::new(SimulatedQueue::new(Duration::from_millis(80)));
    let service = delegated_service(queue, 10);

    let id = service.submit("https://example.com", ScanTool::Zap).await;

    // While the worker is busy the job shows no partial progress
    sleep(Duration::from_millis(30)).await;
    let snap = service.status(&id).await.expect("job should be tracked");
    if snap.status == JobStatus::Running {
        assert_eq!(snap.progress, 0, "delegated jobs report no step ticks");
    }

    let snap = wait_terminal(&service, &id).await;
    assert_eq!(snap.status, JobStatus::Completed);
    assert_eq!(snap.progress, 100);
}

#[tokio::test]
async fn test_worker_failure_marks_job_failed() {
    let service = delegated_service(Arc::new(FailingQueue), 10);

    let id = service.submit("https://example.com", ScanTool::Zap).await;

    let snap = wait_terminal(&service, &id).await;
    assert_eq!(snap.status, JobStatus::Failed);
    assert!(snap.result.is_none(), "failed jobs carry no report");

    // A failed job counts as finished for cancellation purposes
    assert!(service.cancel(&id).await.is_err());
}

#[tokio::test]
async fn test_unreachable_broker_marks_job_failed() {
    let service = delegated_service(Arc::new(UnreachableQueue), 10);

    let id = service.submit("https://example.com", ScanTool::Zap).await;

    let snap = wait_terminal(&service, &id).await;
    assert_eq!(snap.status, JobStatus::Failed);
    assert!(snap.result.is_none());
    assert_eq!(service.active_count().await, 0);
}

#[tokio::test]
async fn test_cancel_stops_the_watcher() {
    // A worker that will not finish within the test window
    let queue = Arc::new(SimulatedQueue::new(Duration::from_secs(60)));
    let service = delegated_service(queue, 10);

    let id = service.submit("https://example.com", ScanTool::Zap).await;
    sleep(Duration::from_millis(30)).await;
    service.cancel(&id).await.expect("cancel should succeed");

    // drain only returns once the watcher task gave up on the worker
    timeout(Duration::from_secs(2), service.drain())
        .await
        .expect("watcher should stop after cancellation");

    let snap = service.status(&id).await.expect("job should be tracked");
    assert_eq!(snap.status, JobStatus::Cancelled);
    assert!(snap.result.is_none());
}

#[tokio::test]
async fn test_worker_result_after_cancel_is_dropped() {
    // The worker finishes while the watcher sleeps between polls, so the
    // cancel lands before the watcher ever sees the report
    let queue = Arc::new(SimulatedQueue::new(Duration::from_millis(150)));
    let service = delegated_service(queue, 300);

    let id = service.submit("https://example.com", ScanTool::Zap).await;
    service.cancel(&id).await.expect("cancel should succeed");

    service.drain().await;
    let snap = service.status(&id).await.expect("job should be tracked");
    assert_eq!(snap.status, JobStatus::Cancelled);
    assert!(
        snap.result.is_none(),
        "late worker report must not resurrect the job"
    );
}
