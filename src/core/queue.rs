//! Client-side seam for brokers that run scans out of process.
//!
//! The daemon never talks to a real broker directly; it goes through
//! `QueueClient`, and the delegated executor only ever sees a `TaskHandle`
//! it can poll. `SimulatedQueue` is the in-process stand-in worker.

use anyhow::Result;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

use super::models::{ScanReport, ScanTool};

/// Handle to a scan that was handed off to a queue worker.
#[async_trait]
pub trait TaskHandle: Send + Sync {
    /// Ask the broker whether the worker finished. `Ok(None)` while the scan
    /// is still in flight, `Ok(Some(..))` once the report is ready, `Err`
    /// when the worker crashed or rejected the task.
    async fn poll(&self) -> Result<Option<ScanReport>>;
}

/// Trait for queue broker client implementations.
#[async_trait]
pub trait QueueClient: Send + Sync {
    async fn enqueue(&self, target: &str, tool: ScanTool) -> Result<Box<dyn TaskHandle>>;
}

/// Stand-in broker running the placeholder worker in-process.
///
/// Each enqueued task becomes ready after a fixed worker delay with a
/// synthesized report, which is what the real worker fleet returns until the
/// actual scanner containers are wired up.
pub struct SimulatedQueue {
    worker_delay: Duration,
}

impl SimulatedQueue {
    pub fn new(worker_delay: Duration) -> Self {
        Self { worker_delay }
    }
}

impl Default for SimulatedQueue {
    fn default() -> Self {
        Self {
            worker_delay: Duration::from_secs(2),
        }
    }
}

#[async_trait]
impl QueueClient for SimulatedQueue {
    async fn enqueue(&self, target: &str, tool: ScanTool) -> Result<Box<dyn TaskHandle>> {
        debug!(target_url = %target, tool = tool.as_str(), "enqueued simulated scan task");
        Ok(Box::new(SimulatedTask {
            ready_at: Instant::now() + self.worker_delay,
            report: ScanReport::simulated(tool, target),
        }))
    }
}

struct SimulatedTask {
    ready_at: Instant,
    report: ScanReport,
}

#[async_trait]
impl TaskHandle for SimulatedTask {
    async fn poll(&self) -> Result<Option<ScanReport>> {
        if Instant::now() >= self.ready_at {
            Ok(Some(self.report.clone()))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_simulated_task_pends_then_completes() {
        let queue = SimulatedQueue::new(Duration::from_millis(40));
        let handle = queue
            .enqueue("https://example.com", ScanTool::Zap)
            .await
            .unwrap();

        assert!(handle.poll().await.unwrap().is_none());

        sleep(Duration::from_millis(60)).await;
        let report = handle.poll().await.unwrap().expect("worker should be done");
        assert_eq!(report.summary.high, 1);
        assert_eq!(report.findings[0].url, "https://example.com");

        // Ready handles stay ready
        assert!(handle.poll().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_simulated_report_tracks_tool() {
        let queue = SimulatedQueue::new(Duration::from_millis(0));
        let handle = queue
            .enqueue("https://example.com", ScanTool::Nuclei)
            .await
            .unwrap();

        let report = handle.poll().await.unwrap().unwrap();
        assert_eq!(report.summary.high, 0);
        assert_eq!(report.findings.len(), 1);
    }
}
