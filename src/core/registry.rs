//! In-memory registry of scan jobs.
//!
//! This module provides a thread-safe store for every job the daemon has
//! accepted. Jobs are NOT persisted; a restart forgets them. Terminal jobs
//! are retained so pollers can still fetch results after completion.
//!
//! All state transitions go through compare-and-set style methods that check
//! the current status before writing. A terminal status (completed, failed,
//! cancelled) is absorbing: no method moves a job out of it. This closes two
//! races that unguarded writes would allow, a runner finishing after a
//! cancel request clobbering the cancelled status, and a cancel of a queued
//! job being overwritten when the runner finally starts.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{CancelError, JobSnapshot, JobStatus, ScanJob, ScanReport};

/// Thread-safe in-memory store for scan jobs.
///
/// This is designed to be shared across the application via `AppContext`.
/// Executors write transitions through it while the HTTP layer reads
/// snapshots, so every mutation validates the current status first.
#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<HashMap<String, ScanJob>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a freshly created job and return its id.
    pub async fn insert(&self, job: ScanJob) -> String {
        let id = job.id.clone();
        let mut map = self.inner.write().await;
        map.insert(id.clone(), job);
        id
    }

    /// Get the current state of a specific job.
    pub async fn snapshot(&self, job_id: &str) -> Option<JobSnapshot> {
        let map = self.inner.read().await;
        map.get(job_id).map(JobSnapshot::from)
    }

    /// Move a queued job to running. Returns false if the job is missing or
    /// no longer queued, which tells the executor to stop before doing work.
    pub async fn mark_running(&self, job_id: &str) -> bool {
        let mut map = self.inner.write().await;
        match map.get_mut(job_id) {
            Some(job) if job.status == JobStatus::Queued => {
                job.status = JobStatus::Running;
                true
            }
            _ => false,
        }
    }

    /// Record a progress tick. Only running jobs accept progress, so a false
    /// return doubles as the executor's cancellation checkpoint.
    pub async fn advance(&self, job_id: &str, progress: u8) -> bool {
        let mut map = self.inner.write().await;
        match map.get_mut(job_id) {
            Some(job) if job.status == JobStatus::Running => {
                job.progress = progress;
                true
            }
            _ => false,
        }
    }

    /// Whether the job has been cancelled. Used by watchers that poll an
    /// external queue and need to stop waiting on its result.
    pub async fn is_cancelled(&self, job_id: &str) -> bool {
        let map = self.inner.read().await;
        map.get(job_id)
            .map(|job| job.status == JobStatus::Cancelled)
            .unwrap_or(false)
    }

    /// Attach the report and finish the job. Only a running job completes;
    /// a cancel that landed first wins and the report is dropped.
    pub async fn complete(&self, job_id: &str, report: ScanReport) -> bool {
        let mut map = self.inner.write().await;
        match map.get_mut(job_id) {
            Some(job) if job.status == JobStatus::Running => {
                job.status = JobStatus::Completed;
                job.progress = 100;
                job.result = Some(report);
                true
            }
            _ => false,
        }
    }

    /// Mark a job failed. No-op on terminal jobs.
    pub async fn fail(&self, job_id: &str) -> bool {
        let mut map = self.inner.write().await;
        match map.get_mut(job_id) {
            Some(job) if !job.status.is_terminal() => {
                job.status = JobStatus::Failed;
                true
            }
            _ => false,
        }
    }

    /// Request cancellation. Queued and running jobs move to cancelled;
    /// cancelling an already cancelled job succeeds again. Jobs that already
    /// finished (completed or failed) refuse.
    pub async fn cancel(&self, job_id: &str) -> Result<(), CancelError> {
        let mut map = self.inner.write().await;
        let job = map.get_mut(job_id).ok_or(CancelError::NotFound)?;
        match job.status {
            JobStatus::Completed | JobStatus::Failed => Err(CancelError::AlreadyFinished),
            JobStatus::Cancelled => Ok(()),
            JobStatus::Queued | JobStatus::Running => {
                job.status = JobStatus::Cancelled;
                Ok(())
            }
        }
    }

    /// Total number of jobs tracked, terminal ones included.
    pub async fn job_count(&self) -> usize {
        let map = self.inner.read().await;
        map.len()
    }

    /// Number of jobs still queued or running.
    pub async fn active_count(&self) -> usize {
        let map = self.inner.read().await;
        map.values().filter(|job| !job.status.is_terminal()).count()
    }
}
