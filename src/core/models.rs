use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// External scan tool a job is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanTool {
    Zap,
    Nuclei,
    Both,
}

impl ScanTool {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "zap" => Some(Self::Zap),
            "nuclei" => Some(Self::Nuclei),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zap => "zap",
            Self::Nuclei => "nuclei",
            Self::Both => "both",
        }
    }
}

/// Lifecycle states of a scan job.
///
/// `Completed`, `Failed` and `Cancelled` are terminal; a job never leaves
/// them once entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Severity of a single finding, serialized capitalized ("High") as the
/// scan tools report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

/// One issue reported by a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub url: String,
}

/// Issue counts keyed by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingsSummary {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

/// Findings produced by a finished scan: the per-severity summary plus a
/// sample of concrete findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub summary: FindingsSummary,
    pub findings: Vec<Finding>,
}

impl ScanReport {
    /// Synthesized report for simulated execution. The counts match what the
    /// placeholder queue worker produces: one high-severity hit when ZAP is
    /// involved, a fixed handful of medium/low noise otherwise.
    pub fn simulated(tool: ScanTool, target: &str) -> Self {
        let high = match tool {
            ScanTool::Zap | ScanTool::Both => 1,
            ScanTool::Nuclei => 0,
        };

        let mut findings = Vec::new();
        if matches!(tool, ScanTool::Zap | ScanTool::Both) {
            findings.push(Finding {
                id: "ZAP-001".to_string(),
                severity: Severity::High,
                title: "Reflected Cross-Site Scripting".to_string(),
                url: target.to_string(),
            });
        }
        if matches!(tool, ScanTool::Nuclei | ScanTool::Both) {
            findings.push(Finding {
                id: "NUCLEI-001".to_string(),
                severity: Severity::Medium,
                title: "Missing Security Headers".to_string(),
                url: target.to_string(),
            });
        }

        Self {
            summary: FindingsSummary {
                critical: 0,
                high,
                medium: 2,
                low: 1,
            },
            findings,
        }
    }
}

/// A scan job as the registry owns it.
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub id: String,
    pub target: String,
    pub tool: ScanTool,
    pub status: JobStatus,
    pub progress: u8,
    pub result: Option<ScanReport>,
    pub created_at: i64,
}

impl ScanJob {
    pub fn new(target: impl Into<String>, tool: ScanTool) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            target: target.into(),
            tool,
            status: JobStatus::Queued,
            progress: 0,
            result: None,
            created_at: Utc::now().timestamp(),
        }
    }
}

/// Read-only view of a job handed to status pollers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: String,
    pub target: String,
    pub tool: ScanTool,
    pub status: JobStatus,
    pub progress: u8,
    pub result: Option<ScanReport>,
}

impl From<&ScanJob> for JobSnapshot {
    fn from(job: &ScanJob) -> Self {
        Self {
            id: job.id.clone(),
            target: job.target.clone(),
            tool: job.tool,
            status: job.status,
            progress: job.progress,
            result: job.result.clone(),
        }
    }
}

/// Why a cancel request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelError {
    #[error("job not found")]
    NotFound,
    #[error("job already finished")]
    AlreadyFinished,
}
