pub mod executor;
pub mod models;
pub mod queue;
pub mod registry;
pub mod service;

pub use models::{CancelError, JobSnapshot, JobStatus, ScanJob, ScanReport, ScanTool};
pub use registry::JobRegistry;
pub use service::ScanService;
