use crate::config::AppConfig;
use crate::core::ScanService;
use std::time::Instant;

#[derive(Clone)]
pub struct AppContext {
    pub config: std::sync::Arc<AppConfig>,
    pub scans: ScanService,
    started_at: Instant,
}

impl AppContext {
    pub fn new(config: AppConfig, scans: ScanService) -> Self {
        Self {
            config: std::sync::Arc::new(config),
            scans,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
