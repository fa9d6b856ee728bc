//! Daemon configuration.
//!
//! Layered with figment: compiled defaults, then the `dastd.toml` file,
//! then `DASTD_`-prefixed environment variables, then CLI flags. Flags the
//! user did not pass serialize to nothing and override nothing.

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::core::executor::ExecutorKind;

/// Environment variable naming an alternative config file path.
const CONFIG_PATH_VAR: &str = "DASTD_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP API binds to.
    pub http_bind: SocketAddr,
    /// Backend that runs submitted scans.
    pub executor: ExecutorKind,
    /// Broker the delegated backend reports it would connect to.
    pub broker_url: String,
    /// Delay between the local backend's progress steps.
    pub step_delay_ms: u64,
    /// Interval at which the delegated backend polls the broker.
    pub poll_interval_ms: u64,
    /// Emit logs as JSON.
    pub log_json: bool,
    /// Default the log level to debug instead of info.
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_bind: SocketAddr::from(([127, 0, 0, 1], 8480)),
            executor: ExecutorKind::Local,
            broker_url: "redis://127.0.0.1:6379/0".to_string(),
            step_delay_ms: 500,
            poll_interval_ms: 500,
            log_json: false,
            verbose: false,
        }
    }
}

impl AppConfig {
    /// Load configuration, layering file, environment and CLI overrides on
    /// top of the defaults.
    pub fn new<T: Serialize>(cli_overrides: Option<&T>) -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "dastd.toml".to_string());

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed("DASTD_"));

        if let Some(args) = cli_overrides {
            figment = figment.merge(Serialized::defaults(args));
        }

        figment.extract().context("Failed to load configuration")
    }
}
