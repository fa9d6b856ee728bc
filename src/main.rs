use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dastd::core::ScanService;
use dastd::core::executor::{ExecutorKind, create_executor};
use dastd::web::{DaemonStatus, WebServer};
use dastd::{config, context, logging};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dastd")]
#[command(about = "Asynchronous DAST Scan Daemon", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scan daemon
    Daemon(ServerArgs),
    /// Query a running daemon
    Status(StatusArgs),
}

#[derive(Args, Serialize)]
struct ServerArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    http_bind: Option<SocketAddr>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    executor: Option<ExecutorKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    broker_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    step_delay_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    log_json: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    verbose: Option<bool>,
}

#[derive(Args)]
struct StatusArgs {
    /// Daemon address, defaults to the configured http_bind
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Daemon(args) => {
            let config = config::AppConfig::new(Some(args))?;
            logging::init(logging::LogConfig {
                json: config.log_json,
                verbose: config.verbose,
            });
            run_daemon(config).await.context("Failed to start daemon")?
        }
        Commands::Status(args) => {
            let config = config::AppConfig::new(None::<&ServerArgs>)?;
            let addr = args.addr.unwrap_or(config.http_bind);
            run_status(addr)
                .await
                .context("Failed to check status of daemon")?
        }
    }

    Ok(())
}

async fn run_daemon(config: config::AppConfig) -> Result<()> {
    let executor = create_executor(&config);
    let scans = ScanService::new(executor);
    let bind_addr = config.http_bind;
    let ctx = context::AppContext::new(config, scans);

    let server = Arc::new(WebServer::new(ctx.clone(), bind_addr));
    let mut server_task = tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.start().await }
    });

    tokio::select! {
        result = &mut server_task => result??,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            server.shutdown();
            server_task.await??;
        }
    }

    // Let in-flight scan tasks settle before the process exits
    ctx.scans.drain().await;
    tracing::info!("Scan daemon stopped");
    Ok(())
}

async fn run_status(addr: SocketAddr) -> Result<()> {
    let url = format!("http://{addr}/api/v1/status");
    let status: DaemonStatus = reqwest::get(&url)
        .await
        .context("Failed to reach the daemon")?
        .error_for_status()
        .context("Daemon returned an error")?
        .json()
        .await
        .context("Failed to parse daemon status")?;

    println!("dastd {} (up {}s)", status.version, status.uptime_secs);
    println!("  executor:    {}", status.executor);
    println!("  jobs total:  {}", status.jobs_total);
    println!("  jobs active: {}", status.jobs_active);
    Ok(())
}
