//! sentinel-sync binary

use clap::{ArgGroup, Parser};
use sentinel_sync::common::{parse_duration, ConfigSnapshot, SyncConfig};
use sentinel_sync::coordination::{CoordinationClient, ZkBackend};
use sentinel_sync::ops::{self, EXIT_FAILURE};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sentinel-sync")]
#[command(about = "Sync Redis Sentinel masters into ZooKeeper")]
#[command(version)]
#[command(group(ArgGroup::new("mode").required(true).args(["check", "monitor"])))]
struct Cli {
    /// Directory of Sentinel config files
    #[arg(short = 'i', long = "include")]
    include: PathBuf,

    /// ZooKeeper hosts (comma-separated host:port)
    #[arg(short = 'z', long = "zk")]
    zk: String,

    /// Sentinel port
    #[arg(short = 'p', long = "port")]
    port: u16,

    /// Audit config against ZooKeeper and exit
    #[arg(short = 'c')]
    check: bool,

    /// Propagate failovers and refresh masters until stopped
    #[arg(short = 'm')]
    monitor: bool,

    /// ZooKeeper root path
    #[arg(long)]
    zk_root: Option<String>,

    /// Sentinel host
    #[arg(long)]
    sentinel_host: Option<String>,

    /// Refresh interval (e.g. 10s)
    #[arg(long)]
    refresh_interval: Option<String>,
}

impl Cli {
    /// File and environment settings, overridden by flags.
    fn into_config(self, mut config: SyncConfig) -> anyhow::Result<SyncConfig> {
        config.include_dir = self.include;
        config.zk_hosts = self.zk;
        config.sentinel_port = self.port;
        if let Some(root) = self.zk_root {
            config.zk_root = root;
        }
        if let Some(host) = self.sentinel_host {
            config.sentinel_host = host;
        }
        if let Some(interval) = self.refresh_interval {
            config.set_refresh_interval(parse_duration(&interval)?)?;
        }
        config.validate()?;
        Ok(config)
    }
}

async fn check(config: &SyncConfig) -> anyhow::Result<i32> {
    let snapshot = ConfigSnapshot::load_dir(&config.include_dir)?;
    let backend = Arc::new(ZkBackend::new(config.zk_hosts.clone(), config.session_timeout()));
    let client = CoordinationClient::connect(backend, true).await?;
    let report = ops::audit(&snapshot, &client, config.root()).await;
    if let Some(mismatch) = report.mismatch() {
        tracing::error!("{}", mismatch);
    }
    Ok(report.exit_code())
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let check_mode = cli.check;
    let config = cli.into_config(SyncConfig::load()?)?;

    if check_mode {
        check(&config).await
    } else {
        // An unreadable include dir is fatal in every mode.
        ConfigSnapshot::load_dir(&config.include_dir)?;
        ops::run_monitor(&config).await?;
        Ok(0)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = SyncConfig::load()
        .map(|c| c.log_level)
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            EXIT_FAILURE
        }
    };
    ExitCode::from(code as u8)
}
