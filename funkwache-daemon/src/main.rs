use anyhow::{Context, Result};
use clap::Parser;

use funkwache_core::config::FunkwacheConfig;

mod cli;
mod decoder;
mod logging;
mod orchestrator;
mod plugins;

use cli::DaemonCli;
use orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let args = DaemonCli::parse();

    // 설정 로드: 파일 -> 환경변수 -> CLI 오버라이드 순서
    let mut config = FunkwacheConfig::load(&args.config)
        .await
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    if let Some(level) = args.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = args.log_format {
        config.general.log_format = format;
    }
    if let Some(pid_file) = args.pid_file {
        config.general.pid_file = pid_file;
    }
    // CLI 오버라이드 이후 재검증
    config.validate().context("invalid configuration")?;

    if args.validate {
        println!("configuration OK: {}", args.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    funkwache_core::metrics::describe_metrics();

    tracing::info!(
        config = %args.config.display(),
        frequency_hz = config.receiver.frequency_hz,
        stdin = args.stdin,
        "funkwache-daemon starting"
    );

    let mut orchestrator = Orchestrator::new(config, args.stdin);
    orchestrator.run().await
}
