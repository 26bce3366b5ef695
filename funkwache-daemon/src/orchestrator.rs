//! Daemon orchestration -- assembly, wiring, and lifecycle management.
//!
//! The [`Orchestrator`] builds every component from the validated
//! configuration, wires the line source into the telegram pipeline,
//! runs until a shutdown signal or end of input, and tears everything
//! down in order.
//!
//! # Startup order (producers before consumers)
//!
//! 1. Output plugins (registered, then initialized fail-fast)
//! 2. Filter rules and description tables (loaded fail-fast)
//! 3. Telegram pipeline (owns dedup state and dispatcher)
//! 4. Line source (decoder chain stdout, or stdin)
//!
//! # Shutdown order
//!
//! 1. Cancel line source and pipeline loop
//! 2. Kill the decoder chain
//! 3. Drain in-flight deliveries with the configured grace period
//! 4. Stop plugins (continuing past individual failures)

use std::path::Path;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use funkwache_core::config::FunkwacheConfig;
use funkwache_core::event::Protocol;
use funkwache_telegram::describe::DescriptionTable;
use funkwache_telegram::filter::{FilterLoader, FilterRule};
use funkwache_telegram::pipeline::TelegramPipelineBuilder;
use funkwache_telegram::source::LineCollector;
use funkwache_telegram::{PipelineConfig, TelegramError, TelegramPipeline};

use crate::decoder::DecoderChain;
use crate::plugins;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: FunkwacheConfig,
    /// Read lines from stdin instead of spawning the decoder chain.
    stdin_mode: bool,
}

impl Orchestrator {
    /// Create an orchestrator from an already-validated configuration.
    pub fn new(config: FunkwacheConfig, stdin_mode: bool) -> Self {
        Self { config, stdin_mode }
    }

    /// Run the daemon until a shutdown signal or end of input.
    pub async fn run(&mut self) -> Result<()> {
        if !self.config.general.pid_file.is_empty() {
            write_pid_file(Path::new(&self.config.general.pid_file))?;
        }

        // 1. Output plugins
        let mut registry = plugins::build_registry(&self.config.plugins)?;
        registry
            .init_all()
            .await
            .context("plugin initialization failed")?;
        tracing::info!(plugins = registry.count(), "plugins initialized");
        let shared = registry.into_shared();

        // 2. Filter rules and description tables (fatal on corruption,
        //    before any telegram is processed)
        let rules = self.load_filter_rules().await?;
        let descriptions = self.load_descriptions().await?;

        // 3. Telegram pipeline
        let cancel = CancellationToken::new();
        let (mut pipeline, line_tx) = TelegramPipelineBuilder::new()
            .config(PipelineConfig::from_core(&self.config))
            .plugins(shared.clone())
            .filter_rules(rules)
            .descriptions(descriptions)
            .cancel_token(cancel.clone())
            .build()
            .context("failed to build telegram pipeline")?;

        // 4. Line source
        let max_line_length = self.config.dispatch.max_line_length;
        let mut decoder = None;
        let source_task: JoinHandle<Result<(), TelegramError>> = if self.stdin_mode {
            let collector =
                LineCollector::new(line_tx, "stdin", max_line_length, cancel.clone());
            tokio::spawn(collector.run(tokio::io::stdin()))
        } else {
            let (chain, stdout) = DecoderChain::spawn(&self.config.receiver)?;
            decoder = Some(chain);
            let collector =
                LineCollector::new(line_tx, "decoder", max_line_length, cancel.clone());
            tokio::spawn(collector.run(stdout))
        };

        let mut pipeline_task: JoinHandle<TelegramPipeline> = tokio::spawn(async move {
            if let Err(e) = pipeline.run().await {
                tracing::error!(error = %e, "pipeline loop failed");
            }
            pipeline
        });

        tracing::info!("funkwache-daemon running");

        // Wait for a shutdown signal, or for the pipeline to finish on
        // its own (end of input in stdin mode, decoder chain exit).
        let pipeline = tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for shutdown signal")?;
                tracing::info!("shutdown signal received");
                cancel.cancel();
                pipeline_task.await.context("pipeline task panicked")?
            }
            finished = &mut pipeline_task => {
                tracing::info!("input ended, shutting down");
                cancel.cancel();
                finished.context("pipeline task panicked")?
            }
        };

        self.teardown(pipeline, source_task, decoder, shared).await;

        if !self.config.general.pid_file.is_empty() {
            let _ = std::fs::remove_file(&self.config.general.pid_file);
        }

        tracing::info!("funkwache-daemon shut down");
        Ok(())
    }

    /// Load the filter rule table, if one is configured.
    async fn load_filter_rules(&self) -> Result<Vec<FilterRule>> {
        if self.config.filter.rule_file.is_empty() {
            // No filters configured: every plugin receives everything.
            return Ok(Vec::new());
        }
        let rules = FilterLoader::load_file(&self.config.filter.rule_file)
            .await
            .context("failed to load filter rules")?;
        Ok(rules)
    }

    /// Load the per-protocol description tables that are enabled.
    async fn load_descriptions(&self) -> Result<DescriptionTable> {
        let mut table = DescriptionTable::new();
        for (protocol, enabled, path) in [
            (
                Protocol::Fms,
                self.config.fms.describe,
                &self.config.fms.description_file,
            ),
            (
                Protocol::Zvei,
                self.config.zvei.describe,
                &self.config.zvei.description_file,
            ),
            (
                Protocol::Pocsag,
                self.config.pocsag.describe,
                &self.config.pocsag.description_file,
            ),
        ] {
            if enabled {
                table
                    .load_protocol_file(protocol, path)
                    .await
                    .with_context(|| format!("failed to load {protocol} description table"))?;
            }
        }
        Ok(table)
    }

    /// Tear down the source, decoder chain, dispatcher and plugins.
    async fn teardown(
        &self,
        mut pipeline: TelegramPipeline,
        source_task: JoinHandle<Result<(), TelegramError>>,
        decoder: Option<DecoderChain>,
        plugins: Vec<std::sync::Arc<dyn funkwache_core::plugin::DynAlarmPlugin>>,
    ) {
        if let Some(chain) = decoder {
            chain.shutdown().await;
        }

        match source_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "line source ended with error"),
            Err(e) => tracing::error!(error = %e, "line source task panicked"),
        }

        // Bounded grace period for in-flight deliveries.
        pipeline.shutdown().await;

        for plugin in &plugins {
            if let Err(e) = plugin.stop().await {
                tracing::error!(plugin = %plugin.info().name, error = %e, "plugin stop failed");
            }
        }
    }
}

/// Write the daemon PID to the given path.
fn write_pid_file(path: &Path) -> Result<()> {
    std::fs::write(path, format!("{}\n", std::process::id()))
        .with_context(|| format!("failed to write PID file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "PID file written");
    Ok(())
}
