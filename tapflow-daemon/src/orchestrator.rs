//! Daemon orchestration -- assembly, worker wiring and lifecycle.
//!
//! The [`Orchestrator`] loads configuration, builds the shared toolset and
//! dispatcher, then runs ingestion until the input ends or a shutdown signal
//! arrives.
//!
//! # Data flow
//!
//! ```text
//! input lines -> TopicRouter -> worker(topic) -> Dispatcher -> ProcessReport
//!                                                    |              |
//!                                               PendingSink      events, log lines
//!                                                    \              /
//!                                     worker sends -> output channel -> JSON lines
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::{broadcast, mpsc};

use tapflow_core::config::TapflowConfig;
use tapflow_core::metrics as m;
use tapflow_stream_processor::{Dispatcher, MemoryCache, StreamConfig, Toolset};

use crate::ingest::{self, IngestStats, TopicRouter};
use crate::metrics_server;
use crate::sink::{self, Output, PendingSink};

/// Output channel capacity.
const OUTPUT_CHANNEL_CAPACITY: usize = 1024;

/// Uptime gauge refresh interval.
const UPTIME_INTERVAL: Duration = Duration::from_secs(15);

/// Interval between sweeps of expired cache entries.
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Summary returned once a run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ingestion counters.
    pub ingest: IngestStats,
    /// Records processed by the topic workers.
    pub processed: u64,
    /// Output lines written.
    pub outputs: u64,
}

/// The main daemon orchestrator.
pub struct Orchestrator {
    config: TapflowConfig,
    dispatcher: Arc<Dispatcher>,
    cache: Arc<MemoryCache>,
    pending: Arc<PendingSink>,
    output_tx: mpsc::Sender<Output>,
    output_rx: mpsc::Receiver<Output>,
    shutdown_tx: broadcast::Sender<()>,
    start_time: Instant,
}

impl Orchestrator {
    /// Load `tapflow.toml` (with environment overrides) and build the orchestrator.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = TapflowConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    pub fn build_from_config(config: TapflowConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let stream_config = StreamConfig::from_core(&config)
            .map_err(|e| anyhow::anyhow!("invalid processor config: {}", e))?;

        let (output_tx, output_rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        let cache = Arc::new(MemoryCache::new());
        let pending = Arc::new(PendingSink::new());
        let tools = Toolset::new(cache.clone(), pending.clone(), pending.clone());

        let dispatcher = Dispatcher::from_config(&stream_config, tools)
            .map_err(|e| anyhow::anyhow!("failed to build dispatcher: {}", e))?;
        let (shutdown_tx, _) = broadcast::channel(4);

        tracing::info!(
            topics = ?dispatcher.topics(),
            processors = dispatcher.processors().len(),
            "orchestrator initialized"
        );

        Ok(Self {
            config,
            dispatcher: Arc::new(dispatcher),
            cache,
            pending,
            output_tx,
            output_rx,
            shutdown_tx,
            start_time: Instant::now(),
        })
    }

    /// Sender that stops ingestion when a message is sent.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// The loaded configuration.
    pub fn config(&self) -> &TapflowConfig {
        &self.config
    }

    /// The shared dispatcher.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// The shared cache.
    pub fn cache(&self) -> &Arc<MemoryCache> {
        &self.cache
    }

    /// Ingest `input` until EOF or shutdown and write outputs to `output`.
    ///
    /// Workers drain their queues before this returns; the writer is handed back.
    pub async fn run<R, W>(self, input: R, output: W) -> Result<(RunSummary, W)>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let Self {
            config,
            dispatcher,
            cache,
            pending,
            output_tx,
            output_rx,
            shutdown_tx,
            start_time,
        } = self;

        let writer = tokio::spawn(sink::write_outputs(output_rx, output));
        let uptime = config
            .metrics
            .enabled
            .then(|| spawn_uptime_updater(start_time, shutdown_tx.subscribe()));
        let sweeper = spawn_cache_sweeper(cache, CACHE_SWEEP_INTERVAL, shutdown_tx.subscribe());

        let router = TopicRouter::spawn(Arc::clone(&dispatcher), pending, output_tx.clone());
        let ingest_result = ingest::read_envelopes(input, &router, shutdown_tx.subscribe()).await;
        let processed = router.shutdown().await;

        // Workers have exited; the last sender closes the writer.
        drop(output_tx);
        drop(dispatcher);
        let _ = shutdown_tx.send(());
        if let Some(task) = uptime {
            let _ = task.await;
        }
        let _ = sweeper.await;

        let (output, outputs) = writer
            .await
            .map_err(|e| anyhow::anyhow!("output writer task failed: {}", e))??;
        let ingest = ingest_result?;

        let summary = RunSummary {
            ingest,
            processed,
            outputs,
        };
        tracing::info!(
            routed = ingest.routed,
            unrouted = ingest.unrouted,
            malformed = ingest.malformed,
            processed,
            outputs,
            "ingestion finished"
        );
        Ok((summary, output))
    }
}

fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPTIME_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(start_time.elapsed().as_secs_f64());
                }
                _ = shutdown.recv() => break,
            }
        }
    })
}

/// Periodically drop expired cache entries and idle namespaces.
pub fn spawn_cache_sweeper(
    cache: Arc<MemoryCache>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    cache.purge_expired();
                }
                _ = shutdown.recv() => break,
            }
        }
    })
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for Ctrl+C.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("CTRL_C")
}
