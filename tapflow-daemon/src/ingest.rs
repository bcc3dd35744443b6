//! Envelope ingestion and per-topic workers.
//!
//! Input is a stream of JSON lines, each an [`Envelope`]. Envelopes are routed
//! to one worker per subscribed topic; all workers share one `Arc<Dispatcher>`.
//! Malformed lines are logged, counted and skipped.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use tapflow_core::metrics as m;
use tapflow_core::record::Record;
use tapflow_core::types::ProcessReport;
use tapflow_stream_processor::Dispatcher;

use crate::sink::{Output, PendingSink};

/// Per-topic worker queue capacity.
pub const RECORD_CHANNEL_CAPACITY: usize = 1024;

/// One input line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    /// Bus topic.
    pub topic: String,
    /// Raw record.
    pub record: Record,
}

impl Envelope {
    /// Parse one JSON line.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Counters reported after the input ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Envelopes handed to a worker.
    pub routed: u64,
    /// Envelopes for topics nobody subscribes to.
    pub unrouted: u64,
    /// Lines that were not valid envelopes.
    pub malformed: u64,
}

/// Routes envelopes to per-topic workers.
pub struct TopicRouter {
    dispatcher: Arc<Dispatcher>,
    senders: HashMap<String, mpsc::Sender<Record>>,
    workers: Vec<JoinHandle<u64>>,
}

impl TopicRouter {
    /// Spawn one worker for each subscribed topic.
    ///
    /// `pending` must be the inventory sink wired into the dispatcher's toolset.
    pub fn spawn(
        dispatcher: Arc<Dispatcher>,
        pending: Arc<PendingSink>,
        output: mpsc::Sender<Output>,
    ) -> Self {
        let mut senders = HashMap::new();
        let mut workers = Vec::new();

        for topic in dispatcher.topics() {
            let (tx, rx) = mpsc::channel(RECORD_CHANNEL_CAPACITY);
            workers.push(tokio::spawn(run_worker(
                topic.to_owned(),
                Arc::clone(&dispatcher),
                Arc::clone(&pending),
                rx,
                output.clone(),
            )));
            senders.insert(topic.to_owned(), tx);
        }
        tracing::debug!(workers = workers.len(), "topic workers spawned");

        Self {
            dispatcher,
            senders,
            workers,
        }
    }

    /// Hand one envelope to its topic worker. Returns `false` if no worker subscribes.
    pub async fn route(&self, envelope: Envelope) -> bool {
        let Some(tx) = self.senders.get(&envelope.topic) else {
            // Counts the record as unrouted.
            let _ = self.dispatcher.dispatch(&envelope.topic, &envelope.record);
            return false;
        };
        if tx.send(envelope.record).await.is_err() {
            tracing::error!(topic = %envelope.topic, "topic worker stopped unexpectedly");
            return false;
        }
        true
    }

    /// Close every worker queue and wait for the workers to drain.
    ///
    /// Returns the number of records processed.
    pub async fn shutdown(self) -> u64 {
        drop(self.senders);
        let mut processed = 0;
        for worker in self.workers {
            match worker.await {
                Ok(n) => processed += n,
                Err(e) => tracing::error!(error = %e, "topic worker failed"),
            }
        }
        processed
    }
}

/// Read envelopes until EOF or a shutdown signal.
pub async fn read_envelopes<R>(
    reader: R,
    router: &TopicRouter,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<IngestStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = IngestStats::default();
    let mut line_no = 0u64;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = shutdown.recv() => {
                tracing::info!("shutdown requested, stopping ingestion");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        line_no += 1;

        if line.trim().is_empty() {
            continue;
        }

        match Envelope::parse(&line) {
            Ok(envelope) => {
                if router.route(envelope).await {
                    stats.routed += 1;
                } else {
                    stats.unrouted += 1;
                }
            }
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "skipping malformed envelope");
                metrics::counter!(m::DAEMON_MALFORMED_INPUT_TOTAL).increment(1);
                stats.malformed += 1;
            }
        }
    }

    Ok(stats)
}

async fn run_worker(
    topic: String,
    dispatcher: Arc<Dispatcher>,
    pending: Arc<PendingSink>,
    mut rx: mpsc::Receiver<Record>,
    output: mpsc::Sender<Output>,
) -> u64 {
    let mut processed = 0;
    while let Some(record) = rx.recv().await {
        processed += 1;
        let Some(report) = dispatcher.dispatch(&topic, &record) else {
            continue;
        };
        let sent = match emit_report(&topic, report, &output).await {
            Ok(()) => flush_pending(&pending, &output).await,
            Err(e) => Err(e),
        };
        if sent.is_err() {
            tracing::debug!(topic = %topic, "output channel closed, worker exiting");
            break;
        }
    }
    tracing::debug!(topic = %topic, processed, "topic worker finished");
    processed
}

/// Log the report's notes and forward its derived entities.
async fn emit_report(
    topic: &str,
    report: ProcessReport,
    output: &mpsc::Sender<Output>,
) -> Result<(), mpsc::error::SendError<Output>> {
    let processor = report.processor;
    for note in report.diagnostics.into_notes() {
        match &note.context {
            Some(context) => tracing::warn!(topic, processor = %processor, context = %context, "{}", note.message),
            None => tracing::warn!(topic, processor = %processor, "{}", note.message),
        }
    }

    for event in report.events {
        output.send(Output::event(topic, event)).await?;
    }
    for line in report.log_lines {
        output.send(Output::log_line(topic, line)).await?;
    }
    Ok(())
}

/// Send the inventory outputs buffered by the sink.
///
/// Workers share one sink, so a worker may send outputs produced by another.
async fn flush_pending(
    pending: &PendingSink,
    output: &mpsc::Sender<Output>,
) -> Result<(), mpsc::error::SendError<Output>> {
    for item in pending.take() {
        output.send(item).await?;
    }
    Ok(())
}
