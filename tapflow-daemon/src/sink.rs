//! Output records and the buffered inventory sink.
//!
//! Every derived entity leaves the daemon as one [`Output`] JSON line,
//! tagged by `kind`. [`PendingSink`] implements the inventory collaborator
//! traits by buffering; topic workers drain it after each record and send
//! the outputs with backpressure, the same way they send events.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use tapflow_core::pipeline::{HostInventory, InventoryProducer};
use tapflow_core::record::Record;
use tapflow_core::types::{Event, InventoryUpdate, LogLine};

/// One output line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Output {
    /// Event derived from an audit record.
    Event {
        /// Topic the source record came from.
        topic: String,
        /// The derived event.
        event: Event,
    },
    /// Cached log line, eventified.
    LogLine {
        topic: String,
        logset: String,
        line: String,
    },
    /// Inventory update produced by the inventory processor.
    InventoryUpdate { update: InventoryUpdate },
    /// Inventory record forwarded to the host sink.
    HostUpdate { record: Record },
}

impl Output {
    pub fn event(topic: &str, event: Event) -> Self {
        Self::Event {
            topic: topic.to_owned(),
            event,
        }
    }

    pub fn log_line(topic: &str, line: LogLine) -> Self {
        Self::LogLine {
            topic: topic.to_owned(),
            logset: line.logset,
            line: line.line,
        }
    }

    /// The `kind` tag of this output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Event { .. } => "event",
            Self::LogLine { .. } => "log_line",
            Self::InventoryUpdate { .. } => "inventory_update",
            Self::HostUpdate { .. } => "host_update",
        }
    }
}

/// Inventory collaborator that buffers outputs until a worker takes them.
///
/// Processors call the sink synchronously and cannot wait on the output
/// channel, so nothing is sent from here.
#[derive(Debug, Default)]
pub struct PendingSink {
    pending: Mutex<Vec<Output>>,
}

impl PendingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Output>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take every buffered output, oldest first.
    pub fn take(&self) -> Vec<Output> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of buffered outputs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InventoryProducer for PendingSink {
    fn produce_inventory_update(&self, update: InventoryUpdate) {
        self.lock().push(Output::InventoryUpdate { update });
    }
}

impl HostInventory for PendingSink {
    fn update_host(&self, record: &Record) {
        self.lock().push(Output::HostUpdate {
            record: record.clone(),
        });
    }
}

/// Drain the output channel into `writer`, one JSON document per line.
///
/// Returns the writer and the number of lines written once every sender is dropped.
pub async fn write_outputs<W>(mut rx: mpsc::Receiver<Output>, mut writer: W) -> anyhow::Result<(W, u64)>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(output) = rx.recv().await {
        let mut line = serde_json::to_vec(&output)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        written += 1;
    }
    writer.flush().await?;
    Ok((writer, written))
}
