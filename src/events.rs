//! Messages passed between the pipeline stages.

use crate::models::{BookTop, DexSnapshot, SpreadRow};
use tokio::sync::mpsc;
use tracing::debug;

/// Default capacity of the producer -> scanner channel.
pub const SOURCE_CHANNEL_CAPACITY: usize = 1024;
/// Default capacity of the scanner -> consumer broadcast.
pub const BROADCAST_CAPACITY: usize = 1024;

/// Emitted by the feed and the poller.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    BookTopUpdated(BookTop),
    QuoteUpdated(DexSnapshot),
    Log(String),
}

impl SourceEvent {
    /// Symbol whose spread should be recomputed, if any.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            SourceEvent::BookTopUpdated(top) => Some(&top.symbol),
            SourceEvent::QuoteUpdated(snap) => Some(&snap.symbol),
            SourceEvent::Log(_) => None,
        }
    }
}

/// Published to external consumers.
#[derive(Debug, Clone)]
pub enum ScannerEvent {
    SpreadUpdated(SpreadRow),
    Log(String),
}

/// Fire-and-forget log line. Dropped if the channel is full or closed.
pub(crate) fn emit_log(tx: &mpsc::Sender<SourceEvent>, message: impl Into<String>) {
    if let Err(e) = tx.try_send(SourceEvent::Log(message.into())) {
        debug!(error = %e, "log event dropped");
    }
}
