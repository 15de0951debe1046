//! DEX quote polling across multiple providers.
//!
//! One polling loop walks the configured pairs in fixed-size batches. Each
//! pair queries every provider that can handle its chain concurrently and
//! keeps the first usable answer in registration order.

pub mod jupiter;
pub mod oneinch;
pub mod provider;
pub mod zerox;

use crate::events::{SourceEvent, emit_log};
use crate::models::{DexSnapshot, QuotePair};
use crate::store::SymbolStore;
use crate::utils::{STOP_GRACE, Worker};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::{Mutex, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use provider::{ProviderConfig, QuoteProvider, default_providers};

/// Pairs polled together before moving on to the next batch.
pub const BATCH_SIZE: usize = 20;
/// Default bound on in-flight pair fetches across the whole poller.
pub const DEFAULT_MAX_PARALLEL: usize = 20;

struct PollerShared {
    providers: Vec<Arc<dyn QuoteProvider>>,
    limiter: Semaphore,
    dex: Arc<SymbolStore<DexSnapshot>>,
    events: mpsc::Sender<SourceEvent>,
}

/// Periodically refreshes the `DexSnapshot` store.
pub struct QuotePoller {
    shared: Arc<PollerShared>,
    worker: Mutex<Option<Worker>>,
}

impl QuotePoller {
    pub fn new(
        providers: Vec<Arc<dyn QuoteProvider>>,
        max_parallel: usize,
        dex: Arc<SymbolStore<DexSnapshot>>,
        events: mpsc::Sender<SourceEvent>,
    ) -> Self {
        Self {
            shared: Arc::new(PollerShared {
                providers,
                limiter: Semaphore::new(max_parallel.max(1)),
                dex,
                events,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Start (or restart) polling `pairs` every `interval_secs`.
    pub async fn start(&self, pairs: Vec<QuotePair>, interval_secs: u64) {
        let mut slot = self.worker.lock().await;
        if let Some(old) = slot.take() {
            old.stop(STOP_GRACE).await;
        }
        let shared = self.shared.clone();
        let interval = Duration::from_secs(interval_secs);
        info!(pairs = pairs.len(), interval_secs, "[DEX] polling started");
        *slot = Some(Worker::spawn("dex_poller", move |cancel| {
            run(shared, pairs, interval, cancel)
        }));
    }

    /// Cancel in-flight fetches and stop scheduling cycles. Safe to call repeatedly.
    pub async fn stop(&self) {
        if let Some(worker) = self.worker.lock().await.take() {
            worker.stop(STOP_GRACE).await;
            emit_log(&self.shared.events, "DEX polling stopped");
        }
    }

    /// Stop and release the concurrency limiter. Later fetches are skipped.
    pub async fn close(&self) {
        self.stop().await;
        self.shared.limiter.close();
    }

    pub async fn is_running(&self) -> bool {
        self.worker
            .lock()
            .await
            .as_ref()
            .is_some_and(|w| !w.is_finished())
    }

    /// Fetch one pair right now, outside the polling loop.
    pub async fn poll_pair(&self, pair: &QuotePair) -> Option<DexSnapshot> {
        poll_pair(&self.shared, pair).await
    }
}

async fn run(
    shared: Arc<PollerShared>,
    pairs: Vec<QuotePair>,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = poll_cycle(&shared, &pairs) => {}
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

async fn poll_cycle(shared: &PollerShared, pairs: &[QuotePair]) {
    for batch in pairs.chunks(BATCH_SIZE) {
        join_all(batch.iter().map(|pair| poll_pair(shared, pair))).await;
    }
}

async fn poll_pair(shared: &PollerShared, pair: &QuotePair) -> Option<DexSnapshot> {
    let Ok(_permit) = shared.limiter.acquire().await else {
        debug!(symbol = %pair.symbol, "[DEX] limiter closed, skipping");
        return None;
    };

    let attempts = shared
        .providers
        .iter()
        .filter(|p| p.can_handle(pair))
        .map(|provider| async move {
            let started = Instant::now();
            match provider.quote(pair).await {
                Ok(Some(quote)) if quote.is_valid() => {
                    Some((provider.name(), quote, started.elapsed()))
                }
                Ok(_) => None,
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        symbol = %pair.symbol,
                        error = %e,
                        "[DEX] provider failed"
                    );
                    None
                }
            }
        });

    // join_all keeps input order, so this is first usable in registration order
    let (name, quote, elapsed) = join_all(attempts).await.into_iter().flatten().next()?;
    let latency_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    let now = SystemTime::now();

    let snapshot = shared.dex.upsert(
        &pair.symbol,
        |key| DexSnapshot {
            symbol: key.to_string(),
            bid: quote.bid,
            ask: quote.ask,
            updated_at: Some(now),
            latency_ms,
        },
        |current| {
            current.bid = quote.bid;
            current.ask = quote.ask;
            current.latency_ms = latency_ms;
            current.updated_at = Some(now);
        },
    );

    let _ = shared
        .events
        .send(SourceEvent::QuoteUpdated(snapshot.clone()))
        .await;
    debug!(symbol = %snapshot.symbol, provider = name, latency_ms, "[DEX] quote");
    emit_log(
        &shared.events,
        format!("DEX {} via {}: {}ms", snapshot.symbol, name, latency_ms),
    );
    Some(snapshot)
}
