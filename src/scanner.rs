//! Wires the CEX feed, the DEX poller and the spread engine together.
//!
//! Both producers push `SourceEvent`s into one channel. A single dispatcher
//! task drains it, recomputes the affected symbol and broadcasts the result
//! to subscribers.

use crate::cex::{FeedConfig, MexcFeed};
use crate::config::AppConfig;
use crate::dex::{QuotePoller, QuoteProvider, default_providers};
use crate::events::{BROADCAST_CAPACITY, SOURCE_CHANNEL_CAPACITY, ScannerEvent, SourceEvent};
use crate::models::{BookTop, DexSnapshot, QuotePair, SpreadRow};
use crate::spread::{FeeConfig, SpreadEngine};
use crate::store::SymbolStore;
use crate::utils::{STOP_GRACE, Worker};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct SpreadScanner {
    pairs: Vec<QuotePair>,
    feed: MexcFeed,
    poller: QuotePoller,
    engine: Arc<SpreadEngine>,
    spreads: Arc<SymbolStore<SpreadRow>>,
    source_rx: Arc<Mutex<mpsc::Receiver<SourceEvent>>>,
    updates: broadcast::Sender<ScannerEvent>,
    dispatcher: Mutex<Option<Worker>>,
}

impl SpreadScanner {
    /// Build a scanner with the built-in providers.
    pub fn new(config: &AppConfig) -> Self {
        Self::with_providers(
            config.pairs.clone(),
            config.feed_config(),
            config.fees,
            default_providers(&config.provider_config()),
            config.dex_max_parallel,
        )
    }

    pub fn with_providers(
        pairs: Vec<QuotePair>,
        feed_config: FeedConfig,
        fees: FeeConfig,
        providers: Vec<Arc<dyn QuoteProvider>>,
        max_parallel: usize,
    ) -> Self {
        let cex = Arc::new(SymbolStore::<BookTop>::new());
        let dex = Arc::new(SymbolStore::<DexSnapshot>::new());
        let spreads = Arc::new(SymbolStore::<SpreadRow>::new());
        let (source_tx, source_rx) = mpsc::channel(SOURCE_CHANNEL_CAPACITY);
        let (updates, _) = broadcast::channel(BROADCAST_CAPACITY);

        let feed = MexcFeed::new(
            feed_config,
            pairs.iter().map(|p| p.symbol.as_str()),
            cex.clone(),
            source_tx.clone(),
        );
        let poller = QuotePoller::new(providers, max_parallel, dex.clone(), source_tx);
        let engine = Arc::new(SpreadEngine::new(cex, dex, spreads.clone(), fees));

        Self {
            pairs,
            feed,
            poller,
            engine,
            spreads,
            source_rx: Arc::new(Mutex::new(source_rx)),
            updates,
            dispatcher: Mutex::new(None),
        }
    }

    /// Receive `SpreadUpdated` rows and log lines.
    pub fn subscribe(&self) -> broadcast::Receiver<ScannerEvent> {
        self.updates.subscribe()
    }

    /// Copy of every merged row computed so far.
    pub fn rows(&self) -> Vec<SpreadRow> {
        self.spreads.snapshot()
    }

    /// Start (or restart) the whole pipeline.
    pub async fn start(&self, dex_interval_secs: u64) {
        let mut slot = self.dispatcher.lock().await;
        if let Some(old) = slot.take() {
            self.poller.stop().await;
            self.feed.stop().await;
            old.stop(STOP_GRACE).await;
        }

        let rx = self.source_rx.clone();
        let engine = self.engine.clone();
        let updates = self.updates.clone();
        *slot = Some(Worker::spawn("scanner_dispatch", move |cancel| {
            dispatch(rx, engine, updates, cancel)
        }));

        self.feed.start().await;
        self.poller.start(self.pairs.clone(), dex_interval_secs).await;
        self.publish_log("Scanner started");
        info!(pairs = self.pairs.len(), dex_interval_secs, "[SCAN] started");
    }

    /// Stop producers, drain what they already queued, then stop dispatching.
    /// Safe to call repeatedly or before `start`.
    pub async fn stop(&self) {
        let mut slot = self.dispatcher.lock().await;
        let Some(worker) = slot.take() else {
            return;
        };
        self.poller.stop().await;
        self.feed.stop().await;
        worker.stop(STOP_GRACE).await;
        self.publish_log("Scanner stopped");
        info!("[SCAN] stopped");
    }

    /// Stop everything and release the poller's limiter.
    pub async fn shutdown(&self) {
        self.stop().await;
        self.poller.close().await;
    }

    pub async fn is_running(&self) -> bool {
        self.dispatcher
            .lock()
            .await
            .as_ref()
            .is_some_and(|w| !w.is_finished())
    }

    fn publish_log(&self, message: &str) {
        let _ = self.updates.send(ScannerEvent::Log(message.to_string()));
    }
}

async fn dispatch(
    rx: Arc<Mutex<mpsc::Receiver<SourceEvent>>>,
    engine: Arc<SpreadEngine>,
    updates: broadcast::Sender<ScannerEvent>,
    cancel: CancellationToken,
) {
    let mut events = rx.lock().await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            ev = events.recv() => match ev {
                Some(ev) => handle_event(&engine, &updates, ev),
                None => return,
            },
        }
    }
    // producers are already stopped; flush whatever they left behind
    while let Ok(ev) = events.try_recv() {
        handle_event(&engine, &updates, ev);
    }
}

fn handle_event(
    engine: &SpreadEngine,
    updates: &broadcast::Sender<ScannerEvent>,
    ev: SourceEvent,
) {
    match ev {
        SourceEvent::Log(message) => {
            let _ = updates.send(ScannerEvent::Log(message));
        }
        update => {
            let Some(symbol) = update.symbol() else {
                return;
            };
            match engine.recalculate(symbol) {
                Some(row) => {
                    debug!(
                        symbol = %row.symbol,
                        net_a = row.net_a,
                        net_b = row.net_b,
                        "[SCAN] spread updated"
                    );
                    let _ = updates.send(ScannerEvent::SpreadUpdated(row));
                }
                None => debug!(symbol, "[SCAN] waiting for both sides"),
            }
        }
    }
}
