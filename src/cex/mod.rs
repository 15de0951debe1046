//! CEX WebSocket client.
//!
//! Responsibilities:
//! • Maintain one connection to the MEXC contract feed.
//! • Keep the latest best bid / ask per tracked symbol.
//! • Handle reconnection and backoff.

pub mod backoff;
pub mod mexc;

use crate::errors::{AppError, Result};
use crate::events::{SourceEvent, emit_log};
use crate::models::{BookTop, normalize_symbol};
use crate::store::SymbolStore;
use crate::utils::{STOP_GRACE, Worker};
use backoff::Backoff;
use futures::{SinkExt, StreamExt, stream::SplitSink, stream::SplitStream};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use mexc::MEXC_WS_ENDPOINT;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Connection settings for [`MexcFeed`].
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub ws_url: String,
    pub heartbeat_interval: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: MEXC_WS_ENDPOINT.to_string(),
            heartbeat_interval: HEARTBEAT_INTERVAL,
            initial_backoff: backoff::DEFAULT_INITIAL_BACKOFF,
            max_backoff: backoff::DEFAULT_MAX_BACKOFF,
        }
    }
}

struct FeedShared {
    config: FeedConfig,
    symbols: Vec<String>,
    tops: Arc<SymbolStore<BookTop>>,
    events: mpsc::Sender<SourceEvent>,
}

/// Streams top-of-book for a fixed symbol set into the shared `BookTop` store.
pub struct MexcFeed {
    shared: Arc<FeedShared>,
    worker: Mutex<Option<Worker>>,
}

impl MexcFeed {
    pub fn new<I, S>(
        config: FeedConfig,
        symbols: I,
        tops: Arc<SymbolStore<BookTop>>,
        events: mpsc::Sender<SourceEvent>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for s in symbols {
            let sym = normalize_symbol(s.as_ref());
            if !sym.is_empty() && !normalized.contains(&sym) {
                normalized.push(sym);
            }
        }
        for sym in &normalized {
            tops.insert_if_absent(sym, BookTop::empty(sym));
        }
        Self {
            shared: Arc::new(FeedShared {
                config,
                symbols: normalized,
                tops,
                events,
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.shared.symbols
    }

    /// Start (or restart) the connection loop.
    pub async fn start(&self) {
        let mut slot = self.worker.lock().await;
        if let Some(old) = slot.take() {
            old.stop(STOP_GRACE).await;
        }
        let shared = self.shared.clone();
        *slot = Some(Worker::spawn("mexc_feed", move |cancel| {
            run(shared, cancel)
        }));
    }

    /// Close the connection and stop reconnecting. Safe to call repeatedly.
    pub async fn stop(&self) {
        if let Some(worker) = self.worker.lock().await.take() {
            worker.stop(STOP_GRACE).await;
            emit_log(&self.shared.events, "MEXC feed stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.worker
            .lock()
            .await
            .as_ref()
            .is_some_and(|w| !w.is_finished())
    }
}

async fn run(shared: Arc<FeedShared>, cancel: CancellationToken) {
    let cfg = &shared.config;
    let mut backoff = Backoff::new(cfg.initial_backoff, cfg.max_backoff);

    while !cancel.is_cancelled() {
        emit_log(&shared.events, "Connecting to MEXC websocket...");
        let outcome = tokio::select! {
            _ = cancel.cancelled() => return,
            res = session(&shared, &mut backoff) => res,
        };
        match outcome {
            Ok(()) => {
                info!("[CEX] websocket closed by remote");
                emit_log(&shared.events, "MEXC websocket closed");
            }
            Err(e) => {
                warn!(error = %e, "[CEX] websocket error");
                emit_log(&shared.events, format!("MEXC websocket error: {e}"));
            }
        }

        let delay = backoff.next_delay();
        emit_log(
            &shared.events,
            format!("Reconnect in {:.1}s", delay.as_secs_f64()),
        );
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// One connection lifetime: connect, subscribe, then heartbeat + read until
/// either side ends. Returns `Ok(())` on a clean remote close.
async fn session(shared: &FeedShared, backoff: &mut Backoff) -> Result<()> {
    let ws = mexc::connect(&shared.config.ws_url).await?;
    info!(url = %shared.config.ws_url, "[CEX] websocket connected");
    emit_log(&shared.events, "MEXC websocket connected");

    let (mut sink, stream) = ws.split();
    subscribe_all(&mut sink, &shared.symbols).await?;
    backoff.reset();
    info!(symbols = shared.symbols.len(), "[CEX] subscribed");

    // Whichever loop finishes first drops the other.
    tokio::select! {
        res = heartbeat_loop(sink, shared.config.heartbeat_interval) => res,
        res = read_loop(stream, shared) => res,
    }
}

/// Queue every subscription, then flush them in one go. Any send failure
/// fails the whole session.
async fn subscribe_all(
    sink: &mut SplitSink<mexc::WsStream, Message>,
    symbols: &[String],
) -> Result<()> {
    for symbol in symbols {
        sink.feed(mexc::subscribe_message(symbol)?).await?;
    }
    sink.flush().await?;
    Ok(())
}

async fn heartbeat_loop(
    mut sink: SplitSink<mexc::WsStream, Message>,
    interval: Duration,
) -> Result<()> {
    loop {
        sink.send(mexc::ping_message()?).await?;
        tokio::time::sleep(interval).await;
    }
}

async fn read_loop(mut stream: SplitStream<mexc::WsStream>, shared: &FeedShared) -> Result<()> {
    while let Some(msg) = stream.next().await {
        match msg? {
            Message::Text(txt) => handle_payload(shared, &txt).await,
            Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(txt) => handle_payload(shared, txt).await,
                Err(_) => debug!("[CEX] non utf-8 binary frame dropped"),
            },
            Message::Close(frame) => {
                debug!(?frame, "[CEX] close frame");
                return Ok(());
            }
            _ => {}
        }
    }
    Err(AppError::ConnectionClosed)
}

async fn handle_payload(shared: &FeedShared, payload: &str) {
    let Some(ticker) = mexc::parse_ticker(payload) else {
        return;
    };
    let now = SystemTime::now();
    let top = shared.tops.upsert(
        &ticker.symbol,
        |key| BookTop {
            symbol: key.to_string(),
            bid: ticker.bid,
            ask: ticker.ask,
            updated_at: Some(now),
        },
        |current| {
            current.bid = ticker.bid;
            current.ask = ticker.ask;
            current.updated_at = Some(now);
        },
    );
    let _ = shared.events.send(SourceEvent::BookTopUpdated(top)).await;
}
