use anyhow::Result;
use spread_scanner::{
    ScannerEvent, SpreadScanner, config::AppConfig, models::AGE_NEVER_UPDATED_MS, utils,
};
use tokio::sync::broadcast::error::RecvError;

fn fmt_age(ms: u64) -> String {
    if ms == AGE_NEVER_UPDATED_MS {
        "never".to_string()
    } else {
        format!("{ms}ms")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = AppConfig::load()?;
    tracing::info!(
        pairs = config.pairs.len(),
        dex_interval_secs = config.dex_interval_secs,
        fees_total = config.fees.total(),
        "[INIT] spread-scanner starting"
    );

    let scanner = SpreadScanner::new(&config);
    let mut events = scanner.subscribe();
    scanner.start(config.dex_interval_secs).await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("[INIT] ctrl-c received, shutting down");
                break;
            }
            ev = events.recv() => match ev {
                Ok(ScannerEvent::SpreadUpdated(row)) => {
                    tracing::info!(
                        symbol = %row.symbol,
                        cex_bid = row.cex_bid,
                        cex_ask = row.cex_ask,
                        dex_bid = row.dex_bid,
                        dex_ask = row.dex_ask,
                        net_a = %format!("{:.3}%", row.net_a),
                        net_b = %format!("{:.3}%", row.net_b),
                        cex_age = %fmt_age(row.cex_age_ms),
                        dex_age = %fmt_age(row.dex_age_ms),
                        "[SPREAD]"
                    );
                }
                Ok(ScannerEvent::Log(message)) => tracing::info!("{message}"),
                Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "consumer lagging"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    scanner.shutdown().await;
    Ok(())
}
