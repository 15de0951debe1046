//! Configuration loader and application settings.

use crate::cex::{FeedConfig, MEXC_WS_ENDPOINT};
use crate::dex::{DEFAULT_MAX_PARALLEL, ProviderConfig, zerox::ZEROEX_API_URL};
use crate::errors::{AppError, Result};
use crate::models::{ChainType, QuotePair, normalize_symbol};
use crate::spread::FeeConfig;
use ethers::types::Address;
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;
use url::Url;

/// Accepted values for `DEX_INTERVAL_SECS`.
pub const DEX_INTERVAL_RANGE: RangeInclusive<u64> = 2..=5;

/// WBTC / USDT on Ethereum mainnet, tracked as MEXC `BTC_USDT`.
const DEFAULT_PAIR: (&str, &str, &str) = (
    "BTC_USDT",
    "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599",
    "0xdAC17F958D2ee523a2206206994597C13D831ec7",
);

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// WebSocket endpoint for the MEXC contract feed.
    pub mexc_ws_url: String,
    /// Base URL of the 0x API.
    pub zeroex_api_url: String,
    pub zeroex_api_key: Option<String>,
    pub fees: FeeConfig,
    /// Seconds between DEX polling cycles.
    pub dex_interval_secs: u64,
    /// Max concurrent pair fetches.
    pub dex_max_parallel: usize,
    pub pairs: Vec<QuotePair>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let mexc_ws_url = env_or("MEXC_WS_URL", MEXC_WS_ENDPOINT);
        Url::parse(&mexc_ws_url)?;
        let zeroex_api_url = env_or("ZEROEX_API_URL", ZEROEX_API_URL);
        Url::parse(&zeroex_api_url)?;
        let zeroex_api_key = std::env::var("ZEROEX_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let fees = FeeConfig {
            cex_fee_percent: parse_percent("CEX_FEE_PERCENT", 0.02)?,
            dex_fee_percent: parse_percent("DEX_FEE_PERCENT", 0.08)?,
            slippage_percent: parse_percent("SLIPPAGE_PERCENT", 0.02)?,
        };

        let dex_interval_secs: u64 = env_or("DEX_INTERVAL_SECS", "2").trim().parse()?;
        if !DEX_INTERVAL_RANGE.contains(&dex_interval_secs) {
            return Err(AppError::Config(format!(
                "DEX_INTERVAL_SECS must be within {}..={}, got {dex_interval_secs}",
                DEX_INTERVAL_RANGE.start(),
                DEX_INTERVAL_RANGE.end()
            )));
        }

        let dex_max_parallel: usize = std::env::var("DEX_MAX_PARALLEL")
            .map(|v| v.trim().parse())
            .unwrap_or(Ok(DEFAULT_MAX_PARALLEL))?;
        if dex_max_parallel == 0 {
            return Err(AppError::Config("DEX_MAX_PARALLEL must be at least 1".into()));
        }

        let pairs = match std::env::var("PAIRS_FILE") {
            Ok(path) => load_pairs(Path::new(&path))?,
            Err(_) => vec![default_pair()],
        };

        Ok(Self {
            mexc_ws_url,
            zeroex_api_url,
            zeroex_api_key,
            fees,
            dex_interval_secs,
            dex_max_parallel,
            pairs,
        })
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            ws_url: self.mexc_ws_url.clone(),
            ..FeedConfig::default()
        }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            zeroex_api_url: self.zeroex_api_url.clone(),
            zeroex_api_key: self.zeroex_api_key.clone(),
        }
    }
}

pub fn default_pair() -> QuotePair {
    let (symbol, base, quote) = DEFAULT_PAIR;
    QuotePair::new(symbol, ChainType::Evm, base, quote)
}

/// Read a JSON array of pairs, normalize symbols and validate addresses.
pub fn load_pairs(path: &Path) -> Result<Vec<QuotePair>> {
    let raw = std::fs::read_to_string(path)?;
    let mut pairs: Vec<QuotePair> = serde_json::from_str(&raw)?;
    if pairs.is_empty() {
        return Err(AppError::Config(format!(
            "{} contains no pairs",
            path.display()
        )));
    }
    for pair in &mut pairs {
        pair.symbol = normalize_symbol(&pair.symbol);
        validate_pair(pair)?;
    }
    Ok(pairs)
}

pub fn validate_pair(pair: &QuotePair) -> Result<()> {
    if pair.symbol.is_empty() {
        return Err(AppError::Config("pair with empty symbol".into()));
    }
    for token in [&pair.base_token, &pair.quote_token] {
        let ok = match pair.chain {
            ChainType::Evm => Address::from_str(token.trim()).is_ok(),
            ChainType::Solana => !token.trim().is_empty(),
        };
        if !ok {
            return Err(AppError::InvalidAddress {
                symbol: pair.symbol.clone(),
                address: token.clone(),
            });
        }
    }
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_percent(key: &str, default: f64) -> Result<f64> {
    let value = match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<f64>()?,
        Err(_) => default,
    };
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Config(format!(
            "{key} must be a non-negative number, got {value}"
        )));
    }
    Ok(value)
}
