//! Shared data structures used throughout the application.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Age reported for a side that has never received an update.
pub const AGE_NEVER_UPDATED_MS: u64 = u64::MAX;

/// Canonical store key for a symbol. Every store goes through this so
/// `btc_usdt` and `BTC_USDT` land on the same entry.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

/// Milliseconds between `updated_at` and `now`.
///
/// `None` means the side never updated and yields [`AGE_NEVER_UPDATED_MS`].
/// A timestamp in the future (clock step backwards) is clamped to zero.
pub fn age_ms(updated_at: Option<SystemTime>, now: SystemTime) -> u64 {
    match updated_at {
        None => AGE_NEVER_UPDATED_MS,
        Some(at) => now
            .duration_since(at)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0),
    }
}

/// Best bid/ask on the centralized venue for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct BookTop {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub updated_at: Option<SystemTime>,
}

impl BookTop {
    /// Entry for a tracked symbol that has not ticked yet.
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            bid: 0.0,
            ask: 0.0,
            updated_at: None,
        }
    }

    pub fn has_prices(&self) -> bool {
        is_positive(self.bid) && is_positive(self.ask)
    }
}

/// Latest decentralized quote for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct DexSnapshot {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub updated_at: Option<SystemTime>,
    /// Round trip of the provider call that produced this quote.
    pub latency_ms: u64,
}

impl DexSnapshot {
    pub fn has_prices(&self) -> bool {
        is_positive(self.bid) && is_positive(self.ask)
    }
}

/// Merged CEX/DEX view of one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadRow {
    pub symbol: String,
    pub cex_bid: f64,
    pub cex_ask: f64,
    pub dex_bid: f64,
    pub dex_ask: f64,
    /// Buy on CEX at ask, sell on DEX at bid (percent).
    pub spread_a: f64,
    /// Buy on DEX at ask, sell on CEX at bid (percent).
    pub spread_b: f64,
    pub net_a: f64,
    pub net_b: f64,
    pub cex_age_ms: u64,
    pub dex_age_ms: u64,
    pub updated_at: SystemTime,
}

/// Chain family a pair trades on; decides which providers may quote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Evm,
    Solana,
}

/// Static description of one tracked pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePair {
    pub symbol: String,
    #[serde(default = "default_chain")]
    pub chain: ChainType,
    pub base_token: String,
    pub quote_token: String,
}

fn default_chain() -> ChainType {
    ChainType::Evm
}

impl QuotePair {
    pub fn new(
        symbol: &str,
        chain: ChainType,
        base_token: impl Into<String>,
        quote_token: impl Into<String>,
    ) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            chain,
            base_token: base_token.into(),
            quote_token: quote_token.into(),
        }
    }
}

/// Bid/ask pair returned by a quote provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
}

impl Quote {
    pub fn is_valid(&self) -> bool {
        is_positive(self.bid) && is_positive(self.ask)
    }
}

pub(crate) fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn symbols_normalize_to_one_key() {
        assert_eq!(normalize_symbol("btc_usdt"), "BTC_USDT");
        assert_eq!(normalize_symbol(" Btc_Usdt "), "BTC_USDT");
    }

    #[test]
    fn age_of_never_updated_side_is_sentinel() {
        assert_eq!(age_ms(None, SystemTime::now()), AGE_NEVER_UPDATED_MS);
    }

    #[test]
    fn age_counts_elapsed_millis() {
        let now = SystemTime::now();
        let then = now - Duration::from_millis(1_500);
        assert_eq!(age_ms(Some(then), now), 1_500);
        // future timestamps clamp instead of wrapping
        assert_eq!(age_ms(Some(now + Duration::from_secs(1)), now), 0);
    }

    #[test]
    fn quote_validity_requires_both_sides_positive() {
        assert!(Quote { bid: 1.0, ask: 2.0 }.is_valid());
        assert!(!Quote { bid: 0.0, ask: 2.0 }.is_valid());
        assert!(!Quote { bid: 1.0, ask: -1.0 }.is_valid());
        assert!(!Quote { bid: f64::NAN, ask: 1.0 }.is_valid());
    }

    #[test]
    fn pair_deserializes_with_default_chain() {
        let raw = r#"{"symbol":"eth_usdt","base_token":"0xa","quote_token":"0xb"}"#;
        let pair: QuotePair = serde_json::from_str(raw).unwrap();
        assert_eq!(pair.chain, ChainType::Evm);
        let raw = r#"{"symbol":"SOL_USDT","chain":"solana","base_token":"a","quote_token":"b"}"#;
        let pair: QuotePair = serde_json::from_str(raw).unwrap();
        assert_eq!(pair.chain, ChainType::Solana);
    }

    #[test]
    fn empty_book_top_has_no_prices() {
        let top = BookTop::empty("btc_usdt");
        assert_eq!(top.symbol, "BTC_USDT");
        assert!(!top.has_prices());
        assert!(top.updated_at.is_none());
    }
}
