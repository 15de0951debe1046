//! 0x aggregator price provider (EVM).

use super::provider::QuoteProvider;
use crate::errors::{AppError, Result};
use crate::models::{ChainType, Quote, QuotePair};
use async_trait::async_trait;
use serde::Deserialize;

pub const ZEROEX_API_URL: &str = "https://api.0x.org";

/// Raw sell amount used for both directions of the price probe.
const PROBE_SELL_AMOUNT: u64 = 100_000_000;

#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: String,
}

pub struct ZeroExProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ZeroExProvider {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Price of `sell` denominated in `buy`.
    async fn price(&self, sell: &str, buy: &str) -> Result<f64> {
        let amount = PROBE_SELL_AMOUNT.to_string();
        let mut req = self
            .http
            .get(format!("{}/swap/v1/price", self.base_url))
            .query(&[("sellToken", sell), ("buyToken", buy), ("sellAmount", amount.as_str())]);
        if let Some(key) = &self.api_key {
            req = req.header("0x-api-key", key);
        }
        let resp: PriceResponse = req.send().await?.error_for_status()?.json().await?;
        resp.price
            .trim()
            .parse::<f64>()
            .map_err(|e| AppError::Other(format!("0x price {:?}: {e}", resp.price)))
    }
}

#[async_trait]
impl QuoteProvider for ZeroExProvider {
    fn name(&self) -> &str {
        "0x"
    }

    fn can_handle(&self, pair: &QuotePair) -> bool {
        pair.chain == ChainType::Evm
    }

    /// Bid is the base->quote price; ask is the inverse of quote->base.
    async fn quote(&self, pair: &QuotePair) -> Result<Option<Quote>> {
        let (bid, inverse) = tokio::try_join!(
            self.price(&pair.base_token, &pair.quote_token),
            self.price(&pair.quote_token, &pair.base_token),
        )?;
        let ask = if inverse > 0.0 { 1.0 / inverse } else { 0.0 };
        Ok(Some(Quote { bid, ask }))
    }
}
