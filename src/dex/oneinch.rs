//! 1inch routing aggregator (EVM).

use super::provider::QuoteProvider;
use crate::errors::Result;
use crate::models::{ChainType, Quote, QuotePair};
use async_trait::async_trait;

/// Registered as the EVM fallback. The public 1inch quote API requires a
/// key, so until one is wired in this provider never produces a quote.
pub struct OneInchProvider;

#[async_trait]
impl QuoteProvider for OneInchProvider {
    fn name(&self) -> &str {
        "1inch"
    }

    fn can_handle(&self, pair: &QuotePair) -> bool {
        pair.chain == ChainType::Evm
    }

    async fn quote(&self, _pair: &QuotePair) -> Result<Option<Quote>> {
        Ok(None)
    }
}
