//! Jupiter (Solana).

use super::provider::QuoteProvider;
use crate::errors::Result;
use crate::models::{ChainType, Quote, QuotePair};
use async_trait::async_trait;

/// Solana slot in the provider list. No quote source is wired yet.
pub struct JupiterProvider;

#[async_trait]
impl QuoteProvider for JupiterProvider {
    fn name(&self) -> &str {
        "Jupiter"
    }

    fn can_handle(&self, pair: &QuotePair) -> bool {
        pair.chain == ChainType::Solana
    }

    async fn quote(&self, _pair: &QuotePair) -> Result<Option<Quote>> {
        Ok(None)
    }
}
