//! Quote provider interface and the registered provider set.

use crate::errors::Result;
use crate::models::{QuotePair, Quote};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::jupiter::JupiterProvider;
use super::oneinch::OneInchProvider;
use super::zerox::ZeroExProvider;

/// Per-request timeout for every provider HTTP call.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A source of decentralized-exchange quotes.
///
/// `quote` returns `Ok(None)` when the provider has nothing to offer for the
/// pair; errors are isolated by the poller and treated the same way.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn name(&self) -> &str;

    fn can_handle(&self, pair: &QuotePair) -> bool;

    async fn quote(&self, pair: &QuotePair) -> Result<Option<Quote>>;
}

/// Settings for the built-in providers.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub zeroex_api_url: String,
    pub zeroex_api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            zeroex_api_url: super::zerox::ZEROEX_API_URL.to_string(),
            zeroex_api_key: None,
        }
    }
}

pub fn create_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Built-in providers in resolution order. The poller takes the first one in
/// this list that returns a usable quote, so the order decides which price a
/// symbol reports.
pub fn default_providers(config: &ProviderConfig) -> Vec<Arc<dyn QuoteProvider>> {
    let zeroex = ZeroExProvider::new(
        create_http_client(),
        &config.zeroex_api_url,
        config.zeroex_api_key.clone(),
    );
    let providers: [Arc<dyn QuoteProvider>; 3] = [
        Arc::new(zeroex),
        Arc::new(OneInchProvider),
        Arc::new(JupiterProvider),
    ];
    providers.into()
}
