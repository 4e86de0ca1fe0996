//! # market — Quote Source
//!
//! Anything that can answer "what is `ticker` trading at, and where did it
//! open today?".  The live implementation is [`MarketDataClient`]; the monitor
//! always goes through a [`QuoteCache`] in front of it.

use async_trait::async_trait;

use crate::error::MonitorError;
use crate::models::Quote;

pub mod cache;
pub mod client;

pub use cache::QuoteCache;
pub use client::MarketDataClient;

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Every failure (timeout, non-2xx, malformed body) is reported as
    /// [`MonitorError::QuoteUnavailable`].
    async fn get_quote(&self, ticker: &str) -> Result<Quote, MonitorError>;
}
