//! # market::cache — per-ticker quote cache
//!
//! TTL equals the refresh interval, so several positions on the same ticker
//! inside one window share a single fetch.  Failures are not cached: an
//! outage is retried on the next cycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::MonitorError;
use crate::market::QuoteSource;
use crate::models::Quote;

pub struct QuoteCache {
    source:  Arc<dyn QuoteSource>,
    ttl:     Duration,
    entries: HashMap<String, (Instant, Quote)>,
}

impl QuoteCache {
    pub fn new(source: Arc<dyn QuoteSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Cached quote if still fresh, otherwise one call to the source.
    pub async fn get(&mut self, ticker: &str) -> Result<Quote, MonitorError> {
        let key = ticker.to_uppercase();
        let now = Instant::now();

        if let Some((fetched_at, quote)) = self.entries.get(&key) {
            if now.duration_since(*fetched_at) < self.ttl {
                debug!(ticker = %key, "Quote served from cache");
                return Ok(*quote);
            }
        }

        match self.source.get_quote(&key).await {
            Ok(quote) => {
                self.entries.insert(key, (now, quote));
                Ok(quote)
            }
            Err(e) => {
                self.entries.remove(&key);
                warn!(ticker = %key, error = %e, "⚠️ Quote unavailable");
                Err(e)
            }
        }
    }

    /// Drops expired entries so removed tickers do not linger.
    pub fn purge_expired(&mut self) {
        let now = Instant::now();
        let ttl = self.ttl;
        self.entries.retain(|_, (fetched_at, _)| now.duration_since(*fetched_at) < ttl);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
