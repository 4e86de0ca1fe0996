//! # market::client — REST quote provider
//!
//! `GET {base}stocks/quotes/{ticker}/?token=...`
//!
//! ```json
//! { "s": "ok", "symbol": ["SPY"], "last": [512.31], "open": [509.80] }
//! ```
//!
//! Columns come back as one-element arrays; `s != "ok"` means the provider
//! had nothing for the symbol.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::MonitorError;
use crate::market::QuoteSource;
use crate::models::Quote;

/// Response format from `/stocks/quotes/{ticker}/`.
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    s:    String,
    #[serde(default)]
    last: Vec<Option<f64>>,
    #[serde(default)]
    open: Vec<Option<f64>>,
}

#[derive(Clone)]
pub struct MarketDataClient {
    client:   reqwest::Client,
    base_url: String,
    token:    String,
    timeout:  Duration,
}

impl MarketDataClient {
    pub fn new(client: reqwest::Client, base_url: &str, token: &str, timeout: Duration) -> Self {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            client,
            base_url,
            token: token.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl QuoteSource for MarketDataClient {
    async fn get_quote(&self, ticker: &str) -> Result<Quote, MonitorError> {
        // Tickers are user input; keep them inside one path segment.
        let url = format!(
            "{}stocks/quotes/{}/",
            self.base_url,
            urlencoding::encode(ticker)
        );

        debug!(ticker, "Fetching quote...");

        let resp = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| MonitorError::quote_unavailable(ticker, e))?;

        if !resp.status().is_success() {
            return Err(MonitorError::quote_unavailable(
                ticker,
                format!("HTTP {}", resp.status()),
            ));
        }

        let data: QuoteResponse = resp
            .json()
            .await
            .map_err(|e| MonitorError::quote_unavailable(ticker, format!("parse error: {e}")))?;

        if data.s != "ok" {
            return Err(MonitorError::quote_unavailable(ticker, format!("status '{}'", data.s)));
        }

        Ok(Quote {
            last: data.last.into_iter().next().flatten(),
            open: data.open.into_iter().next().flatten(),
        })
    }
}
