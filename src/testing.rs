//! Test doubles for the three external collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::MonitorError;
use crate::market::QuoteSource;
use crate::models::{Position, Quote};
use crate::notify::Notifier;
use crate::store::{MemoryStore, PositionStore};

// ─── Quotes ───────────────────────────────────────────────────────────────────

/// Scripted prices; `None` answers "unavailable".
#[derive(Default)]
pub struct StubQuotes {
    quotes: Mutex<HashMap<String, Option<Quote>>>,
    calls:  Mutex<HashMap<String, usize>>,
}

impl StubQuotes {
    pub fn set(&self, ticker: &str, quote: Option<Quote>) {
        self.quotes.lock().unwrap().insert(ticker.to_string(), quote);
    }

    pub fn set_last(&self, ticker: &str, last: f64) {
        self.set(ticker, Some(Quote::new(last, 100.0)));
    }

    pub fn calls(&self, ticker: &str) -> usize {
        self.calls.lock().unwrap().get(ticker).copied().unwrap_or(0)
    }
}

#[async_trait]
impl QuoteSource for StubQuotes {
    async fn get_quote(&self, ticker: &str) -> Result<Quote, MonitorError> {
        *self.calls.lock().unwrap().entry(ticker.to_string()).or_default() += 1;
        self.quotes
            .lock()
            .unwrap()
            .get(ticker)
            .copied()
            .flatten()
            .ok_or_else(|| MonitorError::quote_unavailable(ticker, "stub has no quote"))
    }
}

// ─── Notifier ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    fail:     AtomicBool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<(), MonitorError> {
        self.sent.lock().unwrap().push(text.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(MonitorError::NotifyFailed("stub refused".into()));
        }
        Ok(())
    }
}

// ─── Store ────────────────────────────────────────────────────────────────────

/// [`MemoryStore`] whose reads and writes can be switched off.
#[derive(Default)]
pub struct FlakyStore {
    inner:           MemoryStore,
    pub fail_list:   AtomicBool,
    pub fail_writes: AtomicBool,
}

impl FlakyStore {
    fn check(&self, flag: &AtomicBool) -> Result<(), MonitorError> {
        if flag.load(Ordering::SeqCst) {
            return Err(MonitorError::StoreUnavailable("stub outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PositionStore for FlakyStore {
    async fn list(&self) -> Result<Vec<Position>, MonitorError> {
        self.check(&self.fail_list)?;
        self.inner.list().await
    }

    async fn insert(
        &self,
        ticker: &str,
        put_strike: f64,
        call_strike: f64,
    ) -> Result<Position, MonitorError> {
        self.check(&self.fail_writes)?;
        self.inner.insert(ticker, put_strike, call_strike).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), MonitorError> {
        self.check(&self.fail_writes)?;
        self.inner.delete(id).await
    }

    async fn update_alert_flag(&self, id: Uuid, alert_sent: bool) -> Result<(), MonitorError> {
        self.check(&self.fail_writes)?;
        self.inner.update_alert_flag(id, alert_sent).await
    }
}
