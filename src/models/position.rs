//! # models::position
//!
//! Defines [`Position`] — one monitored strangle: a ticker bracketed by a PUT
//! strike below and a CALL strike above.
//!
//! The record is intentionally **flat** (`id, ticker, put_strike, call_strike,
//! center_price, alert_sent`) so it serialises one-to-one into the JSON file
//! store and the `strangle_positions` table.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MonitorError;

// ─── Position ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Assigned at creation, never changes.
    pub id: Uuid,

    /// Uppercase symbol, e.g. `"SPY"`.
    pub ticker: String,

    pub put_strike: f64,

    pub call_strike: f64,

    /// `(put_strike + call_strike) / 2`, computed once at creation and stored.
    /// Never recomputed from the strikes afterwards.
    pub center_price: f64,

    /// `false` = Armed, `true` = Alerted.  Only the alert engine writes this.
    pub alert_sent: bool,
}

impl Position {
    /// Validates user input and builds a fresh, armed position.
    pub fn create(ticker: &str, put_strike: f64, call_strike: f64) -> Result<Self, MonitorError> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(MonitorError::InvalidPosition("ticker must not be empty".into()));
        }
        if !put_strike.is_finite() || !call_strike.is_finite() {
            return Err(MonitorError::InvalidPosition("strikes must be finite numbers".into()));
        }
        if put_strike >= call_strike {
            return Err(MonitorError::InvalidPosition(format!(
                "PUT strike ({put_strike:.2}) must be lower than CALL strike ({call_strike:.2})"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            ticker,
            put_strike,
            call_strike,
            center_price: (put_strike + call_strike) / 2.0,
            alert_sent: false,
        })
    }

    /// Strike value on the given side of the range.
    #[inline]
    pub fn strike(&self, side: Side) -> f64 {
        match side {
            Side::Put => self.put_strike,
            Side::Call => self.call_strike,
        }
    }
}

// ─── Side ─────────────────────────────────────────────────────────────────────

/// Which boundary of the strangle the price went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Put,
    Call,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Put => write!(f, "PUT"),
            Side::Call => write!(f, "CALL"),
        }
    }
}

// ─── NewPosition ──────────────────────────────────────────────────────────────

/// Request body of `POST /api/positions`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPosition {
    pub ticker:      String,
    pub put_strike:  f64,
    pub call_strike: f64,
}
