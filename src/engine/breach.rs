//! # engine::breach
//!
//! **Breach Evaluator** — pure function of a position and this cycle's quote.
//!
//! Decides whether the price sits at or beyond either strike and derives the
//! display metrics the dashboard renders per row.  Never fails: a missing
//! quote becomes [`Evaluation::Unavailable`], and any percentage whose
//! denominator is zero comes back as `None` ("not computable").

use serde::Serialize;

use crate::models::{Position, Quote, Side};

/// `|range_position_pct - 50|` at or below this is `safe`.
const SAFE_BAND: f64 = 10.0;
/// ... at or below this is `watch`, anything further is `danger`.
const WATCH_BAND: f64 = 25.0;

// ─── Output Types ─────────────────────────────────────────────────────────────

/// Closeness of the price to the middle of the strike range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProximityBand {
    Safe,
    Watch,
    Danger,
}

impl ProximityBand {
    fn from_range_position(range_position_pct: f64) -> Self {
        let off_center = (range_position_pct - 50.0).abs();
        if off_center <= SAFE_BAND {
            ProximityBand::Safe
        } else if off_center <= WATCH_BAND {
            ProximityBand::Watch
        } else {
            ProximityBand::Danger
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub last: f64,
    pub open: Option<f64>,
    /// Inclusive on both sides: a price equal to a strike is a breach.
    pub is_breached: bool,
    /// `Some` exactly when `is_breached`.  PUT wins if both sides match.
    pub breached_side: Option<Side>,
    /// `0` when `open` is missing or not strictly positive.
    pub change_pct: f64,
    pub deviation_from_center_pct: Option<f64>,
    /// `(put - last) / last * 100`: negative while comfortably above the put.
    pub distance_to_put_pct: Option<f64>,
    /// `(call - last) / last * 100`: positive while below the call.
    pub distance_to_call_pct: Option<f64>,
    /// Clamped to `[0, 100]`.
    pub range_position_pct: Option<f64>,
    pub proximity_band: Option<ProximityBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Evaluation {
    #[serde(rename = "available")]
    Metrics(Metrics),
    /// No usable price this cycle; the row renders a placeholder.
    Unavailable,
}

impl Evaluation {
    pub fn metrics(&self) -> Option<&Metrics> {
        match self {
            Evaluation::Metrics(m) => Some(m),
            Evaluation::Unavailable => None,
        }
    }
}

// ─── Core Evaluation ──────────────────────────────────────────────────────────

/// Evaluates one position against the quote fetched this cycle.
///
/// `quote = None` means the source could not be reached; a quote without a
/// usable `last` is treated the same way.
pub fn evaluate(position: &Position, quote: Option<&Quote>) -> Evaluation {
    let Some(quote) = quote else {
        return Evaluation::Unavailable;
    };
    let Some(last) = quote.usable_last() else {
        return Evaluation::Unavailable;
    };

    let put = position.put_strike;
    let call = position.call_strike;

    let breached_side = if last <= put {
        Some(Side::Put)
    } else if last >= call {
        Some(Side::Call)
    } else {
        None
    };

    let change_pct = match quote.open {
        Some(open) if open > 0.0 => (last - open) / open * 100.0,
        _ => 0.0,
    };

    let range_position_pct = percent(last - put, call - put).map(|p| p.clamp(0.0, 100.0));

    Evaluation::Metrics(Metrics {
        last,
        open: quote.open,
        is_breached: breached_side.is_some(),
        breached_side,
        change_pct,
        deviation_from_center_pct: percent(last - position.center_price, position.center_price),
        distance_to_put_pct: percent(put - last, last),
        distance_to_call_pct: percent(call - last, last),
        range_position_pct,
        proximity_band: range_position_pct.map(ProximityBand::from_range_position),
    })
}

/// `numerator / denominator * 100`, or `None` when not computable.
#[inline]
fn percent(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let pct = numerator / denominator * 100.0;
    pct.is_finite().then_some(pct)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
