//! # engine::alert
//!
//! **Alert State Machine** — edge-triggered, one notification per breach
//! episode.
//!
//! ```text
//!            breached → Fire (notify, persist true)
//!   ┌───────┐ ─────────────────────────────────▶ ┌─────────┐
//!   │ ARMED │                                     │ ALERTED │  breached → Hold
//!   └───────┘ ◀───────────────────────────────── └─────────┘
//!            not breached → Rearm (persist false, silent)
//! ```
//!
//! No price this cycle means no transition at all.

use serde::Serialize;

use crate::engine::breach::Evaluation;
use crate::models::{Position, Side};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertAction {
    /// Armed and breached: send one notification, then persist `alert_sent = true`.
    Fire { side: Side, price: f64, strike: f64 },
    /// Alerted and back inside the range: persist `alert_sent = false`.
    Rearm,
    /// Nothing to do this cycle.
    Hold,
}

/// Transition table for one position and one cycle.
pub fn next_action(position: &Position, evaluation: &Evaluation) -> AlertAction {
    let Some(metrics) = evaluation.metrics() else {
        return AlertAction::Hold;
    };

    match (position.alert_sent, metrics.breached_side) {
        (false, Some(side)) => AlertAction::Fire {
            side,
            price: metrics.last,
            strike: position.strike(side),
        },
        (true, None) => AlertAction::Rearm,
        _ => AlertAction::Hold,
    }
}

/// Telegram-Markdown text sent when a strike is hit.
pub fn breach_message(ticker: &str, side: Side, price: f64, strike: f64) -> String {
    format!(
        "🚨 *STRIKE BREACHED* 🚨\n\n\
         *Ticker:* `{ticker}`\n\
         *Current price:* `${price:.2}`\n\n\
         Price reached the *{side}* strike at `${strike:.2}`."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::breach::evaluate;
    use crate::models::Quote;

    fn armed() -> Position {
        Position::create("SPY", 90.0, 110.0).unwrap()
    }

    fn alerted() -> Position {
        Position { alert_sent: true, ..armed() }
    }

    fn action_at(position: &Position, last: f64) -> AlertAction {
        let quote = Quote::new(last, 100.0);
        next_action(position, &evaluate(position, Some(&quote)))
    }

    #[test]
    fn test_armed_breach_fires() {
        assert_eq!(
            action_at(&armed(), 89.5),
            AlertAction::Fire { side: Side::Put, price: 89.5, strike: 90.0 }
        );
        assert_eq!(
            action_at(&armed(), 110.0),
            AlertAction::Fire { side: Side::Call, price: 110.0, strike: 110.0 }
        );
    }

    #[test]
    fn test_armed_inside_holds() {
        assert_eq!(action_at(&armed(), 100.0), AlertAction::Hold);
    }

    #[test]
    fn test_alerted_breach_holds() {
        assert_eq!(action_at(&alerted(), 85.0), AlertAction::Hold);
    }

    #[test]
    fn test_alerted_inside_rearms() {
        assert_eq!(action_at(&alerted(), 100.0), AlertAction::Rearm);
    }

    #[test]
    fn test_unavailable_never_transitions() {
        assert_eq!(next_action(&armed(), &Evaluation::Unavailable), AlertAction::Hold);
        assert_eq!(next_action(&alerted(), &Evaluation::Unavailable), AlertAction::Hold);
    }

    #[test]
    fn test_breach_message() {
        let text = breach_message("SPY", Side::Put, 89.456, 90.0);
        assert!(text.contains("`SPY`"));
        assert!(text.contains("`$89.46`"));
        assert!(text.contains("*PUT* strike at `$90.00`"));
    }
}
