//! # events
//!
//! Defines [`WsEvent`] — every event the service broadcasts to dashboard
//! clients over `/ws/monitor`.
//!
//! Events are serialised to a JSON `String` before going into the
//! `tokio::sync::broadcast` channel, so receivers never need the types.

use serde::Serialize;
use uuid::Uuid;

use crate::engine::monitor::CycleReport;
use crate::models::{Position, Side};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WsEvent {
    /// A refresh cycle finished; carries the full table.
    CycleCompleted {
        report: Box<CycleReport>,
    },

    PositionAdded {
        position: Box<Position>,
    },

    PositionDeleted {
        position_id: Uuid,
    },

    /// First breach of an episode.  `delivered = false` when the notifier
    /// failed; the position is alerted either way.
    AlertFired {
        position_id: Uuid,
        ticker:      String,
        side:        Side,
        price:       f64,
        strike:      f64,
        delivered:   bool,
    },

    /// Price came back inside the range; silent re-arm.
    AlertRearmed {
        position_id: Uuid,
        ticker:      String,
    },

    QuoteUnavailable {
        ticker: String,
    },

    /// An alert flag could not be persisted; it is retried next cycle.
    StoreWriteFailed {
        position_id: Uuid,
        error:       String,
    },
}

impl WsEvent {
    /// JSON String for the WebSocket text frame.
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }
}
