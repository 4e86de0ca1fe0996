//! # engine::monitor
//!
//! **Refresh cycle** — the single actor that walks every stored position:
//!
//! ```text
//! for each position (store order):
//!   quote (cache) → evaluate → next_action → notify / persist flag
//! ```
//!
//! The store is the only shared mutable resource.  When an alert flag cannot
//! be written, the value is kept in `pending_flags` and laid over what the
//! store returns until a retry succeeds.  Without that overlay a flaky store
//! would make the next cycle see an armed position and notify twice.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::alert::{breach_message, next_action, AlertAction};
use crate::engine::breach::{evaluate, Evaluation};
use crate::error::MonitorError;
use crate::events::WsEvent;
use crate::market::QuoteCache;
use crate::models::Position;
use crate::notify::Notifier;
use crate::store::PositionStore;

// ─── Report ───────────────────────────────────────────────────────────────────

/// One table row: the position (with its post-cycle flag) and its metrics.
#[derive(Debug, Clone, Serialize)]
pub struct PositionRow {
    #[serde(flatten)]
    pub position:   Position,
    pub evaluation: Evaluation,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle:        u64,
    pub completed_at: DateTime<Utc>,
    pub rows:         Vec<PositionRow>,
    pub alerts_fired: usize,
    pub rearmed:      usize,
    pub unavailable:  usize,
}

// ─── Monitor ──────────────────────────────────────────────────────────────────

pub struct Monitor {
    store:          Arc<dyn PositionStore>,
    quotes:         QuoteCache,
    notifier:       Arc<dyn Notifier>,
    /// Alert flags decided but not yet persisted.
    pending_flags:  HashMap<Uuid, bool>,
    /// Last successful `list()`, with flags as decided in-cycle.
    last_positions: Vec<Position>,
    cycle:          u64,
}

impl Monitor {
    pub fn new(store: Arc<dyn PositionStore>, quotes: QuoteCache, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            quotes,
            notifier,
            pending_flags: HashMap::new(),
            last_positions: Vec::new(),
            cycle: 0,
        }
    }

    /// Runs one full cycle and returns the table plus the events it produced.
    pub async fn run_cycle(&mut self) -> (CycleReport, Vec<WsEvent>) {
        self.cycle += 1;
        let mut events = Vec::new();

        self.quotes.purge_expired();
        let positions = self.load_positions(&mut events).await;

        let mut rows = Vec::with_capacity(positions.len());
        let mut alerts_fired = 0;
        let mut rearmed = 0;
        let mut unavailable = 0;

        for mut position in positions {
            let quote = self.quotes.get(&position.ticker).await.ok();
            let evaluation = evaluate(&position, quote.as_ref());

            if evaluation == Evaluation::Unavailable {
                unavailable += 1;
                events.push(WsEvent::QuoteUnavailable { ticker: position.ticker.clone() });
            }

            match next_action(&position, &evaluation) {
                AlertAction::Fire { side, price, strike } => {
                    let text = breach_message(&position.ticker, side, price, strike);
                    let delivered = match self.notifier.notify(&text).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(ticker = %position.ticker, error = %e, "⚠️ Breach notification failed");
                            false
                        }
                    };

                    info!(
                        ticker = %position.ticker,
                        %side,
                        price,
                        strike,
                        delivered,
                        "🚨 Strike breached — alert fired"
                    );
                    events.push(WsEvent::AlertFired {
                        position_id: position.id,
                        ticker: position.ticker.clone(),
                        side,
                        price,
                        strike,
                        delivered,
                    });

                    position.alert_sent = true;
                    self.persist_flag(&position, &mut events).await;
                    alerts_fired += 1;
                }
                AlertAction::Rearm => {
                    info!(ticker = %position.ticker, "✅ Price back inside range — alert re-armed");
                    events.push(WsEvent::AlertRearmed {
                        position_id: position.id,
                        ticker: position.ticker.clone(),
                    });

                    position.alert_sent = false;
                    self.persist_flag(&position, &mut events).await;
                    rearmed += 1;
                }
                AlertAction::Hold => {}
            }

            rows.push(PositionRow { position, evaluation });
        }

        debug!(
            cycle = self.cycle,
            positions = rows.len(),
            alerts_fired,
            rearmed,
            unavailable,
            "Cycle complete"
        );

        let report = CycleReport {
            cycle: self.cycle,
            completed_at: Utc::now(),
            rows,
            alerts_fired,
            rearmed,
            unavailable,
        };
        (report, events)
    }

    /// Current positions with the pending overlay applied.
    ///
    /// A failing store falls back to the previous cycle's list.
    async fn load_positions(&mut self, events: &mut Vec<WsEvent>) -> Vec<Position> {
        match self.store.list().await {
            Ok(listed) => {
                self.pending_flags.retain(|id, _| listed.iter().any(|p| p.id == *id));
                self.last_positions = listed;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    cached = self.last_positions.len(),
                    "⚠️ Store list failed — reusing previous positions"
                );
            }
        }

        let mut positions = self.last_positions.clone();
        for position in positions.iter_mut() {
            if let Some(&flag) = self.pending_flags.get(&position.id) {
                position.alert_sent = flag;
                debug!(ticker = %position.ticker, flag, "Retrying pending alert flag write");
                self.persist_flag(position, events).await;
            }
        }
        positions
    }

    async fn persist_flag(&mut self, position: &Position, events: &mut Vec<WsEvent>) {
        if let Some(cached) = self.last_positions.iter_mut().find(|p| p.id == position.id) {
            cached.alert_sent = position.alert_sent;
        }

        match self.store.update_alert_flag(position.id, position.alert_sent).await {
            Ok(()) => {
                self.pending_flags.remove(&position.id);
            }
            Err(MonitorError::PositionNotFound(id)) => {
                // Deleted mid-cycle.
                debug!(%id, "Position vanished before flag write");
                self.pending_flags.remove(&id);
            }
            Err(e) => {
                warn!(
                    ticker = %position.ticker,
                    alert_sent = position.alert_sent,
                    error = %e,
                    "⚠️ Alert flag not persisted — will retry next cycle"
                );
                self.pending_flags.insert(position.id, position.alert_sent);
                events.push(WsEvent::StoreWriteFailed {
                    position_id: position.id,
                    error: e.to_string(),
                });
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
