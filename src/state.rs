//! # state
//!
//! The **shared application state** injected into every Axum handler and into
//! the monitor task.
//!
//! ## Design Decisions
//!
//! * `Arc<AppState>` is cloned cheaply into every handler via
//!   `axum::extract::State`.
//! * The [`Monitor`] sits behind a `tokio::sync::Mutex`: whoever holds it runs
//!   the cycle, so two cycles can never overlap.
//! * Handlers never run a cycle themselves.  They call
//!   [`AppState::request_refresh`], which wakes the monitor task; several
//!   requests during one cycle collapse into a single follow-up cycle.
//! * The latest [`CycleReport`] lives in an `RwLock` so snapshot reads never
//!   wait on a running cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex, Notify, RwLock};

use crate::engine::monitor::{CycleReport, Monitor};
use crate::events::WsEvent;
use crate::store::PositionStore;

// ─── AppState ─────────────────────────────────────────────────────────────────

pub struct AppState {
    // ── Collaborators ─────────────────────────────────────────────────────────
    pub store:   Arc<dyn PositionStore>,
    pub monitor: Mutex<Monitor>,

    // ── Monitor Output ────────────────────────────────────────────────────────
    /// `None` until the first cycle completes.
    pub snapshot:     RwLock<Option<CycleReport>>,
    /// Pre-serialised JSON events for WebSocket clients.
    pub broadcast_tx: broadcast::Sender<String>,

    // ── Scheduling ────────────────────────────────────────────────────────────
    pub refresh:          Notify,
    pub refresh_interval: Duration,

    // ── Metrics ───────────────────────────────────────────────────────────────
    pub cycle_count: AtomicU64,
    pub alert_count: AtomicU64,
}

impl AppState {
    pub fn new(store: Arc<dyn PositionStore>, monitor: Monitor, refresh_interval: Duration) -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);

        Self {
            store,
            monitor: Mutex::new(monitor),
            snapshot: RwLock::new(None),
            broadcast_tx,
            refresh: Notify::new(),
            refresh_interval,
            cycle_count: AtomicU64::new(0),
            alert_count: AtomicU64::new(0),
        }
    }

    /// Broadcast to every WebSocket client.
    /// Does not fail when nobody is listening (headless mode).
    pub fn broadcast(&self, event: &WsEvent) {
        let _ = self.broadcast_tx.send(event.to_json());
    }

    /// Ask the monitor task for a cycle as soon as it is free.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Publishes a finished cycle: snapshot, counters, then events.
    ///
    /// The snapshot is stored before anything is broadcast.  A WebSocket
    /// client subscribes first and reads the snapshot second, so it either
    /// sees the new report in its SNAPSHOT frame or receives it as an event.
    pub async fn publish(&self, report: CycleReport, events: Vec<WsEvent>) {
        *self.snapshot.write().await = Some(report.clone());

        self.cycle_count.fetch_add(1, Ordering::Relaxed);
        self.alert_count
            .fetch_add(report.alerts_fired as u64, Ordering::Relaxed);

        for event in &events {
            self.broadcast(event);
        }

        self.broadcast(&WsEvent::CycleCompleted {
            report: Box::new(report),
        });
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;
