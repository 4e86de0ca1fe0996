//! # engine::runner
//!
//! Background task that drives refresh cycles: on every interval tick, and
//! whenever a handler requests a refresh.  Runs for the life of the process.

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::engine::monitor::CycleReport;
use crate::state::SharedState;

/// Runs one cycle under the monitor lock and publishes the result.
pub async fn run_cycle(state: &SharedState) -> CycleReport {
    let (report, events) = {
        let mut monitor = state.monitor.lock().await;
        monitor.run_cycle().await
    };

    info!(
        cycle       = report.cycle,
        positions   = report.rows.len(),
        alerts      = report.alerts_fired,
        rearmed     = report.rearmed,
        unavailable = report.unavailable,
        "🔄 Refresh cycle complete"
    );

    state.publish(report.clone(), events).await;
    report
}

/// Spawns the monitor loop.  The first cycle runs immediately.
pub fn spawn_monitor(state: SharedState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interval = state.refresh_interval;
        info!(?interval, "📊 Position monitor started");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = state.refresh.notified() => {
                    debug!("Refresh requested");
                }
            }

            run_cycle(&state).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::engine::monitor::Monitor;
    use crate::market::QuoteCache;
    use crate::state::AppState;
    use crate::store::{MemoryStore, PositionStore};
    use crate::testing::{RecordingNotifier, StubQuotes};

    fn make_state() -> (SharedState, Arc<StubQuotes>) {
        let store: Arc<dyn PositionStore> = Arc::new(MemoryStore::new());
        let quotes = Arc::new(StubQuotes::default());
        let monitor = Monitor::new(
            store.clone(),
            QuoteCache::new(quotes.clone(), Duration::ZERO),
            Arc::new(RecordingNotifier::default()),
        );
        let state = Arc::new(AppState::new(store, monitor, Duration::from_secs(300)));
        (state, quotes)
    }

    #[tokio::test]
    async fn test_run_cycle_publishes_snapshot() {
        let (state, quotes) = make_state();
        state.store.insert("SPY", 90.0, 110.0).await.unwrap();
        quotes.set_last("SPY", 89.0);

        let mut rx = state.broadcast_tx.subscribe();
        run_cycle(&state).await;

        let snapshot = state.snapshot.read().await.clone().unwrap();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(state.cycle_count.load(Ordering::Relaxed), 1);
        assert_eq!(state.alert_count.load(Ordering::Relaxed), 1);

        let first: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(first["event"], "ALERT_FIRED");
        let last: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(last["event"], "CYCLE_COMPLETED");
        assert_eq!(last["report"]["rows"][0]["evaluation"]["status"], "available");
    }

    #[tokio::test]
    async fn test_snapshot_stored_before_broadcast() {
        let (state, quotes) = make_state();
        state.store.insert("SPY", 90.0, 110.0).await.unwrap();
        quotes.set_last("SPY", 100.0);
        let (report, events) = state.monitor.lock().await.run_cycle().await;

        // A reader (a connecting WS client) holds the snapshot lock.
        let reader = state.snapshot.read().await;
        let mut rx = state.broadcast_tx.subscribe();

        let publisher = {
            let state = state.clone();
            tokio::spawn(async move { state.publish(report, events).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Nothing goes out while the snapshot still holds the old report.
        assert!(reader.is_none());
        assert!(rx.try_recv().is_err());
        drop(reader);

        publisher.await.unwrap();
        let completed: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(completed["event"], "CYCLE_COMPLETED");
        assert_eq!(completed["report"]["cycle"], 1);
        assert_eq!(state.snapshot.read().await.as_ref().unwrap().cycle, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_runs_on_start_and_on_request() {
        let (state, _) = make_state();
        let handle = spawn_monitor(state.clone());

        // let the immediate first tick run
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(state.cycle_count.load(Ordering::Relaxed), 1);

        state.request_refresh();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(state.cycle_count.load(Ordering::Relaxed), 2);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(state.cycle_count.load(Ordering::Relaxed), 3);

        handle.abort();
    }
}
