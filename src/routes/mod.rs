//! HTTP surface consumed by the dashboard.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::SharedState;

pub mod monitor;
pub mod positions;

use monitor::{get_snapshot, get_stats, health_check, request_refresh, ws_monitor};
use positions::{add_position, delete_position, list_positions};

/// All routes, without middleware.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // ── Positions ─────────────────────────────────────────────────────────
        .route("/api/positions",          get(list_positions))
        .route("/api/positions",          post(add_position))
        .route("/api/positions/:id",      delete(delete_position))
        // ── Monitor ───────────────────────────────────────────────────────────
        .route("/ws/monitor",             get(ws_monitor))
        .route("/api/monitor/snapshot",   get(get_snapshot))
        .route("/api/monitor/refresh",    post(request_refresh))
        .route("/api/monitor/stats",      get(get_stats))
        .route("/health",                 get(health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::IntoFuture;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::engine::{monitor::Monitor, runner::run_cycle};
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
        (Arc::new(AppState::new(store, monitor, Duration::from_secs(300))), quotes)
    }

    async fn send(
        state: &SharedState,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let resp = build_router(state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let (state, _) = make_state();
        let (status, body) = send(
            &state,
            "POST",
            "/api/positions",
            Some(serde_json::json!({ "ticker": "spy", "put_strike": 90.0, "call_strike": 110.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["position"]["ticker"], "SPY");
        assert_eq!(body["position"]["center_price"], 100.0);
        assert_eq!(body["position"]["alert_sent"], false);

        let (status, body) = send(&state, "GET", "/api/positions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
    }

    #[tokio::test]
    async fn test_add_rejects_inverted_strikes() {
        let (state, _) = make_state();
        let (status, body) = send(
            &state,
            "POST",
            "/api/positions",
            Some(serde_json::json!({ "ticker": "SPY", "put_strike": 110.0, "call_strike": 90.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert!(state.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let (state, _) = make_state();
        let pos = state.store.insert("SPY", 90.0, 110.0).await.unwrap();

        let uri = format!("/api/positions/{}", pos.id);
        let (status, _) = send(&state, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.store.list().await.unwrap().is_empty());

        let (status, _) = send(&state, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_snapshot_before_and_after_cycle() {
        let (state, quotes) = make_state();
        let (status, _) = send(&state, "GET", "/api/monitor/snapshot", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        state.store.insert("SPY", 90.0, 110.0).await.unwrap();
        quotes.set_last("SPY", 95.0);
        run_cycle(&state).await;

        let (status, body) = send(&state, "GET", "/api/monitor/snapshot", None).await;
        assert_eq!(status, StatusCode::OK);
        let row = &body["report"]["rows"][0];
        assert_eq!(row["ticker"], "SPY");
        assert_eq!(row["evaluation"]["status"], "available");
        assert_eq!(row["evaluation"]["range_position_pct"], 25.0);
        assert_eq!(row["evaluation"]["proximity_band"], "watch");
    }

    #[tokio::test]
    async fn test_add_rejects_malformed_body_as_json() {
        let (state, _) = make_state();

        for (body, expected) in [
            ("{not json", StatusCode::BAD_REQUEST),
            (r#"{"ticker":"SPY","put_strike":90.0}"#, StatusCode::UNPROCESSABLE_ENTITY),
        ] {
            let req = Request::builder()
                .method("POST")
                .uri("/api/positions")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap();
            let resp = build_router(state.clone()).oneshot(req).await.unwrap();
            assert_eq!(resp.status(), expected);

            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(json["ok"], false);
            assert!(json["error"].as_str().unwrap().starts_with("Invalid request body"));
        }
        assert!(state.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_reports_stale_monitor() {
        let (state, _) = make_state();
        run_cycle(&state).await;

        let (status, body) = send(&state, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        // Two intervals (600 s) without a cycle.
        state.snapshot.write().await.as_mut().unwrap().completed_at =
            chrono::Utc::now() - chrono::Duration::seconds(601);

        let (status, body) = send(&state, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ok"], false);
        assert_eq!(body["status"], "stale");
    }

    async fn next_json<S>(ws: &mut S) -> serde_json::Value
    where
        S: futures_util::Stream<
                Item = Result<
                    tokio_tungstenite::tungstenite::Message,
                    tokio_tungstenite::tungstenite::Error,
                >,
            > + Unpin,
    {
        use futures_util::StreamExt;
        use tokio_tungstenite::tungstenite::Message;

        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("no WebSocket frame within 5s")
                .unwrap()
                .unwrap();
            if let Message::Text(text) = msg {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_ws_feed_sends_snapshot_then_events() {
        let (state, quotes) = make_state();
        state.store.insert("SPY", 90.0, 110.0).await.unwrap();
        quotes.set_last("SPY", 89.0);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(axum::serve(listener, build_router(state.clone())).into_future());

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/monitor"))
            .await
            .unwrap();

        let snapshot = next_json(&mut ws).await;
        assert_eq!(snapshot["event"], "SNAPSHOT");
        assert!(snapshot["report"].is_null());
        assert_eq!(snapshot["cycle_count"], 0);

        // The handler subscribed before sending SNAPSHOT.
        run_cycle(&state).await;

        let fired = next_json(&mut ws).await;
        assert_eq!(fired["event"], "ALERT_FIRED");
        assert_eq!(fired["ticker"], "SPY");

        let completed = next_json(&mut ws).await;
        assert_eq!(completed["event"], "CYCLE_COMPLETED");
        assert_eq!(completed["report"]["cycle"], 1);

        server.abort();
    }

    #[tokio::test]
    async fn test_refresh_and_stats() {
        let (state, _) = make_state();
        let (status, _) = send(&state, "POST", "/api/monitor/refresh", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, body) = send(&state, "GET", "/api/monitor/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cycle_count"], 0);
        assert_eq!(body["refresh_interval_secs"], 300);

        let (status, _) = send(&state, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
