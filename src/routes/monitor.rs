//! # routes::monitor
//!
//! **Dashboard feed** — the latest table and a live event stream.
//!
//! | Method    | Path                    | Description                          |
//! |-----------|-------------------------|--------------------------------------|
//! | GET (WS)  | `/ws/monitor`           | Snapshot on connect, then WsEvents   |
//! | GET       | `/api/monitor/snapshot` | Latest cycle report                  |
//! | POST      | `/api/monitor/refresh`  | Request a cycle now                  |
//! | GET       | `/api/monitor/stats`    | Cycle / alert counters               |
//! | GET       | `/health`               | Liveness                             |

use std::sync::atomic::Ordering;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tracing::{debug, info};

use crate::{error::AppError, state::SharedState};

// ─── WebSocket Handler ────────────────────────────────────────────────────────

/// Upgrade HTTP → WebSocket and subscribe to the broadcast channel.
pub async fn ws_monitor(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let mut rx = state.broadcast_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    info!("🔌 WebSocket client connected");

    // ── Send the current table straight away ─────────────────────────────────
    let snapshot = {
        let report = state.snapshot.read().await.clone();
        json!({
            "event":       "SNAPSHOT",
            "report":      report,
            "cycle_count": state.cycle_count.load(Ordering::Relaxed),
        })
        .to_string()
    };

    if sender.send(Message::Text(snapshot.into())).await.is_err() {
        return;
    }

    // ── Event Loop ────────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(json_str) => {
                        if sender.send(Message::Text(json_str.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!("WS client lagged, skipped {n} events");
                    }
                    Err(_) => break,
                }
            }

            result = receiver.next() => {
                match result {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("🔌 WebSocket client disconnected");
}

// ─── REST Endpoints ───────────────────────────────────────────────────────────

/// GET /api/monitor/snapshot
pub async fn get_snapshot(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let guard = state.snapshot.read().await;

    match guard.as_ref() {
        Some(report) => Ok(Json(json!({ "ok": true, "report": report }))),
        None => Err(AppError::NotFound(
            "No snapshot yet. The first refresh cycle has not completed.".into(),
        )),
    }
}

/// POST /api/monitor/refresh
pub async fn request_refresh(
    State(state): State<SharedState>,
) -> impl IntoResponse {
    state.request_refresh();

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "ok":      true,
            "message": "Refresh requested",
        })),
    )
}

/// GET /api/monitor/stats
pub async fn get_stats(
    State(state): State<SharedState>,
) -> impl IntoResponse {
    let last_cycle_at = state
        .snapshot
        .read()
        .await
        .as_ref()
        .map(|r| r.completed_at);

    Json(json!({
        "ok":                    true,
        "cycle_count":           state.cycle_count.load(Ordering::Relaxed),
        "alert_count":           state.alert_count.load(Ordering::Relaxed),
        "last_cycle_at":         last_cycle_at,
        "refresh_interval_secs": state.refresh_interval.as_secs(),
    }))
}

/// GET /health
///
/// Unhealthy (503) once the last cycle is older than two intervals, which
/// means the monitor task has stopped or is stuck.
pub async fn health_check(
    State(state): State<SharedState>,
) -> impl IntoResponse {
    let last_cycle_at = state
        .snapshot
        .read()
        .await
        .as_ref()
        .map(|r| r.completed_at);

    let max_age = state.refresh_interval * 2;
    let stale = last_cycle_at.is_some_and(|at| {
        (Utc::now() - at).to_std().is_ok_and(|age| age > max_age)
    });

    if stale {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ok": false, "status": "stale", "last_cycle_at": last_cycle_at })),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({ "ok": true, "status": "healthy", "last_cycle_at": last_cycle_at })),
        )
    }
}
