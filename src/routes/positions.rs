//! # routes::positions
//!
//! CRUD for monitored strangles (the dashboard's sidebar form and ❌ button).
//!
//! | Method | Path                  | Description                     |
//! |--------|-----------------------|---------------------------------|
//! | GET    | `/api/positions`      | All positions, store order      |
//! | POST   | `/api/positions`      | Add a position                  |
//! | DELETE | `/api/positions/:id`  | Remove a position permanently   |

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    events::WsEvent,
    models::NewPosition,
    state::SharedState,
};

// ─── GET /api/positions ───────────────────────────────────────────────────────

pub async fn list_positions(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let positions = state.store.list().await?;
    Ok(Json(json!({
        "ok":        true,
        "count":     positions.len(),
        "positions": positions,
    })))
}

// ─── POST /api/positions ──────────────────────────────────────────────────────

/// Validates and stores a new strangle, then asks for an immediate refresh so
/// the row shows up without waiting a full interval.
pub async fn add_position(
    State(state): State<SharedState>,
    body: Result<Json<NewPosition>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let position = state
        .store
        .insert(&body.ticker, body.put_strike, body.call_strike)
        .await?;

    tracing::info!(
        id     = %position.id,
        ticker = %position.ticker,
        put    = position.put_strike,
        call   = position.call_strike,
        center = position.center_price,
        "➕ Position added"
    );

    state.broadcast(&WsEvent::PositionAdded {
        position: Box::new(position.clone()),
    });
    state.request_refresh();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok":       true,
            "position": position,
            "message":  format!(
                "{} added with center at ${:.2}",
                position.ticker, position.center_price
            ),
        })),
    ))
}

// ─── DELETE /api/positions/:id ────────────────────────────────────────────────

pub async fn delete_position(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.store.delete(id).await?;

    tracing::info!(%id, "🗑️ Position deleted");

    state.broadcast(&WsEvent::PositionDeleted { position_id: id });
    state.request_refresh();

    Ok(Json(json!({
        "ok":          true,
        "position_id": id,
    })))
}
