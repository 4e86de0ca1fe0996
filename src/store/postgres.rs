//! # store::postgres — hosted table backend
//!
//! Uses `sqlx` runtime queries against `strangle_positions` (see
//! `migrations/001_init.sql`, applied at startup).
//!
//! ## Setup
//! 1. Create a database and set `DATABASE_URL` in `.env`
//! 2. `STORE_BACKEND=postgres cargo run --features postgres`

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::MonitorError;
use crate::models::Position;
use crate::store::PositionStore;

pub struct PgStore {
    pool: PgPool,
}

fn unavailable(context: &str, e: sqlx::Error) -> MonitorError {
    MonitorError::StoreUnavailable(format!("{context}: {e}"))
}

impl PgStore {
    /// Connects and runs the embedded migration.
    pub async fn connect(database_url: &str) -> Result<Self, MonitorError> {
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| unavailable("Failed to connect to PostgreSQL", e))?;

        sqlx::query(include_str!("../../migrations/001_init.sql"))
            .execute(&pool)
            .await
            .map_err(|e| unavailable("Failed to run migration 001_init.sql", e))?;

        info!("✅ PostgreSQL connected and migrations applied");
        Ok(Self { pool })
    }
}

#[async_trait]
impl PositionStore for PgStore {
    async fn list(&self) -> Result<Vec<Position>, MonitorError> {
        let rows = sqlx::query(
            r#"
            SELECT id, ticker, put_strike, call_strike, center_price, alert_sent
            FROM strangle_positions
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| unavailable("list positions failed", e))?;

        Ok(rows
            .into_iter()
            .map(|row| Position {
                id:           row.get("id"),
                ticker:       row.get("ticker"),
                put_strike:   row.get("put_strike"),
                call_strike:  row.get("call_strike"),
                center_price: row.get("center_price"),
                alert_sent:   row.get("alert_sent"),
            })
            .collect())
    }

    async fn insert(
        &self,
        ticker: &str,
        put_strike: f64,
        call_strike: f64,
    ) -> Result<Position, MonitorError> {
        let position = Position::create(ticker, put_strike, call_strike)?;

        sqlx::query(
            r#"
            INSERT INTO strangle_positions
              (id, ticker, put_strike, call_strike, center_price, alert_sent)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(position.id)
        .bind(&position.ticker)
        .bind(position.put_strike)
        .bind(position.call_strike)
        .bind(position.center_price)
        .bind(position.alert_sent)
        .execute(&self.pool)
        .await
        .map_err(|e| unavailable("insert position failed", e))?;

        Ok(position)
    }

    async fn delete(&self, id: Uuid) -> Result<(), MonitorError> {
        let result = sqlx::query("DELETE FROM strangle_positions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| unavailable("delete position failed", e))?;

        if result.rows_affected() == 0 {
            return Err(MonitorError::PositionNotFound(id));
        }
        Ok(())
    }

    async fn update_alert_flag(&self, id: Uuid, alert_sent: bool) -> Result<(), MonitorError> {
        let result = sqlx::query("UPDATE strangle_positions SET alert_sent = $2 WHERE id = $1")
            .bind(id)
            .bind(alert_sent)
            .execute(&self.pool)
            .await
            .map_err(|e| unavailable("update alert flag failed", e))?;

        if result.rows_affected() == 0 {
            return Err(MonitorError::PositionNotFound(id));
        }
        Ok(())
    }
}
