//! # store — Position Store
//!
//! Durable list of [`Position`]s.  Three interchangeable backends:
//!
//! | Backend    | `STORE_BACKEND` | Notes                                  |
//! |------------|-----------------|----------------------------------------|
//! | Memory     | `memory`        | lost on restart, handy for dev/tests   |
//! | JSON file  | `file`          | default, `POSITIONS_FILE`              |
//! | PostgreSQL | `postgres`      | needs `--features postgres`            |
//!
//! `list()` order is insertion order and stable between calls.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::MonitorError;
use crate::models::Position;

pub mod file;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use file::FileStore;
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;

#[async_trait]
pub trait PositionStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Position>, MonitorError>;

    /// Validates, computes `center_price`, starts armed.
    async fn insert(
        &self,
        ticker: &str,
        put_strike: f64,
        call_strike: f64,
    ) -> Result<Position, MonitorError>;

    /// Permanent; there is no soft delete.
    async fn delete(&self, id: Uuid) -> Result<(), MonitorError>;

    async fn update_alert_flag(&self, id: Uuid, alert_sent: bool) -> Result<(), MonitorError>;
}
