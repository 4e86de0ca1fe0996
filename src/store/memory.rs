//! In-process store.  Nothing survives a restart.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::MonitorError;
use crate::models::Position;
use crate::store::PositionStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    positions: RwLock<Vec<Position>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Position>, MonitorError> {
        Ok(self.positions.read().await.clone())
    }

    async fn insert(
        &self,
        ticker: &str,
        put_strike: f64,
        call_strike: f64,
    ) -> Result<Position, MonitorError> {
        let position = Position::create(ticker, put_strike, call_strike)?;
        self.positions.write().await.push(position.clone());
        Ok(position)
    }

    async fn delete(&self, id: Uuid) -> Result<(), MonitorError> {
        let mut positions = self.positions.write().await;
        let before = positions.len();
        positions.retain(|p| p.id != id);
        if positions.len() == before {
            return Err(MonitorError::PositionNotFound(id));
        }
        Ok(())
    }

    async fn update_alert_flag(&self, id: Uuid, alert_sent: bool) -> Result<(), MonitorError> {
        let mut positions = self.positions.write().await;
        let position = positions
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(MonitorError::PositionNotFound(id))?;
        position.alert_sent = alert_sent;
        Ok(())
    }
}
