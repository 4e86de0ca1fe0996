//! JSON file store.
//!
//! The whole list lives in memory and is rewritten on every mutation: the new
//! contents go to a sibling `*.tmp` file that is then renamed over the
//! live file, so a crash mid-write never leaves a truncated file behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::MonitorError;
use crate::models::Position;
use crate::store::PositionStore;

#[derive(Debug)]
pub struct FileStore {
    path:      PathBuf,
    positions: Mutex<Vec<Position>>,
}

impl FileStore {
    /// Loads `path`.  A missing file starts empty; an unreadable or corrupt
    /// file is an error so it never gets overwritten.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let path = path.as_ref().to_path_buf();

        let positions = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<Vec<Position>>(&content).map_err(|e| {
                MonitorError::StoreUnavailable(format!("corrupt positions file {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No positions file found, starting fresh");
                Vec::new()
            }
            Err(e) => {
                return Err(MonitorError::StoreUnavailable(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };

        info!(path = %path.display(), count = positions.len(), "📂 Positions loaded");

        Ok(Self {
            path,
            positions: Mutex::new(positions),
        })
    }

    async fn persist(&self, positions: &[Position]) -> Result<(), MonitorError> {
        let content = serde_json::to_string_pretty(positions)
            .map_err(|e| MonitorError::StoreUnavailable(format!("serialize positions: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| MonitorError::StoreUnavailable(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| MonitorError::StoreUnavailable(format!("rename {}: {e}", tmp.display())))?;

        debug!(count = positions.len(), "Saved positions to file");
        Ok(())
    }

    /// Applies `change` to a copy, persists it, and only then commits it to
    /// memory.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<Position>) -> Result<T, MonitorError>,
    ) -> Result<T, MonitorError> {
        let mut guard = self.positions.lock().await;
        let mut next = guard.clone();
        let out = change(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(out)
    }
}

#[async_trait]
impl PositionStore for FileStore {
    async fn list(&self) -> Result<Vec<Position>, MonitorError> {
        Ok(self.positions.lock().await.clone())
    }

    async fn insert(
        &self,
        ticker: &str,
        put_strike: f64,
        call_strike: f64,
    ) -> Result<Position, MonitorError> {
        let position = Position::create(ticker, put_strike, call_strike)?;
        self.mutate(|positions| {
            positions.push(position.clone());
            Ok(position)
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), MonitorError> {
        self.mutate(|positions| {
            let before = positions.len();
            positions.retain(|p| p.id != id);
            if positions.len() == before {
                return Err(MonitorError::PositionNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn update_alert_flag(&self, id: Uuid, alert_sent: bool) -> Result<(), MonitorError> {
        self.mutate(|positions| {
            let position = positions
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(MonitorError::PositionNotFound(id))?;
            position.alert_sent = alert_sent;
            Ok(())
        })
        .await
    }
}
