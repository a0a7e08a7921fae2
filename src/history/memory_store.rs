//! In-memory history backend

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{HistoryRecord, HistoryStore};
use crate::error::Result;

/// Keeps records for the life of the process only
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: RwLock<Vec<HistoryRecord>>,
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }

    async fn append(&self, record: &HistoryRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<HistoryRecord>> {
        Ok(self.records.read().await.clone())
    }
}
