//! In-memory record store for testing and development.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::traits::{InsertOutcome, RecordStore};
use crate::types::Opportunity;

/// Records kept in insertion order. Data is lost on drop.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<Opportunity>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records.write().unwrap().clear();
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_by_url(&self, url: &str) -> StoreResult<Option<Opportunity>> {
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .find(|r| r.url == url)
            .cloned())
    }

    async fn insert_if_absent(&self, record: &Opportunity) -> StoreResult<InsertOutcome> {
        let mut records = self.records.write().unwrap();
        if records.iter().any(|r| r.url == record.url) {
            tracing::info!(url = %record.url, "URL {} already exists in memory. Skipping.", record.url);
            return Ok(InsertOutcome::AlreadyExists);
        }
        records.push(record.clone());
        Ok(InsertOutcome::Inserted(records.len() as u64))
    }

    async fn all(&self) -> StoreResult<Vec<Opportunity>> {
        Ok(self.records.read().unwrap().clone())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.len())
    }
}
