//! Record persistence keyed by source URL.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::Opportunity;

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Record appended under this document id
    Inserted(u64),
    /// A record with the same URL was already present; nothing written
    AlreadyExists,
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

/// A deduplicated collection of Opportunity records.
///
/// At most one record per `url`; records are never overwritten.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the record whose `url` equals `url` exactly.
    async fn get_by_url(&self, url: &str) -> StoreResult<Option<Opportunity>>;

    /// Append `record` unless its `url` is already present.
    ///
    /// The lookup and the append are atomic with respect to other calls on
    /// the same store instance.
    async fn insert_if_absent(&self, record: &Opportunity) -> StoreResult<InsertOutcome>;

    /// All records in insertion order.
    async fn all(&self) -> StoreResult<Vec<Opportunity>>;

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.all().await?.len())
    }

    async fn contains_url(&self, url: &str) -> StoreResult<bool> {
        Ok(self.get_by_url(url).await?.is_some())
    }
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    async fn get_by_url(&self, url: &str) -> StoreResult<Option<Opportunity>> {
        (**self).get_by_url(url).await
    }

    async fn insert_if_absent(&self, record: &Opportunity) -> StoreResult<InsertOutcome> {
        (**self).insert_if_absent(record).await
    }

    async fn all(&self) -> StoreResult<Vec<Opportunity>> {
        (**self).all().await
    }

    async fn count(&self) -> StoreResult<usize> {
        (**self).count().await
    }
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn get_by_url(&self, url: &str) -> StoreResult<Option<Opportunity>> {
        (**self).get_by_url(url).await
    }

    async fn insert_if_absent(&self, record: &Opportunity) -> StoreResult<InsertOutcome> {
        (**self).insert_if_absent(record).await
    }

    async fn all(&self) -> StoreResult<Vec<Opportunity>> {
        (**self).all().await
    }

    async fn count(&self) -> StoreResult<usize> {
        (**self).count().await
    }
}
