//! In-memory gateway.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::StorageGateway;
use crate::error::{FragmentError, FragmentResult};
use crate::record::{FragmentRecord, ListEntry};

type Key = (String, String);

/// Gateway backed by two maps keyed by `(owner_id, id)`.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    metadata: RwLock<BTreeMap<Key, FragmentRecord>>,
    data: RwLock<BTreeMap<Key, Vec<u8>>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(owner_id: &str, id: &str) -> Key {
        (owner_id.to_string(), id.to_string())
    }
}

#[async_trait]
impl StorageGateway for MemoryGateway {
    async fn read_metadata(&self, owner_id: &str, id: &str) -> FragmentResult<FragmentRecord> {
        let metadata = self.metadata.read().await;
        metadata
            .get(&Self::key(owner_id, id))
            .cloned()
            .ok_or_else(|| FragmentError::NotFound(id.to_string()))
    }

    async fn write_metadata(
        &self,
        owner_id: &str,
        id: &str,
        record: &FragmentRecord,
    ) -> FragmentResult<()> {
        let mut metadata = self.metadata.write().await;
        metadata.insert(Self::key(owner_id, id), record.clone());
        Ok(())
    }

    async fn read_data(&self, owner_id: &str, id: &str) -> FragmentResult<Vec<u8>> {
        let data = self.data.read().await;
        data.get(&Self::key(owner_id, id))
            .cloned()
            .ok_or_else(|| FragmentError::NotFound(id.to_string()))
    }

    async fn write_data(&self, owner_id: &str, id: &str, data: &[u8]) -> FragmentResult<()> {
        let mut store = self.data.write().await;
        store.insert(Self::key(owner_id, id), data.to_vec());
        Ok(())
    }

    async fn list_metadata(&self, owner_id: &str, expand: bool) -> FragmentResult<Vec<ListEntry>> {
        let metadata = self.metadata.read().await;
        let entries = metadata
            .iter()
            .filter(|((owner, _), _)| owner == owner_id)
            .map(|((_, id), record)| {
                if expand {
                    ListEntry::Record(record.clone())
                } else {
                    ListEntry::Id(id.clone())
                }
            })
            .collect();
        Ok(entries)
    }

    async fn delete(&self, owner_id: &str, id: &str) -> FragmentResult<()> {
        // Both locks held so no reader sees metadata without data or vice versa.
        let mut metadata = self.metadata.write().await;
        let mut data = self.data.write().await;

        let key = Self::key(owner_id, id);
        metadata
            .remove(&key)
            .ok_or_else(|| FragmentError::NotFound(id.to_string()))?;
        data.remove(&key);
        Ok(())
    }
}
