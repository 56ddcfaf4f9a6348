//! In-process collection backend

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Collection, Entity};
use crate::error::AppResult;

/// Collection kept in memory, iterated in insertion order
pub struct MemoryCollection<E: Entity> {
    records: RwLock<IndexMap<Uuid, E>>,
}

impl<E: Entity> MemoryCollection<E> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(IndexMap::new()),
        }
    }
}

impl<E: Entity> Default for MemoryCollection<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> Collection<E> for MemoryCollection<E> {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<E>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_many(&self, filter: &E::Filter, sort: Option<E::Sort>) -> AppResult<Vec<E>> {
        let mut rows: Vec<E> = self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.matches(filter))
            .cloned()
            .collect();
        if let Some(key) = sort {
            rows.sort_by(|a, b| a.compare(b, key));
        }
        Ok(rows)
    }

    async fn count(&self, filter: &E::Filter) -> AppResult<u64> {
        let records = self.records.read().await;
        Ok(records.values().filter(|record| record.matches(filter)).count() as u64)
    }

    async fn insert(&self, data: E::Data) -> AppResult<E> {
        let record = E::from_data(Uuid::new_v4(), data);
        self.records.write().await.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn update_by_id(&self, id: Uuid, data: E::Data) -> AppResult<Option<E>> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(slot) => {
                *slot = E::from_data(id, data);
                Ok(Some(slot.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.records.write().await.shift_remove(&id).is_some())
    }
}
