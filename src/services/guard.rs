//! Referential guard for deletes
//!
//! The store offers no multi-record atomicity, so the dependents are read
//! again right before every delete instead of trusting an earlier page view.

use std::sync::Arc;

use uuid::Uuid;

use super::join::ConcurrentJoin;
use crate::{
    error::AppResult,
    repository::{Collection, Entity},
};

/// What a guarded delete did
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision<E, D> {
    Deleted,
    /// No record had this id; deleting it again is a no-op
    AlreadyGone,
    /// Dependents still reference the record; nothing was written
    Blocked { entity: E, dependents: Vec<D> },
}

/// A record and everything that references it, read together
#[derive(Debug, Clone, PartialEq)]
pub struct Dependents<E, D> {
    pub entity: Option<E>,
    pub dependents: Vec<D>,
}

/// Delete guard for records of `E` referenced by records of `D`
pub struct IntegrityGuard<E: Entity, D: Entity> {
    primary: Arc<dyn Collection<E>>,
    dependents: Arc<dyn Collection<D>>,
    referencing: fn(Uuid) -> D::Filter,
}

impl<E: Entity, D: Entity> Clone for IntegrityGuard<E, D> {
    fn clone(&self) -> Self {
        Self {
            primary: self.primary.clone(),
            dependents: self.dependents.clone(),
            referencing: self.referencing,
        }
    }
}

impl<E: Entity, D: Entity> IntegrityGuard<E, D> {
    pub fn new(
        primary: Arc<dyn Collection<E>>,
        dependents: Arc<dyn Collection<D>>,
        referencing: fn(Uuid) -> D::Filter,
    ) -> Self {
        Self {
            primary,
            dependents,
            referencing,
        }
    }

    /// Fetch the record and its dependents concurrently
    pub async fn inspect(&self, id: Uuid) -> AppResult<Dependents<E, D>> {
        let primary = self.primary.clone();
        let dependents = self.dependents.clone();
        let filter = (self.referencing)(id);

        let mut join = ConcurrentJoin::new(E::COLLECTION);
        let entity = join.add("entity", async move { primary.find_by_id(id).await });
        let referencing = join.add("dependents", async move {
            dependents.find_many(&filter, None).await
        });
        let mut joined = join.run().await?;

        Ok(Dependents {
            entity: joined.take(entity)?,
            dependents: joined.take(referencing)?,
        })
    }

    /// Delete `id` only when nothing references it
    pub async fn check_and_maybe_delete(&self, id: Uuid) -> AppResult<GuardDecision<E, D>> {
        let Dependents { entity, dependents } = self.inspect(id).await?;

        let Some(entity) = entity else {
            tracing::debug!("{} {} already gone, nothing to delete", E::COLLECTION, id);
            return Ok(GuardDecision::AlreadyGone);
        };

        if !dependents.is_empty() {
            tracing::warn!(
                "Refusing to delete {} {}: {} {} record(s) still reference it",
                E::COLLECTION,
                id,
                dependents.len(),
                D::COLLECTION
            );
            return Ok(GuardDecision::Blocked { entity, dependents });
        }

        if self.primary.delete_by_id(id).await? {
            tracing::info!("Deleted {} {}", E::COLLECTION, id);
            Ok(GuardDecision::Deleted)
        } else {
            // Removed by someone else between the read and the delete
            Ok(GuardDecision::AlreadyGone)
        }
    }
}
