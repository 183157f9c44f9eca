// Persistence port behind the write-through repository.
//
// Purpose
// - Describe the store the repository writes through to, without naming an engine.
//
// Responsibilities
// - Every write reports how many rows it affected. Zero means the write did not happen,
//   whatever the reason, and the repository treats it as a failure.
// - `update_many` applies all values in one transaction or none of them.
//
// Testing guidance
// - `in_memory::InMemoryStore` can be switched offline, made to reject writes, or made to
//   report a different row count per write.

pub mod in_memory;
pub mod repository;

use crate::shared::core::primitives::Entity;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store offline")]
    Offline,

    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait Store<E: Entity>: Send + Sync + 'static {
    async fn insert(&self, value: &E) -> Result<u64, StoreError>;
    async fn update_replace(&self, value: &E) -> Result<u64, StoreError>;
    async fn update_many(&self, values: &[E]) -> Result<u64, StoreError>;
    async fn delete(&self, key: &E::Key) -> Result<u64, StoreError>;
    async fn load_all(&self) -> Result<Vec<E>, StoreError>;
}

/// What a repository mutation did. Only `Committed` changed the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Committed,
    /// Insert of a key the cache already knows. No store round-trip happened.
    AlreadyExists,
    /// Update or removal of a key the cache does not know. No store round-trip happened.
    Missing,
    /// The store answered with fewer affected rows than required.
    Rejected,
    /// The store call itself failed.
    Failed,
}

impl WriteOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, WriteOutcome::Committed)
    }
}
