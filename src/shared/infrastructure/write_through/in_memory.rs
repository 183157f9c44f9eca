// In memory implementation of the Store port.
//
// Purpose
// - Back the repository in tests and local development without a database.
//
// Responsibilities
// - Keep one row per entity key.
// - Report affected rows the way a relational store would: zero when the row to update or
//   delete does not exist, or when an insert hits an existing key.
// - Simulate failures: offline, silently rejected writes, and slow writes.

use super::{Store, StoreError};
use crate::shared::core::primitives::Entity;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

pub struct InMemoryStore<E: Entity> {
    rows: RwLock<HashMap<E::Key, E>>,
    is_offline: AtomicBool,
    rejects_writes: AtomicBool,
    rows_per_write: AtomicU64,
    write_delay_ms: AtomicU64,
    round_trips: AtomicUsize,
}

impl<E: Entity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            is_offline: AtomicBool::new(false),
            rejects_writes: AtomicBool::new(false),
            rows_per_write: AtomicU64::new(1),
            write_delay_ms: AtomicU64::new(0),
            round_trips: AtomicUsize::new(0),
        }
    }
}

impl<E: Entity> InMemoryStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: impl IntoIterator<Item = E>) -> Self {
        let rows = rows.into_iter().map(|row| (row.key(), row)).collect();
        Self {
            rows: RwLock::new(rows),
            ..Self::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.is_offline.store(offline, Ordering::SeqCst);
    }

    /// When set, writes succeed at the transport level but affect zero rows.
    pub fn set_rejects_writes(&self, rejects: bool) {
        self.rejects_writes.store(rejects, Ordering::SeqCst);
    }

    /// Rows reported per written entity, for stores that write companion rows.
    pub fn set_rows_per_write(&self, rows: u64) {
        self.rows_per_write.store(rows, Ordering::SeqCst);
    }

    pub fn set_write_delay(&self, delay: Duration) {
        self.write_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of write calls that reached the store.
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    pub async fn get(&self, key: &E::Key) -> Option<E> {
        self.rows.read().await.get(key).cloned()
    }

    async fn begin_write(&self) -> Result<bool, StoreError> {
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(StoreError::Offline);
        }
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(!self.rejects_writes.load(Ordering::SeqCst))
    }

    fn affected(&self, entities: usize) -> u64 {
        self.rows_per_write.load(Ordering::SeqCst) * entities as u64
    }
}

#[async_trait::async_trait]
impl<E: Entity> Store<E> for InMemoryStore<E> {
    async fn insert(&self, value: &E) -> Result<u64, StoreError> {
        if !self.begin_write().await? {
            return Ok(0);
        }
        let mut rows = self.rows.write().await;
        if rows.contains_key(&value.key()) {
            return Ok(0);
        }
        rows.insert(value.key(), value.clone());
        Ok(self.affected(1))
    }

    async fn update_replace(&self, value: &E) -> Result<u64, StoreError> {
        if !self.begin_write().await? {
            return Ok(0);
        }
        let mut rows = self.rows.write().await;
        match rows.get_mut(&value.key()) {
            Some(row) => {
                *row = value.clone();
                Ok(self.affected(1))
            }
            None => Ok(0),
        }
    }

    async fn update_many(&self, values: &[E]) -> Result<u64, StoreError> {
        if !self.begin_write().await? {
            return Ok(0);
        }
        let mut rows = self.rows.write().await;
        if values.iter().any(|value| !rows.contains_key(&value.key())) {
            return Ok(0);
        }
        for value in values {
            rows.insert(value.key(), value.clone());
        }
        Ok(self.affected(values.len()))
    }

    async fn delete(&self, key: &E::Key) -> Result<u64, StoreError> {
        if !self.begin_write().await? {
            return Ok(0);
        }
        match self.rows.write().await.remove(key) {
            Some(_) => Ok(self.affected(1)),
            None => Ok(0),
        }
    }

    async fn load_all(&self) -> Result<Vec<E>, StoreError> {
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(StoreError::Offline);
        }
        Ok(self.rows.read().await.values().cloned().collect())
    }
}
