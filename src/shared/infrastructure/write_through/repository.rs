// Write-through repository: an in-memory index in front of a Store.
//
// Purpose
// - Serve reads from memory while guaranteeing that the cached value for a key is always
//   one the store has durably accepted.
//
// Responsibilities
// - Seed the index with one bulk read at construction.
// - Persist first. Publish the new value only after the store confirms the write with at
//   least `expected_rows` affected rows (per value for batches).
// - On rejection or failure, report through the ErrorReporter and keep the last committed
//   value. Nothing in flight is ever published to the index.
//
// Boundaries
// - No locking of its own beyond the atomic slot replace. Read-compute-write sequences on
//   one entity must run under an EntityLockRegistry writer guard held by the caller.

use super::{Store, StoreError, WriteOutcome};
use crate::shared::core::primitives::Entity;
use crate::shared::infrastructure::error_reporter::ErrorReporter;
use dashmap::DashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct WriteThroughRepository<E: Entity, S: Store<E>> {
    name: String,
    store: Arc<S>,
    index: DashMap<E::Key, Arc<E>>,
    reporter: Arc<dyn ErrorReporter>,
    expected_rows: u64,
}

impl<E: Entity, S: Store<E>> WriteThroughRepository<E, S> {
    /// Builds the repository and seeds the index from `store.load_all()`.
    pub async fn load(
        name: impl Into<String>,
        store: Arc<S>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self, StoreError> {
        let name = name.into();
        let index = DashMap::new();
        for value in store.load_all().await? {
            index.insert(value.key(), Arc::new(value));
        }
        info!(repository = %name, entities = index.len(), "repository loaded");
        Ok(Self {
            name,
            store,
            index,
            reporter,
            expected_rows: 1,
        })
    }

    /// Minimum affected rows that confirm a single-value write. Stores that write companion
    /// rows (audit trails) alongside the entity row report more than one.
    pub fn with_expected_rows(mut self, expected_rows: u64) -> Self {
        self.expected_rows = expected_rows.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn try_get(&self, key: &E::Key) -> Option<Arc<E>> {
        self.index.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &E::Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Snapshot of every cached value matching `predicate`.
    pub fn scan(&self, predicate: impl Fn(&E) -> bool) -> Vec<Arc<E>> {
        self.index
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub async fn insert(&self, value: E) -> WriteOutcome {
        let key = value.key();
        if self.index.contains_key(&key) {
            warn!(repository = %self.name, key = ?key, "insert of an existing key ignored");
            return WriteOutcome::AlreadyExists;
        }
        let result = self.store.insert(&value).await;
        let outcome = self.confirm("insert", &key, result, self.expected_rows);
        if outcome.is_committed() {
            self.index.insert(key, Arc::new(value));
        }
        outcome
    }

    /// Replaces the stored entity with `value`. The caller builds `value` from a copy of
    /// the cached entity; the cached instance itself is never modified.
    pub async fn update(&self, value: E) -> WriteOutcome {
        let key = value.key();
        if !self.index.contains_key(&key) {
            warn!(repository = %self.name, key = ?key, "update of an unknown key ignored");
            return WriteOutcome::Missing;
        }
        let result = self.store.update_replace(&value).await;
        let outcome = self.confirm("update", &key, result, self.expected_rows);
        if outcome.is_committed() {
            self.index.insert(key, Arc::new(value));
        }
        outcome
    }

    /// Persists every value in one store call. Either all cached entries change or none do.
    pub async fn update_many(&self, values: Vec<E>) -> WriteOutcome {
        if values.is_empty() {
            return WriteOutcome::Committed;
        }
        let keys: Vec<E::Key> = values.iter().map(E::key).collect();
        if let Some(unknown) = keys.iter().find(|key| !self.index.contains_key(*key)) {
            warn!(repository = %self.name, key = ?unknown, "batch update with an unknown key ignored");
            return WriteOutcome::Missing;
        }
        let result = self.store.update_many(&values).await;
        let expected = self.expected_rows * values.len() as u64;
        let outcome = self.confirm("update_many", &BatchKeys(&keys[..]), result, expected);
        if outcome.is_committed() {
            for value in values {
                self.index.insert(value.key(), Arc::new(value));
            }
        }
        outcome
    }

    pub async fn remove(&self, key: &E::Key) -> WriteOutcome {
        if !self.index.contains_key(key) {
            warn!(repository = %self.name, key = ?key, "removal of an unknown key ignored");
            return WriteOutcome::Missing;
        }
        let result = self.store.delete(key).await;
        let outcome = self.confirm("delete", key, result, self.expected_rows);
        if outcome.is_committed() {
            self.index.remove(key);
        }
        outcome
    }

    fn confirm(
        &self,
        operation: &str,
        key: &dyn Debug,
        result: Result<u64, StoreError>,
        expected: u64,
    ) -> WriteOutcome {
        let context = format!("{} repository {operation}", self.name);
        match result {
            Ok(affected) if affected >= expected => {
                debug!(repository = %self.name, operation, key = ?key, affected, "write committed");
                WriteOutcome::Committed
            }
            Ok(affected) => {
                warn!(repository = %self.name, operation, key = ?key, affected, expected, "write not confirmed");
                let error = anyhow::anyhow!(
                    "{operation} of {key:?} affected {affected} rows, expected at least {expected}"
                );
                self.reporter.report(&error, &context);
                WriteOutcome::Rejected
            }
            Err(store_error) => {
                let error = anyhow::Error::new(store_error).context(format!("{operation} of {key:?}"));
                self.reporter.report(&error, &context);
                WriteOutcome::Failed
            }
        }
    }
}

struct BatchKeys<'a, K>(&'a [K]);

impl<K: Debug> Debug for BatchKeys<'_, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
