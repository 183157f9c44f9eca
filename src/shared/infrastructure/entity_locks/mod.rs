// Per-entity asynchronous reader/writer locks.
//
// Purpose
// - Serialize conflicting mutations of the same logical entity without a process-wide lock
//   and without registering the key space up front.
//
// Responsibilities
// - Lazily create exactly one lock per key (atomic get-or-create).
// - Hand out scoped guards that release on every exit path, including cancellation.
// - Acquire every known lock under one parent scope as a single group guard.
//
// Usage invariant
// - Never request a group guard while holding a single-key guard of the same scope, or the
//   reverse, inside one task. The registry orders keys within a group acquisition but does
//   not detect nesting, so such a caller deadlocks against itself.
//
// Lock entries are never evicted implicitly. The key space is one entry per tracked member,
// which is bounded and long-lived; `forget` exists for explicit entity deletion only.

use crate::shared::core::primitives::{EntityKey, GroupedKey};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::trace;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LockError {
    #[error("lock acquisition cancelled")]
    Cancelled,
}

type LockEntry = Arc<RwLock<()>>;

pub struct EntityWriteGuard<K> {
    key: K,
    _guard: OwnedRwLockWriteGuard<()>,
}

impl<K> EntityWriteGuard<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

pub struct EntityReadGuard<K> {
    key: K,
    _guard: OwnedRwLockReadGuard<()>,
}

impl<K> EntityReadGuard<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

/// Guards taken together for every known key of one scope. Dropping it releases the
/// constituents in acquisition order.
pub struct GroupGuard<G> {
    guards: Vec<G>,
}

pub type GroupWriteGuard<K> = GroupGuard<EntityWriteGuard<K>>;
pub type GroupReadGuard<K> = GroupGuard<EntityReadGuard<K>>;

impl<G> GroupGuard<G> {
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl<K> GroupWriteGuard<K> {
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.guards.iter().map(EntityWriteGuard::key)
    }
}

impl<K> GroupReadGuard<K> {
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.guards.iter().map(EntityReadGuard::key)
    }
}

impl<G> Drop for GroupGuard<G> {
    fn drop(&mut self) {
        let released = self.guards.len();
        // Released front to back, in acquisition order.
        self.guards.clear();
        trace!(released, "group guard released");
    }
}

pub struct EntityLockRegistry<K: EntityKey> {
    locks: DashMap<K, LockEntry>,
}

impl<K: EntityKey> Default for EntityLockRegistry<K> {
    fn default() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }
}

impl<K: EntityKey> EntityLockRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn entry(&self, key: &K) -> LockEntry {
        if let Some(existing) = self.locks.get(key) {
            return existing.value().clone();
        }
        self.locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .value()
            .clone()
    }

    /// Registers a lock for `key` without acquiring it, so that later group
    /// acquisitions include it.
    pub fn ensure(&self, key: &K) {
        self.entry(key);
    }

    pub async fn acquire_writer(
        &self,
        key: &K,
        cancel: &CancellationToken,
    ) -> Result<EntityWriteGuard<K>, LockError> {
        let lock = self.entry(key);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LockError::Cancelled),
            guard = lock.write_owned() => Ok(EntityWriteGuard { key: key.clone(), _guard: guard }),
        }
    }

    pub async fn acquire_reader(
        &self,
        key: &K,
        cancel: &CancellationToken,
    ) -> Result<EntityReadGuard<K>, LockError> {
        let lock = self.entry(key);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LockError::Cancelled),
            guard = lock.read_owned() => Ok(EntityReadGuard { key: key.clone(), _guard: guard }),
        }
    }

    /// Removes the lock for `key` if nothing holds or awaits it. Returns whether it was removed.
    pub fn forget(&self, key: &K) -> bool {
        // Every holder and every waiter owns a clone of the Arc, and clones are only handed
        // out under the shard lock `remove_if` holds here.
        self.locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1)
            .is_some()
    }
}

impl<K: GroupedKey> EntityLockRegistry<K> {
    fn members_of(&self, group: &K::Group) -> Vec<(K, LockEntry)> {
        let mut members: Vec<(K, LockEntry)> = self
            .locks
            .iter()
            .filter(|entry| entry.key().group() == *group)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        members.sort_by(|(left, _), (right, _)| left.cmp(right));
        members
    }

    pub async fn acquire_all_writers(
        &self,
        group: &K::Group,
        cancel: &CancellationToken,
    ) -> Result<GroupWriteGuard<K>, LockError> {
        let mut guards = Vec::new();
        for (key, lock) in self.members_of(group) {
            let guard = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LockError::Cancelled),
                guard = lock.write_owned() => guard,
            };
            guards.push(EntityWriteGuard { key, _guard: guard });
        }
        trace!(group = ?group, acquired = guards.len(), "group writers acquired");
        Ok(GroupGuard { guards })
    }

    pub async fn acquire_all_readers(
        &self,
        group: &K::Group,
        cancel: &CancellationToken,
    ) -> Result<GroupReadGuard<K>, LockError> {
        let mut guards = Vec::new();
        for (key, lock) in self.members_of(group) {
            let guard = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LockError::Cancelled),
                guard = lock.read_owned() => guard,
            };
            guards.push(EntityReadGuard { key, _guard: guard });
        }
        trace!(group = ?group, acquired = guards.len(), "group readers acquired");
        Ok(GroupGuard { guards })
    }
}
