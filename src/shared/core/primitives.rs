// Primitive traits shared by the lock registry, the event channels and the repository.
//
// Purpose
// - Describe what makes a value lockable and cacheable without naming any concrete domain.
//
// Responsibilities
// - EntityKey: immutable, hashable and totally ordered identity of one logical record.
// - GroupedKey: keys that belong to a parent scope (for example every member of one guild).
// - Entity: a value object that knows its own key.

use std::fmt::Debug;
use std::hash::Hash;

pub trait EntityKey: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

impl<T> EntityKey for T where T: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

pub trait GroupedKey: EntityKey {
    type Group: Clone + Eq + Debug + Send + Sync + 'static;

    fn group(&self) -> Self::Group;
}

/// A cached value. Implementations are treated as immutable once published:
/// a mutation builds a new value and hands it to the repository.
pub trait Entity: Clone + Send + Sync + 'static {
    type Key: EntityKey;

    fn key(&self) -> Self::Key;
}
