// Minimal entity used by the repository and store tests.

use crate::shared::core::primitives::Entity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    pub id: u64,
    pub value: u64,
}

impl Entity for Counter {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }
}

pub fn make_counter(id: u64, value: u64) -> Counter {
    Counter { id, value }
}
