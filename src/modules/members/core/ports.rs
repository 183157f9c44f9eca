// Ports the member handlers need from the outside world.
//
// Boundaries
// - Message formatting and delivery belong to the adapter. Handlers only say what happened.

use crate::modules::members::core::member::MemberKey;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    pub member: MemberKey,
    pub previous_level: u32,
    pub level: u32,
}

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn level_up(&self, event: &LevelUp) -> anyhow::Result<()>;
}
