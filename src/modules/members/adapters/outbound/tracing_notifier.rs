// Notifier that only logs. Used until a chat gateway adapter is wired in.

use crate::modules::members::core::ports::{LevelUp, Notifier};
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait::async_trait]
impl Notifier for TracingNotifier {
    async fn level_up(&self, event: &LevelUp) -> anyhow::Result<()> {
        info!(
            guild_id = event.member.guild_id,
            user_id = event.member.user_id,
            previous_level = event.previous_level,
            level = event.level,
            "member levelled up"
        );
        Ok(())
    }
}
