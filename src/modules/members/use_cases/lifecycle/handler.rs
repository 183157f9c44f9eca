// Handles scheduled and membership lifecycle events.
//
// Purpose
// - Sweep: credit the open voice sessions of every member of a guild in one batch. The whole
//   guild is locked for the duration, so no single-member handler interleaves with the batch.
// - MemberLeft: delete the member, then drop its lock entry once nobody holds it.

use crate::modules::members::core::events::LifecycleEvent;
use crate::modules::members::core::member::{Member, MemberKey};
use crate::modules::members::use_cases::services::MemberServices;
use crate::shared::core::primitives::Entity;
use crate::shared::infrastructure::event_channel::MessageHandler;
use crate::shared::infrastructure::write_through::Store;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct LifecycleHandler<S: Store<Member>> {
    services: MemberServices<S>,
}

impl<S: Store<Member>> LifecycleHandler<S> {
    pub fn new(services: MemberServices<S>) -> Self {
        Self { services }
    }

    async fn sweep(&self, guild_id: u64, at: DateTime<Utc>, cancel: &CancellationToken) -> anyhow::Result<()> {
        let services = &self.services;
        for member in services.repository.scan(|member| member.guild_id == guild_id) {
            services.locks.ensure(&member.key());
        }
        let guild = services.locks.acquire_all_writers(&guild_id, cancel).await?;

        // Re-read under the group guard: the scan above may predate writes that finished
        // while the guard was being acquired.
        let mut credited = Vec::new();
        let mut batch = Vec::new();
        for key in guild.keys() {
            let Some(current) = services.repository.try_get(key) else {
                continue;
            };
            let seconds = current.open_voice_seconds(at);
            if seconds == 0 {
                continue;
            }
            let mut next = Member::clone(&current);
            next.add_voice_seconds(seconds);
            next.add_experience(services.policy.voice_experience(seconds));
            next.voice_session_started_at = Some(at);
            credited.push((*key, current.experience, next.experience));
            batch.push(next);
        }

        if batch.is_empty() {
            debug!(guild_id, members = guild.len(), "sweep found no open voice sessions");
            return Ok(());
        }
        let outcome = services.repository.update_many(batch).await;
        info!(guild_id, credited = credited.len(), outcome = ?outcome, "sweep finished");
        if outcome.is_committed() {
            for (key, previous_experience, experience) in credited {
                services.announce_level_change(key, previous_experience, experience);
            }
        }
        Ok(())
    }

    async fn member_left(&self, key: MemberKey, cancel: &CancellationToken) -> anyhow::Result<()> {
        let services = &self.services;
        let guard = services.locks.acquire_writer(&key, cancel).await?;
        let outcome = services.repository.remove(&key).await;
        drop(guard);

        if outcome.is_committed() && !services.locks.forget(&key) {
            debug!(guild_id = key.guild_id, user_id = key.user_id, "lock still in use, kept");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: Store<Member>> MessageHandler<LifecycleEvent> for LifecycleHandler<S> {
    async fn handle(&self, message: &LifecycleEvent, cancel: &CancellationToken) -> anyhow::Result<()> {
        match message {
            LifecycleEvent::Sweep { guild_id, at } => self.sweep(*guild_id, *at, cancel).await,
            LifecycleEvent::MemberLeft { guild_id, user_id } => {
                self.member_left(MemberKey::new(*guild_id, *user_id), cancel).await
            }
        }
    }
}
