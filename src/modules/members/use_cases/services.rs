// Shared collaborators of the member handlers and the locked mutation they all perform.
//
// Purpose
// - Run "read current state, compute the next one, write it through" for one member under
//   that member's writer lock, so concurrent handlers from different channels never lose
//   each other's updates.
// - Announce level-ups of committed writes as detached notifications.

use crate::modules::members::core::experience::ExperiencePolicy;
use crate::modules::members::core::member::{Member, MemberKey};
use crate::modules::members::core::ports::{LevelUp, Notifier};
use crate::shared::infrastructure::detached::spawn_detached;
use crate::shared::infrastructure::entity_locks::EntityLockRegistry;
use crate::shared::infrastructure::error_reporter::ErrorReporter;
use crate::shared::infrastructure::write_through::repository::WriteThroughRepository;
use crate::shared::infrastructure::write_through::{Store, WriteOutcome};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub type MemberRepository<S> = WriteThroughRepository<Member, S>;

pub struct MemberServices<S: Store<Member>> {
    pub repository: Arc<MemberRepository<S>>,
    pub locks: Arc<EntityLockRegistry<MemberKey>>,
    pub policy: Arc<dyn ExperiencePolicy>,
    pub notifier: Arc<dyn Notifier>,
    pub reporter: Arc<dyn ErrorReporter>,
}

impl<S: Store<Member>> Clone for MemberServices<S> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            locks: self.locks.clone(),
            policy: self.policy.clone(),
            notifier: self.notifier.clone(),
            reporter: self.reporter.clone(),
        }
    }
}

impl<S: Store<Member>> MemberServices<S> {
    /// Applies `change` to an owned copy of the member's committed state (a fresh member if
    /// none exists) while holding the member's writer lock. `change` returns `None` when
    /// there is nothing to write. Fails only when the lock wait is cancelled.
    pub async fn mutate<F>(
        &self,
        key: MemberKey,
        cancel: &CancellationToken,
        change: F,
    ) -> anyhow::Result<Option<WriteOutcome>>
    where
        F: FnOnce(Member) -> Option<Member> + Send,
    {
        let _guard = self.locks.acquire_writer(&key, cancel).await?;

        let current = self.repository.try_get(&key);
        let base = match &current {
            Some(member) => Member::clone(member),
            None => Member::new(key),
        };
        let previous_experience = base.experience;
        let Some(next) = change(base) else {
            debug!(guild_id = key.guild_id, user_id = key.user_id, "nothing to write");
            return Ok(None);
        };

        let experience = next.experience;
        let outcome = match current {
            Some(_) => self.repository.update(next).await,
            None => self.repository.insert(next).await,
        };
        if outcome.is_committed() {
            self.announce_level_change(key, previous_experience, experience);
        }
        Ok(Some(outcome))
    }

    pub fn announce_level_change(&self, member: MemberKey, previous_experience: u64, experience: u64) {
        let previous_level = self.policy.level_for(previous_experience);
        let level = self.policy.level_for(experience);
        if level <= previous_level {
            return;
        }
        let notifier = self.notifier.clone();
        let event = LevelUp {
            member,
            previous_level,
            level,
        };
        spawn_detached(
            self.reporter.clone(),
            format!("level-up notification for {member:?}"),
            async move { notifier.level_up(&event).await },
        );
    }
}
