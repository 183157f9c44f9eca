// Member state tracked per guild.
//
// A Member is an immutable snapshot of committed state. Handlers receive an owned copy,
// change it, and hand it back to the repository, which publishes it only once stored.

use crate::shared::core::primitives::{Entity, GroupedKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberKey {
    pub guild_id: u64,
    pub user_id: u64,
}

impl MemberKey {
    pub fn new(guild_id: u64, user_id: u64) -> Self {
        Self { guild_id, user_id }
    }
}

impl GroupedKey for MemberKey {
    type Group = u64;

    fn group(&self) -> u64 {
        self.guild_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub guild_id: u64,
    pub user_id: u64,
    pub experience: u64,
    pub message_count: u64,
    pub voice_seconds: u64,
    /// Start of the voice session not yet credited, if the member is in voice.
    pub voice_session_started_at: Option<DateTime<Utc>>,
    pub last_rewarded_message_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn new(key: MemberKey) -> Self {
        Self {
            guild_id: key.guild_id,
            user_id: key.user_id,
            experience: 0,
            message_count: 0,
            voice_seconds: 0,
            voice_session_started_at: None,
            last_rewarded_message_at: None,
        }
    }

    pub fn is_in_voice(&self) -> bool {
        self.voice_session_started_at.is_some()
    }

    /// Seconds of the open voice session up to `until`, zero if no session is open.
    pub fn open_voice_seconds(&self, until: DateTime<Utc>) -> u64 {
        self.voice_session_started_at
            .map(|started| (until - started).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }

    /// Counters saturate at `u64::MAX` instead of wrapping.
    pub fn add_experience(&mut self, amount: u64) {
        self.experience = self.experience.saturating_add(amount);
    }

    pub fn add_voice_seconds(&mut self, seconds: u64) {
        self.voice_seconds = self.voice_seconds.saturating_add(seconds);
    }

    pub fn count_message(&mut self) {
        self.message_count = self.message_count.saturating_add(1);
    }
}

impl Entity for Member {
    type Key = MemberKey;

    fn key(&self) -> MemberKey {
        MemberKey::new(self.guild_id, self.user_id)
    }
}
