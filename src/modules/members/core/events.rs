// Channel messages, one type per event domain.
//
// Each message carries just enough context to be processed on its own: the identifiers
// of the affected member or guild and the payload.

use crate::modules::members::core::member::MemberKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceived {
    pub guild_id: u64,
    pub user_id: u64,
    pub channel_id: u64,
    pub sent_at: DateTime<Utc>,
}

impl MessageReceived {
    pub fn member_key(&self) -> MemberKey {
        MemberKey::new(self.guild_id, self.user_id)
    }
}

/// `channel_id` is the voice channel the member is in after the change; `None` means the
/// member left voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceStateChanged {
    pub guild_id: u64,
    pub user_id: u64,
    pub channel_id: Option<u64>,
    pub at: DateTime<Utc>,
}

impl VoiceStateChanged {
    pub fn member_key(&self) -> MemberKey {
        MemberKey::new(self.guild_id, self.user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Periodic check of one guild: credits open voice sessions of every member.
    Sweep { guild_id: u64, at: DateTime<Utc> },
    MemberLeft { guild_id: u64, user_id: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemberCommand {
    GrantExperience {
        guild_id: u64,
        user_id: u64,
        amount: u64,
        issued_by: u64,
    },
}
