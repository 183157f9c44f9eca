// Experience rules, kept behind a trait so handlers stay free of economy formulas.

use crate::modules::members::core::member::Member;
use chrono::{DateTime, Duration, Utc};

pub trait ExperiencePolicy: Send + Sync + 'static {
    /// Experience earned by `member` for a message sent at `sent_at`. Zero while on cooldown.
    fn message_experience(&self, member: &Member, sent_at: DateTime<Utc>) -> u64;

    fn voice_experience(&self, voice_seconds: u64) -> u64;

    fn level_for(&self, experience: u64) -> u32 {
        (experience / 100).isqrt() as u32
    }
}

#[derive(Debug, Clone)]
pub struct FlatExperiencePolicy {
    pub per_message: u64,
    pub per_voice_minute: u64,
    pub message_cooldown: Duration,
}

impl Default for FlatExperiencePolicy {
    fn default() -> Self {
        Self {
            per_message: 15,
            per_voice_minute: 5,
            message_cooldown: Duration::seconds(60),
        }
    }
}

impl ExperiencePolicy for FlatExperiencePolicy {
    fn message_experience(&self, member: &Member, sent_at: DateTime<Utc>) -> u64 {
        match member.last_rewarded_message_at {
            Some(last) if sent_at - last < self.message_cooldown => 0,
            _ => self.per_message,
        }
    }

    fn voice_experience(&self, voice_seconds: u64) -> u64 {
        (voice_seconds / 60).saturating_mul(self.per_voice_minute)
    }
}
