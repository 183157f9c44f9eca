// Process configuration read from the environment.
//
// Every setting has a default, so an empty environment starts a local instance.

use crate::modules::members::core::experience::FlatExperiencePolicy;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const BIND_ADDR: &str = "GUILD_EVENTS_BIND_ADDR";
pub const CHANNEL_CAPACITY: &str = "GUILD_EVENTS_CHANNEL_CAPACITY";
pub const SWEEP_INTERVAL_SECS: &str = "GUILD_EVENTS_SWEEP_INTERVAL_SECS";
pub const XP_PER_MESSAGE: &str = "GUILD_EVENTS_XP_PER_MESSAGE";
pub const XP_PER_VOICE_MINUTE: &str = "GUILD_EVENTS_XP_PER_VOICE_MINUTE";
pub const MESSAGE_COOLDOWN_SECS: &str = "GUILD_EVENTS_MESSAGE_COOLDOWN_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub channel_capacity: usize,
    pub sweep_interval: Duration,
    pub xp_per_message: u64,
    pub xp_per_voice_minute: u64,
    pub message_cooldown: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: parse(&lookup, BIND_ADDR, "0.0.0.0:8080")?,
            channel_capacity: parse(&lookup, CHANNEL_CAPACITY, "1024")?,
            sweep_interval: Duration::from_secs(parse_positive(&lookup, SWEEP_INTERVAL_SECS, "60")?),
            xp_per_message: parse(&lookup, XP_PER_MESSAGE, "15")?,
            xp_per_voice_minute: parse(&lookup, XP_PER_VOICE_MINUTE, "5")?,
            message_cooldown: Duration::from_secs(parse(&lookup, MESSAGE_COOLDOWN_SECS, "60")?),
        })
    }

    pub fn experience_policy(&self) -> FlatExperiencePolicy {
        FlatExperiencePolicy {
            per_message: self.xp_per_message,
            per_voice_minute: self.xp_per_voice_minute,
            message_cooldown: chrono::Duration::from_std(self.message_cooldown)
                .unwrap_or(chrono::Duration::MAX),
        }
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError> {
    let value = lookup(key).unwrap_or_else(|| default.to_string());
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

/// Like `parse`, but zero is rejected as well.
fn parse_positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<u64, ConfigError> {
    match parse(lookup, key, default)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
        }),
        value => Ok(value),
    }
}
