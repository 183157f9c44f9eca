// Background workers: one consumer loop per channel, plus the sweep ticker.
//
// The ticker is a producer like any other. It enqueues one Sweep per known guild on every
// tick and stops with the shutdown token.

use crate::modules::members::core::events::LifecycleEvent;
use crate::modules::members::use_cases::lifecycle::handler::LifecycleHandler;
use crate::modules::members::use_cases::member_commands::handler::MemberCommandHandler;
use crate::modules::members::use_cases::message_received::handler::MessageReceivedHandler;
use crate::modules::members::use_cases::voice_state_changed::handler::VoiceStateChangedHandler;
use crate::shared::infrastructure::event_channel::ChannelError;
use crate::shell::state::AppState;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub fn spawn_workers(state: &AppState, sweep_interval: Duration) -> Result<Vec<JoinHandle<()>>, ChannelError> {
    let services = &state.services;
    let shutdown = &state.shutdown;
    let handles = vec![
        state.messages.start(
            Arc::new(MessageReceivedHandler::new(services.clone())),
            shutdown.clone(),
        )?,
        state.voice.start(
            Arc::new(VoiceStateChangedHandler::new(services.clone())),
            shutdown.clone(),
        )?,
        state.lifecycle.start(
            Arc::new(LifecycleHandler::new(services.clone())),
            shutdown.clone(),
        )?,
        state.commands.start(
            Arc::new(MemberCommandHandler::new(services.clone())),
            shutdown.clone(),
        )?,
        tokio::spawn(run_sweep_ticker(state.clone(), sweep_interval)),
    ];
    Ok(handles)
}

pub fn known_guilds(state: &AppState) -> BTreeSet<u64> {
    state
        .services
        .repository
        .scan(|_| true)
        .iter()
        .map(|member| member.guild_id)
        .collect()
}

async fn run_sweep_ticker(state: AppState, every: Duration) {
    let mut interval = tokio::time::interval(every.max(Duration::from_millis(1)));
    interval.tick().await; // first tick completes immediately

    info!(every_secs = every.as_secs(), "sweep ticker started");
    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }
        let at = Utc::now();
        for guild_id in known_guilds(&state) {
            let sweep = LifecycleEvent::Sweep { guild_id, at };
            if let Err(error) = state.lifecycle.write(sweep, &state.shutdown).await {
                debug!(guild_id, error = %error, "sweep not enqueued");
                break;
            }
        }
    }
    info!("sweep ticker stopped");
}
