// Handles voice presence changes.
//
// Joining opens a voice session; moving between channels keeps it open. Leaving credits the
// session's time and experience and closes it.

use crate::modules::members::core::events::VoiceStateChanged;
use crate::modules::members::core::member::Member;
use crate::modules::members::use_cases::services::MemberServices;
use crate::shared::infrastructure::event_channel::MessageHandler;
use crate::shared::infrastructure::write_through::Store;
use tokio_util::sync::CancellationToken;

pub struct VoiceStateChangedHandler<S: Store<Member>> {
    services: MemberServices<S>,
}

impl<S: Store<Member>> VoiceStateChangedHandler<S> {
    pub fn new(services: MemberServices<S>) -> Self {
        Self { services }
    }
}

#[async_trait::async_trait]
impl<S: Store<Member>> MessageHandler<VoiceStateChanged> for VoiceStateChangedHandler<S> {
    async fn handle(&self, message: &VoiceStateChanged, cancel: &CancellationToken) -> anyhow::Result<()> {
        let policy = &self.services.policy;
        let at = message.at;
        let joined = message.channel_id.is_some();
        self.services
            .mutate(message.member_key(), cancel, |mut member| {
                match (joined, member.is_in_voice()) {
                    (true, false) => {
                        member.voice_session_started_at = Some(at);
                        Some(member)
                    }
                    (false, true) => {
                        let seconds = member.open_voice_seconds(at);
                        member.add_voice_seconds(seconds);
                        member.add_experience(policy.voice_experience(seconds));
                        member.voice_session_started_at = None;
                        Some(member)
                    }
                    _ => None,
                }
            })
            .await?;
        Ok(())
    }
}
