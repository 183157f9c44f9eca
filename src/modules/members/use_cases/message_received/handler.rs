// Handles chat messages: counts the message and awards message experience.

use crate::modules::members::core::events::MessageReceived;
use crate::modules::members::core::member::Member;
use crate::modules::members::use_cases::services::MemberServices;
use crate::shared::infrastructure::event_channel::MessageHandler;
use crate::shared::infrastructure::write_through::Store;
use tokio_util::sync::CancellationToken;

pub struct MessageReceivedHandler<S: Store<Member>> {
    services: MemberServices<S>,
}

impl<S: Store<Member>> MessageReceivedHandler<S> {
    pub fn new(services: MemberServices<S>) -> Self {
        Self { services }
    }
}

#[async_trait::async_trait]
impl<S: Store<Member>> MessageHandler<MessageReceived> for MessageReceivedHandler<S> {
    async fn handle(&self, message: &MessageReceived, cancel: &CancellationToken) -> anyhow::Result<()> {
        let policy = &self.services.policy;
        let sent_at = message.sent_at;
        self.services
            .mutate(message.member_key(), cancel, |mut member| {
                let earned = policy.message_experience(&member, sent_at);
                member.count_message();
                if earned > 0 {
                    member.add_experience(earned);
                    member.last_rewarded_message_at = Some(sent_at);
                }
                Some(member)
            })
            .await?;
        Ok(())
    }
}
