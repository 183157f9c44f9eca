// Handles user-issued commands against member state.

use crate::modules::members::core::events::MemberCommand;
use crate::modules::members::core::member::{Member, MemberKey};
use crate::modules::members::use_cases::services::MemberServices;
use crate::shared::infrastructure::event_channel::MessageHandler;
use crate::shared::infrastructure::write_through::Store;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct MemberCommandHandler<S: Store<Member>> {
    services: MemberServices<S>,
}

impl<S: Store<Member>> MemberCommandHandler<S> {
    pub fn new(services: MemberServices<S>) -> Self {
        Self { services }
    }
}

#[async_trait::async_trait]
impl<S: Store<Member>> MessageHandler<MemberCommand> for MemberCommandHandler<S> {
    async fn handle(&self, message: &MemberCommand, cancel: &CancellationToken) -> anyhow::Result<()> {
        match message {
            MemberCommand::GrantExperience {
                guild_id,
                user_id,
                amount,
                issued_by,
            } => {
                let amount = *amount;
                let outcome = self
                    .services
                    .mutate(MemberKey::new(*guild_id, *user_id), cancel, |mut member| {
                        if amount == 0 {
                            return None;
                        }
                        member.add_experience(amount);
                        Some(member)
                    })
                    .await?;
                info!(guild_id, user_id, amount, issued_by, outcome = ?outcome, "experience granted");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod member_command_handler_tests {
    use super::*;
    use crate::tests::fixtures::members::{
        RecordingNotifier, TestServices, make_member, test_services_with_notifier,
    };
    use rstest::rstest;
    use std::time::Duration;

    fn grant(amount: u64) -> MemberCommand {
        MemberCommand::GrantExperience {
            guild_id: 1,
            user_id: 7,
            amount,
            issued_by: 99,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_add_the_granted_experience() {
        let TestServices { services, store, .. } =
            test_services_with_notifier(vec![make_member(1, 7, 100)], RecordingNotifier::default()).await;
        let handler = MemberCommandHandler::new(services);

        handler.handle(&grant(50), &CancellationToken::new()).await.unwrap();
        handler.handle(&grant(0), &CancellationToken::new()).await.unwrap();

        assert_eq!(store.get(&MemberKey::new(1, 7)).await.unwrap().experience, 150);
        assert_eq!(store.round_trips(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_report_a_failed_notification_without_undoing_the_grant() {
        let TestServices { services, store, reporter, .. } =
            test_services_with_notifier(vec![make_member(1, 7, 0)], RecordingNotifier::failing()).await;
        let handler = MemberCommandHandler::new(services);

        handler.handle(&grant(400), &CancellationToken::new()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(store.get(&MemberKey::new(1, 7)).await.unwrap().experience, 400);
        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("notification gateway unavailable"));
        assert!(reports[0].context.starts_with("level-up notification"));
    }
}
