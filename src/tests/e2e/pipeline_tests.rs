use crate::modules::members::adapters::outbound::tracing_notifier::TracingNotifier;
use crate::modules::members::core::events::{LifecycleEvent, MemberCommand, MessageReceived, VoiceStateChanged};
use crate::modules::members::core::experience::FlatExperiencePolicy;
use crate::modules::members::core::member::{Member, MemberKey};
use crate::modules::members::use_cases::member_commands::handler::MemberCommandHandler;
use crate::shared::infrastructure::error_reporter::in_memory::RecordingErrorReporter;
use crate::shared::infrastructure::event_channel::EventChannel;
use crate::shared::infrastructure::write_through::in_memory::InMemoryStore;
use crate::shell::state::{AppDependencies, AppState};
use crate::shell::workers::spawn_workers;
use crate::tests::fixtures::members::{TestServices, at, make_member, test_services};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const HOUR: Duration = Duration::from_secs(3600);

async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn app(rows: Vec<Member>) -> (AppState, Arc<InMemoryStore<Member>>, Arc<RecordingErrorReporter>) {
    let store = Arc::new(InMemoryStore::with_rows(rows));
    let reporter = Arc::new(RecordingErrorReporter::new());
    let dependencies = AppDependencies {
        store: store.clone(),
        policy: Arc::new(FlatExperiencePolicy::default()),
        notifier: Arc::new(TracingNotifier),
        reporter: reporter.clone(),
    };
    let state = AppState::build(dependencies, 16, CancellationToken::new()).await.unwrap();
    (state, store, reporter)
}

fn grant(amount: u64) -> MemberCommand {
    MemberCommand::GrantExperience {
        guild_id: 1,
        user_id: 7,
        amount,
        issued_by: 99,
    }
}

#[tokio::test]
async fn concurrent_grants_from_two_channels_never_lose_an_update() {
    let TestServices { services, store, reporter, .. } = test_services(vec![make_member(1, 7, 100)]).await;
    store.set_write_delay(Duration::from_millis(20));
    let shutdown = CancellationToken::new();

    let first = EventChannel::new("grants-a", 4, reporter.clone());
    let second = EventChannel::new("grants-b", 4, reporter.clone());
    let first_worker = first
        .start(Arc::new(MemberCommandHandler::new(services.clone())), shutdown.clone())
        .unwrap();
    let second_worker = second
        .start(Arc::new(MemberCommandHandler::new(services.clone())), shutdown.clone())
        .unwrap();

    let (a, b) = tokio::join!(first.write(grant(50), &shutdown), second.write(grant(50), &shutdown));
    a.unwrap();
    b.unwrap();
    let key = MemberKey::new(1, 7);
    eventually(|| store.round_trips() == 2 && services.repository.try_get(&key).unwrap().experience > 150).await;

    assert_eq!(services.repository.try_get(&key).unwrap().experience, 200);
    assert_eq!(store.get(&key).await.unwrap().experience, 200);
    assert_eq!(reporter.count(), 0);

    shutdown.cancel();
    first_worker.await.unwrap();
    second_worker.await.unwrap();
}

#[tokio::test]
async fn voice_events_are_applied_in_arrival_order() {
    let (state, store, _) = app(vec![make_member(1, 7, 0)]).await;
    let workers = spawn_workers(&state, HOUR).unwrap();

    for (channel_id, offset) in [(Some(3), 0), (Some(4), 60), (None, 300)] {
        let event = VoiceStateChanged {
            guild_id: 1,
            user_id: 7,
            channel_id,
            at: at(offset),
        };
        state.voice.write(event, &state.shutdown).await.unwrap();
    }
    let key = MemberKey::new(1, 7);
    eventually(|| state.services.repository.try_get(&key).is_some_and(|member| member.voice_seconds > 0)).await;

    let member = store.get(&key).await.unwrap();
    assert_eq!(member.voice_seconds, 300);
    assert_eq!(member.experience, 25);
    assert!(!member.is_in_voice());

    state.shutdown.cancel();
    for worker in workers {
        worker.await.unwrap();
    }
}

#[tokio::test]
async fn a_failed_write_is_reported_and_the_next_event_still_runs() {
    let (state, store, reporter) = app(vec![make_member(1, 7, 0)]).await;
    store.set_rejects_writes(true);
    let workers = spawn_workers(&state, HOUR).unwrap();

    state.commands.write(grant(50), &state.shutdown).await.unwrap();
    eventually(|| reporter.count() == 1).await;
    store.set_rejects_writes(false);

    let message = MessageReceived {
        guild_id: 1,
        user_id: 7,
        channel_id: 3,
        sent_at: at(0),
    };
    state.messages.write(message, &state.shutdown).await.unwrap();
    let key = MemberKey::new(1, 7);
    eventually(|| state.services.repository.try_get(&key).unwrap().message_count == 1).await;

    assert_eq!(store.get(&key).await.unwrap().experience, 15);
    assert_eq!(state.services.repository.try_get(&key).unwrap().experience, 15);
    assert_eq!(reporter.count(), 1);

    state.shutdown.cancel();
    for worker in workers {
        worker.await.unwrap();
    }
}

#[tokio::test]
async fn a_departed_member_is_dropped_from_cache_and_store() {
    let (state, store, _) = app(vec![make_member(1, 7, 40), make_member(1, 8, 10)]).await;
    let workers = spawn_workers(&state, HOUR).unwrap();

    let left = LifecycleEvent::MemberLeft { guild_id: 1, user_id: 7 };
    state.lifecycle.write(left, &state.shutdown).await.unwrap();
    eventually(|| !state.services.repository.contains(&MemberKey::new(1, 7))).await;

    assert_eq!(store.get(&MemberKey::new(1, 7)).await, None);
    assert!(store.get(&MemberKey::new(1, 8)).await.is_some());

    state.shutdown.cancel();
    for worker in workers {
        worker.await.unwrap();
    }
}
