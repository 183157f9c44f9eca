// Member fixtures: seeded services over the in memory store, and a recording notifier.

use crate::modules::members::core::experience::FlatExperiencePolicy;
use crate::modules::members::core::member::{Member, MemberKey};
use crate::modules::members::core::ports::{LevelUp, Notifier};
use crate::modules::members::use_cases::services::{MemberRepository, MemberServices};
use crate::shared::infrastructure::entity_locks::EntityLockRegistry;
use crate::shared::infrastructure::error_reporter::in_memory::RecordingErrorReporter;
use crate::shared::infrastructure::write_through::in_memory::InMemoryStore;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

pub const EPOCH_SECONDS: i64 = 1_700_000_000;

pub fn at(offset_seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(EPOCH_SECONDS, 0).unwrap() + Duration::seconds(offset_seconds)
}

pub fn make_member(guild_id: u64, user_id: u64, experience: u64) -> Member {
    Member {
        experience,
        ..Member::new(MemberKey::new(guild_id, user_id))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<LevelUp>>,
    fails: AtomicBool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fails: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub async fn events(&self) -> Vec<LevelUp> {
        self.events.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn level_up(&self, event: &LevelUp) -> anyhow::Result<()> {
        if self.fails.load(Ordering::SeqCst) {
            anyhow::bail!("notification gateway unavailable");
        }
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

pub struct TestServices {
    pub services: MemberServices<InMemoryStore<Member>>,
    pub store: Arc<InMemoryStore<Member>>,
    pub notifier: Arc<RecordingNotifier>,
    pub reporter: Arc<RecordingErrorReporter>,
}

pub async fn test_services(rows: Vec<Member>) -> TestServices {
    test_services_with_notifier(rows, RecordingNotifier::default()).await
}

pub async fn test_services_with_notifier(rows: Vec<Member>, notifier: RecordingNotifier) -> TestServices {
    let store = Arc::new(InMemoryStore::with_rows(rows));
    let reporter = Arc::new(RecordingErrorReporter::new());
    let notifier = Arc::new(notifier);
    let repository = MemberRepository::load("members", store.clone(), reporter.clone())
        .await
        .expect("seeding the member repository failed");
    let services = MemberServices {
        repository: Arc::new(repository),
        locks: Arc::new(EntityLockRegistry::new()),
        policy: Arc::new(FlatExperiencePolicy::default()),
        notifier: notifier.clone(),
        reporter: reporter.clone(),
    };
    TestServices {
        services,
        store,
        notifier,
        reporter,
    }
}
