use crate::modules::members::core::events::{
    LifecycleEvent, MemberCommand, MessageReceived, VoiceStateChanged,
};
use crate::modules::members::core::experience::ExperiencePolicy;
use crate::modules::members::core::member::Member;
use crate::modules::members::core::ports::Notifier;
use crate::modules::members::use_cases::services::{MemberRepository, MemberServices};
use crate::shared::infrastructure::entity_locks::EntityLockRegistry;
use crate::shared::infrastructure::error_reporter::ErrorReporter;
use crate::shared::infrastructure::event_channel::EventChannel;
use crate::shared::infrastructure::write_through::StoreError;
use crate::shared::infrastructure::write_through::in_memory::InMemoryStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub type MemberStore = InMemoryStore<Member>;

/// Everything the inbound adapters and the workers share. One instance per process.
#[derive(Clone)]
pub struct AppState {
    pub messages: Arc<EventChannel<MessageReceived>>,
    pub voice: Arc<EventChannel<VoiceStateChanged>>,
    pub lifecycle: Arc<EventChannel<LifecycleEvent>>,
    pub commands: Arc<EventChannel<MemberCommand>>,
    pub services: MemberServices<MemberStore>,
    pub shutdown: CancellationToken,
}

pub struct AppDependencies {
    pub store: Arc<MemberStore>,
    pub policy: Arc<dyn ExperiencePolicy>,
    pub notifier: Arc<dyn Notifier>,
    pub reporter: Arc<dyn ErrorReporter>,
}

impl AppState {
    /// Loads the member repository from the store and creates one channel per event domain.
    pub async fn build(
        dependencies: AppDependencies,
        channel_capacity: usize,
        shutdown: CancellationToken,
    ) -> Result<Self, StoreError> {
        let AppDependencies {
            store,
            policy,
            notifier,
            reporter,
        } = dependencies;
        let repository = MemberRepository::load("members", store, reporter.clone()).await?;
        let services = MemberServices {
            repository: Arc::new(repository),
            locks: Arc::new(EntityLockRegistry::new()),
            policy,
            notifier,
            reporter: reporter.clone(),
        };
        Ok(Self {
            messages: Arc::new(EventChannel::new("messages", channel_capacity, reporter.clone())),
            voice: Arc::new(EventChannel::new("voice", channel_capacity, reporter.clone())),
            lifecycle: Arc::new(EventChannel::new("lifecycle", channel_capacity, reporter.clone())),
            commands: Arc::new(EventChannel::new("commands", channel_capacity, reporter)),
            services,
            shutdown,
        })
    }
}
