// Bounded, ordered, single-consumer event channel.
//
// Purpose
// - Decouple event producers from processing, so a handler never runs concurrently with itself.
//
// Responsibilities
// - Accept messages from any number of producers, applying backpressure when full.
// - Run exactly one consumer loop that hands messages to a MessageHandler in enqueue order.
// - Isolate failures: an error or a panic while handling one message is reported and the
//   loop moves on to the next message.
// - Stop on cancellation after the in-flight message, and refuse writes from then on.
//
// One channel exists per event domain. Channels progress independently of each other.

use async_trait::async_trait;
use futures::FutureExt;
use std::fmt::Debug;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, OnceLock};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::shared::infrastructure::error_reporter::ErrorReporter;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("write to channel `{0}` cancelled")]
    Cancelled(String),

    #[error("channel `{0}` is closed")]
    Closed(String),

    #[error("channel `{0}` already started")]
    AlreadyStarted(String),
}

#[async_trait]
pub trait MessageHandler<M>: Send + Sync + 'static
where
    M: Send + Sync + 'static,
{
    /// Processes one message. `cancel` fires when the channel is shutting down; handlers
    /// pass it on to lock acquisitions and may abandon the message early.
    async fn handle(&self, message: &M, cancel: &CancellationToken) -> anyhow::Result<()>;
}

pub struct EventChannel<M> {
    name: String,
    sender: mpsc::Sender<M>,
    receiver: Mutex<Option<mpsc::Receiver<M>>>,
    shutdown: OnceLock<CancellationToken>,
    reporter: Arc<dyn ErrorReporter>,
}

impl<M> EventChannel<M>
where
    M: Debug + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, capacity: usize, reporter: Arc<dyn ErrorReporter>) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            name: name.into(),
            sender,
            receiver: Mutex::new(Some(receiver)),
            shutdown: OnceLock::new(),
            reporter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_shut_down(&self) -> bool {
        self.shutdown
            .get()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Enqueues `message`, waiting for capacity when the channel is full.
    pub async fn write(&self, message: M, cancel: &CancellationToken) -> Result<(), ChannelError> {
        if self.is_shut_down() {
            return Err(ChannelError::Closed(self.name.clone()));
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ChannelError::Cancelled(self.name.clone())),
            sent = self.sender.send(message) => {
                sent.map_err(|_| ChannelError::Closed(self.name.clone()))
            }
        }
    }

    /// Spawns the consumer loop. The loop ends when `shutdown` is cancelled.
    pub fn start<H>(&self, handler: Arc<H>, shutdown: CancellationToken) -> Result<JoinHandle<()>, ChannelError>
    where
        H: MessageHandler<M>,
    {
        let receiver = match self.receiver.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(receiver) = receiver else {
            return Err(ChannelError::AlreadyStarted(self.name.clone()));
        };
        // The receiver can only be taken once, so this is the first and only token.
        let _ = self.shutdown.set(shutdown.clone());

        let consumer = Consumer {
            name: self.name.clone(),
            receiver,
            handler,
            reporter: self.reporter.clone(),
        };
        Ok(tokio::spawn(consumer.run(shutdown)))
    }
}

struct Consumer<M, H> {
    name: String,
    receiver: mpsc::Receiver<M>,
    handler: Arc<H>,
    reporter: Arc<dyn ErrorReporter>,
}

impl<M, H> Consumer<M, H>
where
    M: Debug + Send + Sync + 'static,
    H: MessageHandler<M>,
{
    async fn run(mut self, shutdown: CancellationToken) {
        info!(channel = %self.name, "consumer loop started");
        loop {
            let message = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = self.receiver.recv() => match next {
                    Some(message) => message,
                    None => break,
                },
            };
            process(&self.name, self.handler.as_ref(), self.reporter.as_ref(), message, &shutdown).await;
        }
        self.receiver.close();
        info!(channel = %self.name, "consumer loop stopped");
    }
}

async fn process<M, H>(
    channel: &str,
    handler: &H,
    reporter: &dyn ErrorReporter,
    message: M,
    shutdown: &CancellationToken,
) where
    M: Debug + Send + Sync + 'static,
    H: MessageHandler<M>,
{
    debug!(channel = %channel, message = ?message, "handling message");
    let outcome = AssertUnwindSafe(handler.handle(&message, shutdown))
        .catch_unwind()
        .await;
    let failure = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(error)) => error,
        Err(panic) => anyhow::anyhow!("handler panicked: {}", panic_message(panic.as_ref())),
    };
    let context = format!("{channel} channel, message {message:?}");
    reporter.report(&failure, &context);
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
