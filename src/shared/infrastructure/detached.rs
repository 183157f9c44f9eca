// Detached follow-up tasks.
//
// A handler that wants side effects after a committed mutation (notifications, outbound
// calls) spawns them here instead of awaiting them. The caller never observes the result;
// failures, panics included, go to the ErrorReporter under the given context label.

use crate::shared::infrastructure::error_reporter::ErrorReporter;
use crate::shared::infrastructure::event_channel::panic_message;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub fn spawn_detached<F>(
    reporter: Arc<dyn ErrorReporter>,
    context: impl Into<String>,
    task: F,
) -> JoinHandle<()>
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let context = context.into();
    tokio::spawn(async move {
        let failure = match AssertUnwindSafe(task).catch_unwind().await {
            Ok(Ok(())) => return,
            Ok(Err(error)) => error,
            Err(panic) => anyhow::anyhow!("task panicked: {}", panic_message(panic.as_ref())),
        };
        reporter.report(&failure, &context);
    })
}
