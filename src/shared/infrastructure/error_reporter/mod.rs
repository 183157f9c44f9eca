// Error reporting port used wherever a failure is swallowed instead of propagated.
//
// Purpose
// - Give the event channels and the write-through repository one place to send
//   failures that must not interrupt the caller (handler faults, rejected writes).
//
// Boundaries
// - Reporting is fire-and-forget and infallible. Implementations must never panic
//   back into the caller.

pub mod in_memory;

use tracing::error;

pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &anyhow::Error, context: &str);
}

/// Default reporter: one structured `error!` event per report.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, error: &anyhow::Error, context: &str) {
        error!(context = %context, error = %format!("{error:#}"), "reported failure");
    }
}
