// In memory implementation of the ErrorReporter port.
//
// Purpose
// - Let tests assert which failures were reported and with which context label.

use super::ErrorReporter;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub context: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct RecordingErrorReporter {
    reports: Mutex<Vec<ReportedError>>,
}

impl RecordingErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ReportedError> {
        match self.reports.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self) -> usize {
        self.reports().len()
    }
}

impl ErrorReporter for RecordingErrorReporter {
    fn report(&self, error: &anyhow::Error, context: &str) {
        let entry = ReportedError {
            context: context.to_string(),
            message: format!("{error:#}"),
        };
        match self.reports.lock() {
            Ok(mut guard) => guard.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}
