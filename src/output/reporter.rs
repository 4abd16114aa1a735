//! Result reporter
//!
//! Classifies validator results and writes them, one test at a time, to an
//! [`OutputSink`].

use tracing::debug;

use super::sink::{OutputSink, Style};
use crate::models::{ExecutionFailure, RunSummary, TestResult, TestStatus};

pub const FAILURE_REASON_START: &str = "*****************FailureReason Starts*********************";
pub const FAILURE_REASON_END: &str = "*****************FailureReason Ends***********************";

const RUN_STARTS: &str =
    "..........................WopiValidator Execution Starts....................................";
const RUN_ENDS: &str =
    "..........................WopiValidator Execution Ends....................................";

/// Writes test outcomes through an output sink
pub struct ResultReporter<S: OutputSink> {
    sink: S,
}

impl<S: OutputSink> ResultReporter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn run_started(&mut self) {
        self.sink.emit_info(RUN_STARTS);
        self.sink.emit("");
    }

    /// Classify a result and write its name, status and any failure detail
    pub fn report(&mut self, result: &TestResult) -> TestStatus {
        let status = result.status();
        let style = status_style(status);
        debug!("{} classified as {}", result.name, status);

        self.sink.write(Style::Normal, &result.name);
        self.sink.write(style, &format!("...{}...", status.label()));
        self.sink.newline();
        self.sink.emit("");

        if status.is_success() {
            return status;
        }

        if let Some(message) = &result.error_message {
            self.sink.emit_styled(style, message);
            self.sink.emit("");
        }

        for detail in result.failed_requests() {
            self.sink
                .emit_styled(style, &format!("Request Failed: {}", detail.request_name));
            self.sink.emit_styled(style, FAILURE_REASON_START);
            for failure in &detail.validation_failures {
                self.sink.emit_styled(style, failure);
            }
            self.sink.emit_styled(style, FAILURE_REASON_END);
            self.sink.emit("");
        }

        status
    }

    pub fn report_execution_failure(&mut self, failure: &ExecutionFailure) {
        self.sink.emit_error(&failure.to_string());
    }

    pub fn run_finished(&mut self, summary: &RunSummary) {
        let style = if summary.failed() > 0 || summary.execution_errors() > 0 {
            Style::Error
        } else if summary.skipped() > 0 {
            Style::Warning
        } else {
            Style::Success
        };
        self.sink.emit_styled(style, &summary.to_string());
        self.sink.emit_info(RUN_ENDS);
    }

    /// Write a fatal error that ends the run
    pub fn report_fatal(&mut self, error: &anyhow::Error) {
        self.sink.emit_error(&format!("Error: {error:#}"));
    }
}

fn status_style(status: TestStatus) -> Style {
    match status {
        TestStatus::Passed => Style::Success,
        TestStatus::Skipped => Style::Warning,
        TestStatus::Failed => Style::Error,
    }
}
