//! Test result models for WOPI Validator runs
//!
//! Defines the result payload returned per test URL, its classification,
//! and the per-run summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// `errorMessage` value the validator uses for a deliberately skipped test
pub const SKIPPED_SENTINEL: &str = "Skipped";

/// Result of one validator test, as returned by its test URL
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    #[serde(default, alias = "Name")]
    pub name: String,

    #[serde(default, alias = "ErrorMessage")]
    pub error_message: Option<String>,

    #[serde(default, alias = "RequestDetails", deserialize_with = "null_as_empty")]
    pub request_details: Vec<RequestDetail>,
}

impl TestResult {
    #[cfg(test)]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error_message: None,
            request_details: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error_message: Some(message.into()),
            request_details: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn skip(name: impl Into<String>) -> Self {
        Self::fail(name, SKIPPED_SENTINEL)
    }

    #[cfg(test)]
    pub fn with_request(mut self, detail: RequestDetail) -> Self {
        self.request_details.push(detail);
        self
    }

    /// Classify: empty message passes, the sentinel skips, anything else fails
    pub fn status(&self) -> TestStatus {
        match self.error_message.as_deref() {
            None | Some("") => TestStatus::Passed,
            Some(SKIPPED_SENTINEL) => TestStatus::Skipped,
            Some(_) => TestStatus::Failed,
        }
    }

    /// Requests that reported at least one validation failure
    pub fn failed_requests(&self) -> impl Iterator<Item = &RequestDetail> {
        self.request_details
            .iter()
            .filter(|detail| !detail.validation_failures.is_empty())
    }
}

/// Lists sent as `null` read the same as missing ones
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One sub-request made by a validator test
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    #[serde(default, alias = "Name", alias = "RequestName")]
    pub request_name: String,

    #[serde(default, alias = "ValidationFailures", deserialize_with = "null_as_empty")]
    pub validation_failures: Vec<String>,
}

#[cfg(test)]
impl RequestDetail {
    pub fn new(request_name: impl Into<String>) -> Self {
        Self {
            request_name: request_name.into(),
            validation_failures: Vec::new(),
        }
    }

    pub fn with_failure(mut self, failure: impl Into<String>) -> Self {
        self.validation_failures.push(failure.into());
        self
    }
}

/// Classification of a reported test
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TestStatus {
    Passed,
    Skipped,
    Failed,
}

impl TestStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::Passed => "Passed",
            TestStatus::Skipped => "Skipped",
            TestStatus::Failed => "Failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Passed)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A test URL that could not be executed. Isolated to that test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionFailure {
    pub test_url: String,
    pub message: String,
}

impl ExecutionFailure {
    pub fn new(test_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            test_url: test_url.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Execution Failed for TestUrl {}: {}",
            self.test_url, self.message
        )
    }
}

impl std::error::Error for ExecutionFailure {}

/// What happened to one enumerated test URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestOutcome {
    Reported { name: String, status: TestStatus },
    ExecutionFailed(ExecutionFailure),
}

/// Tally of a validator run, in test URL order
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<TestOutcome>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: TestOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn count(&self, status: TestStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, TestOutcome::Reported { status: s, .. } if *s == status))
            .count()
    }

    pub fn passed(&self) -> usize {
        self.count(TestStatus::Passed)
    }

    pub fn skipped(&self) -> usize {
        self.count(TestStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(TestStatus::Failed)
    }

    pub fn execution_errors(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, TestOutcome::ExecutionFailed(_)))
            .count()
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Passed: {}, Skipped: {}, Failed: {}, Execution errors: {} ({} total)",
            self.passed(),
            self.skipped(),
            self.failed(),
            self.execution_errors(),
            self.total()
        )
    }
}
