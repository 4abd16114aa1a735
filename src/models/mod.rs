//! Data models for WOPI Validator runs
//!
//! This module contains the result payloads and run tallies shared by the
//! executor and the reporter.

mod test_result;

pub use test_result::{ExecutionFailure, RunSummary, TestOutcome, TestResult, TestStatus};

#[cfg(test)]
pub use test_result::RequestDetail;
