//! Test execution runner
//!
//! Executes validator test URLs one after another and drives a full run:
//! discovery, enumeration, execution and reporting.

use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{debug, error, info};

use super::enumerator::{Payload, TestEnumerator};
use crate::discovery::{DiscoveryResolver, TestEndpoint};
use crate::http::HttpClient;
use crate::models::{ExecutionFailure, RunSummary, TestOutcome, TestResult};
use crate::output::{OutputSink, ResultReporter};

/// Executes a single test URL
pub struct TestExecutor {
    client: HttpClient,
}

impl TestExecutor {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Fetch and decode one test result. Any failure stays with this URL.
    pub async fn execute(&self, test_url: &str) -> Result<TestResult, ExecutionFailure> {
        let response = self
            .client
            .get(test_url)
            .await
            .map_err(|e| ExecutionFailure::new(test_url, e.to_string()))?;

        if !response.is_success() {
            return Err(ExecutionFailure::new(
                test_url,
                format!("{} for url {}", response.status_line(), response.url),
            ));
        }

        let result: serde_json::Value = serde_json::from_str(&response.body).map_err(|e| {
            ExecutionFailure::new(test_url, format!("Malformed test result: {e}"))
        })?;

        info!("Result for TestUrl: {}", test_url);
        debug!(
            "{}",
            serde_json::to_string_pretty(&result).unwrap_or_default()
        );

        serde_json::from_value(result)
            .map_err(|e| ExecutionFailure::new(test_url, format!("Malformed test result: {e}")))
    }
}

/// Drives a complete validator run
pub struct ValidatorRunner {
    resolver: DiscoveryResolver,
    enumerator: TestEnumerator,
    executor: TestExecutor,
}

impl ValidatorRunner {
    pub fn new(client: HttpClient) -> Self {
        Self {
            resolver: DiscoveryResolver::new(client.clone()),
            enumerator: TestEnumerator::new(client.clone()),
            executor: TestExecutor::new(client),
        }
    }

    /// Resolve the validator endpoint from the discovery service
    pub async fn resolve(&self, discovery_url: &str) -> Result<TestEndpoint> {
        let endpoint = self.resolver.resolve(discovery_url).await?;
        info!("WopiValidator TestEndpoint Url: {}", endpoint);
        Ok(endpoint)
    }

    /// Resolve the endpoint and list the test URLs for a payload
    pub async fn enumerate(&self, discovery_url: &str, payload: &Payload) -> Result<Vec<String>> {
        let endpoint = self.resolve(discovery_url).await?;
        let test_urls = self.enumerator.enumerate(&endpoint, payload).await?;
        Ok(test_urls)
    }

    /// Run every enumerated test in order, reporting each as it completes.
    ///
    /// Discovery and enumeration failures are returned as errors; a failing
    /// test URL is reported and recorded, and the run moves on.
    pub async fn run<S: OutputSink>(
        &self,
        discovery_url: &str,
        payload: &Payload,
        reporter: &mut ResultReporter<S>,
    ) -> Result<RunSummary> {
        let endpoint = self
            .resolve(discovery_url)
            .await
            .context("Discovery failed")?;

        reporter.run_started();

        let test_urls = self
            .enumerator
            .enumerate(&endpoint, payload)
            .await
            .context("Enumeration failed")?;

        let mut summary = RunSummary::new();

        for test_url in &test_urls {
            let start = Instant::now();

            match self.executor.execute(test_url).await {
                Ok(result) => {
                    let status = reporter.report(&result);
                    summary.record(TestOutcome::Reported {
                        name: result.name,
                        status,
                    });
                }
                Err(failure) => {
                    error!("{}", failure);
                    reporter.report_execution_failure(&failure);
                    summary.record(TestOutcome::ExecutionFailed(failure));
                }
            }

            debug!("{} finished in {}ms", test_url, start.elapsed().as_millis());
        }

        info!(
            "Run started at {} completed: {}",
            summary.started_at.to_rfc3339(),
            summary
        );
        reporter.run_finished(&summary);

        Ok(summary)
    }
}
