//! Configuration module
//!
//! Handles loading and layering the runner configuration: config file,
//! then environment, then command line.

mod env;

pub use env::{print_env_help, EnvConfig};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::RunSummary;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./wopi-validator.yaml",
    "./wopi-validator.yml",
    "./.wopi-validator.yaml",
    "~/.config/wopi-validator/config.yaml",
];

/// How test outcomes map to the process exit status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitPolicy {
    /// Only discovery or enumeration failures exit non-zero
    #[default]
    FatalOnly,
    /// Failed tests and execution errors also exit non-zero
    AnyFailure,
    /// Skipped tests exit non-zero as well
    Strict,
}

impl ExitPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fatal-only" | "fatal" => Some(ExitPolicy::FatalOnly),
            "any-failure" | "failure" => Some(ExitPolicy::AnyFailure),
            "strict" => Some(ExitPolicy::Strict),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExitPolicy::FatalOnly => "fatal-only",
            ExitPolicy::AnyFailure => "any-failure",
            ExitPolicy::Strict => "strict",
        }
    }

    /// Exit status for a run that completed
    pub fn exit_code(&self, summary: &RunSummary) -> u8 {
        let failing = summary.failed() + summary.execution_errors();
        let violated = match self {
            ExitPolicy::FatalOnly => false,
            ExitPolicy::AnyFailure => failing > 0,
            ExitPolicy::Strict => failing + summary.skipped() > 0,
        };
        u8::from(violated)
    }
}

impl fmt::Display for ExitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// WOPI discovery service URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_url: Option<String>,

    /// Query parameters sent to the validator endpoint
    pub payload: BTreeMap<String, String>,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    /// Exit status policy for completed runs
    pub exit_policy: ExitPolicy,

    /// Colour console output
    pub colorize: bool,

    /// Accept self-signed certificates on the validator host
    pub accept_invalid_certs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            discovery_url: None,
            payload: BTreeMap::new(),
            timeout_secs: 30,
            exit_policy: ExitPolicy::FatalOnly,
            colorize: true,
            accept_invalid_certs: false,
        }
    }
}

impl AppConfig {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load the explicit file if given, else the first standard location, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(Self::find) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Apply environment overrides on top of file values
    pub fn apply_env(&mut self, env: &EnvConfig) -> Result<()> {
        if let Some(url) = &env.discovery_url {
            self.discovery_url = Some(url.clone());
        }
        if let Some(timeout) = env.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(policy) = &env.exit_policy {
            self.exit_policy = ExitPolicy::from_str(policy)
                .with_context(|| format!("Unknown exit policy in environment: {policy}"))?;
        }
        if env.no_color {
            self.colorize = false;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }

        if let Some(url) = &self.discovery_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("Discovery URL must be an http(s) URL: {url}");
            }
        }

        Ok(())
    }

    /// Discovery URL, required for any command that talks to the service
    pub fn require_discovery_url(&self) -> Result<&str> {
        self.discovery_url.as_deref().context(
            "No discovery URL configured; pass --discovery-url or set WOPI_VALIDATOR_DISCOVERY_URL",
        )
    }
}

/// Expand ~ in path
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExecutionFailure, TestOutcome, TestStatus};
    use tempfile::TempDir;

    fn summary(statuses: &[TestStatus], execution_errors: usize) -> RunSummary {
        let mut summary = RunSummary::new();
        for status in statuses {
            summary.record(TestOutcome::Reported {
                name: "t".to_string(),
                status: *status,
            });
        }
        for _ in 0..execution_errors {
            summary.record(TestOutcome::ExecutionFailed(ExecutionFailure::new(
                "http://v/t", "boom",
            )));
        }
        summary
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.exit_policy, ExitPolicy::FatalOnly);
        assert!(config.colorize);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_exit_policy_from_str() {
        assert_eq!(ExitPolicy::from_str("strict"), Some(ExitPolicy::Strict));
        assert_eq!(
            ExitPolicy::from_str("Any-Failure"),
            Some(ExitPolicy::AnyFailure)
        );
        assert_eq!(ExitPolicy::from_str("sometimes"), None);
    }

    #[test]
    fn test_exit_policy_codes() {
        let clean = summary(&[TestStatus::Passed], 0);
        let skipped = summary(&[TestStatus::Passed, TestStatus::Skipped], 0);
        let failed = summary(&[TestStatus::Failed], 0);
        let errored = summary(&[TestStatus::Passed], 1);

        assert_eq!(ExitPolicy::FatalOnly.exit_code(&failed), 0);
        assert_eq!(ExitPolicy::FatalOnly.exit_code(&errored), 0);

        assert_eq!(ExitPolicy::AnyFailure.exit_code(&clean), 0);
        assert_eq!(ExitPolicy::AnyFailure.exit_code(&skipped), 0);
        assert_eq!(ExitPolicy::AnyFailure.exit_code(&failed), 1);
        assert_eq!(ExitPolicy::AnyFailure.exit_code(&errored), 1);

        assert_eq!(ExitPolicy::Strict.exit_code(&clean), 0);
        assert_eq!(ExitPolicy::Strict.exit_code(&skipped), 1);
    }

    #[test]
    fn test_config_save_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("wopi-validator.yaml");

        let mut config = AppConfig {
            discovery_url: Some("https://host/hosting/discovery".to_string()),
            exit_policy: ExitPolicy::AnyFailure,
            ..Default::default()
        };
        config
            .payload
            .insert("testcategory".to_string(), "OfficeOnline".to_string());
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_json_partial() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"discovery_url": "http://localhost/discovery", "exit_policy": "strict"}"#,
        )
        .unwrap();

        let loaded = AppConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(
            loaded.discovery_url.as_deref(),
            Some("http://localhost/discovery")
        );
        assert_eq!(loaded.exit_policy, ExitPolicy::Strict);
        assert_eq!(loaded.timeout_secs, 30);
    }

    #[test]
    fn test_config_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = AppConfig::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_apply_env_overrides_file() {
        let mut config = AppConfig {
            discovery_url: Some("http://file/discovery".to_string()),
            ..Default::default()
        };
        let env = EnvConfig {
            discovery_url: Some("http://env/discovery".to_string()),
            timeout: Some(5),
            exit_policy: Some("any-failure".to_string()),
            no_color: true,
            ..Default::default()
        };

        config.apply_env(&env).unwrap();
        assert_eq!(config.discovery_url.as_deref(), Some("http://env/discovery"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.exit_policy, ExitPolicy::AnyFailure);
        assert!(!config.colorize);
    }

    #[test]
    fn test_apply_env_rejects_unknown_policy() {
        let mut config = AppConfig::default();
        let env = EnvConfig {
            exit_policy: Some("maybe".to_string()),
            ..Default::default()
        };
        assert!(config.apply_env(&env).is_err());
    }

    #[test]
    fn test_validate_config() {
        let zero_timeout = AppConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());

        let bad_url = AppConfig {
            discovery_url: Some("ftp://host/discovery".to_string()),
            ..Default::default()
        };
        assert!(bad_url.validate().is_err());
    }

    #[test]
    fn test_require_discovery_url() {
        assert!(AppConfig::default().require_discovery_url().is_err());
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("./local.yaml"), PathBuf::from("./local.yaml"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/x.yaml"), home.join("x.yaml"));
        }
    }
}
