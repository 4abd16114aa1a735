//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "WOPI_VALIDATOR";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Discovery URL from WOPI_VALIDATOR_DISCOVERY_URL
    pub discovery_url: Option<String>,
    /// Timeout from WOPI_VALIDATOR_TIMEOUT
    pub timeout: Option<u64>,
    /// Exit policy from WOPI_VALIDATOR_EXIT_POLICY
    pub exit_policy: Option<String>,
    /// Config file from WOPI_VALIDATOR_CONFIG
    pub config_file: Option<String>,
    /// Set by WOPI_VALIDATOR_NO_COLOR or the conventional NO_COLOR
    pub no_color: bool,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefixed = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}"));

        Self {
            discovery_url: prefixed("DISCOVERY_URL"),
            timeout: prefixed("TIMEOUT").and_then(|v| v.parse().ok()),
            exit_policy: prefixed("EXIT_POLICY"),
            config_file: prefixed("CONFIG"),
            no_color: prefixed("NO_COLOR").map_or(false, |v| is_truthy(&v))
                || lookup("NO_COLOR").is_some_and(|v| !v.is_empty()),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.discovery_url.is_some()
            || self.timeout.is_some()
            || self.exit_policy.is_some()
            || self.config_file.is_some()
            || self.no_color
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

/// Print all WOPI_VALIDATOR environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_DISCOVERY_URL  WOPI discovery service URL");
    println!("  {ENV_PREFIX}_TIMEOUT        Request timeout in seconds");
    println!("  {ENV_PREFIX}_EXIT_POLICY    fatal-only, any-failure or strict");
    println!("  {ENV_PREFIX}_CONFIG         Path to configuration file");
    println!("  {ENV_PREFIX}_NO_COLOR       Disable coloured output (true/false)");
    println!("  NO_COLOR                      Disable coloured output when set");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_DISCOVERY_URL=https://host/hosting/discovery");
    println!("  wopi-validator run --wopisrc https://host/wopi/files/test.wopitest --access-token t");
}
