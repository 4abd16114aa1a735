//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::executor::Payload;

/// WOPI Validator conformance suite runner
#[derive(Parser, Debug)]
#[command(name = "wopi-validator")]
#[command(version)]
#[command(about = "Run the WOPI Validator conformance tests against a WOPI host")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error); overrides --verbose
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Whether `--no-color` was passed to the chosen subcommand
    pub fn no_color(&self) -> bool {
        match &self.command {
            Command::Run(run_args) | Command::List(run_args) => run_args.connection.no_color,
            Command::Discover(connection) => connection.no_color,
            Command::Config(_) => false,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve, enumerate and execute the validator tests
    Run(RunArgs),

    /// Resolve and print the validator test endpoint
    Discover(ConnectionArgs),

    /// Print the test URLs the validator would run, without running them
    List(RunArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Options shared by every command that talks to the discovery service
#[derive(Parser, Debug, Default)]
pub struct ConnectionArgs {
    /// WOPI discovery service URL
    #[arg(short, long)]
    pub discovery_url: Option<String>,

    /// Timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    pub insecure: bool,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for run and list commands
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Extra validator query parameter (repeatable)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// WopiSrc of the .wopitest file on the host
    #[arg(long)]
    pub wopisrc: Option<String>,

    /// Access token for the .wopitest file
    #[arg(long)]
    pub access_token: Option<String>,

    /// Access token TTL
    #[arg(long)]
    pub access_token_ttl: Option<String>,

    /// Test group to run
    #[arg(long)]
    pub testgroup: Option<String>,

    /// Single test to run
    #[arg(long)]
    pub testname: Option<String>,

    /// Test category (All, OfficeOnline, OfficeNativeClient)
    #[arg(long)]
    pub testcategory: Option<String>,

    /// Exit status policy (fatal-only, any-failure, strict)
    #[arg(long)]
    pub exit_policy: Option<String>,
}

impl RunArgs {
    /// Payload parameters given on the command line
    pub fn payload(&self) -> Result<Payload> {
        let mut payload = Payload::new();

        let named = [
            ("WopiSrc", &self.wopisrc),
            ("access_token", &self.access_token),
            ("access_token_ttl", &self.access_token_ttl),
            ("testgroup", &self.testgroup),
            ("testname", &self.testname),
            ("testcategory", &self.testcategory),
        ];
        for (key, value) in named {
            if let Some(value) = value {
                payload.insert(key.to_string(), value.clone());
            }
        }

        for param in &self.params {
            let (key, value) = parse_param(param)?;
            payload.insert(key, value);
        }

        Ok(payload)
    }
}

/// Split a `KEY=VALUE` parameter; the value may itself contain `=`
fn parse_param(param: &str) -> Result<(String, String)> {
    match param.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => bail!("Invalid parameter '{param}', expected KEY=VALUE"),
    }
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "wopi-validator.yaml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List supported environment variables
    Env,
}
