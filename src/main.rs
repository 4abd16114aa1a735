//! WOPI Validator runner
//!
//! A CLI tool that drives the WOPI Validator conformance suite against a
//! WOPI host: it resolves the validator endpoint from a discovery document,
//! asks it for the test URLs matching a payload, runs each test in order and
//! reports passed, skipped and failed tests with their failure reasons.
//!
//! ## Usage
//!
//! ```bash
//! # Run every test in a category
//! wopi-validator run --discovery-url https://host/hosting/discovery \
//!     --wopisrc https://host/wopi/files/test.wopitest --access-token t \
//!     --testcategory OfficeOnline
//!
//! # Run a single group and fail the build on any failed test
//! wopi-validator run --testgroup Locks --exit-policy any-failure
//!
//! # Show the resolved validator endpoint
//! wopi-validator discover --discovery-url https://host/hosting/discovery
//!
//! # List test URLs without running them
//! wopi-validator list --testgroup FileVersion
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

mod cli;
mod config;
mod discovery;
mod executor;
mod http;
mod models;
mod output;
mod utils;

use cli::{Args, ConfigAction, ConnectionArgs, RunArgs};
use config::{AppConfig, EnvConfig, ExitPolicy};
use executor::ValidatorRunner;
use http::HttpClient;
use output::{ConsoleSink, OutputSink, ResultReporter};
use utils::{init_logger, LogLevel};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = args
        .log_level
        .as_deref()
        .and_then(LogLevel::from_str)
        .unwrap_or_else(|| LogLevel::from_verbose(args.verbose));
    init_logger(level);

    let env = EnvConfig::load();
    let colorize = fatal_colorize(&args, &env);

    match dispatch(args, &env).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            let mut reporter = ResultReporter::new(ConsoleSink::stdout(colorize));
            reporter.report_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

fn config_path(args: &Args, env: &EnvConfig) -> Option<PathBuf> {
    args.config
        .clone()
        .or_else(|| env.config_file.as_ref().map(PathBuf::from))
}

/// Colour choice for errors raised before the effective config exists
fn fatal_colorize(args: &Args, env: &EnvConfig) -> bool {
    if env.no_color || args.no_color() {
        return false;
    }
    AppConfig::load_or_default(config_path(args, env).as_deref()).map_or(true, |c| c.colorize)
}

async fn dispatch(args: Args, env: &EnvConfig) -> Result<ExitCode> {
    let config_path = config_path(&args, env);

    match args.command {
        cli::Command::Run(run_args) => {
            let config = effective_config(config_path, env, Some(&run_args))?;
            run_validator(&config).await
        }
        cli::Command::List(run_args) => {
            let config = effective_config(config_path, env, Some(&run_args))?;
            list_tests(&config).await
        }
        cli::Command::Discover(connection) => {
            let run_args = RunArgs {
                connection,
                ..Default::default()
            };
            let config = effective_config(config_path, env, Some(&run_args))?;
            discover(&config).await
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args.action, config_path, env)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Layer the config file, environment and command line, in that order
fn effective_config(
    config_path: Option<PathBuf>,
    env: &EnvConfig,
    run_args: Option<&RunArgs>,
) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(config_path.as_deref())?;
    config.apply_env(env)?;

    if let Some(run_args) = run_args {
        apply_connection_args(&mut config, &run_args.connection);

        if let Some(policy) = &run_args.exit_policy {
            config.exit_policy = ExitPolicy::from_str(policy)
                .ok_or_else(|| anyhow::anyhow!("Unknown exit policy: {policy}"))?;
        }

        config.payload.extend(run_args.payload()?);
    }

    config.validate()?;
    Ok(config)
}

fn apply_connection_args(config: &mut AppConfig, connection: &ConnectionArgs) {
    if let Some(url) = &connection.discovery_url {
        config.discovery_url = Some(url.clone());
    }
    if let Some(timeout) = connection.timeout {
        config.timeout_secs = timeout;
    }
    if connection.insecure {
        config.accept_invalid_certs = true;
    }
    if connection.no_color {
        config.colorize = false;
    }
}

fn build_runner(config: &AppConfig) -> Result<ValidatorRunner> {
    let client = HttpClient::with_timeout(config.timeout_secs, config.accept_invalid_certs)?;
    Ok(ValidatorRunner::new(client))
}

async fn run_validator(config: &AppConfig) -> Result<ExitCode> {
    let discovery_url = config.require_discovery_url()?;
    let runner = build_runner(config)?;
    let mut reporter = ResultReporter::new(ConsoleSink::stdout(config.colorize));

    info!(
        "Running WOPI Validator ({} payload parameters, exit policy {})",
        config.payload.len(),
        config.exit_policy
    );

    match runner
        .run(discovery_url, &config.payload, &mut reporter)
        .await
    {
        Ok(summary) => {
            let code = config.exit_policy.exit_code(&summary);
            if code != 0 {
                info!("Exit policy {} reports failure", config.exit_policy);
            }
            Ok(ExitCode::from(code))
        }
        Err(e) => {
            error!("{:#}", e);
            reporter.report_fatal(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn list_tests(config: &AppConfig) -> Result<ExitCode> {
    let discovery_url = config.require_discovery_url()?;
    let runner = build_runner(config)?;

    let test_urls = runner
        .enumerate(discovery_url, &config.payload)
        .await
        .context("Failed to list test URLs")?;

    let mut sink = ConsoleSink::stdout(config.colorize);
    sink.emit_info(&format!("{} test URL(s)", test_urls.len()));
    for (i, url) in test_urls.iter().enumerate() {
        sink.emit(&format!("{:3}. {}", i + 1, url));
    }

    Ok(ExitCode::SUCCESS)
}

async fn discover(config: &AppConfig) -> Result<ExitCode> {
    let discovery_url = config.require_discovery_url()?;
    let runner = build_runner(config)?;

    let endpoint = runner
        .resolve(discovery_url)
        .await
        .context("Failed to resolve test endpoint")?;

    let mut sink = ConsoleSink::stdout(config.colorize);
    sink.emit_success(endpoint.as_str());

    Ok(ExitCode::SUCCESS)
}

fn manage_config(action: ConfigAction, config_path: Option<PathBuf>, env: &EnvConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let source = config_path.clone().or_else(AppConfig::find);
            let config = effective_config(config_path, env, None)?;

            match source {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!("# No config file found; using defaults"),
            }
            if env.has_any() {
                println!("# WOPI_VALIDATOR_* environment overrides applied");
            }
            print!(
                "{}",
                serde_yaml::to_string(&config).context("Failed to serialize config")?
            );
        }
        ConfigAction::Init { path, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                );
            }

            let mut config = AppConfig {
                discovery_url: Some("https://localhost/hosting/discovery".to_string()),
                ..Default::default()
            };
            config
                .payload
                .insert("testcategory".to_string(), "All".to_string());
            config.save(&path)?;

            println!("Wrote default configuration to {}", path.display());
        }
        ConfigAction::Env => config::print_env_help(),
    }

    Ok(())
}
