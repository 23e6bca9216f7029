//! Periodic dump tool
//!
//! Runs each configured producer, fingerprints its output and files it into
//! latest/daily/weekly/monthly retention tiers.

// dumpbox/src/main.rs
mod config;
mod dumper;
mod errors;
mod notifier;
mod producer;
mod utils;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use config::AppConfig;
use notifier::{Notifier, Status};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dumpbox", version, about = "Runs configured dumps into tiered retention")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Only run the named jobs (all jobs when omitted)
    jobs: Vec<String>,
}

/// Main entry point for the dump tool
#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run_app(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Runs every selected job in order; returns whether all of them succeeded.
async fn run_app(cli: Cli) -> Result<bool> {
    let app_config = AppConfig::load_from_json(&cli.config)
        .with_context(|| format!("Failed to load application configuration from {}", cli.config.display()))?;

    utils::ensure_directory_exists(&app_config.global.path).with_context(|| {
        format!("unable to create dump path {}", app_config.global.path.display())
    })?;
    if !app_config.global.tmp_path.as_os_str().is_empty() {
        utils::ensure_directory_exists(&app_config.global.tmp_path).with_context(|| {
            format!("unable to create tmp dump path {}", app_config.global.tmp_path.display())
        })?;
    }
    if let Err(e) = utils::find_executable(&app_config.global.sh_executable) {
        warn!("{:#}", e);
    }

    for unknown in cli.jobs.iter().filter(|name| !app_config.jobs.iter().any(|j| &j.name == *name)) {
        warn!(job = %unknown, "no such job in configuration");
    }

    let notifier = Notifier::new(app_config.notification.clone())
        .context("Failed to set up notifications")?;
    let mut all_succeeded = true;

    for job in app_config.selected_jobs(&cli.jobs) {
        info!(
            job = %job.name,
            dump_type = %job.dump_type,
            force_latest = job.force_latest,
            daily = job.daily.enabled,
            weekly = job.weekly.enabled,
            monthly = job.monthly.enabled,
            "starting dump"
        );
        let orchestrator = match dumper::prepare_job(&app_config.global, job.clone(), Local::now().date_naive()) {
            Ok(orchestrator) => orchestrator,
            Err(outcome) => {
                notifier.notify(Status::Error, &job.name, &outcome.message).await;
                all_succeeded = false;
                continue;
            }
        };
        notifier.notify(Status::Info, &job.name, "starting dump").await;

        let name = job.name.clone();
        let outcome = tokio::task::spawn_blocking(move || dumper::run_job(orchestrator))
            .await
            .with_context(|| format!("dump worker for {} panicked", name))?;

        let status = if outcome.success { Status::Success } else { Status::Error };
        notifier.notify(status, &name, &outcome.message).await;
        all_succeeded &= outcome.success;
    }

    Ok(all_succeeded)
}
