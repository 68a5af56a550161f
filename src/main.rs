//! Sampling controller binary
//!
//! `controller` serves the HTTP API with the scheduler by default; the other
//! subcommands are one-off operator actions against the same backends.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sampling_controller::core::metrics::MetricFamily;
use sampling_controller::core::sampling::BumpRequest;
use sampling_controller::services::Job;
use sampling_controller::utils::logging::init_logging;
use sampling_controller::{Config, Controller};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "controller", version, about = "Adaptive sampling controller")]
struct Cli {
    /// YAML configuration file; environment variables are applied on top
    #[arg(short, long, env = "CONTROLLER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API and run scheduled jobs
    Serve,
    /// Run one scheduled job once
    RunJob {
        #[arg(value_enum)]
        job: Job,
    },
    /// Run spike detection for one project
    Detect { project_id: String },
    /// Override the sample rate of applications for a while
    Bump {
        /// New sample rate in [0, 1]
        #[arg(long)]
        rate: f64,
        /// Window length in seconds
        #[arg(long)]
        duration: i64,
        #[arg(required = true)]
        apps: Vec<String>,
    },
    /// Force every sample rate to 0
    Panic,
    /// Leave panic mode
    Unpanic,
    /// Choose which metric families applications collect
    CollectMetrics {
        /// Families to enable (WSGI, CELERY); unlisted ones are disabled
        #[arg(long = "enable", value_parser = parse_family)]
        enable: Vec<MetricFamily>,
        #[arg(required = true)]
        apps: Vec<String>,
    },
    /// Print the effective configuration
    ShowConfig,
}

fn parse_family(value: &str) -> Result<MetricFamily, String> {
    value.parse().map_err(|e| format!("{}", e))
}

async fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path).await?,
        None => Config::from_env()?,
    };
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())
        .await
        .context("Failed to load configuration")?;
    init_logging(config.logging())?;

    let command = cli.command.unwrap_or(Command::Serve);
    if let Command::ShowConfig = command {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    if matches!(command, Command::Panic | Command::Unpanic) && !config.storage().redis.enabled {
        warn!("Redis is disabled, the panic flag only lives in this process");
    }

    let controller = Controller::new(config).await?;
    let now = Utc::now();

    match command {
        Command::Serve => controller.run().await?,
        Command::RunJob { job } => {
            controller.jobs().run(job).await?;
            info!("Job {} finished", job.name());
        }
        Command::Detect { project_id } => {
            let events = controller.jobs().perform_detect(&project_id).await?;
            info!("Detection recorded {} new event(s)", events.len());
        }
        Command::Bump {
            rate,
            duration,
            apps,
        } => {
            let request = BumpRequest::from_secs(rate, duration)?;
            let updated = controller.rates().bump(&apps, request, now).await?;
            info!("Bumped {} app(s)", updated);
        }
        Command::Panic => controller.rates().panic().await?,
        Command::Unpanic => controller.rates().unpanic().await?,
        Command::CollectMetrics { enable, apps } => {
            controller.rates().set_metric_collection(&apps, &enable).await?;
            info!("Updated metric collection of {} app(s)", apps.len());
        }
        Command::ShowConfig => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
