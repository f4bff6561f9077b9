mod output;
mod tasks;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};

use coursepace_client::HttpSubmissionClient;
use coursepace_config::{defaults, load_and_prepare, redact, PacerConfig, CONFIG_FILE_NAME};
use coursepace_logging::{init_logger, ProgressLogger};
use coursepace_scheduler::Scheduler;

#[derive(Parser)]
#[command(name = "coursepace")]
#[command(about = "CoursePace: paced watch-time reporting for online courses")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report watch-time for every course in a tasks file until done
    Run {
        /// Config file (YAML or JSON)
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
        /// Task list written by course discovery
        #[arg(short, long)]
        tasks: PathBuf,
        /// Print the final report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Validate a config file and show the effective settings
    Check {
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, tasks, json } => run(&config, &tasks, json).await,
        Commands::Check { config } => check(&config).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            output::note_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn check(config_path: &Path) -> Result<ExitCode> {
    let (config, report) = load_and_prepare(config_path).await?;
    output::print_validation(&report);

    let rendered = serde_json::to_string_pretty(&redact(&config))
        .context("Failed to render effective config")?;
    println!("{rendered}");

    if report.is_valid() {
        output::note_success(&format!("{} is valid", config_path.display()));
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn run(config_path: &Path, tasks_path: &Path, json: bool) -> Result<ExitCode> {
    let (config, report) = load_and_prepare(config_path).await?;

    let logging = config.logging();
    init_logger(
        logging.dir.as_deref().unwrap_or(defaults::DEFAULT_LOG_DIR),
        logging.level.as_deref().unwrap_or(defaults::DEFAULT_LOG_LEVEL),
    )?;
    output::print_validation(&report);
    if !report.is_valid() {
        bail!("{} has {} error(s)", config_path.display(), report.errors.len());
    }

    let entries = tasks::load_tasks(tasks_path).await?;
    let client = build_client(&config, &entries)?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let reporter = ProgressLogger::spawn(events_rx);

    let mut scheduler =
        Scheduler::new(config.scheduler(), Arc::new(client)).with_events(events_tx);
    let admission = scheduler.submit(entries.into_iter().map(|e| e.task))?;
    output::note_info(&format!(
        "{} course(s) admitted, {} already complete, {} duplicate(s)",
        admission.admitted,
        admission.already_complete.len(),
        admission.duplicates.len()
    ));

    let token = scheduler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after in-flight submissions");
            token.cancel();
        }
    });

    let report = scheduler.run_until_complete().await;
    // Dropping the scheduler closes the event channel so the reporter finishes.
    drop(scheduler);
    let tallies = reporter.await.context("Progress reporter task failed")?;
    info!(
        run_id = %report.run_id,
        events = tallies.events_seen(),
        completed = report.completed_count(),
        failed = report.failed_count(),
        "Run finished"
    );

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to render report")?
        );
    } else {
        print!("{}", output::render_report(&report));
    }

    Ok(if report.is_complete() && report.failed_count() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn build_client(config: &PacerConfig, entries: &[tasks::TaskEntry]) -> Result<HttpSubmissionClient> {
    let settings = config.client();
    let base_url = settings
        .base_url
        .as_deref()
        .unwrap_or(defaults::DEFAULT_BASE_URL);
    let timeout = Duration::from_secs(
        settings
            .request_timeout_secs
            .unwrap_or(defaults::DEFAULT_REQUEST_TIMEOUT_SECS),
    );
    let cookie = settings.cookie_header();

    let mut client = HttpSubmissionClient::new(
        base_url,
        cookie.as_deref(),
        settings.user_agent.as_deref(),
        timeout,
    )?
    .with_plan_id(
        settings
            .plan_id
            .as_deref()
            .unwrap_or(defaults::DEFAULT_PLAN_ID),
    );
    for entry in entries {
        client.register(entry.task.course_id.clone(), entry.params.clone());
    }
    info!(base_url, courses = client.registered(), "HTTP client ready");
    Ok(client)
}
