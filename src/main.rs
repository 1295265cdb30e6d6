use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ralph_loop::config::{self, ResolvedRun};
use ralph_loop::gateway::AnthropicGateway;
use ralph_loop::observe::{FanoutSink, LogSink};
use ralph_loop::report::{self, ConsoleSink};
use ralph_loop::runner::IterationController;
use tokio_util::sync::CancellationToken;

mod cli;

use cli::Cli;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ralph")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("ralph.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Resolve everything the run needs; any failure here is a configuration error.
fn prepare(cli: &Cli) -> Result<(ResolvedRun, String)> {
    let global = config::load_config(cli.config.as_ref()).context("Failed to load configuration")?;
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let run = config::resolve(&global, &cli.mode(), &cli.overrides(), &cwd).context("Invalid run configuration")?;
    let prompt = run.loop_config.load_prompt().context("Failed to load prompt")?;
    Ok((run, prompt))
}

async fn run_application(cli: &Cli) -> Result<ExitCode> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let (run, prompt) = prepare(cli)?;
    let gateway = AnthropicGateway::new(run.gateway.clone()).context("Failed to set up agent gateway")?;

    report::print_banner(&run);

    let sink = FanoutSink::new().with(Arc::new(ConsoleSink)).with(Arc::new(LogSink));
    let controller = IterationController::new(Arc::new(gateway), run.loop_config, run.session)
        .context("Invalid run configuration")?
        .with_sink(Arc::new(sink));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling run");
            trigger.cancel();
        }
    });

    let result = controller.run_until_cancelled(&prompt, cancel).await;
    report::print_result(&result);

    info!("Run finished: {}", result.outcome.label());
    Ok(ExitCode::from(result.exit_code()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli).await.context("Application failed")
}
