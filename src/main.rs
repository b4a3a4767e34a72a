//! CLI entry point for the paper analysis client.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use paper_vis_core::config::ConfigOverrides;
use paper_vis_core::{
    AnalysisPipeline, HealthProber, HttpTransport, LegacyClient, ProgressSink, ResultEnvelope,
    ServiceConfig, SyntheticProgress, Transport, UploadFile,
};
use serde_json::Value;
use tracing::{debug, info};

mod app_config;
mod cli;
mod progress_ui;
mod terminal;

use cli::{AnalyzeArgs, Args, Command, LegacyCommand};
use progress_ui::ProgressBarSink;

/// Process outcome mapped to an exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    Success,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::FAILURE,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ProcessExit> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let file_config = app_config::load_default_file_config()?.unwrap_or_default();

    let no_color = terminal::no_color_env_requested() || terminal::is_dumb_terminal();
    terminal::init_tracing(
        terminal::resolve_default_log_level(args.quiet, args.verbose, file_config.verbosity),
        no_color,
    );
    debug!(?args, "CLI arguments parsed");

    // Priority: command line > environment > config file > defaults
    let overrides = args
        .overrides()
        .or(ConfigOverrides::from_env().context("Invalid environment configuration")?)
        .or(file_config.overrides());
    let config = ServiceConfig::resolve(&overrides).context("Invalid service configuration")?;
    info!(
        profile = %config.profile(),
        base_url = %config.base_url(),
        endpoint = %config.analysis_endpoint(),
        "paper-vis starting"
    );

    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(&config).context("Failed to build HTTP client")?);

    match &args.command {
        Command::Analyze(analyze) => run_analyze(&config, transport, analyze, args.quiet).await,
        Command::Health => Ok(run_health(&config, transport, args.quiet).await),
        Command::Legacy(LegacyCommand::Upload { file }) => {
            let client = LegacyClient::new(&config, transport);
            let upload = read_upload(file).await?;
            let bar = progress_bar(args.quiet, false);
            let sink = bar.as_deref().map(|bar| bar as &dyn ProgressSink);
            let result = client.upload(&upload, sink).await;
            if let Some(bar) = &bar {
                bar.clear();
            }
            print_json(&result.context("Legacy upload failed")?)?;
            Ok(ProcessExit::Success)
        }
        Command::Legacy(LegacyCommand::Analyze { folder_id }) => {
            let client = LegacyClient::new(&config, transport);
            let body = client
                .start_analysis(folder_id)
                .await
                .context("Legacy analysis request failed")?;
            print_json(&body)?;
            Ok(ProcessExit::Success)
        }
    }
}

async fn run_analyze(
    config: &ServiceConfig,
    transport: Arc<dyn Transport>,
    analyze: &AnalyzeArgs,
    quiet: bool,
) -> Result<ProcessExit> {
    let mut upload = read_upload(&analyze.file).await?;
    if let Some(media_type) = &analyze.media_type {
        upload = upload.with_media_type(media_type.clone());
    }

    let pipeline = AnalysisPipeline::new(config, transport);
    let bar = progress_bar(quiet, analyze.no_progress);
    let synthetic = bar.as_ref().map(|bar| {
        let sink: Arc<dyn ProgressSink> = bar.clone();
        SyntheticProgress::from_config(config).start(sink)
    });

    let sink = bar.as_deref().map(|bar| bar as &dyn ProgressSink);
    let envelope = pipeline.run(&upload, sink).await;

    if let Some(handle) = &synthetic {
        handle.stop();
    }
    if let Some(bar) = &bar {
        bar.clear();
    }

    if analyze.json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else if !quiet || !envelope.is_success() {
        print_summary(&envelope);
    }

    Ok(if envelope.is_success() {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    })
}

async fn run_health(
    config: &ServiceConfig,
    transport: Arc<dyn Transport>,
    quiet: bool,
) -> ProcessExit {
    let prober = HealthProber::new(config, transport);
    if prober.probe().await {
        if !quiet {
            println!("available: {}", config.analysis_endpoint());
        }
        ProcessExit::Success
    } else {
        eprintln!("unavailable: {}", config.analysis_endpoint());
        ProcessExit::Failure
    }
}

async fn read_upload(path: &Path) -> Result<UploadFile> {
    UploadFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read '{}'", path.display()))
}

fn progress_bar(quiet: bool, no_progress: bool) -> Option<Arc<ProgressBarSink>> {
    terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        quiet,
        no_progress,
        terminal::is_dumb_terminal(),
    )
    .then(|| Arc::new(ProgressBarSink::new()))
}

fn print_summary(envelope: &ResultEnvelope) {
    match envelope.metadata() {
        Some(metadata) => {
            println!("Title:    {}", metadata.title);
            if !metadata.authors.is_empty() {
                println!("Authors:  {}", metadata.authors.join(", "));
            }
            println!("Time:     {:.1}s", metadata.total_time);
            println!("Lanes:    {}", metadata.lanes_count);
            println!("Figures:  {}", metadata.figures_count);
        }
        None => {
            eprintln!(
                "Analysis failed: {}",
                envelope.error().unwrap_or("unknown error")
            );
        }
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
