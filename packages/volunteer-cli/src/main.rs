//! `volunteer`: extract one volunteer opportunity and save it.
//!
//! Usage:
//!   volunteer soupmobile.org/volunteer
//!   volunteer --model gpt --store ops.json https://example.org/help
//!   volunteer            # prompts for the URL
//!
//! The record is printed to stdout as JSON. Status and logs go to stderr.

mod cli;

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input};
use opportunity_extraction::{DefaultPipeline, InsertOutcome, PipelineError, RunOutcome, Settings};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.log_filter().into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let stage = e
                .downcast_ref::<PipelineError>()
                .map(PipelineError::stage)
                .unwrap_or("setup");
            debug!(stage, error = %format!("{e:#}"), "run failed");
            eprintln!("{} [{}] {:#}", "✗".bright_red().bold(), stage, e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let settings = cli.apply(
        Settings::from_env_shadowed(&cli.shadowed_vars()).context("Failed to read settings")?,
    );

    let url = match &cli.url {
        Some(url) => url.clone(),
        None => prompt_url()?,
    };

    let pipeline = DefaultPipeline::from_settings(&settings)?;
    eprintln!(
        "{} {} with {}",
        "→".bright_cyan(),
        url.trim(),
        settings.provider.to_string().bold()
    );

    let outcome = pipeline.run(&url).await?;
    info!(
        url = %outcome.record.url,
        inserted = outcome.is_inserted(),
        store = %settings.store_path.display(),
        "run complete"
    );
    print_outcome(&outcome, &settings, cli.compact)
}

fn prompt_url() -> Result<String> {
    let url: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("VOLUNTEER URL")
        .interact_text()
        .context("Failed to read URL")?;

    if url.trim().is_empty() {
        bail!("No URL given");
    }
    Ok(url)
}

fn print_outcome(outcome: &RunOutcome, settings: &Settings, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(&outcome.record)
    } else {
        serde_json::to_string_pretty(&outcome.record)
    }
    .context("Failed to render record")?;
    println!("{json}");

    let store = settings.store_path.display();
    match outcome.insert {
        InsertOutcome::Inserted(id) => eprintln!(
            "{} Saved as record {} in {}",
            "✓".bright_green().bold(),
            id,
            store
        ),
        InsertOutcome::AlreadyExists => eprintln!(
            "{} {} already exists in {}. Skipping.",
            "•".bright_yellow().bold(),
            outcome.record.url,
            store
        ),
    }
    Ok(())
}
