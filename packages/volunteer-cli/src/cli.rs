//! Command-line arguments and how they override environment settings.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use opportunity_extraction::{ModelProvider, Settings};

/// Extract a volunteer opportunity from a webpage and save it to a JSON store.
#[derive(Debug, Parser)]
#[command(name = "volunteer", version, about)]
pub struct Cli {
    /// Page to extract from. Prompted for when omitted.
    pub url: Option<String>,

    /// LLM backend: "gemini" or "gpt" (overrides VOLUNTEER_MODEL)
    #[arg(short, long)]
    pub model: Option<ModelProvider>,

    /// JSON store file (overrides VOLUNTEER_STORE)
    #[arg(short, long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Domain strategy table in TOML (overrides VOLUNTEER_DOMAINS)
    #[arg(short, long, value_name = "PATH")]
    pub domains: Option<PathBuf>,

    /// Page fetch timeout in seconds (overrides FETCH_TIMEOUT_SECS)
    #[arg(short, long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Print the record on a single line
    #[arg(long)]
    pub compact: bool,

    /// Log pipeline stages to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Environment variables replaced by flags given on this command line.
    pub fn shadowed_vars(&self) -> Vec<&'static str> {
        [
            (self.model.is_some(), "VOLUNTEER_MODEL"),
            (self.store.is_some(), "VOLUNTEER_STORE"),
            (self.domains.is_some(), "VOLUNTEER_DOMAINS"),
            (self.timeout.is_some(), "FETCH_TIMEOUT_SECS"),
        ]
        .into_iter()
        .filter_map(|(given, var)| given.then_some(var))
        .collect()
    }

    /// Apply flags on top of settings read from the environment.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(provider) = self.model {
            settings = settings.with_provider(provider);
        }
        if let Some(store) = &self.store {
            settings = settings.with_store_path(store);
        }
        if let Some(domains) = &self.domains {
            settings = settings.with_domains_path(domains);
        }
        if let Some(secs) = self.timeout {
            settings = settings.with_timeout(Duration::from_secs(secs));
        }
        settings
    }

    /// Default log filter when RUST_LOG is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "info,opportunity_extraction=debug,volunteer=debug"
        } else {
            "warn"
        }
    }
}
