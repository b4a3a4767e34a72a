//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use paper_vis_core::config::{ConfigOverrides, Profile};

/// Upload papers to the analysis service and report the result.
#[derive(Parser, Debug)]
#[command(name = "paper-vis")]
#[command(author, version)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base URL of the analysis service (overrides profile and environment)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Deployment profile: development or production
    #[arg(long, global = true, value_parser = parse_profile)]
    pub profile: Option<Profile>,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// The command-line layer of the service configuration.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            profile: self.profile,
            base_url: self.base_url.clone(),
            ..ConfigOverrides::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a PDF and wait for its analysis
    Analyze(AnalyzeArgs),
    /// Check whether the analysis endpoint is reachable
    Health,
    /// Two-step upload/analyze workflow of older service versions
    #[command(subcommand)]
    Legacy(LegacyCommand),
}

#[derive(ClapArgs, Debug)]
pub struct AnalyzeArgs {
    /// Document to analyze
    pub file: PathBuf,

    /// Declared media type (default: guessed from the file extension)
    #[arg(long, value_name = "TYPE")]
    pub media_type: Option<String>,

    /// Print the full result envelope as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Subcommand, Debug)]
pub enum LegacyCommand {
    /// Upload a document to the /upload endpoint
    Upload {
        /// Document to upload
        file: PathBuf,
    },
    /// Start analysis of an uploaded folder via /analyze
    Analyze {
        /// Folder id returned by the upload
        folder_id: String,
    },
}

fn parse_profile(value: &str) -> Result<Profile, String> {
    value.parse::<Profile>().map_err(|error| error.to_string())
}
