//! Command line argument parsing for the Sentiscope CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ThemeScope;

/// Sentiscope - sentiment and theme analysis for banking app reviews
#[derive(Parser, Debug, Clone)]
#[command(name = "sentiscope")]
#[command(about = "Sentiment scoring and theme clustering for banking app reviews")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct SentiscopeArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl SentiscopeArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Clean scraped records into validated reviews
    Clean(CleanArgs),

    /// Score and cluster a batch of cleaned reviews
    Analyze(AnalyzeArgs),

    /// Score the sentiment of a single text
    Score(ScoreArgs),

    /// Summarize stored or analyzed reviews
    Report(ReportArgs),
}

/// Arguments for cleaning scraped records
#[derive(Parser, Debug, Clone)]
pub struct CleanArgs {
    /// Scraped records as a JSON array
    #[arg(value_name = "RAW_FILE")]
    pub input: PathBuf,

    /// Where to write the cleaned reviews (JSON Lines)
    #[arg(short, long, value_name = "OUTPUT_FILE")]
    pub output: PathBuf,
}

/// Arguments for analyzing a batch
#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Cleaned reviews (JSON Lines)
    #[arg(value_name = "REVIEWS_FILE")]
    pub input: PathBuf,

    /// Pipeline configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Identifier of the batch, used in logs and errors
    #[arg(long, default_value = "batch")]
    pub batch_id: String,

    /// Fit themes over the whole batch or per bank (overrides the config)
    #[arg(long)]
    pub scope: Option<ScopeArg>,

    /// Write the enriched reviews here (JSON Lines)
    #[arg(short, long, value_name = "OUTPUT_FILE")]
    pub output: Option<PathBuf>,

    /// Append the enriched reviews to this store snapshot
    #[arg(long, value_name = "STORE_FILE")]
    pub store: Option<PathBuf>,
}

/// Arguments for scoring a single text
#[derive(Parser, Debug, Clone)]
pub struct ScoreArgs {
    /// Review text to score
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Pipeline configuration file (JSON), for a custom lexicon
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for reporting
#[derive(Parser, Debug, Clone)]
pub struct ReportArgs {
    /// Store snapshot to report on
    #[arg(long, value_name = "STORE_FILE", conflicts_with = "input")]
    pub store: Option<PathBuf>,

    /// Enriched reviews written by `analyze --output` (JSON Lines)
    #[arg(value_name = "ANALYZED_FILE", required_unless_present = "store")]
    pub input: Option<PathBuf>,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Theme scope as spelled on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeArg {
    /// One theme space for the whole batch
    Batch,
    /// One theme space per bank
    PerBank,
}

impl From<ScopeArg> for ThemeScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Batch => ThemeScope::Batch,
            ScopeArg::PerBank => ThemeScope::PerBank,
        }
    }
}
