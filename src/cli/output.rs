//! Output formatting for CLI commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, SentiscopeArgs};
use crate::error::Result;
use crate::ingest::CleaningReport;
use crate::pipeline::{Adjustment, BatchSummary};
use crate::review::SentimentLabel;

/// Result structure for cleaning.
#[derive(Debug, Serialize, Deserialize)]
pub struct CleanResult {
    pub output: String,
    pub report: CleaningReport,
}

/// Result structure for a batch analysis.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub batch_id: String,
    pub summary: BatchSummary,
    pub adjustments: Vec<Adjustment>,
    pub output: Option<String>,
    pub stored: Option<usize>,
    pub duration_ms: u64,
}

/// Result structure for scoring a single text.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResult {
    pub text: String,
    pub compound_score: f64,
    pub label: SentimentLabel,
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &SentiscopeArgs) -> Result<()>
where
    T: Serialize + fmt::Display,
{
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: fmt::Display>(message: &str, result: &T, args: &SentiscopeArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!("{}", "═".repeat(message.chars().count()));
    }
    print!("{result}");
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &SentiscopeArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

impl fmt::Display for CleanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = &self.report;
        writeln!(f, "Raw records:     {}", report.raw_count)?;
        writeln!(f, "Kept:            {}", report.kept)?;
        writeln!(f, "Missing content: {}", report.missing_content)?;
        writeln!(f, "Invalid rating:  {}", report.invalid_rating)?;
        writeln!(f, "Invalid date:    {}", report.invalid_date)?;
        writeln!(f, "Unknown bank:    {}", report.unknown_bank)?;
        writeln!(f, "Duplicates:      {}", report.duplicates)?;
        for (bank, count) in &report.per_bank {
            writeln!(f, "  {:<8} {count}", bank.code())?;
        }
        writeln!(f, "Written to {}", self.output)
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = &self.summary;
        writeln!(
            f,
            "Batch {}: {} reviews ({} analysed, {} failed) in {}ms",
            self.batch_id, summary.total, summary.analysed, summary.failed, self.duration_ms
        )?;
        writeln!(
            f,
            "Sentiment: positive={} neutral={} negative={}",
            summary.positive, summary.neutral, summary.negative
        )?;
        for partition in &summary.partitions {
            let scope = partition
                .partition
                .map_or_else(|| "batch".to_string(), |bank| bank.code().to_string());
            writeln!(
                f,
                "  {scope:<8} {} reviews, {} terms, {} components ({:.1}% variance), {} clusters",
                partition.reviews,
                partition.vocabulary_size,
                partition.n_components,
                partition.explained_variance_ratio * 100.0,
                partition.n_clusters
            )?;
        }
        for adjustment in &self.adjustments {
            writeln!(f, "Note: {adjustment}")?;
        }
        if let Some(output) = &self.output {
            writeln!(f, "Written to {output}")?;
        }
        if let Some(stored) = self.stored {
            writeln!(f, "Stored {stored} reviews")?;
        }
        Ok(())
    }
}

impl fmt::Display for ScoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:+.4} {}", self.compound_score, self.label)
    }
}
