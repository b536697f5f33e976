//! Command implementations for the Sentiscope CLI.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::ingest;
use crate::pipeline::Pipeline;
use crate::report::InsightReport;
use crate::review::{EnrichedReview, ReviewBatch};
use crate::storage::{MemoryReviewStore, ReviewStore};

/// Execute a CLI command.
pub fn execute_command(args: SentiscopeArgs) -> Result<()> {
    match &args.command {
        Command::Clean(clean_args) => clean_reviews(clean_args.clone(), &args),
        Command::Analyze(analyze_args) => analyze_batch(analyze_args.clone(), &args),
        Command::Score(score_args) => score_text(score_args.clone(), &args),
        Command::Report(report_args) => show_report(report_args.clone(), &args),
    }
}

/// Clean scraped records and write them as JSON Lines.
fn clean_reviews(args: CleanArgs, cli_args: &SentiscopeArgs) -> Result<()> {
    log::info!("reading scraped records from {}", args.input.display());
    let raw = ingest::read_raw_json(&args.input)?;
    let cleaned = ingest::clean(raw);

    create_parent_dirs(&args.output)?;
    let writer = BufWriter::new(File::create(&args.output)?);
    ingest::write_jsonl(writer, &cleaned.reviews)?;

    output_result(
        "Reviews cleaned",
        &CleanResult {
            output: args.output.to_string_lossy().to_string(),
            report: cleaned.report,
        },
        cli_args,
    )
}

/// Run the pipeline over one batch of cleaned reviews.
fn analyze_batch(args: AnalyzeArgs, cli_args: &SentiscopeArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(scope) = args.scope {
        config.theme_scope = scope.into();
    }
    let pipeline = Pipeline::new(config)?;

    let reviews = ingest::read_reviews_jsonl(&args.input)?;
    let batch = ReviewBatch::new(args.batch_id, reviews);

    let start_time = Instant::now();
    let analyzed = pipeline.run(&batch)?;
    let duration = start_time.elapsed();

    if let Some(output) = &args.output {
        create_parent_dirs(output)?;
        let writer = BufWriter::new(File::create(output)?);
        ingest::write_jsonl(writer, &analyzed.reviews)?;
    }

    let stored = match &args.store {
        Some(path) => {
            let store = MemoryReviewStore::load(path)?;
            let inserted = store.insert_batch(&analyzed)?;
            create_parent_dirs(path)?;
            store.save(path)?;
            log::info!("store {} now holds {} reviews", path.display(), store.review_count()?);
            Some(inserted)
        }
        None => None,
    };

    output_result(
        "Batch analyzed",
        &AnalysisResult {
            batch_id: analyzed.batch_id,
            summary: analyzed.summary,
            adjustments: analyzed.adjustments,
            output: args.output.map(|p| p.to_string_lossy().to_string()),
            stored,
            duration_ms: duration.as_millis() as u64,
        },
        cli_args,
    )
}

/// Score a single text.
fn score_text(args: ScoreArgs, cli_args: &SentiscopeArgs) -> Result<()> {
    let pipeline = Pipeline::new(load_config(args.config.as_deref())?)?;
    let sentiment = pipeline.score_text(&args.text)?;

    output_result(
        "Sentiment",
        &ScoreResult {
            text: args.text,
            compound_score: sentiment.compound_score,
            label: sentiment.label,
        },
        cli_args,
    )
}

/// Summarize a store snapshot or an analyzed JSON Lines file.
fn show_report(args: ReportArgs, cli_args: &SentiscopeArgs) -> Result<()> {
    let store = match (&args.store, &args.input) {
        (Some(path), _) => MemoryReviewStore::load(path)?,
        (None, Some(path)) => {
            let reviews: Vec<EnrichedReview> = ingest::read_jsonl(path)?;
            let batch_id = path
                .file_stem()
                .map_or_else(|| "batch".to_string(), |s| s.to_string_lossy().to_string());
            let store = MemoryReviewStore::new();
            store.insert_reviews(&batch_id, &reviews)?;
            store
        }
        (None, None) => {
            return Err(crate::error::SentiscopeError::invalid_argument(
                "report needs --store or an analyzed file",
            ));
        }
    };

    let report = InsightReport::from_rows(&store.joined()?);
    output_result("Review insights", &report, cli_args)
}

/// Load a configuration file, or the defaults when none is given.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            log::info!("loading configuration from {}", path.display());
            PipelineConfig::from_file(path)
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn create_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
