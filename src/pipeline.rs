//! Batch orchestration: normalize, score, vectorize, reduce, cluster.
//!
//! [`Pipeline::run`] takes an ordered [`ReviewBatch`] and returns an
//! [`AnalyzedBatch`] with exactly one [`EnrichedReview`] per input row, in
//! input order. Rows whose text normalizes to nothing are marked failed and
//! kept out of the theme stages; everything else gets a sentiment and a
//! cluster id.
//!
//! ```
//! use chrono::NaiveDate;
//! use sentiscope::config::PipelineConfig;
//! use sentiscope::pipeline::Pipeline;
//! use sentiscope::review::{Bank, Review, ReviewBatch, SentimentLabel};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
//! let reviews = ["great app, love it", "", "terrible, crashes constantly"]
//!     .into_iter()
//!     .map(|text| Review::new(text, 3, date, Bank::Cbe, "Google Play Store").unwrap())
//!     .collect();
//!
//! let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//! let analyzed = pipeline.run(&ReviewBatch::new("doc", reviews)).unwrap();
//!
//! assert_eq!(analyzed.len(), 3);
//! assert_eq!(analyzed.reviews[0].sentiment.unwrap().label, SentimentLabel::Positive);
//! assert!(analyzed.reviews[1].is_failed());
//! assert_eq!(analyzed.reviews[2].sentiment.unwrap().label, SentimentLabel::Negative);
//! ```

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::TextNormalizer;
use crate::config::{PipelineConfig, ThemeScope};
use crate::error::{Result, SentiscopeError};
use crate::review::{
    Bank, EnrichedReview, FailureReason, Review, ReviewBatch, SentimentLabel, SentimentResult,
    ThemeAssignment,
};
use crate::sentiment::{Lexicon, SentimentScorer};
use crate::theme::{KMeans, Pca, TfIdfVectorizer};

/// Theme stage that had to shrink its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeStage {
    Reduction,
    Clustering,
}

impl fmt::Display for ThemeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeStage::Reduction => f.write_str("components"),
            ThemeStage::Clustering => f.write_str("clusters"),
        }
    }
}

/// A non-fatal change the pipeline made to fit a small or degenerate batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Adjustment {
    /// Fewer components or clusters than configured could be fit.
    DegenerateBatch {
        stage: ThemeStage,
        /// The bank partition, when themes are fit per bank.
        partition: Option<Bank>,
        requested: usize,
        effective: usize,
        reason: String,
    },
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::DegenerateBatch {
                stage,
                partition,
                requested,
                effective,
                reason,
            } => {
                write!(f, "DegenerateBatch: {stage} reduced from {requested} to {effective}")?;
                if let Some(bank) = partition {
                    write!(f, " for {bank}")?;
                }
                write!(f, " ({reason})")
            }
        }
    }
}

/// Theme fit statistics of one partition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionSummary {
    /// `None` when themes were fit over the whole batch.
    pub partition: Option<Bank>,
    pub reviews: usize,
    pub vocabulary_size: usize,
    pub n_components: usize,
    pub explained_variance_ratio: f64,
    pub n_clusters: usize,
    pub iterations: usize,
    pub converged: bool,
}

/// Counts over one analysed batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub analysed: usize,
    pub failed: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub partitions: Vec<PartitionSummary>,
}

/// The enriched output of one batch pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedBatch {
    pub batch_id: String,
    /// One row per input review, in input order.
    pub reviews: Vec<EnrichedReview>,
    pub adjustments: Vec<Adjustment>,
    pub summary: BatchSummary,
}

impl AnalyzedBatch {
    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Rows that could not be analysed.
    pub fn failed(&self) -> impl Iterator<Item = &EnrichedReview> {
        self.reviews.iter().filter(|r| r.is_failed())
    }

    /// Rows with a sentiment and theme.
    pub fn analysed(&self) -> impl Iterator<Item = &EnrichedReview> {
        self.reviews.iter().filter(|r| !r.is_failed())
    }
}

/// Per-row output of the normalize and score stage.
type RowOutcome = Option<(Vec<String>, SentimentResult)>;

/// Theme output of one partition.
struct PartitionThemes {
    assignments: Vec<(usize, ThemeAssignment)>,
    summary: PartitionSummary,
    adjustments: Vec<Adjustment>,
}

/// The review analysis pipeline.
///
/// All models are rebuilt for every batch; only the configuration and the
/// lexicon are shared between runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    normalizer: TextNormalizer,
    scorer: SentimentScorer,
    vectorizer: TfIdfVectorizer,
    reducer: Pca,
    clusterer: KMeans,
}

impl Pipeline {
    /// Build a pipeline, loading the lexicon named by the configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let lexicon = match &config.sentiment.lexicon_path {
            Some(path) => {
                log::info!("loading sentiment lexicon from {}", path.display());
                Lexicon::from_json_file(path, config.sentiment.extend_default_lexicon)?
            }
            None => Lexicon::default(),
        };
        Self::with_lexicon(config, Arc::new(lexicon))
    }

    /// Build a pipeline around an explicit lexicon.
    pub fn with_lexicon(config: PipelineConfig, lexicon: Arc<Lexicon>) -> Result<Self> {
        config.validate()?;
        Ok(Pipeline {
            normalizer: TextNormalizer::with_config(&config.normalizer)?,
            scorer: SentimentScorer::new(lexicon),
            vectorizer: TfIdfVectorizer::new(config.vectorizer.clone()),
            reducer: Pca::new(config.reducer.clone()),
            clusterer: KMeans::new(config.clusterer.clone()),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn scorer(&self) -> &SentimentScorer {
        &self.scorer
    }

    /// Normalize and score a single text.
    pub fn score_text(&self, raw: &str) -> Result<SentimentResult> {
        self.scorer.score(&self.normalizer.normalize(raw)?)
    }

    /// Analyse one batch.
    ///
    /// Either the whole batch is returned or an error; a batch whose
    /// successful rows yield no vocabulary fails with
    /// [`SentiscopeError::VocabularyEmpty`].
    pub fn run(&self, batch: &ReviewBatch) -> Result<AnalyzedBatch> {
        log::info!("analysing batch '{}' ({} reviews)", batch.id, batch.len());
        if batch.is_empty() {
            return Ok(AnalyzedBatch {
                batch_id: batch.id.clone(),
                reviews: Vec::new(),
                adjustments: Vec::new(),
                summary: BatchSummary::default(),
            });
        }

        let outcomes = self.score_rows(&batch.reviews)?;
        let failed = outcomes.iter().filter(|o| o.is_none()).count();
        if failed == batch.len() {
            return Err(SentiscopeError::vocabulary_empty(
                batch.id.clone(),
                batch.len(),
                failed,
            ));
        }
        if failed > 0 {
            log::debug!("batch '{}': {failed} reviews have empty content", batch.id);
        }

        let mut themes: Vec<Option<ThemeAssignment>> = vec![None; batch.len()];
        let mut adjustments = Vec::new();
        let mut partitions = Vec::new();

        let mut fitted_partitions = 0;
        for (partition, indices) in self.partitions(batch, &outcomes) {
            let fitted = match self.fit_themes(partition, &indices, &outcomes) {
                Ok(fitted) => {
                    fitted_partitions += 1;
                    fitted
                }
                Err(SentiscopeError::VocabularyEmpty { .. }) => {
                    self.single_theme(partition, &indices)
                }
                Err(e) => return Err(e),
            };
            for (index, assignment) in fitted.assignments {
                themes[index] = Some(assignment);
            }
            for adjustment in &fitted.adjustments {
                log::warn!("batch '{}': {adjustment}", batch.id);
            }
            adjustments.extend(fitted.adjustments);
            partitions.push(fitted.summary);
        }
        if fitted_partitions == 0 {
            return Err(SentiscopeError::vocabulary_empty(
                batch.id.clone(),
                batch.len(),
                failed,
            ));
        }

        let mut summary = BatchSummary {
            total: batch.len(),
            partitions,
            ..BatchSummary::default()
        };
        let mut reviews = Vec::with_capacity(batch.len());
        for (index, (review, outcome)) in batch.reviews.iter().zip(outcomes).enumerate() {
            let enriched = match outcome {
                Some((_, sentiment)) => {
                    let theme = themes[index].take().ok_or_else(|| {
                        SentiscopeError::internal(format!("review {index} has no theme"))
                    })?;
                    match sentiment.label {
                        SentimentLabel::Positive => summary.positive += 1,
                        SentimentLabel::Neutral => summary.neutral += 1,
                        SentimentLabel::Negative => summary.negative += 1,
                    }
                    summary.analysed += 1;
                    EnrichedReview::analysed(index, review.clone(), sentiment, theme)
                }
                None => {
                    summary.failed += 1;
                    EnrichedReview::failed(index, review.clone(), FailureReason::EmptyContent)
                }
            };
            reviews.push(enriched);
        }

        log::info!(
            "batch '{}' done: {} analysed, {} failed, {} adjustments",
            batch.id,
            summary.analysed,
            summary.failed,
            adjustments.len()
        );

        Ok(AnalyzedBatch {
            batch_id: batch.id.clone(),
            reviews,
            adjustments,
            summary,
        })
    }

    /// Normalize and score every row, keeping input order.
    fn score_rows(&self, reviews: &[Review]) -> Result<Vec<RowOutcome>> {
        let score = |review: &Review| -> Result<RowOutcome> {
            match self.normalizer.normalize(&review.text) {
                Ok(normalized) => {
                    let sentiment = self.scorer.score(&normalized)?;
                    Ok(Some((normalized.terms, sentiment)))
                }
                Err(e) if e.is_per_review() => Ok(None),
                Err(e) => Err(e),
            }
        };

        if self.config.parallel && reviews.len() > self.config.parallel_threshold {
            reviews.par_iter().map(score).collect()
        } else {
            reviews.iter().map(score).collect()
        }
    }

    /// Row indices of the successful reviews, grouped by theme scope.
    fn partitions(
        &self,
        batch: &ReviewBatch,
        outcomes: &[RowOutcome],
    ) -> Vec<(Option<Bank>, Vec<usize>)> {
        let succeeded = |bank: Option<Bank>| -> Vec<usize> {
            outcomes
                .iter()
                .enumerate()
                .filter(|(i, o)| o.is_some() && bank.is_none_or(|b| batch.reviews[*i].bank == b))
                .map(|(i, _)| i)
                .collect()
        };

        match self.config.theme_scope {
            ThemeScope::Batch => vec![(None, succeeded(None))],
            ThemeScope::PerBank => Bank::ALL
                .into_iter()
                .map(|bank| (Some(bank), succeeded(Some(bank))))
                .filter(|(_, indices)| !indices.is_empty())
                .collect(),
        }
    }

    /// Vectorize, reduce and cluster one partition of successful rows.
    ///
    /// Fails with [`SentiscopeError::VocabularyEmpty`] when no term of the
    /// partition survives the document-frequency thresholds.
    fn fit_themes(
        &self,
        partition: Option<Bank>,
        indices: &[usize],
        outcomes: &[RowOutcome],
    ) -> Result<PartitionThemes> {
        let documents: Vec<&Vec<String>> = indices
            .iter()
            .filter_map(|&i| outcomes[i].as_ref().map(|(terms, _)| terms))
            .collect();

        let matrix = self.vectorizer.fit_transform(&documents)?;
        log::debug!(
            "partition {partition:?}: {} documents, vocabulary of {}",
            matrix.n_rows(),
            matrix.n_columns()
        );

        let reduction = self.reducer.fit_transform(&matrix.to_dense())?;
        let clustering = self.clusterer.fit(&reduction.projected)?;

        let mut adjustments = Vec::new();
        if reduction.n_components() < reduction.requested {
            let mut reason = format!(
                "{} reviews with {} vocabulary terms",
                matrix.n_rows(),
                matrix.n_columns()
            );
            if reduction.dropped > 0 {
                reason.push_str(&format!(
                    ", {} components with zero variance",
                    reduction.dropped
                ));
            }
            adjustments.push(Adjustment::DegenerateBatch {
                stage: ThemeStage::Reduction,
                partition,
                requested: reduction.requested,
                effective: reduction.n_components(),
                reason,
            });
        }
        if clustering.n_clusters() < clustering.requested {
            adjustments.push(Adjustment::DegenerateBatch {
                stage: ThemeStage::Clustering,
                partition,
                requested: clustering.requested,
                effective: clustering.n_clusters(),
                reason: format!("only {} distinct feature vectors", clustering.distinct_points),
            });
        }

        let assignments = indices
            .iter()
            .enumerate()
            .map(|(row, &index)| {
                (
                    index,
                    ThemeAssignment {
                        cluster_id: clustering.labels[row],
                        distance: clustering.distances[row],
                        features: reduction.projected.row(row).to_vec(),
                    },
                )
            })
            .collect();

        Ok(PartitionThemes {
            assignments,
            summary: PartitionSummary {
                partition,
                reviews: indices.len(),
                vocabulary_size: matrix.n_columns(),
                n_components: reduction.n_components(),
                explained_variance_ratio: reduction.model.explained_variance_ratio.sum(),
                n_clusters: clustering.n_clusters(),
                iterations: clustering.iterations,
                converged: clustering.converged,
            },
            adjustments,
        })
    }

    /// Put every row of a partition without vocabulary into cluster 0.
    fn single_theme(&self, partition: Option<Bank>, indices: &[usize]) -> PartitionThemes {
        let reason = format!(
            "no vocabulary term of {} reviews passes the document-frequency thresholds",
            indices.len()
        );
        let adjustments = vec![
            Adjustment::DegenerateBatch {
                stage: ThemeStage::Reduction,
                partition,
                requested: self.config.reducer.n_components,
                effective: 0,
                reason: reason.clone(),
            },
            Adjustment::DegenerateBatch {
                stage: ThemeStage::Clustering,
                partition,
                requested: self.config.clusterer.n_clusters,
                effective: 1,
                reason,
            },
        ];

        let assignments = indices
            .iter()
            .map(|&index| {
                (
                    index,
                    ThemeAssignment {
                        cluster_id: 0,
                        distance: 0.0,
                        features: Vec::new(),
                    },
                )
            })
            .collect();

        PartitionThemes {
            assignments,
            summary: PartitionSummary {
                partition,
                reviews: indices.len(),
                vocabulary_size: 0,
                n_components: 0,
                explained_variance_ratio: 0.0,
                n_clusters: 1,
                iterations: 0,
                converged: true,
            },
            adjustments,
        }
    }
}
