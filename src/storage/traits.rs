//! Review store trait and row types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SentiscopeError};
use crate::pipeline::AnalyzedBatch;
use crate::review::{Bank, EnrichedReview, FailureReason, SentimentLabel};

/// Primary key of a bank row.
pub type BankId = u32;

/// A row of the banks relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    pub bank_id: BankId,
    pub bank: Bank,
    /// Display name, unique per bank.
    pub bank_name: String,
    /// Where the bank's reviews were collected.
    pub app_source: String,
}

/// A row of the reviews relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReview {
    pub review_id: u64,
    /// Foreign key into the banks relation.
    pub bank_id: BankId,
    /// Batch the review was analysed in. Cluster ids are only comparable
    /// between rows of the same batch.
    #[serde(default)]
    pub batch_id: String,
    pub review_text: String,
    pub rating: u8,
    pub review_date: NaiveDate,
    /// Compound score at `DECIMAL(5,4)` precision.
    ///
    /// `sentiment` is derived from the full-precision score, so a score just
    /// inside the neutral band (e.g. `0.049996`) is stored as `0.05` next to a
    /// `Neutral` label.
    pub compound_score: Option<f64>,
    pub sentiment: Option<SentimentLabel>,
    /// Cluster id, local to `batch_id`.
    pub theme: Option<usize>,
    pub failure: Option<FailureReason>,
}

impl StoredReview {
    /// Build the row for an enriched review.
    pub fn from_enriched(
        review_id: u64,
        bank_id: BankId,
        batch_id: &str,
        enriched: &EnrichedReview,
    ) -> Self {
        StoredReview {
            review_id,
            bank_id,
            batch_id: batch_id.to_string(),
            review_text: enriched.review.text.clone(),
            rating: enriched.review.rating,
            review_date: enriched.review.date,
            compound_score: enriched.sentiment.map(|s| round_score(s.compound_score)),
            sentiment: enriched.sentiment.map(|s| s.label),
            theme: enriched.cluster_id(),
            failure: enriched.failure,
        }
    }
}

/// One row of `reviews ⋈ banks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedReview {
    pub bank: BankRecord,
    pub review: StoredReview,
}

/// Relational store for banks and enriched reviews.
pub trait ReviewStore: Send + Sync + std::fmt::Debug {
    /// Return the id of `bank`, inserting it first if it is absent.
    fn ensure_bank(&self, bank: Bank, app_source: &str) -> Result<BankId>;

    /// Insert the enriched reviews of batch `batch_id`, creating their banks
    /// as needed.
    ///
    /// All-or-nothing: every row is validated before any row is written.
    /// Returns the number of rows inserted.
    fn insert_reviews(&self, batch_id: &str, reviews: &[EnrichedReview]) -> Result<usize>;

    /// Insert every row of an analysed batch.
    fn insert_batch(&self, batch: &AnalyzedBatch) -> Result<usize> {
        self.insert_reviews(&batch.batch_id, &batch.reviews)
    }

    /// All bank rows, ordered by id.
    fn banks(&self) -> Result<Vec<BankRecord>>;

    /// All review rows, ordered by id.
    fn reviews(&self) -> Result<Vec<StoredReview>>;

    /// Every review joined with its bank, ordered by review id.
    fn joined(&self) -> Result<Vec<JoinedReview>>;

    /// Number of stored reviews.
    fn review_count(&self) -> Result<usize> {
        Ok(self.reviews()?.len())
    }
}

/// Round a compound score to the `DECIMAL(5,4)` precision the reviews
/// relation keeps. Labels are never recomputed from the rounded value.
pub fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

/// Check an enriched review against the reviews relation's constraints.
pub fn validate_row(enriched: &EnrichedReview) -> Result<()> {
    let index = enriched.index;
    if enriched.review.text.is_empty() && enriched.failure.is_none() {
        return Err(SentiscopeError::storage(format!(
            "review {index}: empty text without a failure marker"
        )));
    }
    if !(1..=5).contains(&enriched.review.rating) {
        return Err(SentiscopeError::storage(format!(
            "review {index}: rating {} outside 1..=5",
            enriched.review.rating
        )));
    }
    let analysed = enriched.sentiment.is_some() && enriched.theme.is_some();
    let failed = enriched.sentiment.is_none() && enriched.theme.is_none();
    match (analysed, failed, enriched.failure.is_some()) {
        (true, _, false) | (_, true, true) => Ok(()),
        _ => Err(SentiscopeError::storage(format!(
            "review {index}: must carry either a sentiment and theme or a failure"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{Review, SentimentResult, ThemeAssignment};

    fn enriched() -> EnrichedReview {
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let review = Review::new("slow app", 2, date, Bank::Cbe, "Google Play Store").unwrap();
        EnrichedReview::analysed(
            0,
            review,
            SentimentResult::from_score(-0.123456),
            ThemeAssignment {
                cluster_id: 3,
                distance: 0.1,
                features: vec![0.5, -0.5],
            },
        )
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(-0.123456), -0.1235);
        assert_eq!(round_score(0.87654321), 0.8765);
        assert_eq!(round_score(0.0), 0.0);
    }

    #[test]
    fn test_from_enriched() {
        let row = StoredReview::from_enriched(7, 2, "2024-04", &enriched());
        assert_eq!(row.review_id, 7);
        assert_eq!(row.bank_id, 2);
        assert_eq!(row.batch_id, "2024-04");
        assert_eq!(row.compound_score, Some(-0.1235));
        assert_eq!(row.sentiment, Some(SentimentLabel::Negative));
        assert_eq!(row.theme, Some(3));
        assert_eq!(row.failure, None);
    }

    #[test]
    fn test_label_keeps_full_precision_score() {
        let mut review = enriched();
        review.sentiment = Some(SentimentResult::from_score(0.049996));

        let row = StoredReview::from_enriched(1, 1, "b", &review);
        assert_eq!(row.compound_score, Some(0.05));
        assert_eq!(row.sentiment, Some(SentimentLabel::Neutral));
    }

    #[test]
    fn test_validate_row() {
        assert!(validate_row(&enriched()).is_ok());

        let mut half = enriched();
        half.theme = None;
        assert!(validate_row(&half).is_err());

        let mut both = enriched();
        both.failure = Some(FailureReason::EmptyContent);
        assert!(validate_row(&both).is_err());
    }
}
