//! Review records flowing into and out of the analysis pipeline.
//!
//! [`Review`] is the validated input row; [`EnrichedReview`] is the same row
//! after a batch pass, carrying either a sentiment and theme or the reason the
//! row could not be analysed.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SentiscopeError};

/// The banks whose app reviews are analysed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bank {
    /// Commercial Bank of Ethiopia
    #[serde(rename = "CBE")]
    Cbe,
    /// Bank of Abyssinia
    #[serde(rename = "BOA")]
    Boa,
    /// Dashen Bank
    Dashen,
}

impl Bank {
    /// All banks in a stable order.
    pub const ALL: [Bank; 3] = [Bank::Cbe, Bank::Boa, Bank::Dashen];

    /// Short identifier used as the bank key.
    pub fn code(&self) -> &'static str {
        match self {
            Bank::Cbe => "CBE",
            Bank::Boa => "BOA",
            Bank::Dashen => "Dashen",
        }
    }

    /// Name as listed on the app store.
    pub fn display_name(&self) -> &'static str {
        match self {
            Bank::Cbe => "Commercial Bank of Ethiopia (CBE)",
            Bank::Boa => "Bank of Abyssinia (BOA)",
            Bank::Dashen => "Dashen Bank",
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Bank {
    type Err = SentiscopeError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Bank::ALL
            .into_iter()
            .find(|bank| {
                trimmed.eq_ignore_ascii_case(bank.code())
                    || trimmed.eq_ignore_ascii_case(bank.display_name())
            })
            .ok_or_else(|| SentiscopeError::parse(format!("unknown bank: {trimmed:?}")))
    }
}

/// A cleaned customer review, immutable once constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Free-text review body.
    pub text: String,
    /// Star rating, 1 to 5.
    pub rating: u8,
    /// Calendar date the review was posted.
    pub date: NaiveDate,
    /// Bank whose app was reviewed.
    pub bank: Bank,
    /// Where the review was collected.
    pub source: String,
}

impl Review {
    /// Create a review, validating the rating range.
    pub fn new<T: Into<String>, S: Into<String>>(
        text: T,
        rating: u8,
        date: NaiveDate,
        bank: Bank,
        source: S,
    ) -> Result<Self> {
        if !(1..=5).contains(&rating) {
            return Err(SentiscopeError::invalid_argument(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
        Ok(Review {
            text: text.into(),
            rating,
            date,
            bank,
            source: source.into(),
        })
    }
}

/// An ordered batch of reviews analysed together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewBatch {
    /// Identifier used in logs and errors.
    pub id: String,
    pub reviews: Vec<Review>,
}

impl ReviewBatch {
    pub fn new<S: Into<String>>(id: S, reviews: Vec<Review>) -> Self {
        ReviewBatch {
            id: id.into(),
            reviews,
        }
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

/// Three-way sentiment label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Lower bound (inclusive) of a positive compound score.
    pub const POSITIVE_THRESHOLD: f64 = 0.05;
    /// Upper bound (inclusive) of a negative compound score.
    pub const NEGATIVE_THRESHOLD: f64 = -0.05;

    /// Label for a compound score.
    ///
    /// `score >= 0.05` is positive, `score <= -0.05` is negative, anything
    /// strictly between is neutral.
    pub fn from_score(score: f64) -> Self {
        if score >= Self::POSITIVE_THRESHOLD {
            SentimentLabel::Positive
        } else if score <= Self::NEGATIVE_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compound score and its label.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Aggregate polarity in `[-1, 1]`.
    pub compound_score: f64,
    /// Label derived from `compound_score`.
    pub label: SentimentLabel,
}

impl SentimentResult {
    /// Build a result whose label is derived from the score.
    pub fn from_score(compound_score: f64) -> Self {
        SentimentResult {
            compound_score,
            label: SentimentLabel::from_score(compound_score),
        }
    }
}

/// Reduced feature vector of one review.
pub type FeatureVector = Vec<f64>;

/// The thematic cluster a review was assigned to within its batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThemeAssignment {
    /// Opaque cluster id, `0 <= cluster_id < K_effective`. Run-local.
    pub cluster_id: usize,
    /// Squared Euclidean distance to the assigned centroid.
    pub distance: f64,
    /// The review's coordinates in the reduced space.
    pub features: FeatureVector,
}

/// Why a review was excluded from analysis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// The text normalized to zero tokens.
    EmptyContent,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::EmptyContent => f.write_str("EmptyContent"),
        }
    }
}

/// A review after one batch pass.
///
/// Either `sentiment` and `theme` are both set, or `failure` is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnrichedReview {
    /// Position of the review in the input batch.
    pub index: usize,
    /// The input row.
    pub review: Review,
    pub sentiment: Option<SentimentResult>,
    pub theme: Option<ThemeAssignment>,
    pub failure: Option<FailureReason>,
}

impl EnrichedReview {
    /// A successfully analysed review.
    pub fn analysed(
        index: usize,
        review: Review,
        sentiment: SentimentResult,
        theme: ThemeAssignment,
    ) -> Self {
        EnrichedReview {
            index,
            review,
            sentiment: Some(sentiment),
            theme: Some(theme),
            failure: None,
        }
    }

    /// A review that could not be analysed.
    pub fn failed(index: usize, review: Review, reason: FailureReason) -> Self {
        EnrichedReview {
            index,
            review,
            sentiment: None,
            theme: None,
            failure: Some(reason),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn cluster_id(&self) -> Option<usize> {
        self.theme.as_ref().map(|t| t.cluster_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_label_boundaries() {
        let cases = [
            (-0.05, SentimentLabel::Negative),
            (-0.0499, SentimentLabel::Neutral),
            (0.0, SentimentLabel::Neutral),
            (0.0499, SentimentLabel::Neutral),
            (0.05, SentimentLabel::Positive),
        ];
        for (score, expected) in cases {
            assert_eq!(SentimentLabel::from_score(score), expected, "score {score}");
        }
        assert_eq!(SentimentLabel::from_score(1.0), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(-1.0), SentimentLabel::Negative);
    }

    #[test]
    fn test_bank_parsing() {
        assert_eq!("CBE".parse::<Bank>().unwrap(), Bank::Cbe);
        assert_eq!("boa".parse::<Bank>().unwrap(), Bank::Boa);
        assert_eq!("Dashen Bank".parse::<Bank>().unwrap(), Bank::Dashen);
        assert_eq!(
            "Commercial Bank of Ethiopia (CBE)".parse::<Bank>().unwrap(),
            Bank::Cbe
        );
        assert!("Awash".parse::<Bank>().is_err());
    }

    #[test]
    fn test_bank_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Bank::Cbe).unwrap(), "\"CBE\"");
        assert_eq!(serde_json::to_string(&Bank::Dashen).unwrap(), "\"Dashen\"");
        let bank: Bank = serde_json::from_str("\"BOA\"").unwrap();
        assert_eq!(bank, Bank::Boa);
    }

    #[test]
    fn test_review_rating_validation() {
        assert!(Review::new("ok", 5, date(), Bank::Cbe, "Google Play Store").is_ok());
        assert!(Review::new("ok", 0, date(), Bank::Cbe, "Google Play Store").is_err());
        assert!(Review::new("ok", 6, date(), Bank::Cbe, "Google Play Store").is_err());
    }

    #[test]
    fn test_failed_review_serializes_null_markers() {
        let review = Review::new("", 3, date(), Bank::Boa, "Google Play Store").unwrap();
        let enriched = EnrichedReview::failed(1, review, FailureReason::EmptyContent);
        let value = serde_json::to_value(&enriched).unwrap();

        assert!(value["sentiment"].is_null());
        assert!(value["theme"].is_null());
        assert_eq!(value["failure"], "EmptyContent");
        assert_eq!(value["review"]["date"], "2024-06-01");
        assert!(enriched.is_failed());
        assert_eq!(enriched.cluster_id(), None);
    }
}
