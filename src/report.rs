//! Aggregate insights over stored reviews.
//!
//! [`InsightReport::from_rows`] consumes the joined `reviews ⋈ banks` rows
//! and computes the figures a written report is built from: sentiment
//! distributions, rating averages and histograms, cluster sizes, monthly
//! sentiment trends, and the headline comparisons between banks.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::review::{Bank, SentimentLabel};
use crate::storage::JoinedReview;

/// Number of negative themes listed per bank.
const TOP_NEGATIVE_THEMES: usize = 5;

/// Share of each label among analysed reviews, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentShare {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl SentimentShare {
    fn from_counts(counts: &BTreeMap<SentimentLabel, usize>) -> Self {
        let total: usize = counts.values().sum();
        if total == 0 {
            return Self::default();
        }
        let percent = |label| counts.get(&label).copied().unwrap_or(0) as f64 * 100.0 / total as f64;
        SentimentShare {
            positive: percent(SentimentLabel::Positive),
            neutral: percent(SentimentLabel::Neutral),
            negative: percent(SentimentLabel::Negative),
        }
    }
}

/// Review count of one cluster.
///
/// Cluster ids are local to the batch that produced them, so a theme is
/// identified by both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeCount {
    pub batch_id: String,
    pub cluster_id: usize,
    pub reviews: usize,
}

/// Mean compound score of one bank in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// `YYYY-MM`
    pub month: String,
    pub reviews: usize,
    pub mean_compound: f64,
}

/// Figures for one bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankInsight {
    pub bank: Bank,
    pub bank_name: String,
    pub reviews: usize,
    pub failed: usize,
    pub average_rating: f64,
    pub sentiment: SentimentShare,
    /// Reviews per theme, ordered by batch then cluster id.
    pub cluster_sizes: Vec<ThemeCount>,
    /// Themes with the most negative reviews, most frequent first.
    pub top_negative_themes: Vec<ThemeCount>,
    /// Monthly trend, oldest month first.
    pub monthly_trend: Vec<TrendPoint>,
}

/// Aggregate figures over a set of stored reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub total_reviews: usize,
    pub failed_reviews: usize,
    /// Label counts over all analysed reviews.
    pub sentiment_distribution: BTreeMap<SentimentLabel, usize>,
    /// Reviews per star rating, 1 to 5.
    pub rating_histogram: BTreeMap<u8, usize>,
    /// Banks ordered by average rating, highest first.
    pub average_ratings: Vec<(Bank, f64)>,
    pub banks: Vec<BankInsight>,
    pub highest_rated: Option<Bank>,
    pub most_positive: Option<Bank>,
    pub most_negative: Option<Bank>,
}

#[derive(Default)]
struct BankAccumulator {
    bank_name: String,
    reviews: usize,
    failed: usize,
    rating_sum: u64,
    labels: BTreeMap<SentimentLabel, usize>,
    clusters: BTreeMap<(String, usize), usize>,
    negative_clusters: BTreeMap<(String, usize), usize>,
    months: BTreeMap<(i32, u32), (usize, f64)>,
}

impl InsightReport {
    /// Compute the report from joined rows.
    pub fn from_rows(rows: &[JoinedReview]) -> Self {
        let mut sentiment_distribution = BTreeMap::new();
        let mut rating_histogram: BTreeMap<u8, usize> = (1..=5).map(|r| (r, 0)).collect();
        let mut per_bank: BTreeMap<Bank, BankAccumulator> = BTreeMap::new();
        let mut failed_reviews = 0;

        for row in rows {
            let review = &row.review;
            let acc = per_bank.entry(row.bank.bank).or_default();
            acc.bank_name.clone_from(&row.bank.bank_name);
            acc.reviews += 1;
            acc.rating_sum += u64::from(review.rating);
            *rating_histogram.entry(review.rating).or_insert(0) += 1;

            if review.failure.is_some() {
                acc.failed += 1;
                failed_reviews += 1;
                continue;
            }

            if let Some(label) = review.sentiment {
                *sentiment_distribution.entry(label).or_insert(0) += 1;
                *acc.labels.entry(label).or_insert(0) += 1;
                if let (SentimentLabel::Negative, Some(theme)) = (label, review.theme) {
                *acc.negative_clusters
                    .entry((review.batch_id.clone(), theme))
                    .or_insert(0) += 1;
                }
            }
            if let Some(theme) = review.theme {
                *acc.clusters
                    .entry((review.batch_id.clone(), theme))
                    .or_insert(0) += 1;
            }
            if let Some(score) = review.compound_score {
                let key = (review.review_date.year(), review.review_date.month());
                let month = acc.months.entry(key).or_insert((0, 0.0));
                month.0 += 1;
                month.1 += score;
            }
        }

        let banks: Vec<BankInsight> = per_bank
            .into_iter()
            .map(|(bank, acc)| bank_insight(bank, acc))
            .collect();

        let mut average_ratings: Vec<(Bank, f64)> =
            banks.iter().map(|b| (b.bank, b.average_rating)).collect();
        average_ratings.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let analysed = |b: &&BankInsight| b.reviews > b.failed;
        let highest_rated = average_ratings.first().map(|&(bank, _)| bank);
        let most_positive = banks
            .iter()
            .filter(analysed)
            .max_by(|a, b| {
                a.sentiment
                    .positive
                    .total_cmp(&b.sentiment.positive)
                    .then(b.bank.cmp(&a.bank))
            })
            .map(|b| b.bank);
        let most_negative = banks
            .iter()
            .filter(analysed)
            .max_by(|a, b| {
                a.sentiment
                    .negative
                    .total_cmp(&b.sentiment.negative)
                    .then(b.bank.cmp(&a.bank))
            })
            .map(|b| b.bank);

        InsightReport {
            total_reviews: rows.len(),
            failed_reviews,
            sentiment_distribution,
            rating_histogram,
            average_ratings,
            banks,
            highest_rated,
            most_positive,
            most_negative,
        }
    }

    pub fn bank(&self, bank: Bank) -> Option<&BankInsight> {
        self.banks.iter().find(|b| b.bank == bank)
    }
}

fn bank_insight(bank: Bank, acc: BankAccumulator) -> BankInsight {
    let average_rating = if acc.reviews == 0 {
        0.0
    } else {
        acc.rating_sum as f64 / acc.reviews as f64
    };

    let mut top_negative_themes = theme_counts(acc.negative_clusters);
    top_negative_themes.sort_by(|a, b| {
        b.reviews
            .cmp(&a.reviews)
            .then_with(|| a.batch_id.cmp(&b.batch_id))
            .then(a.cluster_id.cmp(&b.cluster_id))
    });
    top_negative_themes.truncate(TOP_NEGATIVE_THEMES);

    let monthly_trend = acc
        .months
        .into_iter()
        .map(|((year, month), (count, sum))| TrendPoint {
            month: format!("{year:04}-{month:02}"),
            reviews: count,
            mean_compound: sum / count as f64,
        })
        .collect();

    BankInsight {
        bank,
        bank_name: acc.bank_name,
        reviews: acc.reviews,
        failed: acc.failed,
        average_rating,
        sentiment: SentimentShare::from_counts(&acc.labels),
        cluster_sizes: theme_counts(acc.clusters),
        top_negative_themes,
        monthly_trend,
    }
}

fn theme_counts(counts: BTreeMap<(String, usize), usize>) -> Vec<ThemeCount> {
    counts
        .into_iter()
        .map(|((batch_id, cluster_id), reviews)| ThemeCount {
            batch_id,
            cluster_id,
            reviews,
        })
        .collect()
}

impl fmt::Display for InsightReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Total reviews: {} ({} failed)",
            self.total_reviews, self.failed_reviews
        )?;

        write!(f, "Sentiment:")?;
        for (label, count) in &self.sentiment_distribution {
            write!(f, " {label}={count}")?;
        }
        writeln!(f)?;

        write!(f, "Ratings:")?;
        for (rating, count) in &self.rating_histogram {
            write!(f, " {rating}★={count}")?;
        }
        writeln!(f)?;

        writeln!(f, "Average rating by bank:")?;
        for (bank, rating) in &self.average_ratings {
            writeln!(f, "  {:<8} {rating:.2}", bank.code())?;
        }

        for insight in &self.banks {
            writeln!(f)?;
            writeln!(f, "{} ({} reviews)", insight.bank_name, insight.reviews)?;
            writeln!(
                f,
                "  positive {:.1}%  neutral {:.1}%  negative {:.1}%",
                insight.sentiment.positive, insight.sentiment.neutral, insight.sentiment.negative
            )?;
            if !insight.top_negative_themes.is_empty() {
                let themes: Vec<String> = insight
                    .top_negative_themes
                    .iter()
                    .map(|t| format!("{}#{} ({})", t.batch_id, t.cluster_id, t.reviews))
                    .collect();
                writeln!(f, "  negative themes: {}", themes.join(", "))?;
            }
            for point in &insight.monthly_trend {
                writeln!(
                    f,
                    "  {}  {:+.3} over {} reviews",
                    point.month, point.mean_compound, point.reviews
                )?;
            }
        }

        if let Some(bank) = self.highest_rated {
            writeln!(f)?;
            writeln!(f, "Highest average rating: {bank}")?;
        }
        if let Some(bank) = self.most_positive {
            writeln!(f, "Most positive sentiment: {bank}")?;
        }
        if let Some(bank) = self.most_negative {
            writeln!(f, "Most negative sentiment: {bank}")?;
        }
        Ok(())
    }
}
