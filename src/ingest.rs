//! Acquisition boundary: scraped records in, validated reviews out.
//!
//! Scraped app store records arrive as loosely typed JSON. [`clean`] turns
//! them into [`Review`]s, dropping rows without text, with an unusable rating,
//! date or bank, and duplicates of the same text posted at the same time.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use ahash::AHashSet;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SentiscopeError};
use crate::review::{Bank, Review};

/// Source recorded when a scraped record names none.
pub const DEFAULT_SOURCE: &str = "Google Play Store";

/// One scraped record. Fields other than these are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    #[serde(default)]
    pub content: Option<String>,
    /// Star rating; a number or a numeric string.
    #[serde(default)]
    pub score: Option<Value>,
    /// Posting timestamp.
    #[serde(default)]
    pub at: Option<String>,
    /// Bank code or app store display name.
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// What cleaning removed, and what it kept per bank.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub raw_count: usize,
    pub kept: usize,
    pub missing_content: usize,
    pub invalid_rating: usize,
    pub invalid_date: usize,
    pub unknown_bank: usize,
    pub duplicates: usize,
    pub per_bank: BTreeMap<Bank, usize>,
}

impl CleaningReport {
    /// Rows removed for any reason.
    pub fn removed(&self) -> usize {
        self.raw_count - self.kept
    }
}

/// Output of [`clean`].
#[derive(Clone, Debug, PartialEq)]
pub struct CleanedReviews {
    pub reviews: Vec<Review>,
    pub report: CleaningReport,
}

/// Validate, convert and deduplicate scraped records.
///
/// Duplicates share both text and full posting timestamp; the first
/// occurrence is kept.
pub fn clean<I>(raw: I) -> CleanedReviews
where
    I: IntoIterator<Item = RawReview>,
{
    let mut report = CleaningReport::default();
    let mut seen: AHashSet<(String, NaiveDateTime)> = AHashSet::new();
    let mut reviews = Vec::new();

    for record in raw {
        report.raw_count += 1;

        let Some(text) = record.content.filter(|c| !c.trim().is_empty()) else {
            report.missing_content += 1;
            continue;
        };
        let Some(rating) = record.score.as_ref().and_then(parse_rating) else {
            report.invalid_rating += 1;
            continue;
        };
        let Some(posted) = record.at.as_deref().and_then(parse_timestamp) else {
            report.invalid_date += 1;
            continue;
        };
        let Some(bank) = record.bank_name.as_deref().and_then(|b| b.parse::<Bank>().ok()) else {
            report.unknown_bank += 1;
            continue;
        };
        if !seen.insert((text.clone(), posted)) {
            report.duplicates += 1;
            continue;
        }

        let source = record
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        // rating is already range-checked, so this cannot fail
        if let Ok(review) = Review::new(text, rating, posted.date(), bank, source) {
            *report.per_bank.entry(bank).or_insert(0) += 1;
            reviews.push(review);
        }
    }

    report.kept = reviews.len();
    log::info!(
        "cleaned {} raw records: kept {}, removed {} ({} duplicates)",
        report.raw_count,
        report.kept,
        report.removed(),
        report.duplicates
    );

    CleanedReviews { reviews, report }
}

/// Parse a star rating from a JSON number or numeric string.
pub fn parse_rating(value: &Value) -> Option<u8> {
    let rating = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if rating.fract() != 0.0 || !(1.0..=5.0).contains(&rating) {
        return None;
    }
    Some(rating as u8)
}

/// Parse a posting timestamp in any of the accepted formats.
///
/// RFC 3339 values keep their local wall-clock time.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Read a JSON array of scraped records.
pub fn read_raw_json<P: AsRef<Path>>(path: P) -> Result<Vec<RawReview>> {
    let file = File::open(path.as_ref())?;
    let records = serde_json::from_reader(BufReader::new(file))?;
    Ok(records)
}

/// Read one JSON value per line, skipping blank lines.
pub fn read_jsonl<T, P>(path: P) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    let mut items = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).map_err(|e| {
            SentiscopeError::parse(format!(
                "{} line {}: {e}",
                path.as_ref().display(),
                number + 1
            ))
        })?;
        items.push(item);
    }
    Ok(items)
}

/// Read cleaned reviews written as JSON Lines.
pub fn read_reviews_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<Review>> {
    read_jsonl(path)
}

/// Write one JSON value per line.
pub fn write_jsonl<T, W>(mut writer: W, items: &[T]) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
