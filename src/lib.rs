//! # Sentiscope
//!
//! Sentiment scoring and theme discovery for mobile banking app reviews.
//!
//! ## Features
//!
//! - Lexicon and rule based sentiment scoring with negation, boosters,
//!   contrast, capitalization and punctuation emphasis
//! - TF-IDF vectorization, PCA reduction and seeded k-means clustering
//! - Deterministic batch runs: identical input and configuration give
//!   identical output
//! - Cleaning of scraped records, a relational review store and an insight
//!   report

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod review;
pub mod sentiment;
pub mod storage;
pub mod theme;

pub mod prelude {
    pub use crate::config::{PipelineConfig, ThemeScope};
    pub use crate::error::{Result, SentiscopeError};
    pub use crate::pipeline::{AnalyzedBatch, Pipeline};
    pub use crate::review::{Bank, EnrichedReview, Review, ReviewBatch, SentimentLabel};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
