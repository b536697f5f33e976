//! Error types for the Sentiscope library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`SentiscopeError`] enum. Per-review problems such as
//! [`SentiscopeError::EmptyContent`] are normally caught by the pipeline and
//! turned into a failure marker on the affected row; batch-level problems
//! such as [`SentiscopeError::VocabularyEmpty`] abort the batch.
//!
//! # Examples
//!
//! ```
//! use sentiscope::error::{Result, SentiscopeError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SentiscopeError::invalid_argument("rating must be between 1 and 5"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Sentiscope operations.
#[derive(Error, Debug)]
pub enum SentiscopeError {
    /// I/O errors (reading review files, writing results)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The text normalized to zero tokens.
    #[error("Empty content: review text contains no scorable tokens")]
    EmptyContent,

    /// No usable vocabulary term survived for the batch.
    #[error(
        "Vocabulary empty: batch '{batch_id}' produced no usable terms \
         ({batch_size} reviews, {empty_reviews} with empty content)"
    )]
    VocabularyEmpty {
        batch_id: String,
        batch_size: usize,
        empty_reviews: usize,
    },

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input records that cannot be converted into reviews
    #[error("Parse error: {0}")]
    Parse(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with SentiscopeError.
pub type Result<T> = std::result::Result<T, SentiscopeError>;

impl SentiscopeError {
    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        SentiscopeError::Analysis(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SentiscopeError::Config(msg.into())
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        SentiscopeError::Parse(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        SentiscopeError::Storage(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SentiscopeError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        SentiscopeError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        SentiscopeError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Create a vocabulary-empty error for a batch.
    pub fn vocabulary_empty<S: Into<String>>(
        batch_id: S,
        batch_size: usize,
        empty_reviews: usize,
    ) -> Self {
        SentiscopeError::VocabularyEmpty {
            batch_id: batch_id.into(),
            batch_size,
            empty_reviews,
        }
    }

    /// Whether this error only concerns a single review.
    pub fn is_per_review(&self) -> bool {
        matches!(self, SentiscopeError::EmptyContent)
    }
}
