//! Storage boundary for enriched reviews.
//!
//! Analysed batches are persisted as two relations: banks, and reviews with a
//! foreign key to their bank. Each review row also records the batch it was
//! analysed in; cluster ids are only comparable within one batch. Reporting
//! reads the rows back through an equi-join on the bank id.
//!
//! # Architecture
//!
//! - **ReviewStore trait**: the relational interface every backend offers
//! - **MemoryReviewStore**: in-process backend behind a read/write lock, with
//!   optional JSON snapshots for persistence between runs
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use sentiscope::review::{Bank, EnrichedReview, FailureReason, Review};
//! use sentiscope::storage::{MemoryReviewStore, ReviewStore};
//!
//! # fn main() -> sentiscope::error::Result<()> {
//! let store = MemoryReviewStore::new();
//! let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
//! let review = Review::new("...", 3, date, Bank::Dashen, "Google Play Store")?;
//!
//! store.insert_reviews("2024-01", &[EnrichedReview::failed(0, review, FailureReason::EmptyContent)])?;
//!
//! let joined = store.joined()?;
//! assert_eq!(joined[0].bank.bank, Bank::Dashen);
//! assert_eq!(joined[0].review.batch_id, "2024-01");
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod traits;

pub use memory::MemoryReviewStore;
pub use traits::{BankId, BankRecord, JoinedReview, ReviewStore, StoredReview};
