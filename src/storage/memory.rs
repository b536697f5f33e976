//! In-memory review store.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SentiscopeError};
use crate::review::{Bank, EnrichedReview};
use crate::storage::traits::{
    BankId, BankRecord, JoinedReview, ReviewStore, StoredReview, validate_row,
};

/// The two relations held by a [`MemoryReviewStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub banks: Vec<BankRecord>,
    pub reviews: Vec<StoredReview>,
}

impl StoreSnapshot {
    fn bank_id(&self, bank: Bank) -> Option<BankId> {
        self.banks
            .iter()
            .find(|record| record.bank == bank)
            .map(|record| record.bank_id)
    }

    fn insert_bank(&mut self, bank: Bank, app_source: &str) -> BankId {
        if let Some(id) = self.bank_id(bank) {
            return id;
        }
        let id = self.banks.last().map_or(1, |record| record.bank_id + 1);
        self.banks.push(BankRecord {
            bank_id: id,
            bank,
            bank_name: bank.display_name().to_string(),
            app_source: app_source.to_string(),
        });
        id
    }
}

/// A review store kept in process memory.
///
/// Clones share the same data. A snapshot of both relations can be written to
/// and read from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct MemoryReviewStore {
    data: Arc<RwLock<StoreSnapshot>>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        MemoryReviewStore {
            data: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Copy of both relations.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.data.read().clone()
    }

    /// Write a JSON snapshot to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&*self.data.read())?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a store from a JSON snapshot, or start empty when `path` does
    /// not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content).map_err(|e| {
            SentiscopeError::storage(format!("invalid store file {}: {e}", path.display()))
        })?;
        Ok(Self::from_snapshot(snapshot))
    }
}

impl ReviewStore for MemoryReviewStore {
    fn ensure_bank(&self, bank: Bank, app_source: &str) -> Result<BankId> {
        Ok(self.data.write().insert_bank(bank, app_source))
    }

    fn insert_reviews(&self, batch_id: &str, reviews: &[EnrichedReview]) -> Result<usize> {
        if batch_id.is_empty() {
            return Err(SentiscopeError::storage("batch id must not be empty"));
        }
        for enriched in reviews {
            validate_row(enriched)?;
        }

        let mut data = self.data.write();
        let mut next_id = data.reviews.last().map_or(1, |r| r.review_id + 1);
        for enriched in reviews {
            let bank_id = data.insert_bank(enriched.review.bank, &enriched.review.source);
            data.reviews
                .push(StoredReview::from_enriched(next_id, bank_id, batch_id, enriched));
            next_id += 1;
        }

        log::debug!("stored {} reviews of batch '{batch_id}'", reviews.len());
        Ok(reviews.len())
    }

    fn banks(&self) -> Result<Vec<BankRecord>> {
        Ok(self.data.read().banks.clone())
    }

    fn reviews(&self) -> Result<Vec<StoredReview>> {
        Ok(self.data.read().reviews.clone())
    }

    fn joined(&self) -> Result<Vec<JoinedReview>> {
        let data = self.data.read();
        data.reviews
            .iter()
            .map(|review| {
                data.banks
                    .iter()
                    .find(|bank| bank.bank_id == review.bank_id)
                    .map(|bank| JoinedReview {
                        bank: bank.clone(),
                        review: review.clone(),
                    })
                    .ok_or_else(|| {
                        SentiscopeError::storage(format!(
                            "review {} references missing bank {}",
                            review.review_id, review.bank_id
                        ))
                    })
            })
            .collect()
    }

    fn review_count(&self) -> Result<usize> {
        Ok(self.data.read().reviews.len())
    }
}
