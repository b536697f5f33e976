//! TF-IDF vectorizer for the clustering view of reviews.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use ndarray::Array2;

use crate::config::VectorizerConfig;
use crate::error::{Result, SentiscopeError};

/// A sparse row-per-document TF-IDF matrix and its vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct TfIdfMatrix {
    /// Terms in column order (lexicographic).
    pub vocabulary: Vec<String>,
    /// Inverse document frequency per column.
    pub idf: Vec<f64>,
    /// `(column, weight)` pairs per row, columns ascending.
    pub rows: Vec<Vec<(usize, f64)>>,
}

impl TfIdfMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.vocabulary.len()
    }

    /// Column of a term.
    pub fn column(&self, term: &str) -> Option<usize> {
        self.vocabulary
            .binary_search_by(|t| t.as_str().cmp(term))
            .ok()
    }

    /// Weight at `(row, column)`.
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.rows
            .get(row)
            .and_then(|r| {
                r.binary_search_by_key(&column, |&(c, _)| c)
                    .ok()
                    .map(|i| r[i].1)
            })
            .unwrap_or(0.0)
    }

    /// Dense copy of the matrix.
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.n_rows(), self.n_columns()));
        for (i, row) in self.rows.iter().enumerate() {
            for &(j, w) in row {
                dense[[i, j]] = w;
            }
        }
        dense
    }
}

/// Fits a vocabulary over a batch of term lists and weights every document.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    config: VectorizerConfig,
}

impl TfIdfVectorizer {
    pub fn new(config: VectorizerConfig) -> Self {
        TfIdfVectorizer { config }
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Fit the vocabulary over `documents` and return their weighted rows.
    ///
    /// Each document is the ordered clustering terms of one review. Fails
    /// with [`SentiscopeError::VocabularyEmpty`] when no term survives the
    /// document-frequency thresholds; the caller fills in batch details.
    pub fn fit_transform<D: AsRef<[String]>>(&self, documents: &[D]) -> Result<TfIdfMatrix> {
        let n_documents = documents.len();
        let grams: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| ngrams(doc.as_ref(), self.config.max_ngram))
            .collect();

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in &grams {
            let unique: BTreeSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let max_df = (self.config.max_df * n_documents as f64).floor() as usize;
        let mut kept: Vec<(&str, usize)> = document_frequency
            .into_iter()
            .filter(|&(_, df)| df >= self.config.min_df && df <= max_df.max(1))
            .collect();

        if let Some(max_features) = self.config.max_features
            && kept.len() > max_features
        {
            kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            kept.truncate(max_features);
            kept.sort_by(|a, b| a.0.cmp(b.0));
        }

        if kept.is_empty() {
            return Err(SentiscopeError::vocabulary_empty("", n_documents, 0));
        }

        let vocabulary: Vec<String> = kept.iter().map(|&(t, _)| t.to_string()).collect();
        let index: AHashMap<&str, usize> = kept
            .iter()
            .enumerate()
            .map(|(j, &(t, _))| (t, j))
            .collect();
        let idf: Vec<f64> = kept
            .iter()
            .map(|&(_, df)| ((1.0 + n_documents as f64) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows = grams
            .iter()
            .map(|doc| self.weigh(doc, &index, &idf))
            .collect();

        Ok(TfIdfMatrix {
            vocabulary,
            idf,
            rows,
        })
    }

    fn weigh(
        &self,
        doc: &[String],
        index: &AHashMap<&str, usize>,
        idf: &[f64],
    ) -> Vec<(usize, f64)> {
        if doc.is_empty() {
            return Vec::new();
        }

        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for term in doc {
            if let Some(&j) = index.get(term.as_str()) {
                *counts.entry(j).or_insert(0) += 1;
            }
        }

        let length = doc.len() as f64;
        let mut row: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(j, count)| (j, count as f64 / length * idf[j]))
            .collect();

        if self.config.l2_normalize {
            let norm = row.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, w) in &mut row {
                    *w /= norm;
                }
            }
        }

        row
    }
}

/// All contiguous n-grams of length `1..=max_n`, joined by a space.
fn ngrams(terms: &[String], max_n: usize) -> Vec<String> {
    let mut grams = Vec::new();
    for n in 1..=max_n.max(1) {
        for window in terms.windows(n) {
            grams.push(window.join(" "));
        }
    }
    grams
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<Vec<String>> {
        texts
            .iter()
            .map(|t| t.split_whitespace().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_vocabulary_is_lexicographic() {
        let matrix = TfIdfVectorizer::new(VectorizerConfig::default())
            .fit_transform(&docs(&["transfer slow", "login error", "app slow"]))
            .unwrap();

        assert_eq!(
            matrix.vocabulary,
            vec!["app", "error", "login", "slow", "transfer"]
        );
        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.column("slow"), Some(3));
        assert_eq!(matrix.column("missing"), None);
    }

    #[test]
    fn test_weights() {
        let config = VectorizerConfig {
            l2_normalize: false,
            ..VectorizerConfig::default()
        };
        let matrix = TfIdfVectorizer::new(config)
            .fit_transform(&docs(&["slow slow app", "slow"]))
            .unwrap();

        // N = 2, df(slow) = 2, df(app) = 1
        let idf_slow = (3.0f64 / 3.0).ln() + 1.0;
        let idf_app = (3.0f64 / 2.0).ln() + 1.0;
        let app = matrix.column("app").unwrap();
        let slow = matrix.column("slow").unwrap();

        assert!((matrix.get(0, slow) - 2.0 / 3.0 * idf_slow).abs() < 1e-12);
        assert!((matrix.get(0, app) - 1.0 / 3.0 * idf_app).abs() < 1e-12);
        assert!((matrix.get(1, slow) - idf_slow).abs() < 1e-12);
        assert_eq!(matrix.get(1, app), 0.0);
    }

    #[test]
    fn test_rows_are_l2_normalized() {
        let matrix = TfIdfVectorizer::new(VectorizerConfig::default())
            .fit_transform(&docs(&["slow slow app", "slow", "fast login"]))
            .unwrap();
        for row in &matrix.rows {
            let norm: f64 = row.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bigrams() {
        let config = VectorizerConfig {
            max_ngram: 2,
            ..VectorizerConfig::default()
        };
        let matrix = TfIdfVectorizer::new(config)
            .fit_transform(&docs(&["transfer failed", "transfer failed again"]))
            .unwrap();

        assert!(matrix.column("transfer failed").is_some());
        assert!(matrix.column("failed again").is_some());
        assert_eq!(matrix.n_columns(), 5);
    }

    #[test]
    fn test_document_frequency_thresholds() {
        let config = VectorizerConfig {
            min_df: 2,
            max_df: 0.7,
            ..VectorizerConfig::default()
        };
        let matrix = TfIdfVectorizer::new(config)
            .fit_transform(&docs(&["app slow", "app login", "app login slow", "otp"]))
            .unwrap();

        // "app" is in 3 of 4 documents (> 0.7), "otp" in only one.
        assert_eq!(matrix.vocabulary, vec!["login", "slow"]);
        assert!(matrix.rows[3].is_empty());
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let config = VectorizerConfig {
            max_features: Some(2),
            ..VectorizerConfig::default()
        };
        let matrix = TfIdfVectorizer::new(config)
            .fit_transform(&docs(&["app slow", "app login", "slow otp", "zzz"]))
            .unwrap();

        assert_eq!(matrix.vocabulary, vec!["app", "slow"]);
    }

    #[test]
    fn test_empty_vocabulary_fails() {
        let config = VectorizerConfig {
            min_df: 2,
            ..VectorizerConfig::default()
        };
        let result =
            TfIdfVectorizer::new(config).fit_transform(&docs(&["one", "two", "three"]));
        assert!(matches!(result, Err(SentiscopeError::VocabularyEmpty { .. })));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let corpus = docs(&["card blocked", "otp never arrives", "card otp"]);
        let vectorizer = TfIdfVectorizer::new(VectorizerConfig::default());
        assert_eq!(
            vectorizer.fit_transform(&corpus).unwrap(),
            vectorizer.fit_transform(&corpus).unwrap()
        );
    }

    #[test]
    fn test_to_dense() {
        let matrix = TfIdfVectorizer::new(VectorizerConfig::default())
            .fit_transform(&docs(&["a b", "b"]))
            .unwrap();
        let dense = matrix.to_dense();
        assert_eq!(dense.dim(), (2, 2));
        assert_eq!(dense[[1, 0]], 0.0);
        assert!((dense[[1, 1]] - 1.0).abs() < 1e-12);
    }
}
