//! Configuration for the review analysis pipeline.
//!
//! Every knob that shapes a batch run lives here and is fixed before the
//! batch starts. Configurations are plain serde structs, so a partial JSON
//! file only needs to name the values it overrides:
//!
//! ```
//! use sentiscope::config::PipelineConfig;
//!
//! let config: PipelineConfig =
//!     serde_json::from_str(r#"{ "clusterer": { "n_clusters": 4 } }"#).unwrap();
//! assert_eq!(config.clusterer.n_clusters, 4);
//! assert_eq!(config.clusterer.seed, 42);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::regex::DEFAULT_TOKEN_PATTERN;
use crate::error::{Result, SentiscopeError};

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Text normalization settings.
    pub normalizer: NormalizerConfig,
    /// Sentiment lexicon settings.
    pub sentiment: SentimentConfig,
    /// TF-IDF vocabulary and weighting settings.
    pub vectorizer: VectorizerConfig,
    /// Dimensionality reduction settings.
    pub reducer: ReducerConfig,
    /// K-means settings.
    pub clusterer: ClusterConfig,
    /// Whether themes are fit over the whole batch or per bank.
    pub theme_scope: ThemeScope,
    /// Normalize and score rows on the rayon pool.
    pub parallel: bool,
    /// Minimum batch size before the parallel path is taken.
    pub parallel_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            sentiment: SentimentConfig::default(),
            vectorizer: VectorizerConfig::default(),
            reducer: ReducerConfig::default(),
            clusterer: ClusterConfig::default(),
            theme_scope: ThemeScope::Batch,
            parallel: true,
            parallel_threshold: 1000,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SentiscopeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        self.normalizer.validate()?;
        self.vectorizer.validate()?;
        self.reducer.validate()?;
        self.clusterer.validate()?;
        Ok(())
    }
}

/// Text normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Regex whose matches are the word tokens of a review.
    pub token_pattern: String,
    /// Minimum characters for a term in the clustering view.
    pub min_term_len: usize,
    /// Drop English stop words from the clustering view.
    pub remove_stop_words: bool,
    /// Additional stop words for the clustering view (e.g. "app", "bank").
    pub extra_stop_words: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
            min_term_len: 3,
            remove_stop_words: true,
            extra_stop_words: Vec::new(),
        }
    }
}

impl NormalizerConfig {
    fn validate(&self) -> Result<()> {
        if self.token_pattern.is_empty() {
            return Err(SentiscopeError::config("token_pattern must not be empty"));
        }
        if self.min_term_len == 0 {
            return Err(SentiscopeError::config("min_term_len must be at least 1"));
        }
        Ok(())
    }
}

/// Sentiment lexicon settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// JSON object of `word -> valence` loaded at startup.
    pub lexicon_path: Option<PathBuf>,
    /// When true the file entries are merged into the built-in lexicon,
    /// otherwise they replace it.
    pub extend_default_lexicon: bool,
}

/// TF-IDF vocabulary and weighting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Largest n-gram length (1 = unigrams only).
    pub max_ngram: usize,
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in.
    pub max_df: f64,
    /// Keep only the most document-frequent terms.
    pub max_features: Option<usize>,
    /// L2-normalize every row after weighting.
    pub l2_normalize: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_ngram: 1,
            min_df: 1,
            max_df: 1.0,
            max_features: None,
            l2_normalize: true,
        }
    }
}

impl VectorizerConfig {
    fn validate(&self) -> Result<()> {
        if self.max_ngram == 0 {
            return Err(SentiscopeError::config("max_ngram must be at least 1"));
        }
        if self.min_df == 0 {
            return Err(SentiscopeError::config("min_df must be at least 1"));
        }
        if self.max_df.is_nan() || self.max_df <= 0.0 || self.max_df > 1.0 {
            return Err(SentiscopeError::config("max_df must be in (0, 1]"));
        }
        if self.max_features == Some(0) {
            return Err(SentiscopeError::config("max_features must be positive"));
        }
        Ok(())
    }
}

/// Dimensionality reduction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Requested number of principal components.
    pub n_components: usize,
    /// Power iteration limit per component.
    pub max_iter: usize,
    /// Largest per-coordinate change of the eigenvector that counts as converged.
    pub tolerance: f64,
    /// Seed for the power iteration start vectors.
    pub seed: u64,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            n_components: 10,
            max_iter: 500,
            tolerance: 1e-10,
            seed: 42,
        }
    }
}

impl ReducerConfig {
    fn validate(&self) -> Result<()> {
        if self.n_components == 0 {
            return Err(SentiscopeError::config("n_components must be at least 1"));
        }
        if self.max_iter == 0 {
            return Err(SentiscopeError::config("reducer max_iter must be at least 1"));
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(SentiscopeError::config("reducer tolerance must be positive"));
        }
        Ok(())
    }
}

/// K-means settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Number of thematic clusters (K).
    pub n_clusters: usize,
    /// Upper bound on assignment/update rounds.
    pub max_iter: usize,
    /// Seed for k-means++ initialization.
    pub seed: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            n_clusters: 10,
            max_iter: 300,
            seed: 42,
        }
    }
}

impl ClusterConfig {
    fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(SentiscopeError::config("n_clusters must be at least 1"));
        }
        if self.max_iter == 0 {
            return Err(SentiscopeError::config("clusterer max_iter must be at least 1"));
        }
        Ok(())
    }
}

/// Scope over which the vocabulary, basis and centroids are fit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeScope {
    /// One theme space for the whole batch.
    #[default]
    Batch,
    /// An independent theme space per bank; cluster ids are per bank.
    PerBank,
}
