//! Review text normalization.
//!
//! A [`TextNormalizer`] turns raw review text into a [`NormalizedText`] with
//! two views of the same words:
//!
//! - `tokens`: every word, lower-cased, in order. The sentiment scorer reads
//!   this view, so negations and intensifiers are kept, and each token
//!   remembers whether it was written in ALL CAPS.
//! - `terms`: the clustering view, with stop words, short words and numbers
//!   removed.
//!
//! ```
//! use sentiscope::analysis::normalizer::TextNormalizer;
//!
//! let normalizer = TextNormalizer::new().unwrap();
//! let normalized = normalizer.normalize("  The app is GREAT,   but slow!! ").unwrap();
//!
//! assert_eq!(normalized.text, "the app is great but slow");
//! assert_eq!(normalized.terms, vec!["app", "great", "slow"]);
//! assert_eq!(normalized.exclamations, 2);
//! assert!(normalized.tokens[3].all_caps);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::token::{Token, TokenStream, TokenType};
use crate::analysis::token_filter::Filter;
use crate::analysis::token_filter::length::LengthFilter;
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::token_filter::stop::{DEFAULT_ENGLISH_STOP_WORDS, StopFilter};
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::config::NormalizerConfig;
use crate::error::{Result, SentiscopeError};

/// One lower-cased word of a review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedToken {
    /// Lower-cased word.
    pub text: String,
    /// Whether the word was written entirely in capitals (two letters or more).
    pub all_caps: bool,
}

/// The canonical form of one review's text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedText {
    /// Lower-cased words in order.
    pub tokens: Vec<NormalizedToken>,
    /// Tokens joined by single spaces.
    pub text: String,
    /// Clustering view of the tokens.
    pub terms: Vec<String>,
    /// Number of `!` in the raw text.
    pub exclamations: usize,
    /// Number of `?` in the raw text.
    pub questions: usize,
    /// Some, but not all, words were written in ALL CAPS.
    pub mixed_case: bool,
}

impl NormalizedText {
    /// Number of word tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no word tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Deterministic review text normalizer.
///
/// Holds no mutable state: the same input always yields the same output, and
/// one instance can be shared by every worker thread.
#[derive(Clone)]
pub struct TextNormalizer {
    words: PipelineAnalyzer,
    term_filters: Vec<Arc<dyn Filter>>,
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("words", &self.words)
            .field(
                "term_filters",
                &self.term_filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl TextNormalizer {
    /// Create a normalizer with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(&NormalizerConfig::default())
    }

    /// Create a normalizer from configuration.
    pub fn with_config(config: &NormalizerConfig) -> Result<Self> {
        let tokenizer = Arc::new(RegexTokenizer::with_pattern(&config.token_pattern)?);
        let words = PipelineAnalyzer::new(tokenizer)
            .add_filter(Arc::new(LowercaseFilter::new()))
            .with_name("review_words");

        let mut term_filters: Vec<Arc<dyn Filter>> = Vec::new();
        if config.remove_stop_words {
            let stop_words = DEFAULT_ENGLISH_STOP_WORDS
                .iter()
                .map(|w| w.to_string())
                .chain(config.extra_stop_words.iter().map(|w| w.to_lowercase()));
            term_filters.push(Arc::new(StopFilter::from_words(stop_words)));
        } else if !config.extra_stop_words.is_empty() {
            let stop_words = config.extra_stop_words.iter().map(|w| w.to_lowercase());
            term_filters.push(Arc::new(StopFilter::from_words(stop_words)));
        }
        term_filters.push(Arc::new(LengthFilter::new(config.min_term_len)));

        Ok(TextNormalizer {
            words,
            term_filters,
        })
    }

    /// Normalize one review text.
    ///
    /// Fails with [`SentiscopeError::EmptyContent`] when no word survives.
    pub fn normalize(&self, raw: &str) -> Result<NormalizedText> {
        let word_tokens: Vec<Token> = self.words.analyze(raw)?.collect();
        if word_tokens.is_empty() {
            return Err(SentiscopeError::EmptyContent);
        }

        let tokens: Vec<NormalizedToken> = word_tokens
            .iter()
            .map(|token| NormalizedToken {
                text: token.text.clone(),
                all_caps: is_all_caps(token.original_text()),
            })
            .collect();

        let worded: Vec<&Token> = word_tokens
            .iter()
            .filter(|t| t.token_type() != Some(TokenType::Num))
            .collect();
        let caps = worded
            .iter()
            .filter(|t| is_all_caps(t.original_text()))
            .count();
        let mixed_case = caps > 0 && caps < worded.len();

        let mut term_stream: TokenStream = Box::new(word_tokens.clone().into_iter());
        for filter in &self.term_filters {
            term_stream = filter.filter(term_stream)?;
        }
        let mut terms: Vec<String> = term_stream.map(|t| t.text).collect();
        if terms.is_empty() {
            // Never hand a non-empty review to the vectorizer as a zero row.
            terms = tokens.iter().map(|t| t.text.clone()).collect();
        }

        let text = tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(NormalizedText {
            text,
            terms,
            exclamations: raw.chars().filter(|&c| c == '!').count(),
            questions: raw.chars().filter(|&c| c == '?').count(),
            mixed_case,
            tokens,
        })
    }
}

fn is_all_caps(surface: &str) -> bool {
    let mut letters = 0;
    for c in surface.chars().filter(|c| c.is_alphabetic()) {
        if !c.is_uppercase() {
            return false;
        }
        letters += 1;
    }
    letters >= 2
}
