//! Valence-aware compound sentiment scoring.
//!
//! Each word found in the lexicon contributes its valence, adjusted by
//! capitalization, preceding intensifiers and negations, and a "but"
//! contrast. The adjusted sum is pushed further by `!`/`?` emphasis and then
//! squashed into `[-1, 1]`.
//!
//! ```
//! use std::sync::Arc;
//!
//! use sentiscope::analysis::normalizer::TextNormalizer;
//! use sentiscope::review::SentimentLabel;
//! use sentiscope::sentiment::{Lexicon, SentimentScorer};
//!
//! let normalizer = TextNormalizer::new().unwrap();
//! let scorer = SentimentScorer::new(Arc::new(Lexicon::default()));
//!
//! let result = scorer.score(&normalizer.normalize("great app, love it").unwrap()).unwrap();
//! assert_eq!(result.label, SentimentLabel::Positive);
//! ```

use std::sync::Arc;

use crate::analysis::normalizer::NormalizedText;
use crate::error::{Result, SentiscopeError};
use crate::review::{SentimentLabel, SentimentResult};
use crate::sentiment::lexicon::Lexicon;

/// Normalization constant of the compound score.
pub const ALPHA: f64 = 15.0;

/// Valence added to an ALL CAPS word in mixed-case text.
pub const CAPS_INCREMENT: f64 = 0.733;

/// Multiplier applied by a preceding negation.
pub const NEGATION_SCALAR: f64 = -0.74;

/// How far back intensifiers and negations reach.
const WINDOW: usize = 3;

/// Intensifier damping by distance (1, 2, 3 tokens back).
const BOOSTER_DAMPING: [f64; WINDOW] = [1.0, 0.95, 0.9];

const BUT_BEFORE_SCALAR: f64 = 0.5;
const BUT_AFTER_SCALAR: f64 = 1.5;

const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const QUESTION_INCREMENT: f64 = 0.18;
const MAX_QUESTION_EMPHASIS: f64 = 0.96;

/// Scores normalized review text against a fixed lexicon.
///
/// Stateless apart from the shared lexicon, so it can be used from many
/// threads at once.
#[derive(Debug, Clone)]
pub struct SentimentScorer {
    lexicon: Arc<Lexicon>,
}

impl SentimentScorer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        SentimentScorer { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Score one normalized review.
    ///
    /// Fails with [`SentiscopeError::EmptyContent`] when the text has no
    /// tokens.
    pub fn score(&self, text: &NormalizedText) -> Result<SentimentResult> {
        if text.is_empty() {
            return Err(SentiscopeError::EmptyContent);
        }

        let mut valences: Vec<f64> = (0..text.tokens.len())
            .map(|i| self.token_valence(text, i))
            .collect();

        if let Some(but) = text.tokens.iter().position(|t| t.text == "but") {
            for (i, v) in valences.iter_mut().enumerate() {
                if i < but {
                    *v *= BUT_BEFORE_SCALAR;
                } else if i > but {
                    *v *= BUT_AFTER_SCALAR;
                }
            }
        }

        let mut sum: f64 = valences.iter().sum();
        let emphasis = punctuation_emphasis(text.exclamations, text.questions);
        if sum > 0.0 {
            sum += emphasis;
        } else if sum < 0.0 {
            sum -= emphasis;
        }

        Ok(SentimentResult::from_score(compound(sum)))
    }

    /// Label for a compound score.
    pub fn label_for_score(score: f64) -> SentimentLabel {
        SentimentLabel::from_score(score)
    }

    fn token_valence(&self, text: &NormalizedText, i: usize) -> f64 {
        let token = &text.tokens[i];
        let word = token.text.as_str();
        if self.lexicon.booster(word).is_some() || self.lexicon.is_negation(word) {
            return 0.0;
        }
        let Some(mut valence) = self.lexicon.valence(word) else {
            return 0.0;
        };

        if text.mixed_case && token.all_caps {
            valence += valence.signum() * CAPS_INCREMENT;
        }

        for distance in 1..=WINDOW.min(i) {
            let previous = &text.tokens[i - distance];
            if let Some(mut scalar) = self.lexicon.booster(&previous.text) {
                if text.mixed_case && previous.all_caps {
                    scalar += scalar.signum() * CAPS_INCREMENT;
                }
                valence += valence.signum() * scalar * BOOSTER_DAMPING[distance - 1];
            }
        }

        for distance in 1..=WINDOW.min(i) {
            if self.lexicon.is_negation(&text.tokens[i - distance].text) {
                valence *= NEGATION_SCALAR;
            }
        }

        valence
    }
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new(Arc::new(Lexicon::default()))
    }
}

fn punctuation_emphasis(exclamations: usize, questions: usize) -> f64 {
    let exclamation = exclamations.min(MAX_EXCLAMATIONS) as f64 * EXCLAMATION_INCREMENT;
    let question = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * QUESTION_INCREMENT,
        _ => MAX_QUESTION_EMPHASIS,
    };
    exclamation + question
}

fn compound(sum: f64) -> f64 {
    (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
}
