//! Lexicon-based sentiment scoring.
//!
//! A [`SentimentScorer`] reads a [`NormalizedText`](crate::analysis::normalizer::NormalizedText)
//! and produces a bounded compound score with a three-way label. The word
//! valences, intensifiers and negations it uses come from an immutable
//! [`Lexicon`] handed to it at construction.

pub mod lexicon;
pub mod scorer;

pub use lexicon::Lexicon;
pub use scorer::SentimentScorer;
