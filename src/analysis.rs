//! Text analysis module for Sentiscope.
//!
//! This module provides tokenization, token filters, analyzer pipelines and
//! the review text normalizer built from them.

pub mod analyzer;
pub mod normalizer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;
