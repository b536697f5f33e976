//! Core analyzer trait definition.
//!
//! Analyzers combine a tokenizer and a chain of filters into a complete text
//! processing pipeline:
//!
//! ```text
//! Raw Text → Analyzer → Token Stream
//!             ↓
//!         Tokenizer
//!             ↓
//!         Filter 1 … Filter N
//! ```
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use sentiscope::analysis::analyzer::Analyzer;
//! use sentiscope::analysis::analyzer::pipeline::PipelineAnalyzer;
//! use sentiscope::analysis::token_filter::lowercase::LowercaseFilter;
//! use sentiscope::analysis::tokenizer::regex::RegexTokenizer;
//!
//! let analyzer = PipelineAnalyzer::new(Arc::new(RegexTokenizer::new().unwrap()))
//!     .add_filter(Arc::new(LowercaseFilter::new()));
//! let tokens: Vec<_> = analyzer.analyze("Hello World").unwrap().collect();
//!
//! assert_eq!(tokens[0].text, "hello");
//! assert_eq!(tokens[1].text, "world");
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
///
/// Requires `Send + Sync` so one analyzer can serve every worker thread of a
/// parallel normalization pass.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and logging).
    fn name(&self) -> &str;
}

pub mod pipeline;
