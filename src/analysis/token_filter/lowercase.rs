//! Lowercase filter implementation.
//!
//! # Examples
//!
//! ```
//! use sentiscope::analysis::token_filter::Filter;
//! use sentiscope::analysis::token_filter::lowercase::LowercaseFilter;
//! use sentiscope::analysis::token::Token;
//!
//! let filter = LowercaseFilter::new();
//! let tokens = vec![Token::new("Hello", 0), Token::new("WORLD", 1)];
//! let filtered: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(filtered[0].text, "hello");
//! assert_eq!(filtered[1].text, "world");
//! assert_eq!(filtered[1].original_text(), "WORLD");
//! ```

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// A filter that converts tokens to lowercase.
///
/// The pre-lowercase surface form is kept in the token metadata whenever it
/// differs, so downstream consumers (the sentiment scorer's capitalization
/// emphasis) can still see it. Stopped tokens pass through untouched.
#[derive(Clone, Debug, Default)]
pub struct LowercaseFilter;

impl LowercaseFilter {
    /// Create a new lowercase filter.
    pub fn new() -> Self {
        LowercaseFilter
    }
}

impl Filter for LowercaseFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens = tokens
            .map(|token| {
                let lowered = token.text.to_lowercase();
                if lowered == token.text {
                    token
                } else {
                    let original = token.text.clone();
                    token.with_text(lowered).with_original_text(original)
                }
            })
            .collect::<Vec<_>>();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}
