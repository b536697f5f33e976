//! Regex-based tokenizer implementation.

use std::sync::Arc;

use regex::Regex;

use super::Tokenizer;
use crate::analysis::token::{Token, TokenStream, TokenType};
use crate::error::{Result, SentiscopeError};

/// Default pattern: runs of letters/digits, keeping inner apostrophes so
/// contractions like "don't" stay a single token.
pub const DEFAULT_TOKEN_PATTERN: &str = r"[\p{L}\p{N}]+(?:['’][\p{L}]+)*";

/// A regex-based tokenizer that extracts tokens using regular expressions.
///
/// Every match becomes a token; everything between matches (punctuation,
/// whitespace, emoji) is discarded.
#[derive(Clone, Debug)]
pub struct RegexTokenizer {
    /// The regex pattern used to extract tokens
    pattern: Arc<Regex>,
}

impl RegexTokenizer {
    /// Create a new regex tokenizer with the default pattern.
    pub fn new() -> Result<Self> {
        Self::with_pattern(DEFAULT_TOKEN_PATTERN)
    }

    /// Create a new regex tokenizer with a custom pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| SentiscopeError::analysis(format!("Invalid regex pattern: {e}")))?;

        Ok(RegexTokenizer {
            pattern: Arc::new(regex),
        })
    }

    /// Get the regex pattern used by this tokenizer.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn classify(text: &str) -> TokenType {
        if text.chars().all(|c| c.is_numeric()) {
            TokenType::Num
        } else {
            TokenType::Alphanum
        }
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = self
            .pattern
            .find_iter(text)
            .enumerate()
            .map(|(position, mat)| {
                // Typographic apostrophes are folded so "don’t" == "don't".
                let surface = mat.as_str().replace('’', "'");
                let token_type = Self::classify(&surface);
                Token::with_offsets(surface, position, mat.start(), mat.end())
                    .with_token_type(token_type)
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_tokenizer() {
        let tokenizer = RegexTokenizer::new().unwrap();
        let tokens: Vec<Token> = tokenizer.tokenize("hello world").unwrap().collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "hello");
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[0].start_offset, 0);
        assert_eq!(tokens[0].end_offset, 5);

        assert_eq!(tokens[1].text, "world");
        assert_eq!(tokens[1].position, 1);
        assert_eq!(tokens[1].start_offset, 6);
        assert_eq!(tokens[1].end_offset, 11);
    }

    #[test]
    fn test_punctuation_is_dropped_and_contractions_kept() {
        let tokenizer = RegexTokenizer::new().unwrap();
        let tokens: Vec<String> = tokenizer
            .tokenize("It doesn’t work!!! Crashes... again?")
            .unwrap()
            .map(|t| t.text)
            .collect();

        assert_eq!(tokens, vec!["It", "doesn't", "work", "Crashes", "again"]);
    }

    #[test]
    fn test_numeric_tokens_are_classified() {
        let tokenizer = RegexTokenizer::new().unwrap();
        let tokens: Vec<Token> = tokenizer.tokenize("version 2 ok").unwrap().collect();

        assert_eq!(tokens[0].token_type(), Some(TokenType::Alphanum));
        assert_eq!(tokens[1].token_type(), Some(TokenType::Num));
    }

    #[test]
    fn test_invalid_pattern_is_an_analysis_error() {
        let err = RegexTokenizer::with_pattern("[unclosed").unwrap_err();
        assert!(matches!(err, SentiscopeError::Analysis(_)));
    }

    #[test]
    fn test_tokenizer_name() {
        assert_eq!(RegexTokenizer::new().unwrap().name(), "regex");
    }
}
