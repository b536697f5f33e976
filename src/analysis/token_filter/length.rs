//! Length filter implementation.

use crate::analysis::token::{Token, TokenStream, TokenType};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Drops tokens shorter than a minimum character count, and optionally
/// digit-only tokens.
#[derive(Clone, Debug)]
pub struct LengthFilter {
    min_chars: usize,
    drop_numeric: bool,
}

impl LengthFilter {
    /// Create a filter keeping tokens with at least `min_chars` characters.
    pub fn new(min_chars: usize) -> Self {
        LengthFilter {
            min_chars,
            drop_numeric: true,
        }
    }

    /// Keep or drop digit-only tokens (dropped by default).
    pub fn drop_numeric(mut self, drop: bool) -> Self {
        self.drop_numeric = drop;
        self
    }

    fn keep(&self, token: &Token) -> bool {
        if token.text.chars().count() < self.min_chars {
            return false;
        }
        !(self.drop_numeric && token.token_type() == Some(TokenType::Num))
    }
}

impl Filter for LengthFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens: Vec<Token> = tokens.filter(|token| self.keep(token)).collect();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "length"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_filter() {
        let filter = LengthFilter::new(3);
        let tokens = vec![
            Token::new("ok", 0),
            Token::new("app", 1),
            Token::new("2024", 2).with_token_type(TokenType::Num),
            Token::new("transfer", 3),
        ];

        let result: Vec<String> = filter
            .filter(Box::new(tokens.into_iter()))
            .unwrap()
            .map(|t| t.text)
            .collect();

        assert_eq!(result, vec!["app", "transfer"]);
    }

    #[test]
    fn test_numeric_tokens_can_be_kept() {
        let filter = LengthFilter::new(1).drop_numeric(false);
        let tokens = vec![Token::new("2024", 0).with_token_type(TokenType::Num)];

        let result: Vec<Token> = filter
            .filter(Box::new(tokens.into_iter()))
            .unwrap()
            .collect();

        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let filter = LengthFilter::new(3);
        let tokens = vec![Token::new("ጥሩ", 0)];

        let result: Vec<Token> = filter
            .filter(Box::new(tokens.into_iter()))
            .unwrap()
            .collect();

        assert!(result.is_empty());
    }

    #[test]
    fn test_filter_name() {
        assert_eq!(LengthFilter::new(2).name(), "length");
    }
}
