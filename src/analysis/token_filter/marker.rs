//! Marker filter implementation.
//!
//! Prefixes every token with a reserved marker string. The exact half of a
//! merged search vector runs through this filter so its lexemes live in a
//! namespace the stemmed half can never produce.

use std::sync::Arc;

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// A filter that prepends a fixed marker to every token.
#[derive(Clone, Debug)]
pub struct MarkerFilter {
    marker: Arc<str>,
}

impl MarkerFilter {
    /// Create a new marker filter.
    pub fn new<S: AsRef<str>>(marker: S) -> Self {
        MarkerFilter {
            marker: Arc::from(marker.as_ref()),
        }
    }

    /// The marker prepended to tokens.
    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl Filter for MarkerFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let marker = Arc::clone(&self.marker);
        Ok(Box::new(tokens.map(move |token| {
            let marked = format!("{marker}{}", token.text);
            token.with_text(marked)
        })))
    }

    fn name(&self) -> &'static str {
        "marker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    #[test]
    fn test_marker_filter() {
        let filter = MarkerFilter::new("=");
        let tokens = vec![Token::new("the", 1), Token::new("cats", 2)];

        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result[0].text, "=the");
        assert_eq!(result[1].text, "=cats");
        assert_eq!(result[1].position, 2);
    }

    #[test]
    fn test_filter_name() {
        assert_eq!(MarkerFilter::new("=").name(), "marker");
    }
}
