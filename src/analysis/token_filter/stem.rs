//! Stemming token filter backed by the snowball stemmers.

use std::fmt;

use rust_stemmers::{Algorithm, Stemmer};

use super::Filter;
use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Filter that reduces every token to its snowball stem.
pub struct StemFilter {
    stemmer: Stemmer,
    language: &'static str,
}

impl fmt::Debug for StemFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StemFilter")
            .field("language", &self.language)
            .finish()
    }
}

impl StemFilter {
    /// Create a stem filter for a snowball algorithm.
    ///
    /// `language` is only used for diagnostics.
    pub fn new(algorithm: Algorithm, language: &'static str) -> Self {
        StemFilter {
            stemmer: Stemmer::create(algorithm),
            language,
        }
    }

    /// Create an English stem filter.
    pub fn english() -> Self {
        Self::new(Algorithm::English, "english")
    }

    /// Stem a single word.
    pub fn stem(&self, word: &str) -> String {
        self.stemmer.stem(word).into_owned()
    }
}

impl Filter for StemFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens = tokens
            .map(|token| {
                let stemmed = self.stem(&token.text);
                token.with_text(stemmed)
            })
            .collect::<Vec<_>>();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "stem"
    }
}
