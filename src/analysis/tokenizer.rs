//! Tokenizers that split analyzed text into words.
//!
//! Tokenizers are the first step after char filtering in the vector
//! analysis pipeline.
//!
//! - [`word::WordTokenizer`] - Runs of letters and digits, regex driven
//!
//! # Examples
//!
//! ```
//! use postindex::analysis::tokenizer::Tokenizer;
//! use postindex::analysis::tokenizer::word::WordTokenizer;
//!
//! let tokenizer = WordTokenizer::new().unwrap();
//! let tokens: Vec<_> = tokenizer.tokenize("hello, world").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//! assert_eq!(tokens[1].position, 2);
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// The trait requires `Send + Sync` so one analyzer can serve concurrent
/// saves.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod word;
