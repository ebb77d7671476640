//! Char filters that rewrite the text string before tokenization.
//!
//! - [`fold::FoldingCharFilter`] - Canonicalizes text with
//!   [`normalize`](crate::analysis::normalizer::normalize)

/// Trait for character filters that transform text before tokenization.
pub trait CharFilter: Send + Sync {
    /// Apply this filter to the input text.
    fn filter(&self, input: &str) -> String;

    /// Get the name of this char filter.
    fn name(&self) -> &'static str;
}

pub mod fold;
