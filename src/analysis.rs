//! Text analysis for search vectors.
//!
//! This module holds the canonicalization shared by every part of the crate
//! ([`normalizer`]) and the analysis pipeline that turns folded text into
//! lexemes:
//!
//! ```text
//! Text → Char Filter (fold) → Tokenizer (words) → Token Filters → Lexemes
//! ```

pub mod analyzer;
pub mod char_filter;
pub mod normalizer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;
