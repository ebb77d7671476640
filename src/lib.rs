//! # postindex
//!
//! The text-indexing pipeline behind user-authored posts and comments.
//!
//! ## Features
//!
//! - Unicode folding for hashtag names and search lexemes
//! - Gap-free markup tokenization (hashtags, mentions, links, emails, arrows)
//! - Hashtag usages and cross-post backlinks derived on every save
//! - Merged search vectors supporting stemmed and exact-wordform matching
//! - Persistence through narrow async store traits, with an in-memory store

pub mod analysis;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod indexer;
pub mod markup;
pub mod store;
pub mod vector;

pub mod prelude {
    pub use crate::analysis::analyzer::profile::SearchProfile;
    pub use crate::analysis::normalizer::{link_text, normalize};
    pub use crate::config::IndexingConfig;
    pub use crate::content::{Backlink, CommentId, ContentId, ContentRef, HashtagId, PostId, UserId};
    pub use crate::error::{PostindexError, Result};
    pub use crate::extract::{EntityExtractor, Extraction, ExtractionWarning};
    pub use crate::indexer::{ContentIndexer, DerivedState};
    pub use crate::markup::scanner::Scanner;
    pub use crate::markup::token::{MarkupKind, MarkupToken};
    pub use crate::store::memory::MemoryStore;
    pub use crate::store::{ContentStore, IndexStore};
    pub use crate::vector::{MergedVector, SearchMode, VectorBuilder};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
