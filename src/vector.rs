//! Merged stemmed + exact search vectors.
//!
//! A [`MergedVector`] holds two sub-vectors over one document:
//!
//! - the *stemmed* half, produced by the configured
//!   [`SearchProfile`](crate::analysis::analyzer::profile::SearchProfile)
//!   (folding, stop-word removal, stemming),
//! - the *exact* half, produced without stop words or stemming, every lexeme
//!   prefixed with the reserved exact marker.
//!
//! Both halves share the document's 1-based position space, so phrase and
//! proximity queries stay meaningful within each half. Their lexeme
//! namespaces are disjoint: stemmed lexemes are runs of letters and digits
//! while exact lexemes start with the marker.
//!
//! # Example
//!
//! ```
//! use postindex::config::IndexingConfig;
//! use postindex::vector::{SearchMode, VectorBuilder};
//!
//! let builder = VectorBuilder::new(&IndexingConfig::default()).unwrap();
//! let vector = builder.build("The cats jumped", "").unwrap();
//! assert_eq!(vector.to_tsvector_literal(), "'=cats':2 '=jumped':3 '=the':1 'cat':2 'jump':3");
//!
//! let stemmed = builder.query_terms("jumping cat", SearchMode::Stemmed).unwrap();
//! assert!(vector.matches(&stemmed));
//! let exact = builder.query_terms("the", SearchMode::Exact).unwrap();
//! assert!(vector.matches(&exact));
//! ```

pub mod builder;
pub mod merged;
pub mod thread;

pub use self::builder::{QueryTerm, SearchMode, VectorBuilder};
pub use self::merged::{MergedVector, VectorEntry};
pub use self::thread::ThreadDocument;
