//! Markup tokenization of raw post and comment bodies.
//!
//! The [`Scanner`](scanner::Scanner) splits the *original* text (case and
//! diacritics intact) into a gap-free sequence of typed
//! [`MarkupToken`](token::MarkupToken)s: hashtags, email addresses,
//! mentions, links, arrows and the plain text between them.
//!
//! Each structured kind is recognised by a [`Matcher`](matcher::Matcher).
//! One left-to-right scan consults the matchers in their configured order:
//! the earliest match wins, and at equal offsets the matcher listed first
//! wins.
//!
//! # Examples
//!
//! ```
//! use postindex::config::IndexingConfig;
//! use postindex::markup::scanner::Scanner;
//! use postindex::markup::token::MarkupKind;
//!
//! let scanner = Scanner::from_config(&IndexingConfig::default()).unwrap();
//! let kinds: Vec<_> = scanner
//!     .scan("#ff @bob check https://example.com/page thanks")
//!     .map(|t| t.kind)
//!     .collect();
//!
//! assert_eq!(
//!     kinds,
//!     vec![
//!         MarkupKind::Hashtag,
//!         MarkupKind::Text,
//!         MarkupKind::Mention,
//!         MarkupKind::Text,
//!         MarkupKind::Link,
//!         MarkupKind::Text,
//!     ]
//! );
//! ```

pub mod matcher;
pub mod scanner;
pub mod token;
