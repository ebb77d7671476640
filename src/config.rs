//! Configuration supplied by the host application.
//!
//! [`IndexingConfig`] carries everything the pipeline must not hardcode:
//! the search-text profile, the top-level domain allow-list for bare-domain
//! links, and the reserved exact-match marker. It deserializes from JSON
//! with every field optional.
//!
//! # Example
//!
//! ```
//! use postindex::analysis::analyzer::profile::SearchProfile;
//! use postindex::config::IndexingConfig;
//!
//! let config = IndexingConfig::from_json_str(
//!     r#"{ "search_profile": "german", "allowed_tlds": ["de", "at"] }"#,
//! )
//! .unwrap();
//! assert_eq!(config.search_profile, SearchProfile::German);
//! assert_eq!(config.exact_marker, "=");
//!
//! let config = IndexingConfig::builder()
//!     .search_profile(SearchProfile::Simple)
//!     .max_upsert_retries(5)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.max_upsert_retries, 5);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::profile::SearchProfile;
use crate::error::{PostindexError, Result};
use crate::markup::token::MarkupKind;

/// Default reserved prefix of exact-match lexemes.
///
/// Lexemes are runs of letters and digits, so a marker made only of other
/// characters can never be produced by stemming.
pub const DEFAULT_EXACT_MARKER: &str = "=";

/// Default delimiter placed between the bodies of a thread document.
pub const DEFAULT_THREAD_DELIMITER: &str = "\n\n";

const DEFAULT_ALLOWED_TLDS: &[&str] = &[
    "com", "org", "net", "edu", "gov", "info", "io", "dev", "app", "eu", "cz", "sk", "de", "at",
    "pl", "uk", "fr", "it", "es", "nl", "ru", "us",
];

/// Configuration of the indexing pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Linguistic profile of the stemmed half of search vectors.
    pub search_profile: SearchProfile,

    /// Stop words replacing the profile's built-in list.
    pub stop_words: Option<Vec<String>>,

    /// Top-level domains recognised in bare-domain links.
    pub allowed_tlds: Vec<String>,

    /// Reserved prefix of exact-match lexemes.
    pub exact_marker: String,

    /// Structured matchers in priority order.
    pub matcher_order: Vec<MarkupKind>,

    /// Retries of a hashtag upsert that lost a uniqueness race.
    pub max_upsert_retries: u32,

    /// Separator between post and comment bodies in thread documents.
    pub thread_delimiter: String,

    /// Largest accepted body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        IndexingConfig {
            search_profile: SearchProfile::default(),
            stop_words: None,
            allowed_tlds: DEFAULT_ALLOWED_TLDS.iter().map(|s| s.to_string()).collect(),
            exact_marker: DEFAULT_EXACT_MARKER.to_string(),
            matcher_order: MarkupKind::DEFAULT_ORDER.to_vec(),
            max_upsert_retries: 3,
            thread_delimiter: DEFAULT_THREAD_DELIMITER.to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl IndexingConfig {
    /// Create a new builder starting from the defaults.
    pub fn builder() -> IndexingConfigBuilder {
        IndexingConfigBuilder::new()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: IndexingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.exact_marker.is_empty() {
            return Err(PostindexError::config("exact_marker must not be empty"));
        }
        if self
            .exact_marker
            .chars()
            .any(|c| c.is_alphanumeric() || c.is_whitespace())
        {
            return Err(PostindexError::config(format!(
                "exact_marker {:?} must not contain letters, digits or whitespace",
                self.exact_marker
            )));
        }

        if self.thread_delimiter.is_empty()
            || self.thread_delimiter.chars().any(char::is_alphanumeric)
        {
            return Err(PostindexError::config(
                "thread_delimiter must be non-empty and free of letters and digits",
            ));
        }

        for (idx, kind) in self.matcher_order.iter().enumerate() {
            if *kind == MarkupKind::Text {
                return Err(PostindexError::config(
                    "matcher_order must not contain the text kind",
                ));
            }
            if self.matcher_order[..idx].contains(kind) {
                return Err(PostindexError::config(format!(
                    "matcher_order lists {kind} more than once"
                )));
            }
        }

        if let Some(tld) = self
            .allowed_tlds
            .iter()
            .find(|tld| !tld.trim_start_matches('.').chars().all(char::is_alphanumeric))
        {
            return Err(PostindexError::config(format!(
                "allowed_tlds entry {tld:?} is not a domain label"
            )));
        }

        if self.max_body_bytes == 0 {
            return Err(PostindexError::config("max_body_bytes must be positive"));
        }

        Ok(())
    }
}

/// Builder for [`IndexingConfig`].
#[derive(Debug, Clone, Default)]
pub struct IndexingConfigBuilder {
    config: IndexingConfig,
}

impl IndexingConfigBuilder {
    /// Create a builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search-text profile.
    pub fn search_profile(mut self, profile: SearchProfile) -> Self {
        self.config.search_profile = profile;
        self
    }

    /// Replace the profile's stop words.
    pub fn stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.stop_words = Some(words.into_iter().map(Into::into).collect());
        self
    }

    /// Set the top-level domain allow-list.
    pub fn allowed_tlds<I, S>(mut self, tlds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_tlds = tlds.into_iter().map(Into::into).collect();
        self
    }

    /// Set the exact-match marker.
    pub fn exact_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.config.exact_marker = marker.into();
        self
    }

    /// Set the matcher priority order.
    pub fn matcher_order(mut self, order: Vec<MarkupKind>) -> Self {
        self.config.matcher_order = order;
        self
    }

    /// Set the hashtag upsert retry budget.
    pub fn max_upsert_retries(mut self, retries: u32) -> Self {
        self.config.max_upsert_retries = retries;
        self
    }

    /// Set the thread document delimiter.
    pub fn thread_delimiter<S: Into<String>>(mut self, delimiter: S) -> Self {
        self.config.thread_delimiter = delimiter.into();
        self
    }

    /// Set the largest accepted body size.
    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.config.max_body_bytes = bytes;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<IndexingConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
