//! Search-text profiles.
//!
//! A profile names the linguistic treatment of the stemmed half of a search
//! vector, the way a search engine's text-search configuration does
//! (`english`, `german`, ... or `simple`). The exact half always uses the
//! `simple` treatment.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ahash::AHashSet;
use rust_stemmers::Algorithm;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::char_filter::fold::FoldingCharFilter;
use crate::analysis::normalizer::normalize;
use crate::analysis::token_filter::marker::MarkerFilter;
use crate::analysis::token_filter::stem::StemFilter;
use crate::analysis::token_filter::stop::{DEFAULT_ENGLISH_STOP_WORDS_SET, StopFilter};
use crate::analysis::tokenizer::word::WordTokenizer;
use crate::error::{PostindexError, Result};

/// A search-text profile identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProfile {
    /// Folding only: no stop words, no stemming.
    Simple,
    Arabic,
    Danish,
    Dutch,
    English,
    Finnish,
    French,
    German,
    Greek,
    Hungarian,
    Italian,
    Norwegian,
    Portuguese,
    Romanian,
    Russian,
    Spanish,
    Swedish,
    Tamil,
    Turkish,
}

impl SearchProfile {
    /// Every known profile, in identifier order.
    pub const ALL: &'static [SearchProfile] = &[
        SearchProfile::Simple,
        SearchProfile::Arabic,
        SearchProfile::Danish,
        SearchProfile::Dutch,
        SearchProfile::English,
        SearchProfile::Finnish,
        SearchProfile::French,
        SearchProfile::German,
        SearchProfile::Greek,
        SearchProfile::Hungarian,
        SearchProfile::Italian,
        SearchProfile::Norwegian,
        SearchProfile::Portuguese,
        SearchProfile::Romanian,
        SearchProfile::Russian,
        SearchProfile::Spanish,
        SearchProfile::Swedish,
        SearchProfile::Tamil,
        SearchProfile::Turkish,
    ];

    /// The profile identifier as used in configuration.
    pub fn identifier(&self) -> &'static str {
        match self {
            SearchProfile::Simple => "simple",
            SearchProfile::Arabic => "arabic",
            SearchProfile::Danish => "danish",
            SearchProfile::Dutch => "dutch",
            SearchProfile::English => "english",
            SearchProfile::Finnish => "finnish",
            SearchProfile::French => "french",
            SearchProfile::German => "german",
            SearchProfile::Greek => "greek",
            SearchProfile::Hungarian => "hungarian",
            SearchProfile::Italian => "italian",
            SearchProfile::Norwegian => "norwegian",
            SearchProfile::Portuguese => "portuguese",
            SearchProfile::Romanian => "romanian",
            SearchProfile::Russian => "russian",
            SearchProfile::Spanish => "spanish",
            SearchProfile::Swedish => "swedish",
            SearchProfile::Tamil => "tamil",
            SearchProfile::Turkish => "turkish",
        }
    }

    /// The snowball algorithm of the profile, `None` for `simple`.
    pub fn algorithm(&self) -> Option<Algorithm> {
        let algorithm = match self {
            SearchProfile::Simple => return None,
            SearchProfile::Arabic => Algorithm::Arabic,
            SearchProfile::Danish => Algorithm::Danish,
            SearchProfile::Dutch => Algorithm::Dutch,
            SearchProfile::English => Algorithm::English,
            SearchProfile::Finnish => Algorithm::Finnish,
            SearchProfile::French => Algorithm::French,
            SearchProfile::German => Algorithm::German,
            SearchProfile::Greek => Algorithm::Greek,
            SearchProfile::Hungarian => Algorithm::Hungarian,
            SearchProfile::Italian => Algorithm::Italian,
            SearchProfile::Norwegian => Algorithm::Norwegian,
            SearchProfile::Portuguese => Algorithm::Portuguese,
            SearchProfile::Romanian => Algorithm::Romanian,
            SearchProfile::Russian => Algorithm::Russian,
            SearchProfile::Spanish => Algorithm::Spanish,
            SearchProfile::Swedish => Algorithm::Swedish,
            SearchProfile::Tamil => Algorithm::Tamil,
            SearchProfile::Turkish => Algorithm::Turkish,
        };
        Some(algorithm)
    }

    /// Built-in stop words of the profile.
    ///
    /// Only English ships a list; other languages take theirs from
    /// configuration.
    pub fn default_stop_words(&self) -> AHashSet<String> {
        match self {
            SearchProfile::English => DEFAULT_ENGLISH_STOP_WORDS_SET.clone(),
            _ => AHashSet::new(),
        }
    }

    /// Build the analyzer producing the stemmed half of a search vector.
    ///
    /// Stop words are folded with the same normalizer as the text so a
    /// configured `"být"` matches the indexed `"byt"`.
    pub fn stemmed_analyzer(&self, stop_words: Option<&[String]>) -> Result<PipelineAnalyzer> {
        let mut analyzer = PipelineAnalyzer::new(Arc::new(WordTokenizer::new()?))
            .add_char_filter(Arc::new(FoldingCharFilter::new()))
            .with_name(self.identifier());

        let stop_words: AHashSet<String> = match stop_words {
            Some(words) => words
                .iter()
                .map(|w| normalize(w))
                .filter(|w| !w.is_empty())
                .collect(),
            None => self.default_stop_words(),
        };
        if !stop_words.is_empty() {
            analyzer = analyzer.add_filter(Arc::new(StopFilter::with_stop_words(stop_words)));
        }

        if let Some(algorithm) = self.algorithm() {
            analyzer = analyzer.add_filter(Arc::new(StemFilter::new(algorithm, self.identifier())));
        }

        Ok(analyzer)
    }

    /// Build the analyzer producing the exact half of a search vector.
    pub fn exact_analyzer(marker: &str) -> Result<PipelineAnalyzer> {
        Ok(PipelineAnalyzer::new(Arc::new(WordTokenizer::new()?))
            .add_char_filter(Arc::new(FoldingCharFilter::new()))
            .add_filter(Arc::new(MarkerFilter::new(marker)))
            .with_name("exact"))
    }
}

impl Default for SearchProfile {
    fn default() -> Self {
        SearchProfile::English
    }
}

impl fmt::Display for SearchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for SearchProfile {
    type Err = PostindexError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        SearchProfile::ALL
            .iter()
            .copied()
            .find(|profile| profile.identifier() == wanted)
            .ok_or_else(|| PostindexError::config(format!("Unknown search profile: {s}")))
    }
}
