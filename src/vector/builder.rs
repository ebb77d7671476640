//! Builds merged vectors and the query terms that search them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::analyzer::profile::SearchProfile;
use crate::analysis::token::Token;
use crate::config::IndexingConfig;
use crate::error::Result;
use crate::vector::merged::MergedVector;

/// Which half of a merged vector a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Root-reduced matching; stop words are ignored.
    Stemmed,
    /// Verbatim (folded) wordforms, stop words included.
    Exact,
    /// A word matches through either half.
    #[default]
    Combined,
}

/// One query word and the lexemes that satisfy it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTerm {
    pub alternatives: Vec<String>,
}

/// Produces [`MergedVector`]s for one search profile.
#[derive(Debug, Clone)]
pub struct VectorBuilder {
    profile: SearchProfile,
    stemmed: PipelineAnalyzer,
    exact: PipelineAnalyzer,
}

impl VectorBuilder {
    pub fn new(config: &IndexingConfig) -> Result<Self> {
        config.validate()?;
        Ok(VectorBuilder {
            profile: config.search_profile,
            stemmed: config
                .search_profile
                .stemmed_analyzer(config.stop_words.as_deref())?,
            exact: SearchProfile::exact_analyzer(&config.exact_marker)?,
        })
    }

    pub fn profile(&self) -> SearchProfile {
        self.profile
    }

    /// Build the merged vector of `text` followed by `extra`.
    ///
    /// `extra` continues the position space of `text`; empty input yields an
    /// empty vector.
    pub fn build(&self, text: &str, extra: &str) -> Result<MergedVector> {
        let document = if extra.is_empty() {
            text.to_string()
        } else if text.is_empty() {
            extra.to_string()
        } else {
            format!("{text}\n{extra}")
        };

        let stemmed = self.stemmed.analyze(&document)?;
        let exact = self.exact.analyze(&document)?;
        Ok(MergedVector::merge(stemmed, exact))
    }

    /// Turn a search string into terms for [`MergedVector::matches`].
    pub fn query_terms(&self, text: &str, mode: SearchMode) -> Result<Vec<QueryTerm>> {
        let single = |token: Token| QueryTerm {
            alternatives: vec![token.text],
        };

        let terms = match mode {
            SearchMode::Stemmed => self.stemmed.analyze(text)?.map(single).collect(),
            SearchMode::Exact => self.exact.analyze(text)?.map(single).collect(),
            SearchMode::Combined => {
                let mut stems: BTreeMap<u32, String> = self
                    .stemmed
                    .analyze(text)?
                    .map(|token| (token.position, token.text))
                    .collect();
                self.exact
                    .analyze(text)?
                    .map(|token| {
                        let mut alternatives = vec![token.text];
                        alternatives.extend(stems.remove(&token.position));
                        QueryTerm { alternatives }
                    })
                    .collect()
            }
        };
        Ok(terms)
    }
}
