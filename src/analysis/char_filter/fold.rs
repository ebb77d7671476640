use super::CharFilter;
use crate::analysis::normalizer::normalize;

/// A char filter that applies the crate-wide text canonicalization.
///
/// Analyzers that start with this filter produce lexemes folded exactly like
/// hashtag names, so a hashtag and the same word in running text compare
/// equal.
#[derive(Clone, Debug, Default)]
pub struct FoldingCharFilter;

impl FoldingCharFilter {
    pub fn new() -> Self {
        FoldingCharFilter
    }
}

impl CharFilter for FoldingCharFilter {
    fn filter(&self, input: &str) -> String {
        normalize(input)
    }

    fn name(&self) -> &'static str {
        "fold"
    }
}
