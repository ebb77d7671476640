//! The merged vector value and its tsvector rendering.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::token::Token;
use crate::vector::builder::QueryTerm;

/// Largest position a tsvector can store; later words share it.
pub const MAX_POSITION: u16 = 16383;

/// Most positions kept per lexeme.
pub const MAX_POSITIONS_PER_LEXEME: usize = 256;

/// Longest lexeme, in bytes, that can be indexed.
pub const MAX_LEXEME_BYTES: usize = 2046;

/// One lexeme of a merged vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub lexeme: String,
    /// Strictly increasing 1-based positions.
    pub positions: Vec<u16>,
    /// Whether the entry belongs to the exact half.
    pub exact: bool,
}

/// Ordered collection of lexemes with positions, sorted by lexeme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedVector {
    entries: Vec<VectorEntry>,
}

impl MergedVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the analyzed halves of one document.
    ///
    /// Positions are taken over unchanged. Lexemes longer than
    /// [`MAX_LEXEME_BYTES`] are skipped, positions past [`MAX_POSITION`] are
    /// clamped and each lexeme keeps at most [`MAX_POSITIONS_PER_LEXEME`].
    pub fn merge<S, E>(stemmed: S, exact: E) -> Self
    where
        S: IntoIterator<Item = Token>,
        E: IntoIterator<Item = Token>,
    {
        let mut lexemes: BTreeMap<String, VectorEntry> = BTreeMap::new();

        let halves = stemmed
            .into_iter()
            .map(|token| (token, false))
            .chain(exact.into_iter().map(|token| (token, true)));

        for (token, exact) in halves {
            if token.is_empty() || token.len() > MAX_LEXEME_BYTES {
                continue;
            }
            let position = token.position.clamp(1, u32::from(MAX_POSITION)) as u16;

            let entry = lexemes
                .entry(token.text)
                .or_insert_with_key(|lexeme| VectorEntry {
                    lexeme: lexeme.clone(),
                    positions: Vec::new(),
                    exact,
                });
            if entry.positions.len() < MAX_POSITIONS_PER_LEXEME
                && entry.positions.last().is_none_or(|last| *last < position)
            {
                entry.positions.push(position);
            }
        }

        MergedVector {
            entries: lexemes.into_values().collect(),
        }
    }

    pub fn entries(&self) -> &[VectorEntry] {
        &self.entries
    }

    /// Number of distinct lexemes across both halves.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, lexeme: &str) -> Option<&VectorEntry> {
        self.entries
            .binary_search_by(|entry| entry.lexeme.as_str().cmp(lexeme))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn contains(&self, lexeme: &str) -> bool {
        self.get(lexeme).is_some()
    }

    /// Entries of the stemmed half.
    pub fn stemmed(&self) -> impl Iterator<Item = &VectorEntry> {
        self.entries.iter().filter(|entry| !entry.exact)
    }

    /// Entries of the exact half.
    pub fn exact(&self) -> impl Iterator<Item = &VectorEntry> {
        self.entries.iter().filter(|entry| entry.exact)
    }

    /// Whether every query term has an alternative present in the vector.
    ///
    /// An empty query matches nothing.
    pub fn matches(&self, terms: &[QueryTerm]) -> bool {
        !terms.is_empty()
            && terms.iter().all(|term| {
                term.alternatives
                    .iter()
                    .any(|lexeme| self.contains(lexeme))
            })
    }

    /// Render in PostgreSQL `tsvector` input syntax.
    pub fn to_tsvector_literal(&self) -> String {
        let mut out = String::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            if idx > 0 {
                out.push(' ');
            }
            out.push('\'');
            for c in entry.lexeme.chars() {
                if c == '\'' || c == '\\' {
                    out.push(c);
                }
                out.push(c);
            }
            out.push('\'');
            for (pos_idx, position) in entry.positions.iter().enumerate() {
                out.push(if pos_idx == 0 { ':' } else { ',' });
                out.push_str(&position.to_string());
            }
        }
        out
    }
}

impl fmt::Display for MergedVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tsvector_literal())
    }
}
