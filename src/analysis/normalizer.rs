//! Text canonicalization for matching and deduplication.
//!
//! [`normalize`] folds text into the form used for hashtag names and for
//! every lexeme of a search vector:
//!
//! 1. apostrophes become spaces,
//! 2. compatibility decomposition (NFKD),
//! 3. Cyrillic `И`/`и` followed by a combining breve is rewritten back to
//!    `Й`/`й`, so the short I survives the next step,
//! 4. every codepoint of general category Mark is dropped,
//! 5. canonical recomposition (NFC),
//! 6. Unicode lowercase.
//!
//! Every step is a single streaming pass over the characters.
//!
//! # Examples
//!
//! ```
//! use postindex::analysis::normalizer::{link_text, normalize};
//!
//! assert_eq!(normalize("Pražského povstání"), "prazskeho povstani");
//! assert_eq!(normalize("Йогурт"), "йогурт");
//! assert_eq!(link_text("www.Example.com/Café-page"), "example com cafe page");
//! ```

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const COMBINING_BREVE: char = '\u{0306}';

/// Characters treated as apostrophes.
const APOSTROPHES: &[char] = &[
    '\'', '\u{2018}', '\u{2019}', '\u{201B}', '\u{02BC}', '\u{FF07}',
];

fn is_apostrophe(c: char) -> bool {
    APOSTROPHES.contains(&c)
}

/// Canonicalize `text` for matching.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    // Apostrophes are swapped on the decomposed stream. None of them has a
    // canonical decomposition, and compatibility characters that decompose
    // into one (U+0149) are caught as well.
    let mut decomposed = text
        .nfkd()
        .map(|c| if is_apostrophe(c) { ' ' } else { c })
        .peekable();

    let mut stripped = String::with_capacity(text.len());
    while let Some(c) = decomposed.next() {
        match c {
            'И' | 'и' if decomposed.peek() == Some(&COMBINING_BREVE) => {
                decomposed.next();
                stripped.push(if c == 'И' { 'Й' } else { 'й' });
            }
            c if is_combining_mark(c) => {}
            c => stripped.push(c),
        }
    }

    stripped.nfc().collect::<String>().to_lowercase()
}

/// Indexable text for the visible label of a hyperlink.
///
/// Runs of anything that is not a letter or digit collapse to one space,
/// and a leading `www` label is dropped.
pub fn link_text(display_text: &str) -> String {
    let normalized = normalize(display_text);

    let mut collapsed = String::with_capacity(normalized.len());
    let mut in_gap = false;
    for c in normalized.chars() {
        if c.is_alphanumeric() {
            collapsed.push(c);
            in_gap = false;
        } else if !in_gap {
            collapsed.push(' ');
            in_gap = true;
        }
    }

    let trimmed = collapsed.trim();
    trimmed.strip_prefix("www ").unwrap_or(trimmed).to_string()
}
