//! Matchers recognising the structured markup kinds.
//!
//! Every matcher answers one question: where is the leftmost match at or
//! after a given byte offset. The [`Scanner`](super::scanner::Scanner)
//! combines the answers. Patterns use look-around only through `\b` and
//! `\B`, which the regex engine evaluates against the full haystack, so a
//! match never depends on where a search started.

use std::fmt;
use std::ops::Range;

use regex::Regex;

use crate::config::IndexingConfig;
use crate::error::{PostindexError, Result};
use crate::markup::token::MarkupKind;

/// `#` plus word characters, not glued to a preceding word.
const HASHTAG_PATTERN: &str = r"\B#\w+";

const EMAIL_PATTERN: &str = r"\w[\w.+-]*@[\w-]+(?:\.[\w-]+)+";

/// `@` plus a handle, not glued to a preceding word (that would be an email).
const MENTION_PATTERN: &str = r"\B@\w+(?:[.-]\w+)*";

const ARROW_PATTERN: &str = r"<-{1,2}>|<-{1,2}|-{1,2}>|<=>|=>";

const URL_PATTERN: &str = r#"(?i)\b(?:https?|ftp)://[^\s<>"]+"#;

/// Capability of recognising one markup kind.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// The kind of token this matcher produces.
    fn kind(&self) -> MarkupKind;

    /// Find the leftmost match that starts at or after `from`.
    ///
    /// `from` is always a char boundary of `text`.
    fn find_at(&self, text: &str, from: usize) -> Option<Range<usize>>;
}

/// A matcher backed by a single regular expression.
#[derive(Clone, Debug)]
pub struct RegexMatcher {
    kind: MarkupKind,
    regex: Regex,
}

impl RegexMatcher {
    /// Create a matcher for `kind` from a pattern.
    pub fn new(kind: MarkupKind, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            PostindexError::config(format!("Invalid {kind} pattern: {e}"))
        })?;
        Ok(RegexMatcher { kind, regex })
    }

    /// Hashtags such as `#rust`.
    pub fn hashtag() -> Result<Self> {
        Self::new(MarkupKind::Hashtag, HASHTAG_PATTERN)
    }

    /// Email addresses such as `bob@example.com`.
    pub fn email() -> Result<Self> {
        Self::new(MarkupKind::Email, EMAIL_PATTERN)
    }

    /// Mentions such as `@bob`.
    pub fn mention() -> Result<Self> {
        Self::new(MarkupKind::Mention, MENTION_PATTERN)
    }

    /// ASCII arrows such as `->`, `<--` or `<=>`.
    pub fn arrow() -> Result<Self> {
        Self::new(MarkupKind::Arrow, ARROW_PATTERN)
    }
}

impl Matcher for RegexMatcher {
    fn kind(&self) -> MarkupKind {
        self.kind
    }

    fn find_at(&self, text: &str, from: usize) -> Option<Range<usize>> {
        self.regex.find_at(text, from).map(|m| m.range())
    }
}

/// One half of link recognition: URLs with a scheme, or bare domains whose
/// top-level label is in the allow-list.
///
/// The halves are separate scanner entries so each keeps its own
/// lookahead; a text with many bare domains and no scheme URL then searches
/// for a scheme URL once.
#[derive(Clone, Debug)]
pub struct LinkMatcher {
    regex: Regex,
}

impl LinkMatcher {
    /// URLs with an `http`, `https` or `ftp` scheme.
    pub fn url() -> Result<Self> {
        let regex = Regex::new(URL_PATTERN)
            .map_err(|e| PostindexError::config(format!("Invalid link pattern: {e}")))?;
        Ok(LinkMatcher { regex })
    }

    /// Bare domains such as `www.seznam.cz/zpravy`.
    ///
    /// Returns `None` for an empty allow-list.
    pub fn bare_domain<S: AsRef<str>>(allowed_tlds: &[S]) -> Result<Option<Self>> {
        let mut tlds: Vec<String> = allowed_tlds
            .iter()
            .map(|tld| tld.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|tld| !tld.is_empty())
            .collect();
        if tlds.is_empty() {
            return Ok(None);
        }
        // Longest first so `co` never shadows `com`.
        tlds.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        tlds.dedup();

        let alternation = tlds
            .iter()
            .map(|tld| regex::escape(tld))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(
            r#"(?i)\b(?:[\p{{L}}\p{{N}}](?:[\p{{L}}\p{{N}}-]*[\p{{L}}\p{{N}}])?\.)+(?:{alternation})\b(?::\d{{1,5}})?(?:/[^\s<>"]*)?"#
        );
        let regex = Regex::new(&pattern).map_err(|e| {
            PostindexError::config(format!("Invalid top-level domain list: {e}"))
        })?;
        Ok(Some(LinkMatcher { regex }))
    }
}

impl Matcher for LinkMatcher {
    fn kind(&self) -> MarkupKind {
        MarkupKind::Link
    }

    fn find_at(&self, text: &str, from: usize) -> Option<Range<usize>> {
        let range = self.regex.find_at(text, from)?.range();
        let end = range.start + trimmed_len(&text[range.clone()]);
        Some(range.start..end)
    }
}

/// Both link matchers, scheme URLs first so they win ties with a bare domain.
pub fn link_matchers<S: AsRef<str>>(allowed_tlds: &[S]) -> Result<Vec<LinkMatcher>> {
    let mut matchers = vec![LinkMatcher::url()?];
    matchers.extend(LinkMatcher::bare_domain(allowed_tlds)?);
    Ok(matchers)
}

/// Length of a link candidate once sentence punctuation is cut off its end.
///
/// A closing bracket stays when the link itself opened it, as in
/// `https://en.wikipedia.org/wiki/Rust_(programming_language)`.
fn trimmed_len(candidate: &str) -> usize {
    let opened = |open: char| candidate.chars().filter(|&c| c == open).count();
    let mut parens = (opened('('), candidate.chars().filter(|&c| c == ')').count());
    let mut brackets = (opened('['), candidate.chars().filter(|&c| c == ']').count());

    let mut end = candidate.len();
    while let Some(c) = candidate[..end].chars().next_back() {
        let strip = match c {
            '.' | ',' | ':' | ';' | '!' | '?' | '\'' | '"' | '*' | '\u{2019}' | '\u{201D}' => true,
            ')' if parens.1 > parens.0 => {
                parens.1 -= 1;
                true
            }
            ']' if brackets.1 > brackets.0 => {
                brackets.1 -= 1;
                true
            }
            _ => false,
        };
        if !strip {
            break;
        }
        end -= c.len_utf8();
    }
    end
}

/// Build the scanner entries for a structured kind.
///
/// Links take two entries, every other kind one.
pub fn matchers_for(kind: MarkupKind, config: &IndexingConfig) -> Result<Vec<Box<dyn Matcher>>> {
    let matcher: Box<dyn Matcher> = match kind {
        MarkupKind::Hashtag => Box::new(RegexMatcher::hashtag()?),
        MarkupKind::Email => Box::new(RegexMatcher::email()?),
        MarkupKind::Mention => Box::new(RegexMatcher::mention()?),
        MarkupKind::Link => {
            return Ok(link_matchers(config.allowed_tlds.as_slice())?
                .into_iter()
                .map(|m| Box::new(m) as Box<dyn Matcher>)
                .collect());
        }
        MarkupKind::Arrow => Box::new(RegexMatcher::arrow()?),
        MarkupKind::Text => {
            return Err(PostindexError::config(
                "text is the fallback kind and has no matcher",
            ));
        }
    };
    Ok(vec![matcher])
}
