//! The left-to-right markup scan.

use std::fmt;

use crate::config::IndexingConfig;
use crate::error::{PostindexError, Result};
use crate::markup::matcher::{Matcher, matchers_for};
use crate::markup::token::{MarkupKind, MarkupToken};

/// An ordered table of matchers.
///
/// The order of the table is the tie-break order: when two matchers find a
/// match at the same offset, the one listed first wins.
pub struct Scanner {
    matchers: Vec<Box<dyn Matcher>>,
}

impl Scanner {
    /// Create a scanner over an explicit matcher table.
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Scanner { matchers }
    }

    /// Create a scanner with the matcher order and domain allow-list of
    /// `config`.
    pub fn from_config(config: &IndexingConfig) -> Result<Self> {
        let mut matchers = Vec::with_capacity(config.matcher_order.len() + 1);
        for (idx, &kind) in config.matcher_order.iter().enumerate() {
            if config.matcher_order[..idx].contains(&kind) {
                return Err(PostindexError::config(format!(
                    "Matcher {kind} listed more than once"
                )));
            }
            matchers.extend(matchers_for(kind, config)?);
        }
        Ok(Scanner::new(matchers))
    }

    /// The kinds of the matcher table, in priority order.
    pub fn kinds(&self) -> Vec<MarkupKind> {
        let mut kinds: Vec<_> = self.matchers.iter().map(|m| m.kind()).collect();
        kinds.dedup();
        kinds
    }

    /// Scan `text` into a lazy token sequence.
    ///
    /// The sequence is gap-free: concatenating the spans of all tokens
    /// yields `text`. Cloning the iterator restarts nothing and shares
    /// nothing; each clone continues independently from the same point.
    pub fn scan<'s, 't>(&'s self, text: &'t str) -> MarkupTokens<'s, 't> {
        MarkupTokens {
            matchers: &self.matchers,
            text,
            pos: 0,
            lookahead: vec![Lookahead::Unknown; self.matchers.len()],
        }
    }
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("matchers", &self.kinds())
            .finish()
    }
}

/// The next match a matcher reported, kept until the scan passes it.
#[derive(Clone, Copy, Debug)]
enum Lookahead {
    Unknown,
    Found { start: usize, end: usize },
    Exhausted,
}

/// Lazy iterator over the markup tokens of one text.
///
/// Each matcher is searched again only after the scan has moved past the
/// start of its cached match, so a matcher whose next match lies far ahead
/// is not re-run for every token in between.
#[derive(Clone)]
pub struct MarkupTokens<'s, 't> {
    matchers: &'s [Box<dyn Matcher>],
    text: &'t str,
    pos: usize,
    lookahead: Vec<Lookahead>,
}

impl MarkupTokens<'_, '_> {
    /// The earliest upcoming match as `(start, end, kind)`.
    fn next_match(&mut self) -> Option<(usize, usize, MarkupKind)> {
        let mut best: Option<(usize, usize, MarkupKind)> = None;

        for (slot, matcher) in self.lookahead.iter_mut().zip(self.matchers) {
            let (start, end) = match *slot {
                Lookahead::Exhausted => continue,
                Lookahead::Found { start, end } if start >= self.pos => (start, end),
                _ => match matcher.find_at(self.text, self.pos) {
                    Some(range) => {
                        *slot = Lookahead::Found {
                            start: range.start,
                            end: range.end,
                        };
                        (range.start, range.end)
                    }
                    None => {
                        *slot = Lookahead::Exhausted;
                        continue;
                    }
                },
            };

            // Empty matches cannot advance the scan.
            if end <= start {
                *slot = Lookahead::Unknown;
                continue;
            }
            // Strictly earlier only: at equal offsets the earlier matcher stays.
            if best.is_none_or(|(best_start, _, _)| start < best_start) {
                best = Some((start, end, matcher.kind()));
            }
        }

        best
    }
}

impl<'t> Iterator for MarkupTokens<'_, 't> {
    type Item = MarkupToken<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }

        let token = match self.next_match() {
            Some((start, end, kind)) if start == self.pos => {
                MarkupToken::new(kind, self.text, start, end)
            }
            Some((start, _, _)) => MarkupToken::new(MarkupKind::Text, self.text, self.pos, start),
            None => MarkupToken::new(MarkupKind::Text, self.text, self.pos, self.text.len()),
        };

        self.pos = token.end;
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Range;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::markup::matcher::RegexMatcher;

    /// Counts how often the scanner searches the wrapped matcher.
    #[derive(Debug)]
    struct Counting {
        inner: Box<dyn Matcher>,
        calls: Arc<AtomicUsize>,
    }

    impl Matcher for Counting {
        fn kind(&self) -> MarkupKind {
            self.inner.kind()
        }

        fn find_at(&self, text: &str, from: usize) -> Option<Range<usize>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.inner.find_at(text, from)
        }
    }

    fn counting_scanner(kinds: &[MarkupKind]) -> (Scanner, Arc<AtomicUsize>) {
        let config = IndexingConfig::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        for &kind in kinds {
            for inner in matchers_for(kind, &config).unwrap() {
                matchers.push(Box::new(Counting {
                    inner,
                    calls: Arc::clone(&calls),
                }));
            }
        }
        (Scanner::new(matchers), calls)
    }

    fn scanner() -> Scanner {
        Scanner::from_config(&IndexingConfig::default()).unwrap()
    }

    fn spans(scanner: &Scanner, text: &str) -> Vec<(MarkupKind, String)> {
        scanner
            .scan(text)
            .map(|t| (t.kind, t.text.to_string()))
            .collect()
    }

    #[test]
    fn test_reference_example() {
        let scanner = scanner();
        let tokens = spans(&scanner, "#ff @bob check https://example.com/page thanks");

        assert_eq!(
            tokens,
            vec![
                (MarkupKind::Hashtag, "#ff".to_string()),
                (MarkupKind::Text, " ".to_string()),
                (MarkupKind::Mention, "@bob".to_string()),
                (MarkupKind::Text, " check ".to_string()),
                (MarkupKind::Link, "https://example.com/page".to_string()),
                (MarkupKind::Text, " thanks".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(scanner().scan("").count(), 0);
    }

    #[test]
    fn test_plain_text_is_one_token() {
        let tokens = spans(&scanner(), "just words, nothing else");
        assert_eq!(tokens, vec![(MarkupKind::Text, "just words, nothing else".to_string())]);
    }

    #[test]
    fn test_email_beats_link_and_mention() {
        let tokens = spans(&scanner(), "write bob@example.com");
        assert_eq!(tokens[1], (MarkupKind::Email, "bob@example.com".to_string()));
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_offsets_cover_input() {
        let text = "a -> b <=> #c, @d: www.e.cz!";
        let tokens: Vec<_> = scanner().scan(text).collect();

        let mut expected_start = 0;
        for token in &tokens {
            assert_eq!(token.start, expected_start);
            assert_eq!(&text[token.start..token.end], token.text);
            expected_start = token.end;
        }
        assert_eq!(expected_start, text.len());
        assert_eq!(tokens.iter().map(|t| t.text).collect::<String>(), text);
    }

    #[test]
    fn test_no_adjacent_text_tokens() {
        let tokens: Vec<_> = scanner().scan("x #a#b y -> z @q").collect();
        for pair in tokens.windows(2) {
            assert!(pair[0].is_structured() || pair[1].is_structured());
        }
    }

    #[test]
    fn test_priority_breaks_ties() {
        // Two matchers that both claim "#a" at offset 0.
        let hashtag_first = Scanner::new(vec![
            Box::new(RegexMatcher::hashtag().unwrap()),
            Box::new(RegexMatcher::new(MarkupKind::Arrow, r"#\w").unwrap()),
        ]);
        let arrow_first = Scanner::new(vec![
            Box::new(RegexMatcher::new(MarkupKind::Arrow, r"#\w").unwrap()),
            Box::new(RegexMatcher::hashtag().unwrap()),
        ]);

        assert_eq!(hashtag_first.scan("#ab").next().unwrap().kind, MarkupKind::Hashtag);
        assert_eq!(arrow_first.scan("#ab").next().unwrap().kind, MarkupKind::Arrow);
    }

    #[test]
    fn test_configured_order() {
        let config = IndexingConfig {
            matcher_order: vec![MarkupKind::Mention],
            ..IndexingConfig::default()
        };
        let scanner = Scanner::from_config(&config).unwrap();
        let kinds: Vec<_> = scanner.scan("#a @b").map(|t| t.kind).collect();
        assert_eq!(kinds, vec![MarkupKind::Text, MarkupKind::Mention]);
    }

    #[test]
    fn test_duplicate_matchers_rejected() {
        let config = IndexingConfig {
            matcher_order: vec![MarkupKind::Link, MarkupKind::Link],
            ..IndexingConfig::default()
        };
        assert!(Scanner::from_config(&config).is_err());
    }

    #[test]
    fn test_restartable() {
        let scanner = scanner();
        let text = "#one two @three https://four.example.com";
        let first: Vec<_> = scanner.scan(text).collect();
        let second: Vec<_> = scanner.scan(text).collect();
        assert_eq!(first, second);

        let mut tokens = scanner.scan(text);
        tokens.next();
        let fork = tokens.clone();
        assert_eq!(tokens.collect::<Vec<_>>(), fork.collect::<Vec<_>>());
    }

    #[test]
    fn test_link_dense_text_searches_once_per_match() {
        let (scanner, calls) = counting_scanner(&[MarkupKind::Link]);
        let text = "x.cz ".repeat(1_000);

        let links = scanner
            .scan(&text)
            .filter(|t| t.kind == MarkupKind::Link)
            .count();
        assert_eq!(links, 1_000);
        // The bare-domain entry once per link plus the final miss, the URL
        // entry once.
        assert_eq!(calls.load(Ordering::Relaxed), links + 2);
    }

    #[test]
    fn test_markup_dense_text_searches_once_per_match() {
        let (scanner, calls) = counting_scanner(&IndexingConfig::default().matcher_order);
        let entries = scanner.matchers.len();
        let text = "#a@b.cz".repeat(1_000);

        let tokens = scanner.scan(&text).count();
        assert_eq!(scanner.scan(&text).map(|t| t.text).collect::<String>(), text);
        assert!(calls.load(Ordering::Relaxed) <= (tokens + 1) * entries * 2);
    }

    #[test]
    fn test_links_are_one_kind() {
        assert_eq!(scanner().kinds(), IndexingConfig::default().matcher_order);
    }

    #[test]
    fn test_pathological_input_terminates() {
        let text = format!(
            "{}{}{}",
            "e\u{0301}".repeat(2_000),
            "\u{200B}".repeat(2_000),
            "a.".repeat(2_000)
        );
        let tokens: Vec<_> = scanner().scan(&text).collect();
        assert_eq!(tokens.iter().map(|t| t.text).collect::<String>(), text);
    }
}
