//! Markup token types.

use std::borrow::Cow;
use std::fmt;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

/// Classification of a markup token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupKind {
    /// `#` followed by word characters
    Hashtag,
    /// An email address
    Email,
    /// `@` followed by handle characters
    Mention,
    /// A URL with a scheme, or a bare domain with an allowed top-level label
    Link,
    /// An ASCII arrow such as `->` or `<=>`
    Arrow,
    /// Everything no matcher claimed
    Text,
}

impl MarkupKind {
    /// The structured kinds in their default matching order.
    pub const DEFAULT_ORDER: &'static [MarkupKind] = &[
        MarkupKind::Hashtag,
        MarkupKind::Email,
        MarkupKind::Mention,
        MarkupKind::Link,
        MarkupKind::Arrow,
    ];

    /// Get the kind's name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkupKind::Hashtag => "hashtag",
            MarkupKind::Email => "email",
            MarkupKind::Mention => "mention",
            MarkupKind::Link => "link",
            MarkupKind::Arrow => "arrow",
            MarkupKind::Text => "text",
        }
    }
}

impl fmt::Display for MarkupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed span of the scanned text.
///
/// Tokens borrow the scanned text; `text == &input[start..end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkupToken<'t> {
    /// The token kind
    pub kind: MarkupKind,
    /// The literal span
    pub text: &'t str,
    /// Byte offset of the span start
    pub start: usize,
    /// Byte offset one past the span end
    pub end: usize,
}

impl<'t> MarkupToken<'t> {
    /// Create a token for `input[start..end]`.
    pub fn new(kind: MarkupKind, input: &'t str, start: usize, end: usize) -> Self {
        MarkupToken {
            kind,
            text: &input[start..end],
            start,
            end,
        }
    }

    /// Whether this token is anything but plain text.
    pub fn is_structured(&self) -> bool {
        self.kind != MarkupKind::Text
    }

    /// The hashtag name without the leading `#`.
    pub fn tag(&self) -> Option<&'t str> {
        match self.kind {
            MarkupKind::Hashtag => self.text.strip_prefix('#'),
            _ => None,
        }
    }

    /// The mentioned handle without the leading `@`.
    pub fn handle(&self) -> Option<&'t str> {
        match self.kind {
            MarkupKind::Mention => self.text.strip_prefix('@'),
            _ => None,
        }
    }

    /// The visible label of a link: the span without its scheme.
    pub fn display_text(&self) -> Option<&'t str> {
        match self.kind {
            MarkupKind::Link => Some(
                self.text
                    .find("://")
                    .map_or(self.text, |idx| &self.text[idx + 3..]),
            ),
            _ => None,
        }
    }

    /// The visible label of a link with percent-escapes decoded.
    ///
    /// Falls back to the raw [`display_text`](Self::display_text) when the
    /// escapes do not decode to UTF-8.
    pub fn label(&self) -> Option<Cow<'t, str>> {
        let display = self.display_text()?;
        Some(
            percent_decode_str(display)
                .decode_utf8()
                .unwrap_or(Cow::Borrowed(display)),
        )
    }

    /// The link target, with `http://` prepended to bare domains.
    pub fn href(&self) -> Option<String> {
        match self.kind {
            MarkupKind::Link if self.text.contains("://") => Some(self.text.to_string()),
            MarkupKind::Link => Some(format!("http://{}", self.text)),
            _ => None,
        }
    }

    /// The Unicode arrow an ASCII arrow renders as.
    pub fn glyph(&self) -> Option<char> {
        if self.kind != MarkupKind::Arrow {
            return None;
        }
        match self.text {
            "->" | "-->" => Some('→'),
            "<-" | "<--" => Some('←'),
            "<->" | "<-->" => Some('↔'),
            "=>" => Some('⇒'),
            "<=>" => Some('⇔'),
            _ => None,
        }
    }
}

impl fmt::Display for MarkupToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.kind, self.text)
    }
}
