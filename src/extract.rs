//! Entity extraction: hashtags, mentions and link text from markup tokens.
//!
//! [`EntityExtractor::extract`] walks the tokens of one body and derives:
//!
//! - the distinct hashtags it uses, upserted into the shared dictionary,
//! - backlinks to the posts its mentions reference,
//! - the folded visible text of its links, appended to the search text.
//!
//! Extraction is best-effort: a mention that cannot be resolved becomes an
//! [`ExtractionWarning`] and is left out. Storage failures propagate so the
//! caller's transaction can roll back.

use std::fmt;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::normalizer::{link_text, normalize};
use crate::content::{Backlink, ContentRef, HashtagId, PostId};
use crate::error::{PostindexError, Result};
use crate::markup::token::{MarkupKind, MarkupToken};
use crate::store::{HashtagStore, IndexStore, MentionTarget};

/// A reference that was dropped during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ExtractionWarning {
    /// No user has the mentioned handle.
    UnresolvedHandle { handle: String },
    /// The hashtag folds to nothing (e.g. only combining marks).
    EmptyHashtag { raw: String },
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionWarning::UnresolvedHandle { handle } => {
                write!(f, "unresolved handle @{handle}")
            }
            ExtractionWarning::EmptyHashtag { raw } => write!(f, "empty hashtag {raw:?}"),
        }
    }
}

/// Rows derived from one body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Distinct hashtags in order of first use.
    pub hashtags: Vec<HashtagId>,
    /// Distinct backlinks in order of first mention.
    pub backlinks: Vec<Backlink>,
    /// Folded link labels, space separated.
    pub extra_search_text: String,
    pub warnings: Vec<ExtractionWarning>,
}

/// Derives hashtag usages and backlinks from markup tokens.
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    max_upsert_retries: u32,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        EntityExtractor::new(3)
    }
}

impl EntityExtractor {
    pub fn new(max_upsert_retries: u32) -> Self {
        EntityExtractor { max_upsert_retries }
    }

    pub async fn extract<S>(
        &self,
        store: &mut S,
        tokens: &[MarkupToken<'_>],
        owner: ContentRef,
    ) -> Result<Extraction>
    where
        S: IndexStore + ?Sized,
    {
        let mut extraction = Extraction::default();
        let mut seen_names: AHashSet<String> = AHashSet::new();
        let mut seen_targets: AHashSet<PostId> = AHashSet::new();

        for (idx, token) in tokens.iter().enumerate() {
            match token.kind {
                MarkupKind::Hashtag => {
                    let Some(tag) = token.tag() else { continue };
                    let name = normalize(tag);
                    if name.is_empty() {
                        extraction.warnings.push(ExtractionWarning::EmptyHashtag {
                            raw: token.text.to_string(),
                        });
                        continue;
                    }
                    if !seen_names.insert(name.clone()) {
                        continue;
                    }
                    // Names map to ids one to one, so distinct names give distinct ids.
                    let id = self.upsert_hashtag(store, &name).await?;
                    extraction.hashtags.push(id);
                }
                MarkupKind::Mention => {
                    let Some(handle) = token.handle() else { continue };
                    let Some(user_id) = store.resolve_handle(handle).await? else {
                        extraction.warnings.push(ExtractionWarning::UnresolvedHandle {
                            handle: handle.to_string(),
                        });
                        continue;
                    };

                    let target = MentionTarget {
                        user_id,
                        handle: handle.to_string(),
                        link: following_link(tokens, idx).and_then(|link| link.href()),
                        owner,
                    };
                    match store.locate_post(&target).await? {
                        Some(post) if post == owner.post_id() => {
                            debug!(%owner, handle, "dropping self reference");
                        }
                        Some(post) => {
                            if seen_targets.insert(post) {
                                extraction.backlinks.push(Backlink::new(post, owner));
                            }
                        }
                        None => debug!(%owner, handle, "mention does not reference a post"),
                    }
                }
                _ => {}
            }
        }

        extraction.extra_search_text = link_search_text(tokens);

        for warning in &extraction.warnings {
            warn!(%owner, %warning, "extraction warning");
        }
        debug!(
            %owner,
            hashtags = extraction.hashtags.len(),
            backlinks = extraction.backlinks.len(),
            warnings = extraction.warnings.len(),
            "extracted entities"
        );

        Ok(extraction)
    }

    /// Upsert with bounded retry of lost insert races.
    async fn upsert_hashtag<S>(&self, store: &mut S, name: &str) -> Result<HashtagId>
    where
        S: HashtagStore + ?Sized,
    {
        let mut attempt = 0;
        loop {
            match store.upsert_hashtag(name).await {
                Ok(id) => return Ok(id),
                Err(err) if err.is_conflict() && attempt < self.max_upsert_retries => {
                    attempt += 1;
                    debug!(name, attempt, "retrying hashtag upsert after conflict");
                }
                Err(err) if err.is_conflict() => {
                    warn!(name, attempts = attempt + 1, "hashtag upsert kept conflicting");
                    return Err(PostindexError::transient(format!(
                        "hashtag {name:?}: {err}"
                    )));
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// The link written right after the mention at `idx`, separated by
/// whitespace at most.
fn following_link<'a, 't>(tokens: &'a [MarkupToken<'t>], idx: usize) -> Option<&'a MarkupToken<'t>> {
    let mut rest = tokens.get(idx + 1..)?.iter();
    let mut next = rest.next()?;
    if next.kind == MarkupKind::Text && next.text.chars().all(char::is_whitespace) {
        next = rest.next()?;
    }
    (next.kind == MarkupKind::Link).then_some(next)
}

/// Folded visible text of every link in `tokens`, percent-escapes decoded.
pub fn link_search_text(tokens: &[MarkupToken<'_>]) -> String {
    tokens
        .iter()
        .filter_map(|token| token.label())
        .map(|label| link_text(&label))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The text of `tokens` with each link span blanked out.
///
/// Links reach the vector through [`link_search_text`] only, so their raw
/// encoding is never analyzed.
pub fn text_without_links(tokens: &[MarkupToken<'_>]) -> String {
    tokens
        .iter()
        .map(|token| match token.kind {
            MarkupKind::Link => " ",
            _ => token.text,
        })
        .collect()
}
