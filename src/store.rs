//! Persistence capabilities consumed by the indexer.
//!
//! Each trait lists one narrow capability of the storage collaborator. The
//! host assembles a full implementation by implementing all of them on one
//! transaction-scoped handle; [`IndexStore`] and [`ContentStore`] are blanket
//! supertraits naming the combinations the indexer needs.
//!
//! Every write goes through the handle the caller passed in, so derived rows
//! become visible together with the content row when the caller commits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::{Backlink, CommentId, ContentId, ContentRef, HashtagId, PostId, UserId};
use crate::error::Result;
use crate::vector::merged::MergedVector;

pub mod memory;

/// Hashtag dictionary.
#[async_trait]
pub trait HashtagStore: Send + Sync {
    /// Insert the hashtag if it is missing and return its id.
    ///
    /// Must rely on a uniqueness constraint on `name`. A lost insert race is
    /// reported as [`PostindexError::Conflict`](crate::error::PostindexError::Conflict).
    async fn upsert_hashtag(&mut self, name: &str) -> Result<HashtagId>;
}

/// Hashtag usages owned by content rows.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Replace every usage of `content` with `hashtag_ids`.
    async fn replace_hashtag_usages(
        &mut self,
        content: ContentId,
        hashtag_ids: &[HashtagId],
    ) -> Result<()>;
}

/// Backlinks owned by the content row they were found in.
#[async_trait]
pub trait BacklinkStore: Send + Sync {
    /// Replace every backlink found in `source` with `backlinks`.
    async fn replace_backlinks(&mut self, source: ContentRef, backlinks: &[Backlink])
    -> Result<()>;
}

/// User handle lookup.
#[async_trait]
pub trait HandleDirectory: Send + Sync {
    async fn resolve_handle(&self, handle: &str) -> Result<Option<UserId>>;
}

/// Search vectors owned by content rows.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn write_search_vector(&mut self, content: ContentId, vector: &MergedVector)
    -> Result<()>;
}

/// A resolved mention together with the context it appeared in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionTarget {
    /// The mentioned user.
    pub user_id: UserId,
    /// The handle as written, without `@`.
    pub handle: String,
    /// Target of a link written right after the mention, if any.
    pub link: Option<String>,
    /// The content the mention was found in.
    pub owner: ContentRef,
}

/// Decides whether a mention references a specific post.
#[async_trait]
pub trait PostLocator: Send + Sync {
    async fn locate_post(&self, target: &MentionTarget) -> Result<Option<PostId>>;
}

/// A post and the bodies of its comments, in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub post_id: PostId,
    pub body: String,
    pub comments: Vec<(CommentId, String)>,
}

/// Read access to thread bodies.
#[async_trait]
pub trait ThreadSource: Send + Sync {
    async fn load_thread(&self, post: PostId) -> Result<Option<Thread>>;
}

/// Everything entity extraction needs.
pub trait IndexStore: HashtagStore + HandleDirectory + PostLocator {}

impl<T: HashtagStore + HandleDirectory + PostLocator + ?Sized> IndexStore for T {}

/// Everything derive-and-persist needs.
pub trait ContentStore: IndexStore + UsageStore + BacklinkStore + VectorStore + ThreadSource {}

impl<T> ContentStore for T where
    T: IndexStore + UsageStore + BacklinkStore + VectorStore + ThreadSource + ?Sized
{
}
