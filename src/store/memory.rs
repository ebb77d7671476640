//! In-memory content store with serialized write transactions.
//!
//! [`MemoryStore`] keeps users, posts, comments and every derived row in one
//! [`MemoryState`]. Writers go through a [`MemoryTransaction`]: transactions
//! are serialized by an async mutex, work on a private copy of the state and
//! publish it atomically on [`commit`](MemoryTransaction::commit). Dropping a
//! transaction without committing rolls it back, so readers of
//! [`MemoryStore::snapshot`] never observe half-derived content.
//!
//! Deleting a post or comment cascades to the rows it owns, the way foreign
//! keys with `ON DELETE CASCADE` would.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::content::{
    Backlink, CommentId, ContentId, ContentRef, Hashtag, HashtagId, PostId, UserId,
};
use crate::error::{PostindexError, Result};
use crate::store::{
    BacklinkStore, HandleDirectory, HashtagStore, MentionTarget, PostLocator, Thread,
    ThreadSource, UsageStore, VectorStore,
};
use crate::vector::merged::MergedVector;

#[derive(Debug, Clone)]
struct PostRow {
    author: UserId,
    body: String,
}

#[derive(Debug, Clone)]
struct CommentRow {
    post_id: PostId,
    author: UserId,
    body: String,
}

/// Every table of the memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    next_id: i64,
    users: BTreeMap<UserId, String>,
    handles: AHashMap<String, UserId>,
    posts: BTreeMap<PostId, PostRow>,
    comments: BTreeMap<CommentId, CommentRow>,
    hashtags: BTreeMap<HashtagId, String>,
    hashtag_names: AHashMap<String, HashtagId>,
    usages: BTreeMap<ContentId, BTreeSet<HashtagId>>,
    backlinks: BTreeSet<Backlink>,
    vectors: BTreeMap<ContentId, MergedVector>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn handle(&self, user: UserId) -> Option<&str> {
        self.users.get(&user).map(String::as_str)
    }

    pub fn post_body(&self, post: PostId) -> Option<&str> {
        self.posts.get(&post).map(|row| row.body.as_str())
    }

    pub fn post_author(&self, post: PostId) -> Option<UserId> {
        self.posts.get(&post).map(|row| row.author)
    }

    pub fn comment_body(&self, comment: CommentId) -> Option<&str> {
        self.comments.get(&comment).map(|row| row.body.as_str())
    }

    pub fn comment_author(&self, comment: CommentId) -> Option<UserId> {
        self.comments.get(&comment).map(|row| row.author)
    }

    /// Comments of `post` in creation order.
    pub fn comments_of(&self, post: PostId) -> Vec<CommentId> {
        self.comments
            .iter()
            .filter(|(_, row)| row.post_id == post)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn hashtags(&self) -> Vec<Hashtag> {
        self.hashtags
            .iter()
            .map(|(id, name)| Hashtag {
                id: *id,
                name: name.clone(),
            })
            .collect()
    }

    pub fn hashtag_id(&self, name: &str) -> Option<HashtagId> {
        self.hashtag_names.get(name).copied()
    }

    pub fn usages(&self, content: ContentId) -> Vec<HashtagId> {
        self.usages
            .get(&content)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Names of the hashtags used by `content`, sorted.
    pub fn hashtag_names_of(&self, content: ContentId) -> Vec<String> {
        let mut names: Vec<String> = self
            .usages(content)
            .into_iter()
            .filter_map(|id| self.hashtags.get(&id).cloned())
            .collect();
        names.sort();
        names
    }

    pub fn usage_count(&self) -> usize {
        self.usages.values().map(BTreeSet::len).sum()
    }

    pub fn backlinks(&self) -> Vec<Backlink> {
        self.backlinks.iter().copied().collect()
    }

    pub fn backlinks_to(&self, post: PostId) -> Vec<Backlink> {
        self.backlinks
            .iter()
            .filter(|backlink| backlink.post_id == post)
            .copied()
            .collect()
    }

    pub fn backlinks_from(&self, source: ContentRef) -> Vec<Backlink> {
        self.backlinks
            .iter()
            .filter(|backlink| backlink.source() == source)
            .copied()
            .collect()
    }

    pub fn vector(&self, content: ContentId) -> Option<&MergedVector> {
        self.vectors.get(&content)
    }

    fn thread(&self, post: PostId) -> Option<Thread> {
        let row = self.posts.get(&post)?;
        Some(Thread {
            post_id: post,
            body: row.body.clone(),
            comments: self
                .comments
                .iter()
                .filter(|(_, comment)| comment.post_id == post)
                .map(|(id, comment)| (*id, comment.body.clone()))
                .collect(),
        })
    }

    fn drop_owned_rows(&mut self, content: ContentId) {
        self.usages.remove(&content);
        self.vectors.remove(&content);
    }
}

#[derive(Debug, Default)]
struct Faults {
    upsert_conflicts: AtomicU32,
    unavailable: AtomicBool,
}

impl Faults {
    fn take_conflict(&self) -> bool {
        self.upsert_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(PostindexError::storage("memory store is unavailable"))
        } else {
            Ok(())
        }
    }
}

/// Shared handle to an in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    writer: Arc<Mutex<()>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a write transaction, waiting for the previous one to finish.
    pub async fn begin(&self) -> MemoryTransaction {
        let guard = self.writer.clone().lock_owned().await;
        let working = self.state.read().clone();
        MemoryTransaction {
            _guard: guard,
            working,
            shared: Arc::clone(&self.state),
            faults: Arc::clone(&self.faults),
        }
    }

    /// Copy of the last committed state.
    pub fn snapshot(&self) -> MemoryState {
        self.state.read().clone()
    }

    /// Make the next `count` hashtag upserts fail as lost insert races.
    pub fn inject_upsert_conflicts(&self, count: u32) {
        self.faults.upsert_conflicts.store(count, Ordering::SeqCst);
    }

    /// Simulate the storage going away or coming back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

/// A serialized write transaction on a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTransaction {
    _guard: OwnedMutexGuard<()>,
    working: MemoryState,
    shared: Arc<RwLock<MemoryState>>,
    faults: Arc<Faults>,
}

impl MemoryTransaction {
    /// Publish every change made in this transaction.
    pub fn commit(self) -> Result<()> {
        self.faults.check_available()?;
        debug!(
            posts = self.working.posts.len(),
            comments = self.working.comments.len(),
            "committing memory transaction"
        );
        *self.shared.write() = self.working;
        Ok(())
    }

    /// Discard every change made in this transaction.
    pub fn rollback(self) {
        debug!("rolling back memory transaction");
    }

    /// The state as seen inside this transaction.
    pub fn state(&self) -> &MemoryState {
        &self.working
    }

    pub fn create_user(&mut self, handle: &str) -> Result<UserId> {
        self.faults.check_available()?;
        let key = handle.to_lowercase();
        if self.working.handles.contains_key(&key) {
            return Err(PostindexError::conflict(format!(
                "handle {handle:?} is taken"
            )));
        }
        let id = UserId(self.working.next_id());
        self.working.users.insert(id, handle.to_string());
        self.working.handles.insert(key, id);
        Ok(id)
    }

    pub fn create_post(&mut self, author: UserId, body: &str) -> Result<PostId> {
        self.faults.check_available()?;
        self.require_user(author)?;
        let id = PostId(self.working.next_id());
        self.working.posts.insert(
            id,
            PostRow {
                author,
                body: body.to_string(),
            },
        );
        Ok(id)
    }

    pub fn create_comment(&mut self, post: PostId, author: UserId, body: &str) -> Result<CommentId> {
        self.faults.check_available()?;
        self.require_user(author)?;
        self.require_post(post)?;
        let id = CommentId(self.working.next_id());
        self.working.comments.insert(
            id,
            CommentRow {
                post_id: post,
                author,
                body: body.to_string(),
            },
        );
        Ok(id)
    }

    pub fn update_post_body(&mut self, post: PostId, body: &str) -> Result<()> {
        self.faults.check_available()?;
        let row = self
            .working
            .posts
            .get_mut(&post)
            .ok_or_else(|| PostindexError::not_found(post.to_string()))?;
        row.body = body.to_string();
        Ok(())
    }

    /// Rewrite a comment body and return the post it belongs to.
    pub fn update_comment_body(&mut self, comment: CommentId, body: &str) -> Result<PostId> {
        self.faults.check_available()?;
        let row = self
            .working
            .comments
            .get_mut(&comment)
            .ok_or_else(|| PostindexError::not_found(comment.to_string()))?;
        row.body = body.to_string();
        Ok(row.post_id)
    }

    /// Delete a post together with its comments and every row they own.
    pub fn delete_post(&mut self, post: PostId) -> Result<()> {
        self.faults.check_available()?;
        self.working
            .posts
            .remove(&post)
            .ok_or_else(|| PostindexError::not_found(post.to_string()))?;

        for comment in self.working.comments_of(post) {
            self.working.comments.remove(&comment);
            self.working.drop_owned_rows(ContentId::Comment(comment));
        }
        self.working.drop_owned_rows(ContentId::Post(post));
        self.working
            .backlinks
            .retain(|backlink| backlink.post_id != post && backlink.ref_post_id != post);
        Ok(())
    }

    /// Delete a comment and the rows it owns; returns its post.
    pub fn delete_comment(&mut self, comment: CommentId) -> Result<PostId> {
        self.faults.check_available()?;
        let row = self
            .working
            .comments
            .remove(&comment)
            .ok_or_else(|| PostindexError::not_found(comment.to_string()))?;
        self.working.drop_owned_rows(ContentId::Comment(comment));
        self.working
            .backlinks
            .retain(|backlink| backlink.ref_comment_id != Some(comment));
        Ok(row.post_id)
    }

    fn require_user(&self, user: UserId) -> Result<()> {
        if self.working.users.contains_key(&user) {
            Ok(())
        } else {
            Err(PostindexError::not_found(user.to_string()))
        }
    }

    fn require_post(&self, post: PostId) -> Result<()> {
        if self.working.posts.contains_key(&post) {
            Ok(())
        } else {
            Err(PostindexError::not_found(post.to_string()))
        }
    }

    fn require_content(&self, content: ContentId) -> Result<()> {
        let exists = match content {
            ContentId::Post(post) => self.working.posts.contains_key(&post),
            ContentId::Comment(comment) => self.working.comments.contains_key(&comment),
        };
        if exists {
            Ok(())
        } else {
            Err(PostindexError::not_found(content.to_string()))
        }
    }
}

/// The post id named by a `/posts/<id>` or `/post/<id>` path.
fn post_id_from_link(link: &str) -> Option<PostId> {
    let mut segments = link.split(['/', '?', '#']);
    while let Some(segment) = segments.next() {
        if segment.eq_ignore_ascii_case("posts") || segment.eq_ignore_ascii_case("post") {
            return segments.next()?.parse().ok().map(PostId);
        }
    }
    None
}

#[async_trait]
impl HashtagStore for MemoryTransaction {
    async fn upsert_hashtag(&mut self, name: &str) -> Result<HashtagId> {
        self.faults.check_available()?;
        if self.faults.take_conflict() {
            return Err(PostindexError::conflict(format!(
                "hashtag {name:?} was inserted concurrently"
            )));
        }
        if let Some(id) = self.working.hashtag_names.get(name) {
            return Ok(*id);
        }
        let id = HashtagId(self.working.next_id());
        self.working.hashtags.insert(id, name.to_string());
        self.working.hashtag_names.insert(name.to_string(), id);
        Ok(id)
    }
}

#[async_trait]
impl UsageStore for MemoryTransaction {
    async fn replace_hashtag_usages(
        &mut self,
        content: ContentId,
        hashtag_ids: &[HashtagId],
    ) -> Result<()> {
        self.faults.check_available()?;
        self.require_content(content)?;
        if let Some(missing) = hashtag_ids
            .iter()
            .find(|id| !self.working.hashtags.contains_key(*id))
        {
            return Err(PostindexError::storage(format!(
                "usage references unknown {missing}"
            )));
        }
        self.working
            .usages
            .insert(content, hashtag_ids.iter().copied().collect());
        Ok(())
    }
}

#[async_trait]
impl BacklinkStore for MemoryTransaction {
    async fn replace_backlinks(
        &mut self,
        source: ContentRef,
        backlinks: &[Backlink],
    ) -> Result<()> {
        self.faults.check_available()?;
        self.require_content(source.id())?;
        for backlink in backlinks {
            if backlink.source() != source {
                return Err(PostindexError::storage(format!(
                    "backlink from {} stored under {source}",
                    backlink.source()
                )));
            }
            if backlink.is_self_reference() {
                return Err(PostindexError::storage(format!(
                    "{} cannot reference itself",
                    backlink.post_id
                )));
            }
            self.require_post(backlink.post_id)?;
        }

        self.working
            .backlinks
            .retain(|backlink| backlink.source() != source);
        self.working.backlinks.extend(backlinks.iter().copied());
        Ok(())
    }
}

#[async_trait]
impl HandleDirectory for MemoryTransaction {
    async fn resolve_handle(&self, handle: &str) -> Result<Option<UserId>> {
        self.faults.check_available()?;
        Ok(self.working.handles.get(&handle.to_lowercase()).copied())
    }
}

#[async_trait]
impl VectorStore for MemoryTransaction {
    async fn write_search_vector(
        &mut self,
        content: ContentId,
        vector: &MergedVector,
    ) -> Result<()> {
        self.faults.check_available()?;
        self.require_content(content)?;
        self.working.vectors.insert(content, vector.clone());
        Ok(())
    }
}

/// A link naming a post resolves to that post when the mentioned user wrote
/// it. A mention without such a link references no post.
#[async_trait]
impl PostLocator for MemoryTransaction {
    async fn locate_post(&self, target: &MentionTarget) -> Result<Option<PostId>> {
        self.faults.check_available()?;
        let Some(post) = target.link.as_deref().and_then(post_id_from_link) else {
            return Ok(None);
        };
        let authored = self.working.post_author(post) == Some(target.user_id);
        Ok(authored.then_some(post))
    }
}

#[async_trait]
impl ThreadSource for MemoryTransaction {
    async fn load_thread(&self, post: PostId) -> Result<Option<Thread>> {
        self.faults.check_available()?;
        Ok(self.working.thread(post))
    }
}
