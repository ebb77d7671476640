//! Entry points for the content-mutation workflow.
//!
//! [`ContentIndexer`] owns the configured scanner, extractor and vector
//! builder. The store handle passed to every call is the caller's
//! transaction: nothing here commits, so usages, backlinks and vectors
//! become visible together with the content row or not at all.
//!
//! # Example
//!
//! ```
//! use postindex::config::IndexingConfig;
//! use postindex::content::ContentRef;
//! use postindex::indexer::ContentIndexer;
//! use postindex::store::memory::MemoryStore;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let indexer = ContentIndexer::new(IndexingConfig::default()).unwrap();
//! let store = MemoryStore::new();
//!
//! let mut tx = store.begin().await;
//! let bob = tx.create_user("bob").unwrap();
//! let body = "#Rust tips";
//! let post = tx.create_post(bob, body).unwrap();
//! let derived = indexer
//!     .derive_and_persist(&mut tx, ContentRef::post(post), body.as_bytes())
//!     .await
//!     .unwrap();
//! tx.commit().unwrap();
//!
//! assert_eq!(derived.hashtags.len(), 1);
//! assert!(store.snapshot().vector(ContentRef::post(post).id()).is_some());
//! # });
//! ```

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::IndexingConfig;
use crate::content::{Backlink, ContentRef, HashtagId, PostId};
use crate::error::{PostindexError, Result};
use crate::extract::{EntityExtractor, ExtractionWarning, link_search_text, text_without_links};
use crate::markup::scanner::Scanner;
use crate::markup::token::MarkupToken;
use crate::store::{ContentStore, Thread, ThreadSource, VectorStore};
use crate::vector::builder::VectorBuilder;
use crate::vector::merged::MergedVector;
use crate::vector::thread::ThreadDocument;

/// Everything derived from one body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedState {
    pub content: ContentRef,
    pub hashtags: Vec<HashtagId>,
    pub backlinks: Vec<Backlink>,
    /// The vector stored for the content itself. For posts this is the
    /// thread vector.
    pub vector: MergedVector,
    /// The recomputed vector of the parent post, for comments.
    pub thread_vector: Option<MergedVector>,
    pub warnings: Vec<ExtractionWarning>,
}

/// Derives and persists the search state of posts and comments.
#[derive(Debug)]
pub struct ContentIndexer {
    config: IndexingConfig,
    scanner: Scanner,
    extractor: EntityExtractor,
    builder: VectorBuilder,
}

impl ContentIndexer {
    pub fn new(config: IndexingConfig) -> Result<Self> {
        config.validate()?;
        Ok(ContentIndexer {
            scanner: Scanner::from_config(&config)?,
            extractor: EntityExtractor::new(config.max_upsert_retries),
            builder: VectorBuilder::new(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &IndexingConfig {
        &self.config
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn vector_builder(&self) -> &VectorBuilder {
        &self.builder
    }

    /// Check a raw body before anything is tokenized.
    pub fn validate_body<'b>(&self, body: &'b [u8]) -> Result<&'b str> {
        if body.len() > self.config.max_body_bytes {
            return Err(PostindexError::validation(format!(
                "body is {} bytes, the limit is {}",
                body.len(),
                self.config.max_body_bytes
            )));
        }
        let text = std::str::from_utf8(body).map_err(|e| {
            PostindexError::validation(format!("body is not valid UTF-8: {e}"))
        })?;
        if let Some(offset) = text.find('\0') {
            return Err(PostindexError::validation(format!(
                "body contains a NUL byte at offset {offset}"
            )));
        }
        Ok(text)
    }

    /// Recompute and replace every row derived from `content`.
    ///
    /// `body` is the new body, which may not be written to the content row
    /// yet. Running this twice with the same body leaves the same state.
    pub async fn derive_and_persist<S>(
        &self,
        store: &mut S,
        content: ContentRef,
        body: &[u8],
    ) -> Result<DerivedState>
    where
        S: ContentStore + ?Sized,
    {
        let text = self.validate_body(body)?;
        let tokens: Vec<MarkupToken<'_>> = self.scanner.scan(text).collect();

        let extraction = self.extractor.extract(store, &tokens, content).await?;
        store
            .replace_hashtag_usages(content.id(), &extraction.hashtags)
            .await?;
        store
            .replace_backlinks(content, &extraction.backlinks)
            .await?;

        let thread = store.load_thread(content.post_id()).await?;
        let (vector, thread_vector) = match content {
            ContentRef::Post { id } => {
                let mut document = match &thread {
                    Some(thread) => ThreadDocument::from_thread(thread),
                    None => ThreadDocument::new(text),
                };
                document.set_post_body(text);
                let vector = self.build_thread_vector(&document)?;
                store.write_search_vector(content.id(), &vector).await?;
                debug!(post = %id, lexemes = vector.len(), "wrote post vector");
                (vector, None)
            }
            ContentRef::Comment { id, post_id } => {
                let vector = self
                    .builder
                    .build(&text_without_links(&tokens), &extraction.extra_search_text)?;
                store.write_search_vector(content.id(), &vector).await?;

                let thread = thread.ok_or_else(|| PostindexError::not_found(post_id.to_string()))?;
                let mut document = ThreadDocument::from_thread(&thread);
                document.upsert_comment(id, text);
                let thread_vector = self.build_thread_vector(&document)?;
                store
                    .write_search_vector(ContentRef::post(post_id).id(), &thread_vector)
                    .await?;
                debug!(comment = %id, post = %post_id, lexemes = vector.len(), "wrote comment vector");
                (vector, Some(thread_vector))
            }
        };

        debug!(
            %content,
            hashtags = extraction.hashtags.len(),
            backlinks = extraction.backlinks.len(),
            "derived content state"
        );

        Ok(DerivedState {
            content,
            hashtags: extraction.hashtags,
            backlinks: extraction.backlinks,
            vector,
            thread_vector,
            warnings: extraction.warnings,
        })
    }

    /// Rebuild the vector of `post` from the stored thread.
    ///
    /// Run this after a comment is added, edited or deleted.
    pub async fn recompute_thread_vector<S>(&self, store: &mut S, post: PostId) -> Result<MergedVector>
    where
        S: ThreadSource + VectorStore + ?Sized,
    {
        let thread = store
            .load_thread(post)
            .await?
            .ok_or_else(|| PostindexError::not_found(post.to_string()))?;
        let vector = self.build_thread_vector(&ThreadDocument::from_thread(&thread))?;
        store
            .write_search_vector(ContentRef::post(post).id(), &vector)
            .await?;
        debug!(%post, comments = thread.comments.len(), lexemes = vector.len(), "recomputed thread vector");
        Ok(vector)
    }

    /// Rebuild the vectors of many posts.
    ///
    /// Threads are read and written sequentially on `store`; the vectors are
    /// built in parallel. Posts that no longer exist are skipped. Returns the
    /// number of vectors written.
    pub async fn rebuild_thread_vectors<S>(&self, store: &mut S, posts: &[PostId]) -> Result<usize>
    where
        S: ThreadSource + VectorStore + ?Sized,
    {
        let mut threads: Vec<Thread> = Vec::with_capacity(posts.len());
        for post in posts {
            match store.load_thread(*post).await? {
                Some(thread) => threads.push(thread),
                None => debug!(%post, "skipping missing post"),
            }
        }

        let vectors = threads
            .par_iter()
            .map(|thread| {
                self.build_thread_vector(&ThreadDocument::from_thread(thread))
                    .map(|vector| (thread.post_id, vector))
            })
            .collect::<Result<Vec<_>>>()?;

        for (post, vector) in &vectors {
            store
                .write_search_vector(ContentRef::post(*post).id(), vector)
                .await?;
        }

        info!(
            requested = posts.len(),
            rebuilt = vectors.len(),
            "rebuilt thread vectors"
        );
        Ok(vectors.len())
    }

    /// Build the vector of `text` with its links replaced by their folded
    /// labels.
    pub fn build_vector(&self, text: &str) -> Result<MergedVector> {
        let tokens: Vec<MarkupToken<'_>> = self.scanner.scan(text).collect();
        self.builder
            .build(&text_without_links(&tokens), &link_search_text(&tokens))
    }

    fn build_thread_vector(&self, document: &ThreadDocument<'_>) -> Result<MergedVector> {
        let text = document.text(&self.config.thread_delimiter);
        self.build_vector(&text)
    }
}
