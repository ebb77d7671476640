use postindex::config::IndexingConfig;
use postindex::content::{Backlink, ContentRef, PostId, UserId};
use postindex::error::{PostindexError, Result};
use postindex::indexer::ContentIndexer;
use postindex::store::memory::{MemoryState, MemoryStore};
use postindex::vector::SearchMode;

struct Fixture {
    indexer: ContentIndexer,
    store: MemoryStore,
    alice: UserId,
    bob: UserId,
}

async fn fixture() -> Result<Fixture> {
    let indexer = ContentIndexer::new(IndexingConfig::default())?;
    let store = MemoryStore::new();
    let mut tx = store.begin().await;
    let alice = tx.create_user("alice")?;
    let bob = tx.create_user("bob")?;
    tx.commit()?;
    Ok(Fixture {
        indexer,
        store,
        alice,
        bob,
    })
}

impl Fixture {
    /// Create a post and derive its state in one transaction.
    async fn publish_post(&self, author: UserId, body: &str) -> Result<PostId> {
        let mut tx = self.store.begin().await;
        let post = tx.create_post(author, body)?;
        self.indexer
            .derive_and_persist(&mut tx, ContentRef::post(post), body.as_bytes())
            .await?;
        tx.commit()?;
        Ok(post)
    }

    async fn publish_comment(&self, post: PostId, author: UserId, body: &str) -> Result<ContentRef> {
        let mut tx = self.store.begin().await;
        let comment = tx.create_comment(post, author, body)?;
        let content = ContentRef::comment(comment, post);
        self.indexer
            .derive_and_persist(&mut tx, content, body.as_bytes())
            .await?;
        tx.commit()?;
        Ok(content)
    }

    async fn edit_post(&self, post: PostId, body: &str) -> Result<()> {
        let mut tx = self.store.begin().await;
        tx.update_post_body(post, body)?;
        self.indexer
            .derive_and_persist(&mut tx, ContentRef::post(post), body.as_bytes())
            .await?;
        tx.commit()
    }

    fn matches(&self, state: &MemoryState, post: PostId, query: &str, mode: SearchMode) -> bool {
        let terms = self
            .indexer
            .vector_builder()
            .query_terms(query, mode)
            .unwrap();
        state
            .vector(ContentRef::post(post).id())
            .is_some_and(|vector| vector.matches(&terms))
    }
}

#[tokio::test]
async fn derive_and_persist_twice_yields_identical_state() -> Result<()> {
    let fx = fixture().await?;
    let target = fx.publish_post(fx.bob, "target").await?;
    let body = format!("#Rust #rust @bob https://example.com/posts/{} thanks", target.get());
    let post = fx.publish_post(fx.alice, &body).await?;
    let first = fx.store.snapshot();

    fx.edit_post(post, &body).await?;
    let second = fx.store.snapshot();

    let content = ContentRef::post(post).id();
    assert_eq!(first.usages(content), second.usages(content));
    assert_eq!(first.usages(content).len(), 1);
    assert_eq!(first.backlinks(), second.backlinks());
    assert_eq!(second.backlinks().len(), 1);
    assert_eq!(first.vector(content), second.vector(content));
    assert_eq!(first.hashtags(), second.hashtags());
    Ok(())
}

#[tokio::test]
async fn hashtags_are_case_insensitive_across_content() -> Result<()> {
    let fx = fixture().await?;
    let first = fx.publish_post(fx.alice, "Loving #Test today").await?;
    let second = fx.publish_post(fx.bob, "also #test").await?;
    let third = fx.publish_post(fx.bob, "and #TÉST").await?;

    let state = fx.store.snapshot();
    assert_eq!(state.hashtags().len(), 1);
    let id = state.hashtag_id("test").unwrap();
    for post in [first, second, third] {
        assert_eq!(state.usages(ContentRef::post(post).id()), vec![id]);
    }
    Ok(())
}

#[tokio::test]
async fn duplicate_mentions_in_a_comment_yield_one_backlink() -> Result<()> {
    let fx = fixture().await?;
    let target = fx.publish_post(fx.bob, "bob writes").await?;
    let thread = fx.publish_post(fx.alice, "alice asks").await?;

    let link = format!("https://example.com/posts/{}", target.get());
    let body = format!("@bob {link} and again @bob {link}");
    let comment = fx.publish_comment(thread, fx.alice, &body).await?;

    let state = fx.store.snapshot();
    assert_eq!(
        state.backlinks_from(comment),
        vec![Backlink {
            post_id: target,
            ref_post_id: thread,
            ref_comment_id: comment.comment_id(),
        }]
    );
    assert_eq!(state.backlinks_to(target).len(), 1);
    Ok(())
}

#[tokio::test]
async fn self_mentions_produce_no_backlinks() -> Result<()> {
    let fx = fixture().await?;
    let post = fx.publish_post(fx.alice, "draft").await?;

    let body = format!("see @alice https://example.com/posts/{}", post.get());
    fx.edit_post(post, &body).await?;

    // A comment pointing at its own post is a self reference too.
    let comment = fx.publish_comment(post, fx.bob, &body).await?;

    let state = fx.store.snapshot();
    assert!(state.backlinks_from(ContentRef::post(post)).is_empty());
    assert!(state.backlinks_from(comment).is_empty());
    Ok(())
}

#[tokio::test]
async fn bare_mentions_reference_no_post() -> Result<()> {
    let fx = fixture().await?;
    fx.publish_post(fx.bob, "my pancake recipe").await?;
    let post = fx.publish_post(fx.alice, "thanks @bob for the tip").await?;

    let state = fx.store.snapshot();
    assert!(state.backlinks_from(ContentRef::post(post)).is_empty());
    assert!(state.backlinks().is_empty());
    Ok(())
}

#[tokio::test]
async fn encoded_link_paths_are_searchable_by_their_label() -> Result<()> {
    let fx = fixture().await?;
    let post = fx
        .publish_post(fx.alice, "see https://cs.wikipedia.org/wiki/%C5%A0koda_Auto")
        .await?;
    let state = fx.store.snapshot();

    assert!(fx.matches(&state, post, "Škoda", SearchMode::Exact));
    assert!(!fx.matches(&state, post, "a0koda", SearchMode::Exact));
    assert!(!fx.matches(&state, post, "https", SearchMode::Combined));
    Ok(())
}

#[tokio::test]
async fn unresolved_mentions_do_not_fail_the_save() -> Result<()> {
    let fx = fixture().await?;
    let mut tx = fx.store.begin().await;
    let post = tx.create_post(fx.alice, "")?;
    let derived = fx
        .indexer
        .derive_and_persist(&mut tx, ContentRef::post(post), b"hello @ghost #tag")
        .await?;
    tx.commit()?;

    assert_eq!(derived.warnings.len(), 1);
    assert!(derived.backlinks.is_empty());
    assert_eq!(derived.hashtags.len(), 1);
    Ok(())
}

#[tokio::test]
async fn stop_words_stay_searchable_through_the_exact_half() -> Result<()> {
    let fx = fixture().await?;
    let post = fx.publish_post(fx.alice, "The Who").await?;
    let state = fx.store.snapshot();

    assert!(fx.matches(&state, post, "the", SearchMode::Exact));
    assert!(!fx.matches(&state, post, "the", SearchMode::Stemmed));
    assert!(fx.matches(&state, post, "the who", SearchMode::Combined));

    let vector = state.vector(ContentRef::post(post).id()).unwrap();
    assert!(vector.exact().any(|entry| entry.lexeme == "=the"));
    Ok(())
}

#[tokio::test]
async fn stemmed_and_exact_matching_differ() -> Result<()> {
    let fx = fixture().await?;
    let post = fx.publish_post(fx.alice, "Příliš žluťoučký kůň jumps").await?;
    let state = fx.store.snapshot();

    assert!(fx.matches(&state, post, "jumping", SearchMode::Stemmed));
    assert!(!fx.matches(&state, post, "jumping", SearchMode::Exact));
    assert!(fx.matches(&state, post, "zlutoucky KUN", SearchMode::Exact));
    Ok(())
}

#[tokio::test]
async fn link_labels_are_searchable() -> Result<()> {
    let fx = fixture().await?;
    let post = fx
        .publish_post(fx.alice, "read www.seznam.cz/Zprávy/Počasí")
        .await?;
    let state = fx.store.snapshot();

    assert!(fx.matches(&state, post, "pocasi", SearchMode::Exact));
    assert!(fx.matches(&state, post, "seznam zpravy", SearchMode::Combined));
    Ok(())
}

#[tokio::test]
async fn edits_supersede_derived_rows() -> Result<()> {
    let fx = fixture().await?;
    let target = fx.publish_post(fx.bob, "target").await?;
    let body = format!("#one #two @bob https://example.com/posts/{}", target.get());
    let post = fx.publish_post(fx.alice, &body).await?;

    fx.edit_post(post, "#two only").await?;

    let state = fx.store.snapshot();
    let content = ContentRef::post(post).id();
    assert_eq!(state.hashtag_names_of(content), vec!["two"]);
    assert!(state.backlinks_from(ContentRef::post(post)).is_empty());
    // The dictionary keeps hashtags nobody uses any more.
    assert!(state.hashtag_id("one").is_some());
    assert!(!fx.matches(&state, post, "one", SearchMode::Exact));
    Ok(())
}

#[tokio::test]
async fn comment_mutations_recompute_the_thread_vector() -> Result<()> {
    let fx = fixture().await?;
    let post = fx.publish_post(fx.alice, "A question about bicycles").await?;
    let comment = fx.publish_comment(post, fx.bob, "Try the tandem").await?;

    let state = fx.store.snapshot();
    assert!(fx.matches(&state, post, "tandem", SearchMode::Exact));
    assert!(fx.matches(&state, post, "bicycle", SearchMode::Stemmed));

    let comment_id = comment.comment_id().unwrap();
    let mut tx = fx.store.begin().await;
    tx.update_comment_body(comment_id, "Try a unicycle")?;
    fx.indexer
        .derive_and_persist(&mut tx, comment, b"Try a unicycle")
        .await?;
    tx.commit()?;

    let state = fx.store.snapshot();
    assert!(!fx.matches(&state, post, "tandem", SearchMode::Exact));
    assert!(fx.matches(&state, post, "unicycle", SearchMode::Exact));

    let mut tx = fx.store.begin().await;
    let parent = tx.delete_comment(comment_id)?;
    fx.indexer.recompute_thread_vector(&mut tx, parent).await?;
    tx.commit()?;

    let state = fx.store.snapshot();
    assert!(!fx.matches(&state, post, "unicycle", SearchMode::Exact));
    assert!(state.vector(comment.id()).is_none());
    Ok(())
}

#[tokio::test]
async fn storage_failure_leaves_no_partial_state() -> Result<()> {
    let fx = fixture().await?;
    let post = fx.publish_post(fx.alice, "#before").await?;
    let before = fx.store.snapshot();

    let mut tx = fx.store.begin().await;
    tx.update_post_body(post, "#after")?;
    let derived = fx
        .indexer
        .derive_and_persist(&mut tx, ContentRef::post(post), b"#after")
        .await?;
    assert_eq!(derived.hashtags.len(), 1);

    // Not committed yet: readers still see the old rows.
    assert_eq!(
        fx.store.snapshot().hashtag_names_of(ContentRef::post(post).id()),
        vec!["before"]
    );

    fx.store.set_unavailable(true);
    let err = tx.commit().unwrap_err();
    assert!(matches!(err, PostindexError::Storage(_)));
    fx.store.set_unavailable(false);

    let after = fx.store.snapshot();
    let content = ContentRef::post(post).id();
    assert_eq!(after.hashtag_names_of(content), before.hashtag_names_of(content));
    assert_eq!(after.vector(content), before.vector(content));
    assert_eq!(after.post_body(post), Some("#before"));
    Ok(())
}

#[tokio::test]
async fn hashtag_conflicts_are_retried_then_surface_as_transient() -> Result<()> {
    let fx = fixture().await?;

    fx.store.inject_upsert_conflicts(3);
    fx.publish_post(fx.alice, "#retried").await?;
    assert!(fx.store.snapshot().hashtag_id("retried").is_some());

    fx.store.inject_upsert_conflicts(4);
    let err = fx.publish_post(fx.alice, "#exhausted").await.unwrap_err();
    assert!(matches!(err, PostindexError::Transient(_)));
    assert!(!err.is_user_visible());
    assert!(fx.store.snapshot().hashtag_id("exhausted").is_none());
    Ok(())
}

#[tokio::test]
async fn deleting_a_post_cascades() -> Result<()> {
    let fx = fixture().await?;
    let target = fx.publish_post(fx.bob, "target #shared").await?;
    let post = fx.publish_post(fx.alice, "#shared").await?;
    let link = format!("@bob https://example.com/posts/{}", target.get());
    let comment = fx.publish_comment(post, fx.alice, &link).await?;
    assert_eq!(fx.store.snapshot().backlinks_to(target).len(), 1);

    let mut tx = fx.store.begin().await;
    tx.delete_post(post)?;
    tx.commit()?;

    let state = fx.store.snapshot();
    assert!(state.backlinks().is_empty());
    assert!(state.vector(comment.id()).is_none());
    assert!(state.vector(ContentRef::post(post).id()).is_none());
    assert_eq!(state.usage_count(), 1);
    Ok(())
}

#[tokio::test]
async fn rebuild_thread_vectors_in_bulk() -> Result<()> {
    let fx = fixture().await?;
    let mut posts = Vec::new();
    let mut tx = fx.store.begin().await;
    for i in 0..20 {
        let post = tx.create_post(fx.alice, &format!("post number {i}"))?;
        tx.create_comment(post, fx.bob, "zebra")?;
        posts.push(post);
    }
    posts.push(PostId(10_000));

    let rebuilt = fx.indexer.rebuild_thread_vectors(&mut tx, &posts).await?;
    tx.commit()?;

    assert_eq!(rebuilt, 20);
    let state = fx.store.snapshot();
    for post in &posts[..20] {
        assert!(fx.matches(&state, *post, "zebra number", SearchMode::Exact));
    }
    Ok(())
}

#[tokio::test]
async fn invalid_bodies_are_rejected_before_tokenization() -> Result<()> {
    let fx = fixture().await?;
    let mut tx = fx.store.begin().await;
    let post = tx.create_post(fx.alice, "")?;

    for body in [&b"\xff\xfe"[..], &b"nul\0byte #tag"[..]] {
        let err = fx
            .indexer
            .derive_and_persist(&mut tx, ContentRef::post(post), body)
            .await
            .unwrap_err();
        assert!(matches!(err, PostindexError::Validation(_)));
    }
    assert!(tx.state().hashtags().is_empty());
    Ok(())
}

#[test]
fn config_file_drives_the_indexer() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("postindex.json");
    std::fs::write(
        &path,
        r#"{ "search_profile": "simple", "exact_marker": "§", "allowed_tlds": ["cz"] }"#,
    )?;

    let indexer = ContentIndexer::new(IndexingConfig::from_file(&path)?)?;
    let vector = indexer.build_vector("The example.cz page, not example.com")?;

    assert!(vector.contains("the"));
    assert!(vector.contains("§the"));
    let links: Vec<_> = indexer
        .scanner()
        .scan("example.cz example.com")
        .filter(|token| token.is_structured())
        .map(|token| token.text)
        .collect();
    assert_eq!(links, vec!["example.cz"]);
    Ok(())
}
