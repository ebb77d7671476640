//! Identifiers of indexed content and the rows derived from it.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// The raw row identifier.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                $name(id)
            }
        }
    };
}

id_type!(
    /// Identifier of a post.
    PostId,
    "post"
);
id_type!(
    /// Identifier of a comment.
    CommentId,
    "comment"
);
id_type!(
    /// Identifier of a user account.
    UserId,
    "user"
);
id_type!(
    /// Identifier of a hashtag dictionary row.
    HashtagId,
    "hashtag"
);

/// Key of a row that owns derived state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentId {
    Post(PostId),
    Comment(CommentId),
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentId::Post(id) => write!(f, "{id}"),
            ContentId::Comment(id) => write!(f, "{id}"),
        }
    }
}

/// A content item together with the post it belongs to.
///
/// Comments always live under a post; backlinks and thread vectors are
/// keyed by that post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentRef {
    Post { id: PostId },
    Comment { id: CommentId, post_id: PostId },
}

impl ContentRef {
    pub fn post(id: PostId) -> Self {
        ContentRef::Post { id }
    }

    pub fn comment(id: CommentId, post_id: PostId) -> Self {
        ContentRef::Comment { id, post_id }
    }

    /// The key derived rows are stored under.
    pub fn id(&self) -> ContentId {
        match *self {
            ContentRef::Post { id } => ContentId::Post(id),
            ContentRef::Comment { id, .. } => ContentId::Comment(id),
        }
    }

    /// The post this content belongs to (itself for posts).
    pub fn post_id(&self) -> PostId {
        match *self {
            ContentRef::Post { id } => id,
            ContentRef::Comment { post_id, .. } => post_id,
        }
    }

    pub fn comment_id(&self) -> Option<CommentId> {
        match *self {
            ContentRef::Post { .. } => None,
            ContentRef::Comment { id, .. } => Some(id),
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, ContentRef::Comment { .. })
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentRef::Post { id } => write!(f, "{id}"),
            ContentRef::Comment { id, post_id } => write!(f, "{id} on {post_id}"),
        }
    }
}

/// A hashtag dictionary row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hashtag {
    pub id: HashtagId,
    /// Normalized, case-folded name.
    pub name: String,
}

/// A reference from one content item to a post, discovered via a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Backlink {
    /// The referenced post.
    pub post_id: PostId,
    /// The post containing the reference.
    pub ref_post_id: PostId,
    /// The comment containing the reference, if it is in a comment.
    pub ref_comment_id: Option<CommentId>,
}

impl Backlink {
    /// A backlink from `source` to `target`.
    pub fn new(target: PostId, source: ContentRef) -> Self {
        Backlink {
            post_id: target,
            ref_post_id: source.post_id(),
            ref_comment_id: source.comment_id(),
        }
    }

    /// The content item the reference was found in.
    pub fn source(&self) -> ContentRef {
        match self.ref_comment_id {
            Some(id) => ContentRef::comment(id, self.ref_post_id),
            None => ContentRef::post(self.ref_post_id),
        }
    }

    pub fn is_self_reference(&self) -> bool {
        self.post_id == self.ref_post_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_ref_accessors() {
        let post = ContentRef::post(PostId(7));
        assert_eq!(post.id(), ContentId::Post(PostId(7)));
        assert_eq!(post.post_id(), PostId(7));
        assert_eq!(post.comment_id(), None);

        let comment = ContentRef::comment(CommentId(3), PostId(7));
        assert_eq!(comment.id(), ContentId::Comment(CommentId(3)));
        assert_eq!(comment.post_id(), PostId(7));
        assert!(comment.is_comment());
        assert_eq!(comment.to_string(), "comment:3 on post:7");
    }

    #[test]
    fn test_backlink_source() {
        let source = ContentRef::comment(CommentId(3), PostId(7));
        let backlink = Backlink::new(PostId(1), source);
        assert_eq!(backlink.source(), source);
        assert!(!backlink.is_self_reference());
        assert!(Backlink::new(PostId(7), source).is_self_reference());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&ContentRef::comment(CommentId(3), PostId(7))).unwrap();
        assert_eq!(json, r#"{"kind":"comment","id":3,"post_id":7}"#);
        assert_eq!(serde_json::to_string(&HashtagId(5)).unwrap(), "5");
    }
}
