//! Composite documents made of a post and its comments.

use crate::content::CommentId;
use crate::store::Thread;

/// The indexable text of a whole thread.
///
/// Bodies can be overridden before rendering, so a thread vector can be
/// computed from a pending edit before the content row is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadDocument<'a> {
    post_body: &'a str,
    comments: Vec<(CommentId, &'a str)>,
}

impl<'a> ThreadDocument<'a> {
    pub fn new(post_body: &'a str) -> Self {
        ThreadDocument {
            post_body,
            comments: Vec::new(),
        }
    }

    pub fn from_thread(thread: &'a Thread) -> Self {
        ThreadDocument {
            post_body: &thread.body,
            comments: thread
                .comments
                .iter()
                .map(|(id, body)| (*id, body.as_str()))
                .collect(),
        }
    }

    pub fn set_post_body(&mut self, body: &'a str) {
        self.post_body = body;
    }

    /// Replace the body of `id`, appending the comment if it is new.
    pub fn upsert_comment(&mut self, id: CommentId, body: &'a str) {
        match self.comments.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = body,
            None => self.comments.push((id, body)),
        }
    }

    pub fn remove_comment(&mut self, id: CommentId) {
        self.comments.retain(|(existing, _)| *existing != id);
    }

    /// Post body first, then comment bodies in order.
    pub fn bodies(&self) -> impl Iterator<Item = &'a str> + '_ {
        std::iter::once(self.post_body).chain(self.comments.iter().map(|(_, body)| *body))
    }

    /// Join every body with `delimiter`.
    pub fn text(&self, delimiter: &str) -> String {
        self.bodies().collect::<Vec<_>>().join(delimiter)
    }
}
