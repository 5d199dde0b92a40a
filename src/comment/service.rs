use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::comment::model::{Comment, CommentParent, NewComment};
use crate::error::{CoreError, CoreResult};
use crate::store::{GraphStore, Page};

/// Resolves the threaded comment structure: creation against the
/// book-or-comment tagged parent, root-to-node ancestry, and paginated
/// direct replies.
pub struct CommentService {
    store: Arc<GraphStore>,
}

impl CommentService {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    pub async fn create_comment(&self, author_id: Uuid, new: NewComment) -> CoreResult<Comment> {
        let comment = self.store.create_comment(author_id, new).await?;
        info!(
            "comment {} by user {} under {:?}",
            comment.id, author_id, comment.parent
        );
        Ok(comment)
    }

    /// Walks the parent chain up to the root and returns it root-first, the
    /// given comment last. A top-level comment is its own root. The walk is
    /// iterative, so chain depth costs store lookups, not stack.
    ///
    /// A parent reference to a comment that no longer exists is corrupted
    /// data, reported as an integrity violation rather than a truncated
    /// path. The visited set catches a cyclic chain the same way.
    pub async fn get_ancestry(&self, comment_id: i64) -> CoreResult<Vec<Comment>> {
        let mut current = self.store.comment(comment_id).await?;
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(current.id);

        loop {
            let parent = current.parent;
            chain.push(current);
            match parent {
                CommentParent::Book(_) => break,
                CommentParent::Comment(parent_id) => {
                    if !seen.insert(parent_id) {
                        return Err(CoreError::IntegrityViolation(format!(
                            "comment {comment_id} has a cyclic ancestry through {parent_id}"
                        )));
                    }
                    current = match self.store.comment(parent_id).await {
                        Ok(comment) => comment,
                        Err(CoreError::NotFound(_)) => {
                            return Err(CoreError::IntegrityViolation(format!(
                                "ancestry of comment {comment_id} references missing comment {parent_id}"
                            )))
                        }
                        Err(e) => return Err(e),
                    };
                }
            }
        }

        chain.reverse();
        Ok(chain)
    }

    /// Direct children only, newest first, with the total child count in
    /// `Page::total` for "N replies" rendering.
    pub async fn list_replies(
        &self,
        comment_id: i64,
        page: i64,
        per_page: i64,
    ) -> CoreResult<Page<Comment>> {
        let replies = self.store.direct_replies(comment_id).await?;
        Page::build(replies, page, per_page)
    }

    /// Top-level comments of a book's discussion page, newest first.
    pub async fn book_comments(
        &self,
        book_id: i64,
        page: i64,
        per_page: i64,
    ) -> CoreResult<Page<Comment>> {
        let roots = self.store.root_comments(book_id).await?;
        Page::build(roots, page, per_page)
    }
}
