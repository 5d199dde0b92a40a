use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a comment hangs off: either it is a top-level comment on a book, or
/// a reply to another comment. Exactly one of the two, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CommentParent {
    Book(i64),
    Comment(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub language: Option<String>,
    pub author_id: Uuid,
    pub parent: CommentParent,
    pub created_at: DateTime<Utc>,
}

/// Request to publish a comment or a reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub body: String,
    pub language: Option<String>,
    pub parent: CommentParent,
}
