use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One user's score for one book. At most one row per (author, book); a
/// repeat submission overwrites the score and keeps the row id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub author_id: Uuid,
    pub book_id: i64,
    pub score: i32,
}
