use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A posted book. The poster is fixed at creation; every other field can be
/// edited later by the poster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub description: String,
    pub isbn: Option<String>,

    /// Language tag of the description, supplied by the caller (language
    /// detection lives outside the engine).
    pub language: Option<String>,

    pub poster_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Request to post a new book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub description: String,
    pub isbn: Option<String>,
    pub language: Option<String>,
}

/// Full replacement of a book's editable fields. The poster and creation
/// time never change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookUpdate {
    pub title: String,
    pub author: String,
    pub description: String,
    pub isbn: Option<String>,
    pub language: Option<String>,
}
