use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event kind for the inbox unread counter, the one counter-type event this
/// domain produces.
pub const UNREAD_MESSAGE_COUNT: &str = "unread_message_count";

/// One record in a user's notification stream.
///
/// `timestamp` is seconds since the epoch as a float, strictly increasing
/// within a user's stream. Clients remember the largest value they have seen
/// and pass it back as the `since` cursor to poll for newer events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: Uuid,

    /// Event kind, e.g. [`UNREAD_MESSAGE_COUNT`]. Appends never deduplicate
    /// by name; stale values stay in the stream until the cursor passes them.
    pub name: String,

    /// Opaque payload. The producer decides the shape.
    pub data: serde_json::Value,

    pub timestamp: f64,
}
