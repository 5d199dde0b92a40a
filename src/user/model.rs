use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. Authentication happens upstream; the engine only
/// ever sees an already-resolved user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    /// Display name, unique across the store.
    pub username: String,

    /// Unique contact address. Mail dispatch itself is out of scope.
    pub email: String,

    pub last_seen: DateTime<Utc>,

    /// High-water mark for the inbox; messages newer than this count as
    /// unread. `None` means the user never opened their inbox.
    pub last_message_read_time: Option<DateTime<Utc>>,
}
