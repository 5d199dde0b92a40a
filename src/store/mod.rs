pub mod page;

pub use page::Page;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::time::timeout;
use uuid::Uuid;

use crate::book::model::{Book, BookUpdate, NewBook};
use crate::clock::{Clock, SystemClock};
use crate::comment::model::{Comment, CommentParent, NewComment};
use crate::error::{CoreError, CoreResult};
use crate::message::model::Message;
use crate::notification::model::Notification;
use crate::rating::model::Rating;
use crate::user::model::User;

/// How long a caller waits on the store locks before the call surfaces as a
/// store failure instead of a silent empty result.
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimum spacing between two notification timestamps of one user, applied
/// when the wall clock has not moved past the previous record.
const NOTIFICATION_TICK: f64 = 1e-6;

#[derive(Debug, Default)]
struct StoreInner {
    users: HashMap<Uuid, User>,
    users_by_name: HashMap<String, Uuid>,
    users_by_email: HashMap<String, Uuid>,

    /// Directed follow edges as (follower, followed) pairs.
    follows: HashSet<(Uuid, Uuid)>,

    // BTreeMap keyed by the id sequence keeps insertion order for stable
    // tie-breaking on equal timestamps.
    books: BTreeMap<i64, Book>,
    comments: BTreeMap<i64, Comment>,
    messages: BTreeMap<i64, Message>,

    /// At most one rating per (author, book); the map key is the uniqueness
    /// constraint.
    ratings: HashMap<(Uuid, i64), Rating>,

    /// Per-user streams in append order, which is also ascending timestamp
    /// order by construction.
    notifications: HashMap<Uuid, Vec<Notification>>,

    next_id: i64,
}

impl StoreInner {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn require_user(&self, id: Uuid) -> CoreResult<&User> {
        self.users.get(&id).ok_or(CoreError::NotFound("user"))
    }
}

/// The persistence collaborator: every entity of the engine lives here,
/// behind indexed lookups and timestamp-ordered scans. This implementation
/// is an in-memory engine guarded by a single `RwLock`; the write lock is
/// what serializes the rating upsert and the notification append.
pub struct GraphStore {
    inner: RwLock<StoreInner>,
    clock: Arc<dyn Clock>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn read(&self) -> CoreResult<RwLockReadGuard<'_, StoreInner>> {
        timeout(LOCK_TIMEOUT, self.inner.read())
            .await
            .map_err(|_| CoreError::StoreUnavailable("timed out waiting for store read lock".into()))
    }

    async fn write(&self) -> CoreResult<RwLockWriteGuard<'_, StoreInner>> {
        timeout(LOCK_TIMEOUT, self.inner.write()).await.map_err(|_| {
            CoreError::StoreUnavailable("timed out waiting for store write lock".into())
        })
    }

    // ---- users ----

    pub async fn create_user(&self, username: &str, email: &str) -> CoreResult<User> {
        let now = self.clock.now();
        let mut inner = self.write().await?;

        if inner.users_by_name.contains_key(username) {
            return Err(CoreError::IntegrityViolation(format!(
                "username '{username}' is already taken"
            )));
        }
        if inner.users_by_email.contains_key(email) {
            return Err(CoreError::IntegrityViolation(format!(
                "email '{email}' is already registered"
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            last_seen: now,
            last_message_read_time: None,
        };
        inner.users_by_name.insert(user.username.clone(), user.id);
        inner.users_by_email.insert(user.email.clone(), user.id);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn user(&self, id: Uuid) -> CoreResult<User> {
        Ok(self.read().await?.require_user(id)?.clone())
    }

    pub async fn user_by_username(&self, username: &str) -> CoreResult<User> {
        let inner = self.read().await?;
        let id = inner
            .users_by_name
            .get(username)
            .ok_or(CoreError::NotFound("user"))?;
        Ok(inner.users[id].clone())
    }

    pub async fn mark_active(&self, id: Uuid) -> CoreResult<()> {
        let now = self.clock.now();
        let mut inner = self.write().await?;
        let user = inner.users.get_mut(&id).ok_or(CoreError::NotFound("user"))?;
        user.last_seen = now;
        Ok(())
    }

    /// Moves the inbox read marker to now and returns the new marker.
    pub async fn mark_messages_read(&self, id: Uuid) -> CoreResult<DateTime<Utc>> {
        let now = self.clock.now();
        let mut inner = self.write().await?;
        let user = inner.users.get_mut(&id).ok_or(CoreError::NotFound("user"))?;
        user.last_message_read_time = Some(now);
        Ok(now)
    }

    // ---- follow graph ----

    pub async fn follow(&self, follower: Uuid, followed: Uuid) -> CoreResult<()> {
        if follower == followed {
            return Err(CoreError::InvalidArgument(
                "a user cannot follow themselves".into(),
            ));
        }
        let mut inner = self.write().await?;
        inner.require_user(follower)?;
        inner.require_user(followed)?;
        if !inner.follows.insert((follower, followed)) {
            return Err(CoreError::IntegrityViolation(
                "follow edge already exists".into(),
            ));
        }
        Ok(())
    }

    /// Removing an edge that is not there is a no-op, not an error.
    pub async fn unfollow(&self, follower: Uuid, followed: Uuid) -> CoreResult<()> {
        let mut inner = self.write().await?;
        inner.require_user(follower)?;
        inner.require_user(followed)?;
        inner.follows.remove(&(follower, followed));
        Ok(())
    }

    pub async fn is_following(&self, follower: Uuid, followed: Uuid) -> CoreResult<bool> {
        Ok(self.read().await?.follows.contains(&(follower, followed)))
    }

    /// Ids this user follows (outgoing edges).
    pub async fn followed_ids(&self, user: Uuid) -> CoreResult<HashSet<Uuid>> {
        let inner = self.read().await?;
        inner.require_user(user)?;
        Ok(inner
            .follows
            .iter()
            .filter(|(follower, _)| *follower == user)
            .map(|(_, followed)| *followed)
            .collect())
    }

    pub async fn followed_count(&self, user: Uuid) -> CoreResult<usize> {
        Ok(self.followed_ids(user).await?.len())
    }

    pub async fn follower_count(&self, user: Uuid) -> CoreResult<usize> {
        let inner = self.read().await?;
        inner.require_user(user)?;
        Ok(inner
            .follows
            .iter()
            .filter(|(_, followed)| *followed == user)
            .count())
    }

    // ---- books ----

    pub async fn create_book(&self, poster_id: Uuid, new_book: NewBook) -> CoreResult<Book> {
        let now = self.clock.now();
        let mut inner = self.write().await?;
        inner.require_user(poster_id)?;

        let id = inner.alloc_id();
        let book = Book {
            id,
            title: new_book.title,
            author: new_book.author,
            description: new_book.description,
            isbn: new_book.isbn,
            language: new_book.language,
            poster_id,
            created_at: now,
        };
        inner.books.insert(id, book.clone());
        Ok(book)
    }

    pub async fn book(&self, id: i64) -> CoreResult<Book> {
        self.read()
            .await?
            .books
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("book"))
    }

    /// Replaces a book's editable fields. The poster is immutable, and a
    /// book is invisible to anyone else's edit, so both a missing id and a
    /// foreign editor report "not found".
    pub async fn update_book(
        &self,
        id: i64,
        editor: Uuid,
        update: BookUpdate,
    ) -> CoreResult<Book> {
        let mut inner = self.write().await?;
        let book = inner.books.get_mut(&id).ok_or(CoreError::NotFound("book"))?;
        if book.poster_id != editor {
            return Err(CoreError::NotFound("book"));
        }
        book.title = update.title;
        book.author = update.author;
        book.description = update.description;
        book.isbn = update.isbn;
        book.language = update.language;
        Ok(book.clone())
    }

    pub async fn all_books_by_time(&self) -> CoreResult<Vec<Book>> {
        let inner = self.read().await?;
        Ok(by_time_desc(inner.books.values().cloned().collect()))
    }

    /// Books whose poster is in `posters`, newest first. This is the feed's
    /// union scan.
    pub async fn books_by_posters(&self, posters: &HashSet<Uuid>) -> CoreResult<Vec<Book>> {
        let inner = self.read().await?;
        Ok(by_time_desc(
            inner
                .books
                .values()
                .filter(|book| posters.contains(&book.poster_id))
                .cloned()
                .collect(),
        ))
    }

    pub async fn books_by_poster(&self, poster: Uuid) -> CoreResult<Vec<Book>> {
        let inner = self.read().await?;
        inner.require_user(poster)?;
        Ok(by_time_desc(
            inner
                .books
                .values()
                .filter(|book| book.poster_id == poster)
                .cloned()
                .collect(),
        ))
    }

    // ---- comments ----

    pub async fn create_comment(&self, author_id: Uuid, new: NewComment) -> CoreResult<Comment> {
        let now = self.clock.now();
        let mut inner = self.write().await?;
        inner.require_user(author_id)?;

        // A reply always points at an already-existing comment, which is
        // what keeps the tree acyclic by construction.
        match new.parent {
            CommentParent::Book(book_id) => {
                if !inner.books.contains_key(&book_id) {
                    return Err(CoreError::NotFound("book"));
                }
            }
            CommentParent::Comment(parent_id) => {
                if !inner.comments.contains_key(&parent_id) {
                    return Err(CoreError::InvalidArgument(format!(
                        "parent comment {parent_id} does not exist"
                    )));
                }
            }
        }

        let id = inner.alloc_id();
        let comment = Comment {
            id,
            body: new.body,
            language: new.language,
            author_id,
            parent: new.parent,
            created_at: now,
        };
        inner.comments.insert(id, comment.clone());
        Ok(comment)
    }

    pub async fn comment(&self, id: i64) -> CoreResult<Comment> {
        self.read()
            .await?
            .comments
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("comment"))
    }

    /// Direct children of a comment, newest first. Not the whole subtree.
    pub async fn direct_replies(&self, parent_id: i64) -> CoreResult<Vec<Comment>> {
        let inner = self.read().await?;
        if !inner.comments.contains_key(&parent_id) {
            return Err(CoreError::NotFound("comment"));
        }
        Ok(by_time_desc_comments(
            inner
                .comments
                .values()
                .filter(|c| c.parent == CommentParent::Comment(parent_id))
                .cloned()
                .collect(),
        ))
    }

    /// Top-level comments of a book, newest first.
    pub async fn root_comments(&self, book_id: i64) -> CoreResult<Vec<Comment>> {
        let inner = self.read().await?;
        if !inner.books.contains_key(&book_id) {
            return Err(CoreError::NotFound("book"));
        }
        Ok(by_time_desc_comments(
            inner
                .comments
                .values()
                .filter(|c| c.parent == CommentParent::Book(book_id))
                .cloned()
                .collect(),
        ))
    }

    // ---- ratings ----

    /// Creates or overwrites the single rating for (author, book). The whole
    /// read-modify-write runs under the store write lock, so two racing
    /// calls for the same pair cannot both insert.
    pub async fn upsert_rating(
        &self,
        author_id: Uuid,
        book_id: i64,
        score: i32,
    ) -> CoreResult<Rating> {
        let mut inner = self.write().await?;
        inner.require_user(author_id)?;
        if !inner.books.contains_key(&book_id) {
            return Err(CoreError::NotFound("book"));
        }

        // Overwrite keeps the original row identity.
        let existing_id = inner.ratings.get(&(author_id, book_id)).map(|r| r.id);
        let id = match existing_id {
            Some(id) => id,
            None => inner.alloc_id(),
        };
        let rating = Rating {
            id,
            author_id,
            book_id,
            score,
        };
        inner.ratings.insert((author_id, book_id), rating.clone());
        Ok(rating)
    }

    pub async fn rating(&self, author_id: Uuid, book_id: i64) -> CoreResult<Rating> {
        self.read()
            .await?
            .ratings
            .get(&(author_id, book_id))
            .cloned()
            .ok_or(CoreError::NotFound("rating"))
    }

    pub async fn ratings_for_book(&self, book_id: i64) -> CoreResult<Vec<Rating>> {
        let inner = self.read().await?;
        if !inner.books.contains_key(&book_id) {
            return Err(CoreError::NotFound("book"));
        }
        let mut ratings: Vec<Rating> = inner
            .ratings
            .values()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect();
        ratings.sort_by_key(|r| r.id);
        Ok(ratings)
    }

    // ---- messages ----

    pub async fn create_message(
        &self,
        author_id: Uuid,
        recipient_id: Uuid,
        body: &str,
    ) -> CoreResult<Message> {
        let now = self.clock.now();
        let mut inner = self.write().await?;
        inner.require_user(author_id)?;
        inner.require_user(recipient_id)?;

        let id = inner.alloc_id();
        let message = Message {
            id,
            author_id,
            recipient_id,
            body: body.to_string(),
            created_at: now,
        };
        inner.messages.insert(id, message.clone());
        Ok(message)
    }

    pub async fn messages_received_by_time(&self, recipient: Uuid) -> CoreResult<Vec<Message>> {
        let inner = self.read().await?;
        inner.require_user(recipient)?;
        let mut messages: Vec<Message> = inner
            .messages
            .values()
            .filter(|m| m.recipient_id == recipient)
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    /// Messages newer than the recipient's read marker.
    pub async fn unread_count(&self, user_id: Uuid) -> CoreResult<i64> {
        let inner = self.read().await?;
        let user = inner.require_user(user_id)?;
        let since = user
            .last_message_read_time
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Ok(inner
            .messages
            .values()
            .filter(|m| m.recipient_id == user_id && m.created_at > since)
            .count() as i64)
    }

    // ---- notifications ----

    /// Appends a record with a timestamp strictly greater than anything
    /// already in the user's stream. The write lock is the serializing
    /// mechanism; when the wall clock has not advanced past the previous
    /// record the new timestamp is bumped by a minimum tick instead.
    pub async fn append_notification(
        &self,
        user_id: Uuid,
        name: &str,
        data: serde_json::Value,
    ) -> CoreResult<Notification> {
        let now = self.clock.now();
        let mut inner = self.write().await?;
        inner.require_user(user_id)?;

        let id = inner.alloc_id();
        let wall = now.timestamp_micros() as f64 / 1_000_000.0;
        let stream = inner.notifications.entry(user_id).or_default();
        let timestamp = match stream.last() {
            Some(last) if wall <= last.timestamp => last.timestamp + NOTIFICATION_TICK,
            _ => wall,
        };

        let notification = Notification {
            id,
            user_id,
            name: name.to_string(),
            data,
            timestamp,
        };
        stream.push(notification.clone());
        Ok(notification)
    }

    /// Records strictly newer than `since`, oldest first. `since = 0.0`
    /// replays the whole stream.
    pub async fn notifications_since(
        &self,
        user_id: Uuid,
        since: f64,
    ) -> CoreResult<Vec<Notification>> {
        let inner = self.read().await?;
        inner.require_user(user_id)?;
        Ok(inner
            .notifications
            .get(&user_id)
            .map(|stream| {
                stream
                    .iter()
                    .filter(|n| n.timestamp > since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

// Stable sort: equal timestamps keep id (insertion) order.
fn by_time_desc(mut books: Vec<Book>) -> Vec<Book> {
    books.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    books
}

fn by_time_desc_comments(mut comments: Vec<Comment>) -> Vec<Comment> {
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    comments
}
