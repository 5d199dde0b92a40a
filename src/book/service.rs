use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::book::model::{Book, BookUpdate, NewBook};
use crate::error::{retry_read, CoreResult};
use crate::store::{GraphStore, Page};

/// Book postings: create, poster-only edit, fetch, and the per-poster
/// listing a profile page paginates.
pub struct BookService {
    store: Arc<GraphStore>,
}

impl BookService {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    pub async fn create_book(&self, poster_id: Uuid, new_book: NewBook) -> CoreResult<Book> {
        let book = self.store.create_book(poster_id, new_book).await?;
        info!("book {} '{}' posted by {}", book.id, book.title, poster_id);
        Ok(book)
    }

    pub async fn edit_book(
        &self,
        editor: Uuid,
        book_id: i64,
        update: BookUpdate,
    ) -> CoreResult<Book> {
        let book = self.store.update_book(book_id, editor, update).await?;
        info!("book {} edited by {}", book.id, editor);
        Ok(book)
    }

    pub async fn book(&self, book_id: i64) -> CoreResult<Book> {
        retry_read(|| self.store.book(book_id)).await
    }

    /// A user's own postings, newest first.
    pub async fn books_by_poster(
        &self,
        username: &str,
        page: i64,
        per_page: i64,
    ) -> CoreResult<Page<Book>> {
        let user = self.store.user_by_username(username).await?;
        let books = retry_read(|| self.store.books_by_poster(user.id)).await?;
        Page::build(books, page, per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::CoreError;
    use chrono::{Duration, TimeZone, Utc};

    fn new_book(title: &str) -> NewBook {
        NewBook {
            title: title.into(),
            author: "the first author".into(),
            description: "about it".into(),
            isbn: Some("978-3-16-148410-0".into()),
            language: Some("en".into()),
        }
    }

    async fn fixture() -> (Arc<GraphStore>, BookService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let store = Arc::new(GraphStore::with_clock(clock.clone()));
        let svc = BookService::new(store.clone());
        (store, svc, clock)
    }

    #[tokio::test]
    async fn posting_and_fetching_round_trip() {
        let (store, svc, _) = fixture().await;
        let john = store.create_user("john", "john@example.com").await.unwrap();

        let posted = svc.create_book(john.id, new_book("the first book")).await.unwrap();
        let fetched = svc.book(posted.id).await.unwrap();
        assert_eq!(fetched.title, "the first book");
        assert_eq!(fetched.poster_id, john.id);
        assert_eq!(fetched.isbn.as_deref(), Some("978-3-16-148410-0"));
    }

    #[tokio::test]
    async fn edit_by_someone_else_reads_as_not_found() {
        let (store, svc, _) = fixture().await;
        let john = store.create_user("john", "john@example.com").await.unwrap();
        let susan = store
            .create_user("susan", "susan@example.com")
            .await
            .unwrap();
        let book = svc.create_book(john.id, new_book("the first book")).await.unwrap();

        let update = BookUpdate {
            title: "hijacked".into(),
            author: "someone".into(),
            description: String::new(),
            isbn: None,
            language: None,
        };
        assert!(matches!(
            svc.edit_book(susan.id, book.id, update).await,
            Err(CoreError::NotFound("book"))
        ));
        assert_eq!(svc.book(book.id).await.unwrap().title, "the first book");
    }

    #[tokio::test]
    async fn poster_listing_is_newest_first() {
        let (store, svc, clock) = fixture().await;
        let john = store.create_user("john", "john@example.com").await.unwrap();

        svc.create_book(john.id, new_book("older")).await.unwrap();
        clock.advance(Duration::seconds(1));
        svc.create_book(john.id, new_book("newer")).await.unwrap();

        let page = svc.books_by_poster("john", 1, 10).await.unwrap();
        let titles: Vec<&str> = page.items.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["newer", "older"]);
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn missing_book_is_not_found() {
        let (_, svc, _) = fixture().await;
        assert!(matches!(
            svc.book(42).await,
            Err(CoreError::NotFound("book"))
        ));
    }
}
