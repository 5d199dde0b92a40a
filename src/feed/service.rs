use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::book::model::Book;
use crate::config::CoreConfig;
use crate::error::{retry_read, CoreResult};
use crate::store::{GraphStore, Page};

/// Computes the ranked feed: the union of a user's own book postings and
/// those of everyone they follow, newest first. Pure queries over the store,
/// recomputed per request, so a follow or unfollow shows up on the very next
/// read.
pub struct FeedService {
    store: Arc<GraphStore>,
    books_per_page: i64,
}

impl FeedService {
    pub fn new(store: Arc<GraphStore>, config: &CoreConfig) -> Self {
        Self {
            store,
            books_per_page: config.books_per_page,
        }
    }

    /// The home feed. A user with zero follows still sees their own books.
    pub async fn followed_books(
        &self,
        user_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> CoreResult<Page<Book>> {
        let books = retry_read(|| self.candidate_books(user_id)).await?;
        let page = Page::build(books, page, per_page)?;
        info!(
            "feed for user {}: {} of {} books (page {})",
            user_id,
            page.items.len(),
            page.total,
            page.page
        );
        Ok(page)
    }

    async fn candidate_books(&self, user_id: Uuid) -> CoreResult<Vec<Book>> {
        let mut posters = self.store.followed_ids(user_id).await?;
        posters.insert(user_id);
        self.store.books_by_posters(&posters).await
    }

    /// The global feed: every book, newest first, no graph filter. The
    /// parameter-free first page at the configured size.
    pub async fn explore(&self) -> CoreResult<Page<Book>> {
        self.explore_page(1).await
    }

    pub async fn explore_page(&self, page: i64) -> CoreResult<Page<Book>> {
        let books = retry_read(|| self.store.all_books_by_time()).await?;
        Page::build(books, page, self.books_per_page)
    }
}
