use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::rating::model::Rating;
use crate::store::GraphStore;

/// Create-or-overwrite of the single rating per (user, book). Score range is
/// a form concern upstream; the engine only guarantees uniqueness.
pub struct RatingService {
    store: Arc<GraphStore>,
}

impl RatingService {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// Upserts and returns the resulting score. A missing book is reported
    /// before any write is attempted.
    pub async fn rate(&self, user_id: Uuid, book_id: i64, score: i32) -> CoreResult<i32> {
        let rating = self.store.upsert_rating(user_id, book_id, score).await?;
        info!("user {} rated book {}: {}", user_id, book_id, rating.score);
        Ok(rating.score)
    }

    pub async fn rating(&self, user_id: Uuid, book_id: i64) -> CoreResult<Rating> {
        self.store.rating(user_id, book_id).await
    }
}
