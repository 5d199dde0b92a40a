use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::store::GraphStore;
use crate::user::model::User;

/// Account registration and the follow graph. Callers arrive with an
/// already-authenticated identity and address other users by username, the
/// way profile pages do.
pub struct UserService {
    store: Arc<GraphStore>,
}

impl UserService {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    pub async fn register(&self, username: &str, email: &str) -> CoreResult<User> {
        let user = self.store.create_user(username, email).await?;
        info!("registered user '{}' ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_user(&self, username: &str) -> CoreResult<User> {
        self.store.user_by_username(username).await
    }

    pub async fn follow(&self, follower_id: Uuid, username: &str) -> CoreResult<()> {
        let target = self.store.user_by_username(username).await?;
        if target.id == follower_id {
            return Err(CoreError::InvalidArgument(
                "you cannot follow yourself".into(),
            ));
        }
        self.store.follow(follower_id, target.id).await?;
        info!("user {} now follows '{}'", follower_id, username);
        Ok(())
    }

    pub async fn unfollow(&self, follower_id: Uuid, username: &str) -> CoreResult<()> {
        let target = self.store.user_by_username(username).await?;
        if target.id == follower_id {
            return Err(CoreError::InvalidArgument(
                "you cannot unfollow yourself".into(),
            ));
        }
        self.store.unfollow(follower_id, target.id).await?;
        info!("user {} unfollowed '{}'", follower_id, username);
        Ok(())
    }

    pub async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> CoreResult<bool> {
        self.store.is_following(follower_id, followed_id).await
    }

    /// Last-seen bookkeeping, called once per external request.
    pub async fn mark_active(&self, user_id: Uuid) -> CoreResult<()> {
        self.store.mark_active(user_id).await
    }
}
