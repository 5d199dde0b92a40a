use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::{retry_read, CoreResult};
use crate::notification::model::Notification;
use crate::store::GraphStore;

/// The per-user notification stream: append-only writes, cursor-based reads.
/// There is no per-record read state; a client keeps the largest timestamp
/// it has consumed and polls with it.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<GraphStore>,
}

impl NotificationService {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// Appends a record for `user_id`. Always a new record, even when one
    /// with the same name is already in the stream; consumers see every
    /// value in order and keep only the latest per name if they want
    /// replace-latest semantics.
    pub async fn add_notification(
        &self,
        user_id: Uuid,
        name: &str,
        data: serde_json::Value,
    ) -> CoreResult<Notification> {
        let notification = self.store.append_notification(user_id, name, data).await?;
        info!(
            "notification '{}' for user {} at {}",
            notification.name, user_id, notification.timestamp
        );
        Ok(notification)
    }

    /// Everything strictly newer than `since`, oldest first.
    pub async fn query_notifications(
        &self,
        user_id: Uuid,
        since: f64,
    ) -> CoreResult<Vec<Notification>> {
        retry_read(|| self.store.notifications_since(user_id, since)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notification::model::UNREAD_MESSAGE_COUNT;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    async fn service() -> (NotificationService, Uuid) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let store = Arc::new(GraphStore::with_clock(clock));
        let user = store.create_user("john", "john@example.com").await.unwrap();
        (NotificationService::new(store), user.id)
    }

    #[tokio::test]
    async fn same_name_appends_do_not_collapse() {
        let (svc, user) = service().await;
        svc.add_notification(user, UNREAD_MESSAGE_COUNT, json!(0))
            .await
            .unwrap();
        svc.add_notification(user, UNREAD_MESSAGE_COUNT, json!(2))
            .await
            .unwrap();

        let all = svc.query_notifications(user, 0.0).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].data, json!(0));
        assert_eq!(all[1].data, json!(2));
        assert!(all[0].timestamp < all[1].timestamp);
    }

    #[tokio::test]
    async fn polling_with_the_last_seen_cursor_yields_no_duplicates() {
        let (svc, user) = service().await;
        svc.add_notification(user, UNREAD_MESSAGE_COUNT, json!(1))
            .await
            .unwrap();
        svc.add_notification(user, UNREAD_MESSAGE_COUNT, json!(2))
            .await
            .unwrap();

        let batch = svc.query_notifications(user, 0.0).await.unwrap();
        let cursor = batch.last().unwrap().timestamp;

        svc.add_notification(user, UNREAD_MESSAGE_COUNT, json!(3))
            .await
            .unwrap();
        let next = svc.query_notifications(user, cursor).await.unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].data, json!(3));
    }

    #[tokio::test]
    async fn payload_shape_is_up_to_the_producer() {
        let (svc, user) = service().await;
        svc.add_notification(user, "export_ready", json!({"url": "/exports/7", "rows": 42}))
            .await
            .unwrap();

        let all = svc.query_notifications(user, 0.0).await.unwrap();
        assert_eq!(all[0].data["rows"], json!(42));
    }
}
