use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::message::model::Message;
use crate::notification::model::UNREAD_MESSAGE_COUNT;
use crate::store::{GraphStore, Page};

/// Direct messages, and the producer side of the unread counter: sending a
/// message pushes the recipient's new unread total into their notification
/// stream, opening the inbox pushes a zero.
pub struct MessageService {
    store: Arc<GraphStore>,
}

impl MessageService {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    pub async fn send_message(
        &self,
        author_id: Uuid,
        recipient_username: &str,
        body: &str,
    ) -> CoreResult<Message> {
        let recipient = self.store.user_by_username(recipient_username).await?;
        let message = self
            .store
            .create_message(author_id, recipient.id, body)
            .await?;

        let unread = self.store.unread_count(recipient.id).await?;
        self.store
            .append_notification(recipient.id, UNREAD_MESSAGE_COUNT, json!(unread))
            .await?;

        info!(
            "message {} from {} to '{}' ({} unread)",
            message.id, author_id, recipient_username, unread
        );
        Ok(message)
    }

    /// Opens the inbox: moves the read marker, announces a zero unread
    /// count, and returns the received messages newest first.
    pub async fn read_messages(
        &self,
        user_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> CoreResult<Page<Message>> {
        self.store.mark_messages_read(user_id).await?;
        self.store
            .append_notification(user_id, UNREAD_MESSAGE_COUNT, json!(0))
            .await?;
        let messages = self.store.messages_received_by_time(user_id).await?;
        Page::build(messages, page, per_page)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> CoreResult<i64> {
        self.store.unread_count(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::CoreError;
    use chrono::{Duration, TimeZone, Utc};

    async fn fixture() -> (Arc<GraphStore>, MessageService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let store = Arc::new(GraphStore::with_clock(clock.clone()));
        let svc = MessageService::new(store.clone());
        (store, svc, clock)
    }

    #[tokio::test]
    async fn sending_announces_the_recipients_unread_total() {
        let (store, svc, clock) = fixture().await;
        let john = store.create_user("john", "john@example.com").await.unwrap();
        let susan = store
            .create_user("susan", "susan@example.com")
            .await
            .unwrap();

        svc.send_message(john.id, "susan", "have you read it?")
            .await
            .unwrap();
        clock.advance(Duration::seconds(1));
        svc.send_message(john.id, "susan", "well?").await.unwrap();

        let stream = store.notifications_since(susan.id, 0.0).await.unwrap();
        assert_eq!(stream.len(), 2);
        assert_eq!(stream[0].name, UNREAD_MESSAGE_COUNT);
        assert_eq!(stream[0].data, json!(1));
        assert_eq!(stream[1].data, json!(2));
    }

    #[tokio::test]
    async fn opening_the_inbox_resets_the_counter() {
        let (store, svc, clock) = fixture().await;
        let john = store.create_user("john", "john@example.com").await.unwrap();
        let susan = store
            .create_user("susan", "susan@example.com")
            .await
            .unwrap();

        svc.send_message(john.id, "susan", "hello").await.unwrap();
        clock.advance(Duration::seconds(1));
        assert_eq!(svc.unread_count(susan.id).await.unwrap(), 1);

        let inbox = svc.read_messages(susan.id, 1, 10).await.unwrap();
        assert_eq!(inbox.total, 1);
        assert_eq!(inbox.items[0].body, "hello");
        assert_eq!(svc.unread_count(susan.id).await.unwrap(), 0);

        // The stream keeps both records, the zero last.
        let stream = store.notifications_since(susan.id, 0.0).await.unwrap();
        assert_eq!(stream.len(), 2);
        assert_eq!(stream[1].data, json!(0));
    }

    #[tokio::test]
    async fn inbox_is_newest_first() {
        let (store, svc, clock) = fixture().await;
        let john = store.create_user("john", "john@example.com").await.unwrap();
        store
            .create_user("susan", "susan@example.com")
            .await
            .unwrap();

        svc.send_message(john.id, "susan", "first").await.unwrap();
        clock.advance(Duration::seconds(1));
        svc.send_message(john.id, "susan", "second").await.unwrap();

        let susan = store.user_by_username("susan").await.unwrap();
        let inbox = svc.read_messages(susan.id, 1, 10).await.unwrap();
        let bodies: Vec<&str> = inbox.items.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn messaging_an_unknown_user_is_not_found() {
        let (store, svc, _) = fixture().await;
        let john = store.create_user("john", "john@example.com").await.unwrap();
        assert!(matches!(
            svc.send_message(john.id, "nobody", "hi").await,
            Err(CoreError::NotFound("user"))
        ));
    }
}
