use std::sync::Arc;

use dotenv::dotenv;
use tracing::info;

use bookclub_core::book::model::NewBook;
use bookclub_core::comment::model::{CommentParent, NewComment};
use bookclub_core::comment::service::CommentService;
use bookclub_core::config::CoreConfig;
use bookclub_core::feed::service::FeedService;
use bookclub_core::message::service::MessageService;
use bookclub_core::notification::service::NotificationService;
use bookclub_core::rating::service::RatingService;
use bookclub_core::store::GraphStore;
use bookclub_core::user::service::UserService;

/// Walks the engine through a small scenario end to end, standing in for
/// the web layer that normally drives it.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    tracing_subscriber::fmt::init();

    // Load .env file if it exists
    dotenv().ok();

    let config = CoreConfig::from_env();
    let store = Arc::new(GraphStore::new());

    let users = UserService::new(store.clone());
    let feed = FeedService::new(store.clone(), &config);
    let comments = CommentService::new(store.clone());
    let ratings = RatingService::new(store.clone());
    let messages = MessageService::new(store.clone());
    let notifications = NotificationService::new(store.clone());

    let john = users.register("john", "john@example.com").await?;
    let susan = users.register("susan", "susan@example.com").await?;
    users.follow(john.id, "susan").await?;

    let book = store
        .create_book(
            susan.id,
            NewBook {
                title: "The Dispossessed".into(),
                author: "Ursula K. Le Guin".into(),
                description: "An ambiguous utopia.".into(),
                isbn: Some("978-0-06-051275-4".into()),
                language: Some("en".into()),
            },
        )
        .await?;

    let home = feed.followed_books(john.id, 1, config.books_per_page).await?;
    info!("john's feed has {} book(s)", home.total);

    let root = comments
        .create_comment(
            john.id,
            NewComment {
                body: "Loved the pacing.".into(),
                language: Some("en".into()),
                parent: CommentParent::Book(book.id),
            },
        )
        .await?;
    let reply = comments
        .create_comment(
            susan.id,
            NewComment {
                body: "Agreed, especially the middle chapters.".into(),
                language: Some("en".into()),
                parent: CommentParent::Comment(root.id),
            },
        )
        .await?;
    let ancestry = comments.get_ancestry(reply.id).await?;
    info!("reply {} sits at depth {}", reply.id, ancestry.len());

    let score = ratings.rate(john.id, book.id, 5).await?;
    info!("john rated '{}' a {}", book.title, score);

    messages
        .send_message(susan.id, "john", "Thanks for the comment!")
        .await?;
    let events = notifications.query_notifications(john.id, 0.0).await?;
    for event in &events {
        info!(
            "notification '{}' = {} @ {}",
            event.name, event.data, event.timestamp
        );
    }

    Ok(())
}
