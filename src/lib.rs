pub mod book;
pub mod clock;
pub mod comment;
pub mod config;
pub mod error;
pub mod feed;
pub mod message;
pub mod notification;
pub mod rating;
pub mod store;
pub mod user;

pub use crate::error::{CoreError, CoreResult};
pub use crate::store::GraphStore;
