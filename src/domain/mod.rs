pub mod feed;
pub mod item;

pub use feed::{Feed, NewFeed, DEFAULT_IMAGE_URL};
pub use item::{FeedItem, NewFeedItem};
