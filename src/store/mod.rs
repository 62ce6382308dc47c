pub mod sqlite;

use crate::app::Result;
use crate::domain::{Feed, FeedItem, NewFeed, NewFeedItem};

pub use sqlite::SqliteStore;

pub trait Store {
    // Schema and first-run state
    fn init_schema(&self) -> Result<()>;
    fn is_seeded(&self) -> Result<bool>;
    fn mark_seeded(&self) -> Result<()>;

    // Feed operations
    fn insert_feed(&self, feed: &NewFeed) -> Result<Feed>;
    fn get_feed(&self, id: i64) -> Result<Option<Feed>>;
    fn get_feed_by_link(&self, link: &str) -> Result<Option<Feed>>;
    fn get_all_feeds(&self) -> Result<Vec<Feed>>;
    fn set_parent(&self, feed_id: i64, parent_id: Option<i64>) -> Result<()>;
    fn delete_feed(&self, id: i64) -> Result<()>;

    // Item operations
    /// Returns `None` when an item with the same link is already stored.
    fn insert_item_if_absent(&self, item: &NewFeedItem, feed_id: i64) -> Result<Option<FeedItem>>;
    fn get_item(&self, id: i64) -> Result<Option<FeedItem>>;
    fn get_items_by_feed(&self, feed_id: i64) -> Result<Vec<FeedItem>>;

    // Read state
    /// Returns whether the item changed; an already-read item is left alone.
    fn mark_read(&self, item_id: i64) -> Result<bool>;
    fn mark_all_read(&self, feed_id: i64) -> Result<usize>;
    fn unread_count(&self, feed_id: i64) -> Result<i64>;
}
