use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, SkimmerError};
use crate::domain::item::{format_timestamp, parse_timestamp};
use crate::domain::{Feed, FeedItem, NewFeed, NewFeedItem};
use crate::store::Store;

const FEED_COLUMNS: &str = "id, title, description, link, image_url, parent_id";
const ITEM_COLUMNS: &str = "id, feed_id, title, description, link, last_updated_time, is_read";
const SEEDED_KEY: &str = "seeded";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn migrations() -> Migrations<'static> {
        Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))])
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SkimmerError::Other(format!("database lock poisoned: {}", e)))
    }

    fn require_feed(conn: &Connection, id: i64) -> Result<Feed> {
        conn.query_row(
            &format!("SELECT {} FROM feeds WHERE id = ?1", FEED_COLUMNS),
            params![id],
            feed_from_row,
        )
        .optional()?
        .ok_or(SkimmerError::FeedNotFound(id))
    }

    fn require_directory(conn: &Connection, id: i64) -> Result<Feed> {
        let feed = Self::require_feed(conn, id)?;
        if !feed.is_directory() {
            return Err(SkimmerError::NotADirectory(id));
        }
        Ok(feed)
    }
}

impl Store for SqliteStore {
    fn init_schema(&self) -> Result<()> {
        let mut conn = self.conn()?;
        Self::migrations().to_latest(&mut conn)?;
        Ok(())
    }

    fn is_seeded(&self) -> Result<bool> {
        let conn = self.conn()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![SEEDED_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.as_deref() == Some("1"))
    }

    fn mark_seeded(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, '1')
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![SEEDED_KEY],
        )?;
        Ok(())
    }

    fn insert_feed(&self, feed: &NewFeed) -> Result<Feed> {
        let conn = self.conn()?;

        if let Some(parent_id) = feed.parent_id {
            Self::require_directory(&conn, parent_id)?;
        }

        conn.execute(
            "INSERT INTO feeds (title, description, link, image_url, parent_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                feed.title,
                feed.description,
                feed.link,
                feed.image_url,
                feed.parent_id
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref err, Some(ref msg))
                if err.code == ErrorCode::ConstraintViolation && msg.contains("feeds.link") =>
            {
                SkimmerError::FeedExists(feed.link.clone().unwrap_or_default())
            }
            e => SkimmerError::Database(e),
        })?;

        Ok(Feed {
            id: conn.last_insert_rowid(),
            title: feed.title.clone(),
            description: feed.description.clone(),
            link: feed.link.clone(),
            image_url: feed.image_url.clone(),
            parent_id: feed.parent_id,
            items: Vec::new(),
        })
    }

    fn get_feed(&self, id: i64) -> Result<Option<Feed>> {
        let conn = self.conn()?;
        let feed = conn
            .query_row(
                &format!("SELECT {} FROM feeds WHERE id = ?1", FEED_COLUMNS),
                params![id],
                feed_from_row,
            )
            .optional()?;
        Ok(feed)
    }

    fn get_feed_by_link(&self, link: &str) -> Result<Option<Feed>> {
        let conn = self.conn()?;
        let feed = conn
            .query_row(
                &format!("SELECT {} FROM feeds WHERE link = ?1", FEED_COLUMNS),
                params![link],
                feed_from_row,
            )
            .optional()?;
        Ok(feed)
    }

    fn get_all_feeds(&self) -> Result<Vec<Feed>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!("SELECT {} FROM feeds ORDER BY id", FEED_COLUMNS))?;
        let mut feeds = stmt
            .query_map([], feed_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM feed_items ORDER BY feed_id, last_updated_time DESC, id DESC",
            ITEM_COLUMNS
        ))?;
        let mut items_by_feed: HashMap<i64, Vec<FeedItem>> = HashMap::new();
        for item in stmt.query_map([], item_from_row)? {
            let item = item?;
            items_by_feed.entry(item.feed_id).or_default().push(item);
        }

        for feed in feeds.iter_mut().filter(|f| !f.is_directory()) {
            feed.items = items_by_feed.remove(&feed.id).unwrap_or_default();
        }

        Ok(feeds)
    }

    fn set_parent(&self, feed_id: i64, parent_id: Option<i64>) -> Result<()> {
        let conn = self.conn()?;
        Self::require_feed(&conn, feed_id)?;

        if let Some(parent_id) = parent_id {
            if parent_id == feed_id {
                return Err(SkimmerError::InvalidHierarchy(format!(
                    "feed {} cannot be its own parent",
                    feed_id
                )));
            }
            let mut ancestor = Some(Self::require_directory(&conn, parent_id)?);
            while let Some(current) = ancestor {
                if current.id == feed_id {
                    return Err(SkimmerError::InvalidHierarchy(format!(
                        "moving feed {} under {} would create a cycle",
                        feed_id, parent_id
                    )));
                }
                ancestor = match current.parent_id {
                    Some(next) => Some(Self::require_feed(&conn, next)?),
                    None => None,
                };
            }
        }

        conn.execute(
            "UPDATE feeds SET parent_id = ?1 WHERE id = ?2",
            params![parent_id, feed_id],
        )?;
        Ok(())
    }

    fn delete_feed(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM feeds WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(SkimmerError::FeedNotFound(id));
        }
        Ok(())
    }

    fn insert_item_if_absent(&self, item: &NewFeedItem, feed_id: i64) -> Result<Option<FeedItem>> {
        let conn = self.conn()?;

        let inserted = conn
            .execute(
                "INSERT INTO feed_items (title, description, link, last_updated_time, is_read, feed_id)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)
                 ON CONFLICT(link) DO NOTHING",
                params![
                    item.title,
                    item.description,
                    item.link,
                    format_timestamp(&item.last_updated_time),
                    feed_id
                ],
            )
            .map_err(|e| match e.sqlite_error_code() {
                Some(ErrorCode::ConstraintViolation) => SkimmerError::FeedNotFound(feed_id),
                _ => SkimmerError::Database(e),
            })?;

        if inserted == 0 {
            return Ok(None);
        }

        Ok(Some(item.clone().into_item(conn.last_insert_rowid(), feed_id)))
    }

    fn get_item(&self, id: i64) -> Result<Option<FeedItem>> {
        let conn = self.conn()?;
        let item = conn
            .query_row(
                &format!("SELECT {} FROM feed_items WHERE id = ?1", ITEM_COLUMNS),
                params![id],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    fn get_items_by_feed(&self, feed_id: i64) -> Result<Vec<FeedItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM feed_items WHERE feed_id = ?1
             ORDER BY last_updated_time DESC, id DESC",
            ITEM_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![feed_id], item_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn mark_read(&self, item_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE feed_items SET is_read = 1 WHERE id = ?1 AND is_read = 0",
            params![item_id],
        )?;
        if changed > 0 {
            return Ok(true);
        }

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM feed_items WHERE id = ?1)",
            params![item_id],
            |row| row.get(0),
        )?;
        if exists {
            Ok(false)
        } else {
            Err(SkimmerError::ItemNotFound(item_id))
        }
    }

    fn mark_all_read(&self, feed_id: i64) -> Result<usize> {
        let conn = self.conn()?;
        Self::require_feed(&conn, feed_id)?;
        let changed = conn.execute(
            "UPDATE feed_items SET is_read = 1 WHERE is_read = 0 AND feed_id = ?1",
            params![feed_id],
        )?;
        Ok(changed)
    }

    fn unread_count(&self, feed_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM feed_items WHERE feed_id = ?1 AND is_read = 0",
            params![feed_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn feed_from_row(row: &Row) -> rusqlite::Result<Feed> {
    Ok(Feed {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        link: row.get(3)?,
        image_url: row.get(4)?,
        parent_id: row.get(5)?,
        items: Vec::new(),
    })
}

fn item_from_row(row: &Row) -> rusqlite::Result<FeedItem> {
    let raw_time: String = row.get(5)?;
    let last_updated_time = parse_timestamp(&raw_time).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("invalid timestamp: {}", raw_time).into(),
        )
    })?;

    Ok(FeedItem {
        id: row.get(0)?,
        feed_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        link: row.get(4)?,
        last_updated_time,
        is_read: row.get::<_, i64>(6)? != 0,
    })
}
