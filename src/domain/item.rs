use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub description: String,
    /// Unique across the whole store; identifies an item across fetches.
    pub link: String,
    pub last_updated_time: DateTime<Utc>,
    pub is_read: bool,
}

/// An item as it comes out of a fetched document, before it has an owner or id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub last_updated_time: DateTime<Utc>,
}

impl NewFeedItem {
    pub fn into_item(self, id: i64, feed_id: i64) -> FeedItem {
        FeedItem {
            id,
            feed_id,
            title: self.title,
            description: self.description,
            link: self.link,
            last_updated_time: truncate_to_secs(self.last_updated_time),
            is_read: false,
        }
    }
}

/// Storage form of a timestamp: second precision with a `Z` suffix, so that
/// lexical order matches chronological order.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn truncate_to_secs(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(dt.timestamp(), 0).unwrap_or(dt)
}
