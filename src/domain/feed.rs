use serde::Serialize;

use crate::domain::FeedItem;

/// Image shown for feeds whose source declares none, and for directories.
pub const DEFAULT_IMAGE_URL: &str = "skimmer://icons/feed.svg";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feed {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Source URL. Directories have none.
    pub link: Option<String>,
    pub image_url: String,
    pub parent_id: Option<i64>,
    /// Newest first. Always empty for directories.
    pub items: Vec<FeedItem>,
}

impl Feed {
    pub fn is_directory(&self) -> bool {
        self.link.is_none()
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|item| !item.is_read).count()
    }
}

/// A feed row that has not been persisted yet.
#[derive(Debug, Clone, Default)]
pub struct NewFeed {
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub image_url: String,
    pub parent_id: Option<i64>,
}

impl NewFeed {
    pub fn directory(title: impl Into<String>, parent_id: Option<i64>) -> Self {
        let title = title.into();
        Self {
            description: title.clone(),
            title,
            link: None,
            image_url: DEFAULT_IMAGE_URL.to_string(),
            parent_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: i64, is_read: bool) -> FeedItem {
        FeedItem {
            id,
            feed_id: 1,
            title: format!("Item {}", id),
            description: String::new(),
            link: format!("https://example.com/{}", id),
            last_updated_time: Utc::now(),
            is_read,
        }
    }

    #[test]
    fn test_directory_has_no_link() {
        let dir = NewFeed::directory("Tech", None);
        assert!(dir.link.is_none());
        assert_eq!(dir.description, "Tech");
        assert_eq!(dir.image_url, DEFAULT_IMAGE_URL);
    }

    #[test]
    fn test_unread_count_counts_only_unread() {
        let feed = Feed {
            id: 1,
            title: "Feed".into(),
            description: "Feed".into(),
            link: Some("https://example.com/feed.xml".into()),
            image_url: DEFAULT_IMAGE_URL.into(),
            parent_id: None,
            items: vec![item(1, false), item(2, true), item(3, false)],
        };
        assert!(!feed.is_directory());
        assert_eq!(feed.unread_count(), 2);
    }

    #[test]
    fn test_json_output_shape() {
        let feed = Feed {
            id: 7,
            title: "Comics".into(),
            description: "Comics".into(),
            link: None,
            image_url: DEFAULT_IMAGE_URL.into(),
            parent_id: None,
            items: vec![item(1, true)],
        };
        let value = serde_json::to_value(&feed).unwrap();
        assert_eq!(value["id"], 7);
        assert!(value["link"].is_null());
        assert_eq!(value["items"][0]["is_read"], true);
        assert_eq!(value["items"][0]["link"], "https://example.com/1");
    }
}
