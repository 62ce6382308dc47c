use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{Result, SkimmerError};
use crate::domain::{NewFeedItem, DEFAULT_IMAGE_URL};

const UNTITLED: &str = "(Untitled)";

/// A parsed document with every fallback already applied.
#[derive(Debug, Clone)]
pub struct NormalizedFeed {
    pub title: String,
    pub description: String,
    pub image_url: String,
    /// Document order.
    pub items: Vec<NewFeedItem>,
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, feed_url: &str, body: &[u8]) -> Result<NormalizedFeed> {
        self.normalize_at(feed_url, body, Utc::now())
    }

    /// `fetched_at` stands in for entries that carry no timestamp at all.
    pub fn normalize_at(
        &self,
        feed_url: &str,
        body: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Result<NormalizedFeed> {
        let feed = parser::parse(body).map_err(|e| SkimmerError::FeedParse(e.to_string()))?;

        let title = feed
            .title
            .map(|t| decode(&t.content))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| feed_url.to_string());

        let description = feed
            .description
            .map(|d| decode(&d.content))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| title.clone());

        let image_url = feed
            .logo
            .or(feed.icon)
            .map(|image| image.uri)
            .filter(|uri| !uri.is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string());

        let items = feed
            .entries
            .into_iter()
            .filter_map(|entry| normalize_entry(entry, fetched_at))
            .collect();

        Ok(NormalizedFeed {
            title,
            description,
            image_url,
            items,
        })
    }
}

fn normalize_entry(entry: Entry, fetched_at: DateTime<Utc>) -> Option<NewFeedItem> {
    // No link means no dedup key.
    let Some(link) = entry.links.first().map(|l| l.href.trim().to_string()) else {
        tracing::debug!("Skipping entry {} without a link", entry.id);
        return None;
    };
    if link.is_empty() {
        return None;
    }

    let title = entry
        .title
        .map(|t| decode(&t.content))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let description = entry
        .summary
        .map(|s| decode(&s.content))
        .or_else(|| entry.content.and_then(|c| c.body).map(|b| decode(&b)))
        .unwrap_or_default();

    let last_updated_time = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(fetched_at);

    Some(NewFeedItem {
        title,
        description,
        link,
        last_updated_time,
    })
}

fn decode(text: &str) -> String {
    decode_html_entities(text.trim()).to_string()
}
