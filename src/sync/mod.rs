//! Feed synchronization: adding, refreshing, and read-state bookkeeping.
//!
//! [`FeedManager`] is the entry point a front end talks to. Every fetch it
//! starts is bounded by a timeout and raced against a cancellation token.

pub mod parallel;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::app::{Result, SkimmerError};
use crate::domain::{Feed, FeedItem, NewFeed};
use crate::fetcher::Fetcher;
use crate::hierarchy::FeedTree;
use crate::normalizer::{NormalizedFeed, Normalizer};
use crate::store::Store;

pub use parallel::UpdateStream;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

pub const DEFAULT_SEED_FEEDS: &[&str] = &[
    "https://news.ycombinator.com/rss",
    "https://xkcd.com/rss.xml",
];

/// Result of refreshing one feed.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Items seen for the first time, in source order.
    NewItems(Vec<FeedItem>),
    NoNewItems,
    FetchFailed(String),
}

impl UpdateOutcome {
    pub fn new_items(&self) -> &[FeedItem] {
        match self {
            UpdateOutcome::NewItems(items) => items,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManagerOptions {
    pub workers: usize,
    pub fetch_timeout: Duration,
    pub seed_feeds: Vec<String>,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            seed_feeds: DEFAULT_SEED_FEEDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub struct FeedManager<S> {
    store: Arc<S>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    semaphore: Arc<Semaphore>,
    fetch_timeout: Duration,
    seed_feeds: Vec<String>,
    cancel: CancellationToken,
}

impl<S> Clone for FeedManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            fetcher: self.fetcher.clone(),
            normalizer: self.normalizer.clone(),
            semaphore: self.semaphore.clone(),
            fetch_timeout: self.fetch_timeout,
            seed_feeds: self.seed_feeds.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<S: Store + Send + Sync + 'static> FeedManager<S> {
    pub fn new(store: Arc<S>, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_options(store, fetcher, ManagerOptions::default())
    }

    pub fn with_options(
        store: Arc<S>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        options: ManagerOptions,
    ) -> Self {
        Self {
            store,
            fetcher,
            normalizer: Normalizer::new(),
            semaphore: Arc::new(Semaphore::new(options.workers.max(1))),
            fetch_timeout: options.fetch_timeout,
            seed_feeds: options.seed_feeds,
            cancel: CancellationToken::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Aborts every in-flight fetch; later fetches fail with `Cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Ensures the schema and seeds the default feeds once.
    ///
    /// Seeding is all-or-nothing: if any seed feed cannot be added, the ones
    /// that were added in this attempt are removed again and the marker is
    /// left unset so the next start retries.
    pub async fn init_db(&self) -> Result<()> {
        self.store.init_schema()?;

        if self.store.is_seeded()? {
            return Ok(());
        }

        tracing::info!("Seeding {} default feeds", self.seed_feeds.len());
        let results = join_all(self.seed_feeds.iter().map(|link| self.add_feed(link))).await;

        let mut failures = Vec::new();
        let mut added = Vec::new();
        for (link, result) in self.seed_feeds.iter().zip(results) {
            match result {
                Ok(feed) => added.push(feed.id),
                // Already present from an earlier, interrupted attempt.
                Err(SkimmerError::FeedExists(_)) => {}
                Err(e) => failures.push(format!("{}: {}", link, e)),
            }
        }

        if failures.is_empty() {
            self.store.mark_seeded()?;
            return Ok(());
        }

        for id in added {
            if let Err(e) = self.store.delete_feed(id) {
                tracing::warn!("Failed to roll back seed feed {}: {}", id, e);
            }
        }
        Err(SkimmerError::Init(failures.join("; ")))
    }

    pub async fn add_feed(&self, link: &str) -> Result<Feed> {
        self.add_feed_under(link, None).await
    }

    /// Subscribes to `link`, optionally inside a directory. Returns the new
    /// feed carrying only the items that were actually inserted.
    pub async fn add_feed_under(&self, link: &str, parent_id: Option<i64>) -> Result<Feed> {
        let link = url::Url::parse(link.trim())?.to_string();

        if self.store.get_feed_by_link(&link)?.is_some() {
            return Err(SkimmerError::FeedExists(link));
        }

        let normalized = self.fetch_normalized(&link, &self.cancel).await?;

        let mut feed = self.store.insert_feed(&NewFeed {
            title: normalized.title.clone(),
            description: normalized.description.clone(),
            link: Some(link.clone()),
            image_url: normalized.image_url.clone(),
            parent_id,
        })?;

        feed.items = match self.insert_new_items(feed.id, normalized) {
            Ok(items) => items,
            Err(e) => {
                if let Err(cleanup) = self.store.delete_feed(feed.id) {
                    tracing::warn!("Failed to remove partially added feed {}: {}", feed.id, cleanup);
                }
                return Err(e);
            }
        };
        tracing::info!("Added feed {} with {} items", link, feed.items.len());

        Ok(feed)
    }

    /// Re-fetches one feed. Fetch problems become `FetchFailed`; unknown ids
    /// and directories are errors.
    pub async fn update_feed(&self, feed_id: i64) -> Result<UpdateOutcome> {
        self.update_feed_with(feed_id, &self.cancel).await
    }

    pub(crate) async fn update_feed_with(
        &self,
        feed_id: i64,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome> {
        let feed = self
            .store
            .get_feed(feed_id)?
            .ok_or(SkimmerError::FeedNotFound(feed_id))?;
        let link = feed.link.ok_or(SkimmerError::NotALeaf(feed_id))?;

        let normalized = match self.fetch_normalized(&link, cancel).await {
            Ok(normalized) => normalized,
            Err(e) if e.is_fetch_error() => {
                tracing::warn!("Refreshing {} failed: {}", link, e);
                return Ok(UpdateOutcome::FetchFailed(e.to_string()));
            }
            Err(e) => return Err(e),
        };

        let new_items = self.insert_new_items(feed_id, normalized)?;
        if new_items.is_empty() {
            tracing::debug!("No new items from {}", link);
            Ok(UpdateOutcome::NoNewItems)
        } else {
            tracing::info!("Added {} new items from {}", new_items.len(), link);
            Ok(UpdateOutcome::NewItems(new_items))
        }
    }

    pub fn delete_feed(&self, feed_id: i64) -> Result<()> {
        self.store.delete_feed(feed_id)
    }

    pub fn get_all_feeds(&self) -> Result<Vec<Feed>> {
        self.store.get_all_feeds()
    }

    pub fn feed_tree(&self) -> Result<FeedTree> {
        Ok(FeedTree::new(self.store.get_all_feeds()?))
    }

    /// Returns whether the item changed; marking a read item again is a no-op.
    pub fn mark_read(&self, item_id: i64) -> Result<bool> {
        self.store.mark_read(item_id)
    }

    /// Marks a feed read. For a directory, every leaf below it is marked.
    pub fn mark_all_read(&self, feed_id: i64) -> Result<usize> {
        let feed = self
            .store
            .get_feed(feed_id)?
            .ok_or(SkimmerError::FeedNotFound(feed_id))?;

        if !feed.is_directory() {
            return self.store.mark_all_read(feed_id);
        }

        let tree = self.feed_tree()?;
        let mut changed = 0;
        for leaf in tree.leaves_under(feed_id) {
            changed += self.store.mark_all_read(leaf)?;
        }
        Ok(changed)
    }

    pub fn add_directory(&self, title: &str, parent_id: Option<i64>) -> Result<Feed> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SkimmerError::InvalidHierarchy(
                "directory title must not be empty".into(),
            ));
        }
        self.store.insert_feed(&NewFeed::directory(title, parent_id))
    }

    pub fn move_feed(&self, feed_id: i64, parent_id: Option<i64>) -> Result<()> {
        self.store.set_parent(feed_id, parent_id)
    }

    fn insert_new_items(&self, feed_id: i64, normalized: NormalizedFeed) -> Result<Vec<FeedItem>> {
        let mut inserted = Vec::new();
        for item in &normalized.items {
            if let Some(item) = self.store.insert_item_if_absent(item, feed_id)? {
                inserted.push(item);
            }
        }
        Ok(inserted)
    }

    async fn fetch_normalized(
        &self,
        link: &str,
        cancel: &CancellationToken,
    ) -> Result<NormalizedFeed> {
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SkimmerError::Cancelled),
            fetched = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(link)) => {
                fetched.map_err(|_| SkimmerError::Timeout(link.to_string()))??
            }
        };

        self.normalizer.normalize(link, &body)
    }
}
