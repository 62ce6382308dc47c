use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use tokio_test::assert_ok;

use skimmer::app::{Result, SkimmerError};
use skimmer::fetcher::Fetcher;
use skimmer::store::{SqliteStore, Store};
use skimmer::sync::{FeedManager, ManagerOptions, UpdateOutcome};

#[derive(Default)]
struct CannedFetcher {
    bodies: Mutex<HashMap<String, String>>,
}

impl CannedFetcher {
    fn serve(&self, url: &str, links: &[&str]) {
        let items: String = links
            .iter()
            .enumerate()
            .map(|(n, link)| {
                format!(
                    "<item><title>Post {n}</title><link>{link}</link>\
                     <pubDate>Tue, 02 Jan 2024 {n:02}:00:00 GMT</pubDate>\
                     <description>Post {n} summary</description></item>",
                    n = n,
                    link = link
                )
            })
            .collect();
        let body = format!(
            "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel>\
             <title>{url}</title><link>{url}</link>{items}</channel></rss>",
            url = url,
            items = items
        );
        self.bodies.lock().unwrap().insert(url.to_string(), body);
    }
}

#[async_trait]
impl Fetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tokio::task::yield_now().await;
        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .map(|b| b.clone().into_bytes())
            .ok_or_else(|| SkimmerError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

fn setup() -> (Arc<CannedFetcher>, FeedManager<SqliteStore>) {
    let fetcher = Arc::new(CannedFetcher::default());
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let manager = FeedManager::with_options(
        store,
        fetcher.clone(),
        ManagerOptions {
            workers: 4,
            seed_feeds: Vec::new(),
            ..Default::default()
        },
    );
    (fetcher, manager)
}

const FEED_A: &str = "https://a.example.com/rss";
const FEED_B: &str = "https://b.example.com/rss";

#[tokio::test]
async fn add_then_update_then_read() {
    let (fetcher, manager) = setup();
    fetcher.serve(
        FEED_A,
        &[
            "https://a.example.com/1",
            "https://a.example.com/2",
            "https://a.example.com/3",
        ],
    );
    fetcher.serve(FEED_B, &["https://b.example.com/1"]);

    let a = assert_ok!(manager.add_feed(FEED_A).await);
    let b = assert_ok!(manager.add_feed(FEED_B).await);

    let feeds = manager.get_all_feeds().unwrap();
    let stored_a = feeds.iter().find(|f| f.id == a.id).unwrap();
    assert_eq!(stored_a.items.len(), 3);
    assert!(stored_a.items.iter().all(|i| !i.is_read));
    // Newest first.
    assert_eq!(stored_a.items[0].link, "https://a.example.com/3");

    fetcher.serve(
        FEED_A,
        &[
            "https://a.example.com/1",
            "https://a.example.com/2",
            "https://a.example.com/3",
            "https://a.example.com/4",
        ],
    );
    let outcome = manager.update_feed(a.id).await.unwrap();
    let new_links: Vec<&str> = outcome.new_items().iter().map(|i| i.link.as_str()).collect();
    assert_eq!(new_links, vec!["https://a.example.com/4"]);
    assert_eq!(manager.store().get_items_by_feed(a.id).unwrap().len(), 4);

    let target = manager.store().get_items_by_feed(a.id).unwrap()[2].id;
    assert!(manager.mark_read(target).unwrap());
    manager.mark_all_read(a.id).unwrap();

    assert!(manager
        .store()
        .get_items_by_feed(a.id)
        .unwrap()
        .iter()
        .all(|i| i.is_read));
    assert_eq!(manager.store().unread_count(b.id).unwrap(), 1);
}

#[tokio::test]
async fn concurrent_refreshes_insert_each_link_once() {
    let (fetcher, manager) = setup();

    // Several feeds carry the same article; only one may own it.
    let urls: Vec<String> = (0..6).map(|n| format!("https://mirror{}.example.com/rss", n)).collect();
    for url in &urls {
        fetcher.serve(url, &[]);
    }
    let mut ids = Vec::new();
    for url in &urls {
        ids.push(manager.add_feed(url).await.unwrap().id);
    }

    for url in &urls {
        fetcher.serve(
            url,
            &["https://shared.example.com/story", "https://shared.example.com/other"],
        );
    }

    let results: Vec<(i64, UpdateOutcome)> = manager.update_all_feeds().unwrap().collect().await;
    assert_eq!(results.len(), urls.len());

    let mut owners: HashMap<String, Vec<i64>> = HashMap::new();
    for (feed_id, outcome) in &results {
        for item in outcome.new_items() {
            assert_eq!(item.feed_id, *feed_id);
            owners.entry(item.link.clone()).or_default().push(*feed_id);
        }
    }
    assert_eq!(owners.len(), 2);
    assert!(owners.values().all(|feeds| feeds.len() == 1));

    let stored: usize = ids
        .iter()
        .map(|id| manager.store().get_items_by_feed(*id).unwrap().len())
        .sum();
    assert_eq!(stored, 2);
}

#[tokio::test]
async fn deleted_feed_leaves_no_items() {
    let (fetcher, manager) = setup();
    fetcher.serve(FEED_A, &["https://a.example.com/1", "https://a.example.com/2"]);
    let a = manager.add_feed(FEED_A).await.unwrap();

    manager.delete_feed(a.id).unwrap();

    assert!(manager.store().get_items_by_feed(a.id).unwrap().is_empty());
    assert!(matches!(
        manager.update_feed(a.id).await.unwrap_err(),
        SkimmerError::FeedNotFound(_)
    ));
}

#[tokio::test]
async fn unknown_ids_are_reported() {
    let (_, manager) = setup();
    assert!(matches!(
        manager.mark_read(404).unwrap_err(),
        SkimmerError::ItemNotFound(404)
    ));
    assert!(matches!(
        manager.mark_all_read(404).unwrap_err(),
        SkimmerError::FeedNotFound(404)
    ));
    assert!(matches!(
        manager.move_feed(404, None).unwrap_err(),
        SkimmerError::FeedNotFound(404)
    ));
}

#[tokio::test]
async fn on_disk_store_seeds_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feeds.db");
    let fetcher = Arc::new(CannedFetcher::default());
    fetcher.serve(FEED_A, &["https://a.example.com/1"]);

    let options = ManagerOptions {
        seed_feeds: vec![FEED_A.to_string()],
        ..Default::default()
    };

    {
        let store = Arc::new(SqliteStore::new(&path).unwrap());
        let manager = FeedManager::with_options(store, fetcher.clone(), options.clone());
        manager.init_db().await.unwrap();
        assert_eq!(manager.get_all_feeds().unwrap().len(), 1);
    }

    let store = Arc::new(SqliteStore::new(&path).unwrap());
    let manager = FeedManager::with_options(store, fetcher, options);
    manager.init_db().await.unwrap();
    assert_eq!(manager.get_all_feeds().unwrap().len(), 1);
}
