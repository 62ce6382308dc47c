//! # Skimmer
//!
//! A personal RSS/Atom feed reader built around a synchronization engine.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → FeedManager → Store
//!                             ↓
//!                         FeedTree
//! ```
//!
//! - [`fetcher`]: HTTP client with a fixed user agent and timeout
//! - [`normalizer`]: Converts RSS/Atom documents into unified domain models
//! - [`store`]: SQLite persistence; item links are the dedup key
//! - [`sync`]: Adding, refreshing and read-state operations
//! - [`hierarchy`]: Directory grouping and unread aggregation
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a feed
//! skimmer add https://blog.rust-lang.org/feed.xml
//!
//! # Refresh everything
//! skimmer update
//!
//! # Show feeds grouped by directory
//! skimmer tree
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// fetcher and [`FeedManager`](sync::FeedManager).
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/skimmer/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Feed`](domain::Feed): a leaf feed with items, or a directory
/// - [`FeedItem`](domain::FeedItem): one entry, identified across fetches by its link
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Directory tree over the flat feed list.
pub mod hierarchy;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0
/// into a [`NormalizedFeed`](normalizer::NormalizedFeed).
pub mod normalizer;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Feed synchronization.
///
/// - [`FeedManager`](sync::FeedManager): add, update, delete, mark read
/// - [`UpdateStream`](sync::UpdateStream): bounded whole-library refresh
pub mod sync;
