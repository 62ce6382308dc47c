pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "skimmer")]
#[command(about = "A personal RSS/Atom feed reader", long_about = None)]
pub struct Cli {
    /// Number of feeds refreshed concurrently (overrides the config file)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Database file (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Subscribe to a feed
    Add {
        /// URL of the feed to add
        url: String,
        /// Directory to place the feed in
        #[arg(long)]
        parent: Option<i64>,
    },
    /// Unsubscribe from a feed and delete its items
    Remove {
        /// Id of the feed to remove
        id: i64,
    },
    /// Refresh one feed, or every feed when no id is given
    Update {
        id: Option<i64>,
    },
    /// List feeds or items
    List {
        /// Show items instead of feeds
        #[arg(long)]
        items: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show feeds grouped by directory with unread counts
    Tree,
    /// Mark one item as read
    Read {
        item_id: i64,
    },
    /// Mark every item of a feed (or directory) as read
    ReadAll {
        feed_id: i64,
    },
    /// Create a directory
    Mkdir {
        title: String,
        #[arg(long)]
        parent: Option<i64>,
    },
    /// Move a feed into a directory, or to the top level without --parent
    Mv {
        feed_id: i64,
        #[arg(long)]
        parent: Option<i64>,
    },
}
