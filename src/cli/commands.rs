use futures::StreamExt;

use crate::app::{AppContext, Result};
use crate::domain::Feed;
use crate::sync::UpdateOutcome;

pub async fn add_feed(ctx: &AppContext, url: &str, parent: Option<i64>) -> Result<()> {
    let feed = ctx.manager.add_feed_under(url, parent).await?;
    println!("Added feed [{}] {}", feed.id, feed.title);
    println!("Fetched {} items", feed.items.len());
    Ok(())
}

pub fn remove_feed(ctx: &AppContext, id: i64) -> Result<()> {
    ctx.manager.delete_feed(id)?;
    println!("Removed feed {}", id);
    Ok(())
}

pub async fn update_feed(ctx: &AppContext, id: i64) -> Result<()> {
    match ctx.manager.update_feed(id).await? {
        UpdateOutcome::NewItems(items) => {
            println!("{} new items", items.len());
            for item in items {
                println!("  + {}", item.title);
            }
        }
        UpdateOutcome::NoNewItems => println!("No new items"),
        UpdateOutcome::FetchFailed(reason) => eprintln!("Update failed: {}", reason),
    }
    Ok(())
}

pub async fn update_feeds(ctx: &AppContext) -> Result<()> {
    let tree = ctx.manager.feed_tree()?;
    let mut results = ctx.manager.update_all_feeds()?;

    let mut total_new = 0;
    let mut errors = 0;

    while let Some((feed_id, outcome)) = results.next().await {
        let title = tree.get(feed_id).map(|f| f.title.as_str()).unwrap_or("?");
        match outcome {
            UpdateOutcome::NewItems(items) => {
                total_new += items.len();
                println!("  {} new items from {}", items.len(), title);
            }
            UpdateOutcome::NoNewItems => {}
            UpdateOutcome::FetchFailed(reason) => {
                errors += 1;
                eprintln!("  Error updating {}: {}", title, reason);
            }
        }
    }

    println!("Update complete: {} new items, {} errors", total_new, errors);
    Ok(())
}

pub fn list_feeds(ctx: &AppContext, json: bool) -> Result<()> {
    let feeds = ctx.manager.get_all_feeds()?;

    if json {
        print_json(&feeds)?;
        return Ok(());
    }

    if feeds.is_empty() {
        println!("No feeds");
        return Ok(());
    }

    let tree = ctx.manager.feed_tree()?;
    for feed in &feeds {
        println!(
            "[{}] {} ({} unread)\n  {}",
            feed.id,
            feed.title,
            tree.unread_count(feed.id),
            feed.link.as_deref().unwrap_or("(directory)")
        );
    }

    Ok(())
}

pub fn list_items(ctx: &AppContext, json: bool) -> Result<()> {
    let feeds = ctx.manager.get_all_feeds()?;
    let mut items: Vec<_> = feeds.into_iter().flat_map(|f| f.items).collect();
    items.sort_by(|a, b| b.last_updated_time.cmp(&a.last_updated_time));

    if json {
        print_json(&items)?;
        return Ok(());
    }

    if items.is_empty() {
        println!("No items");
        return Ok(());
    }

    for item in items {
        let read_marker = if item.is_read { " " } else { "*" };
        println!(
            "{} [{}] {} {}",
            read_marker,
            item.id,
            item.last_updated_time.format("%Y-%m-%d"),
            item.title
        );
    }

    Ok(())
}

pub fn show_tree(ctx: &AppContext) -> Result<()> {
    let tree = ctx.manager.feed_tree()?;

    println!("All feeds ({} unread)", tree.total_unread());
    for (depth, feed) in tree.walk() {
        println!("{}", tree_line(depth, feed, tree.unread_count(feed.id)));
    }

    Ok(())
}

pub fn mark_read(ctx: &AppContext, item_id: i64) -> Result<()> {
    if ctx.manager.mark_read(item_id)? {
        println!("Marked item {} as read", item_id);
    } else {
        println!("Item {} was already read", item_id);
    }
    Ok(())
}

pub fn mark_all_read(ctx: &AppContext, feed_id: i64) -> Result<()> {
    let count = ctx.manager.mark_all_read(feed_id)?;
    println!("Marked {} items as read", count);
    Ok(())
}

pub fn make_directory(ctx: &AppContext, title: &str, parent: Option<i64>) -> Result<()> {
    let dir = ctx.manager.add_directory(title, parent)?;
    println!("Created directory [{}] {}", dir.id, dir.title);
    Ok(())
}

pub fn move_feed(ctx: &AppContext, feed_id: i64, parent: Option<i64>) -> Result<()> {
    ctx.manager.move_feed(feed_id, parent)?;
    match parent {
        Some(parent) => println!("Moved feed {} into {}", feed_id, parent),
        None => println!("Moved feed {} to the top level", feed_id),
    }
    Ok(())
}

fn tree_line(depth: usize, feed: &Feed, unread: usize) -> String {
    let marker = if feed.is_directory() { "+" } else { "-" };
    format!(
        "{}{} [{}] {} ({})",
        "  ".repeat(depth + 1),
        marker,
        feed.id,
        feed.title,
        unread
    )
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| crate::app::SkimmerError::Other(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
