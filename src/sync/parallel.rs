use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::Stream;
use tokio_util::sync::DropGuard;

use crate::store::Store;
use crate::sync::{FeedManager, UpdateOutcome};

/// Per-feed refresh results in completion order.
///
/// Dropping the stream cancels the fetches of its batch that are still running.
pub struct UpdateStream {
    rx: UnboundedReceiver<(i64, UpdateOutcome)>,
    _guard: DropGuard,
}

impl Stream for UpdateStream {
    type Item = (i64, UpdateOutcome);

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

impl<S: Store + Send + Sync + 'static> FeedManager<S> {
    /// Refreshes every leaf feed, at most `workers` at a time.
    ///
    /// A failure in one feed is reported for that feed only. Must be called
    /// from within a tokio runtime.
    pub fn update_all_feeds(&self) -> crate::app::Result<UpdateStream> {
        let feeds = self.store.get_all_feeds()?;
        let batch = self.cancel.child_token();
        let (tx, rx) = mpsc::unbounded();

        let leaf_ids: Vec<i64> = feeds
            .into_iter()
            .filter(|f| !f.is_directory())
            .map(|f| f.id)
            .collect();
        tracing::debug!("Refreshing {} feeds", leaf_ids.len());

        for feed_id in leaf_ids {
            let manager = self.clone();
            let semaphore = self.semaphore.clone();
            let batch = batch.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => match manager.update_feed_with(feed_id, &batch).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::warn!("Refreshing feed {} failed: {}", feed_id, e);
                            UpdateOutcome::FetchFailed(e.to_string())
                        }
                    },
                    Err(e) => UpdateOutcome::FetchFailed(e.to_string()),
                };
                // The receiver may already be gone.
                let _ = tx.unbounded_send((feed_id, outcome));
            });
        }

        Ok(UpdateStream {
            rx,
            _guard: batch.drop_guard(),
        })
    }
}
