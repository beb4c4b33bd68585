use std::sync::Arc;
use tako_client::FeedSource;
use takotako_core::{CoreError, FeedStatus, Post};
use tracing::{info, warn};

pub struct FeedPoller {
    source: Arc<dyn FeedSource>,
}

impl FeedPoller {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self { source }
    }

    /// Fetches the followed-accounts feed.
    ///
    /// `Ok(None)` means the platform answered with a non-success status and
    /// there is nothing to do this cycle. Transport faults are returned as
    /// errors for the caller's fault boundary.
    pub async fn poll(&self) -> Result<Option<Vec<Post>>, CoreError> {
        let feed = self.source.fetch_following_feed().await?;

        match feed.status {
            FeedStatus::Success => {
                info!("Fetched {} posts from following feed", feed.items.len());
                Ok(Some(feed.items))
            }
            FeedStatus::Failure { payload } => {
                warn!("Failed to get feed: {}", payload);
                Ok(None)
            }
        }
    }
}
