pub mod api;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use takotako_core::{CoreError, FeedResult, Post, ReplyStatus, TakoConfig};
use tracing::warn;

pub use api::{CastAttachments, TakoApiClient};

/// Source of the followed-accounts feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_following_feed(&self) -> Result<FeedResult, CoreError>;
}

/// Publishes a reply under an existing cast.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn post_reply(&self, post_id: &str, text: &str) -> Result<ReplyStatus, CoreError>;
}

pub struct TakoClient {
    api: TakoApiClient,
}

impl TakoClient {
    pub fn new(config: TakoConfig) -> Result<Self, CoreError> {
        Ok(Self {
            api: TakoApiClient::new(&config)?,
        })
    }
}

#[async_trait]
impl FeedSource for TakoClient {
    async fn fetch_following_feed(&self) -> Result<FeedResult, CoreError> {
        let envelope = self.api.get_following_feed().await?;

        if !envelope.is_success() {
            let payload = envelope
                .message
                .clone()
                .unwrap_or_else(|| format!("status={}", envelope.status));
            warn!("Following feed returned non-success status: {}", payload);
            return Ok(FeedResult::failure(payload));
        }

        let items = envelope
            .data
            .map(|data| data.into_casts().into_iter().map(Post::from).collect())
            .unwrap_or_default();
        Ok(FeedResult::success(items))
    }
}

#[async_trait]
impl ReplySink for TakoClient {
    async fn post_reply(&self, post_id: &str, text: &str) -> Result<ReplyStatus, CoreError> {
        let envelope = self
            .api
            .reply_to_cast(post_id, text, &CastAttachments::default())
            .await?;

        if envelope.is_success() {
            Ok(ReplyStatus::Success)
        } else {
            warn!(
                "Reply to {} rejected: status={} message={:?}",
                post_id, envelope.status, envelope.message
            );
            Ok(ReplyStatus::Failure)
        }
    }
}
