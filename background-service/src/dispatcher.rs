use crate::clock::Clock;
use crate::eligibility::is_eligible;
use llm_interface::CommentGenerator;
use std::sync::Arc;
use tako_client::ReplySink;
use takotako_core::{ErrorExt, GenerationResult, Post, ReplyOutcome, ReplyStatus};
use tracing::{debug, info, warn};

/// Generates and posts one reply per eligible post, strictly in feed order.
///
/// Nothing is remembered between calls: dispatching the same posts twice
/// publishes two replies to each.
pub struct ReplyDispatcher {
    generator: CommentGenerator,
    replies: Arc<dyn ReplySink>,
    clock: Arc<dyn Clock>,
    window_minutes: u64,
}

impl ReplyDispatcher {
    pub fn new(
        generator: CommentGenerator,
        replies: Arc<dyn ReplySink>,
        clock: Arc<dyn Clock>,
        window_minutes: u64,
    ) -> Self {
        Self {
            generator,
            replies,
            clock,
            window_minutes,
        }
    }

    /// Returns one outcome per eligible post. Ineligible posts produce none.
    pub async fn dispatch(&self, feed_items: &[Post]) -> Vec<ReplyOutcome> {
        let mut outcomes = Vec::new();

        for post in feed_items {
            if !is_eligible(post, self.clock.now_unix(), self.window_minutes) {
                debug!(
                    "Skipping post {} by {}: outside reply window",
                    post.id, post.author_display_name
                );
                continue;
            }

            let outcome = self.reply_to(post).await;
            if outcome.is_success() {
                info!("Replied to {}'s post ({})", post.author_display_name, post.id);
            } else {
                warn!("Failed to reply to post {}: {}", post.id, outcome.detail);
            }
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn reply_to(&self, post: &Post) -> ReplyOutcome {
        let comment = match self.generator.generate(&post.text).await {
            GenerationResult::Success { comment, .. } => comment,
            GenerationResult::Error { error } => {
                return ReplyOutcome::failure(&post.id, format!("generation failed: {}", error));
            }
        };

        info!(
            "Replying to {}'s post: {} -> {}",
            post.author_display_name, post.text, comment
        );

        match self.replies.post_reply(&post.id, &comment).await {
            Ok(ReplyStatus::Success) => ReplyOutcome::success(&post.id, comment),
            Ok(ReplyStatus::Failure) => {
                ReplyOutcome::failure(&post.id, "reply rejected by platform")
            }
            Err(e) => {
                e.log_error();
                ReplyOutcome::failure(&post.id, format!("reply failed: {}", e))
            }
        }
    }
}
