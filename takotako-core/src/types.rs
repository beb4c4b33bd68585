use serde::{Deserialize, Serialize};
use std::fmt;

/// A cast fetched from the followed-accounts feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_display_name: String,
    pub text: String,
    pub created_at: i64,
}

/// Output of one comment-generation call.
///
/// Callers branch on [`GenerationResult::is_error`] only; the cause of a
/// failure is carried as a message, never as a typed error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Success { reasoning: String, comment: String },
    Error { error: String },
}

impl GenerationResult {
    pub fn success(reasoning: impl Into<String>, comment: impl Into<String>) -> Self {
        Self::Success {
            reasoning: reasoning.into(),
            comment: comment.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { error } => Some(error),
            Self::Success { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Failure,
}

impl fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyStatus::Success => write!(f, "success"),
            ReplyStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Result of handling one eligible post. Only ever logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyOutcome {
    pub post_id: String,
    pub status: ReplyStatus,
    pub detail: String,
}

impl ReplyOutcome {
    pub fn success(post_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            status: ReplyStatus::Success,
            detail: detail.into(),
        }
    }

    pub fn failure(post_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            status: ReplyStatus::Failure,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReplyStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Success,
    /// Anything other than `success`, with the raw payload kept for logging.
    Failure { payload: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResult {
    pub status: FeedStatus,
    pub items: Vec<Post>,
}

impl FeedResult {
    pub fn success(items: Vec<Post>) -> Self {
        Self {
            status: FeedStatus::Success,
            items,
        }
    }

    pub fn failure(payload: impl Into<String>) -> Self {
        Self {
            status: FeedStatus::Failure {
                payload: payload.into(),
            },
            items: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FeedStatus::Success
    }
}

/// Sampling parameters passed to the text-generation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_p: 0.95,
            presence_penalty: 0.3,
            frequency_penalty: 0.3,
            max_tokens: 1000,
        }
    }
}
