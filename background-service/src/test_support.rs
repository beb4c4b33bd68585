//! In-memory collaborators for dispatcher and orchestrator tests.

use crate::clock::{Clock, Sleeper};
use async_trait::async_trait;
use llm_interface::LlmProvider;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tako_client::{FeedSource, ReplySink};
use takotako_core::{
    CoreError, FeedResult, LlmError, Post, ReplyStatus, SamplingParams, TakoApiError,
};

pub const NOW: i64 = 1_739_666_249;

pub fn post(id: &str, text: &str, created_at: i64) -> Post {
    Post {
        id: id.to_string(),
        author_display_name: format!("author of {id}"),
        text: text.to_string(),
        created_at,
    }
}

pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

/// A clock that only moves when [`ClockSleeper`] sleeps.
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn starting_at(now: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(now)))
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ClockSleeper {
    clock: Arc<ManualClock>,
    slept: Mutex<Vec<Duration>>,
}

impl ClockSleeper {
    pub fn new(clock: Arc<ManualClock>) -> Arc<Self> {
        Arc::new(Self {
            clock,
            slept: Mutex::new(Vec::new()),
        })
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for ClockSleeper {
    async fn sleep(&self, duration: Duration) {
        self.clock
            .0
            .fetch_add(duration.as_secs() as i64, Ordering::SeqCst);
        self.slept.lock().unwrap().push(duration);
    }
}

fn content_of(user_prompt: &str) -> &str {
    user_prompt
        .split("用户内容：")
        .nth(1)
        .and_then(|rest| rest.split('\n').next())
        .unwrap_or_default()
}

/// Answers `reasoning === comment on <content>` unless told to fail.
pub struct ScriptedProvider {
    fail_on: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail_on: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn fail_on(self: Arc<Self>, content: &str) -> Arc<Self> {
        self.fail_on.lock().unwrap().insert(content.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _params: &SamplingParams,
    ) -> Result<String, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = content_of(user_prompt);
        if self.fail_on.lock().unwrap().contains(content) {
            return Err(CoreError::Llm(LlmError::ServiceUnavailable {
                provider: "scripted".to_string(),
            }));
        }
        Ok(format!("reasoning about {content} === comment on {content}"))
    }
}

pub struct RecordingReplies {
    sent: Mutex<Vec<(String, String)>>,
    transport_fail: Mutex<HashSet<String>>,
    reject: Mutex<HashSet<String>>,
}

impl RecordingReplies {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            transport_fail: Mutex::new(HashSet::new()),
            reject: Mutex::new(HashSet::new()),
        })
    }

    pub fn fail_transport_for(self: Arc<Self>, post_id: &str) -> Arc<Self> {
        self.transport_fail
            .lock()
            .unwrap()
            .insert(post_id.to_string());
        self
    }

    pub fn reject_for(self: Arc<Self>, post_id: &str) -> Arc<Self> {
        self.reject.lock().unwrap().insert(post_id.to_string());
        self
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySink for RecordingReplies {
    async fn post_reply(&self, post_id: &str, text: &str) -> Result<ReplyStatus, CoreError> {
        if self.transport_fail.lock().unwrap().contains(post_id) {
            return Err(CoreError::TakoApi(TakoApiError::ServerError { status_code: 502 }));
        }
        if self.reject.lock().unwrap().contains(post_id) {
            return Ok(ReplyStatus::Failure);
        }
        self.sent
            .lock()
            .unwrap()
            .push((post_id.to_string(), text.to_string()));
        Ok(ReplyStatus::Success)
    }
}

/// Plays back queued feed responses, then keeps returning an empty feed.
pub struct ScriptedFeed {
    responses: Mutex<VecDeque<Result<FeedResult, CoreError>>>,
    fetches: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new(responses: Vec<Result<FeedResult, CoreError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch_following_feed(&self) -> Result<FeedResult, CoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(FeedResult::success(Vec::new())))
    }
}
