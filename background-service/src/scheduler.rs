use crate::clock::Sleeper;
use crate::dispatcher::ReplyDispatcher;
use crate::poller::FeedPoller;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use takotako_core::{CoreError, ErrorReporter, ReplyOutcome};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Polling,
    Sleeping,
}

/// What one Polling pass did.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub cycle: u64,
    /// False when the feed answered with a non-success status or the pass
    /// faulted before dispatch.
    pub feed_fetched: bool,
    pub outcomes: Vec<ReplyOutcome>,
    pub fault: Option<String>,
}

impl CycleReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Poll → dispatch → sleep, forever, one pass at a time.
pub struct Orchestrator {
    poller: FeedPoller,
    dispatcher: ReplyDispatcher,
    sleeper: Arc<dyn Sleeper>,
    interval: Duration,
    state: OrchestratorState,
    cycles: u64,
    reporter: ErrorReporter,
}

impl Orchestrator {
    pub fn new(
        poller: FeedPoller,
        dispatcher: ReplyDispatcher,
        sleeper: Arc<dyn Sleeper>,
        interval: Duration,
    ) -> Self {
        Self {
            poller,
            dispatcher,
            sleeper,
            interval,
            state: OrchestratorState::Polling,
            cycles: 0,
            reporter: ErrorReporter::new(),
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs until the process is killed.
    pub async fn run(&mut self) {
        info!(
            "Starting auto-reply loop, checking feed every {:?}",
            self.interval
        );
        loop {
            self.run_cycle().await;
            self.sleep().await;
        }
    }

    /// Runs `count` full Polling → Sleeping rounds.
    pub async fn run_cycles(&mut self, count: usize) -> Vec<CycleReport> {
        let mut reports = Vec::with_capacity(count);
        for _ in 0..count {
            reports.push(self.run_cycle().await);
            self.sleep().await;
        }
        reports
    }

    /// One Polling pass inside the fault boundary. Always ends in `Sleeping`.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.state = OrchestratorState::Polling;
        self.cycles += 1;
        let cycle = self.cycles;
        info!("Checking feed (cycle {})", cycle);

        let report = match AssertUnwindSafe(self.pass(cycle)).catch_unwind().await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                self.reporter.report_error(&e);
                CycleReport {
                    cycle,
                    fault: Some(e.to_string()),
                    ..Default::default()
                }
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Error in auto reply process: {}", message);
                CycleReport {
                    cycle,
                    fault: Some(message),
                    ..Default::default()
                }
            }
        };

        if report.feed_fetched {
            info!(
                "Cycle {} done: {} replied, {} failed",
                cycle,
                report.succeeded(),
                report.failed()
            );
        }
        self.state = OrchestratorState::Sleeping;
        report
    }

    async fn pass(&self, cycle: u64) -> Result<CycleReport, CoreError> {
        let Some(items) = self.poller.poll().await? else {
            return Ok(CycleReport {
                cycle,
                ..Default::default()
            });
        };

        let outcomes = self.dispatcher.dispatch(&items).await;
        Ok(CycleReport {
            cycle,
            feed_fetched: true,
            outcomes,
            fault: None,
        })
    }

    async fn sleep(&mut self) {
        self.state = OrchestratorState::Sleeping;
        self.sleeper.sleep(self.interval).await;
        self.state = OrchestratorState::Polling;
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "pass panicked".to_string()
    }
}
