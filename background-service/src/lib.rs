pub mod clock;
pub mod dispatcher;
pub mod eligibility;
pub mod poller;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, Sleeper, SystemClock, TokioSleeper};
pub use dispatcher::ReplyDispatcher;
pub use eligibility::{is_eligible, DEFAULT_WINDOW_MINUTES};
pub use poller::FeedPoller;
pub use scheduler::{CycleReport, Orchestrator, OrchestratorState};

use llm_interface::{CommentGenerator, LlmProvider, OpenAiProvider};
use std::sync::Arc;
use tako_client::TakoClient;
use takotako_core::{BotConfig, CoreError, LlmConfig, TakoConfig};
use tracing::info;

/// Production wiring of the auto-reply loop.
pub struct BackgroundService {
    orchestrator: Orchestrator,
}

impl BackgroundService {
    pub fn new(tako: TakoConfig, llm: LlmConfig, bot: BotConfig) -> Result<Self, CoreError> {
        let client = Arc::new(TakoClient::new(tako)?);
        let provider = Arc::new(OpenAiProvider::new(&llm)?);
        info!("Using {} model {}", provider.name(), provider.model());

        let generator = CommentGenerator::new(provider).with_sampling(llm.sampling);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let dispatcher =
            ReplyDispatcher::new(generator, client.clone(), clock, bot.reply_window_minutes);

        let orchestrator = Orchestrator::new(
            FeedPoller::new(client),
            dispatcher,
            Arc::new(TokioSleeper),
            bot.polling_interval,
        );

        Ok(Self { orchestrator })
    }

    pub async fn start(mut self) {
        info!("Starting auto-reply bot with smart comments...");
        self.orchestrator.run().await;
    }
}
