mod chat;
mod cli;

use anyhow::Context;
use background_service::BackgroundService;
use clap::Parser;
use cli::{Cli, Commands};
use comment_api::AppState;
use llm_interface::{CommentGenerator, OpenAiProvider};
use std::sync::Arc;
use takotako_core::{load_dotenv, BotConfig, LlmConfig, ServerConfig, TakoConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "takotako=info,background_service=info,comment_api=info,llm_interface=info,tako_client=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    load_dotenv().context("failed to load .env")?;

    match cli.command() {
        Commands::Bot => run_bot().await,
        Commands::Serve { bind } => run_server(bind).await,
        Commands::Chat => run_chat().await,
    }
}

fn comment_generator() -> anyhow::Result<CommentGenerator> {
    let llm = LlmConfig::from_env().context("LLM configuration")?;
    let sampling = llm.sampling.clone();
    let provider = OpenAiProvider::new(&llm)?;
    tracing::info!("Using model {}", provider.model());
    Ok(CommentGenerator::new(Arc::new(provider)).with_sampling(sampling))
}

async fn run_bot() -> anyhow::Result<()> {
    let tako = TakoConfig::from_env().context("Tako configuration")?;
    let llm = LlmConfig::from_env().context("LLM configuration")?;
    let bot = BotConfig::from_env().context("bot configuration")?;

    BackgroundService::new(tako, llm, bot)?.start().await;
    Ok(())
}

async fn run_server(bind: Option<String>) -> anyhow::Result<()> {
    let mut config = ServerConfig::from_env();
    if let Some(bind) = bind {
        config.bind_addr = bind;
    }

    let state = AppState::new(comment_generator()?);
    comment_api::serve(&config, state).await?;
    Ok(())
}

async fn run_chat() -> anyhow::Result<()> {
    let generator = comment_generator()?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    chat::run(&generator, &mut stdin.lock(), &mut stdout.lock()).await?;
    Ok(())
}
