//! `POST /comment`: the synchronous entry point into comment generation.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use llm_interface::CommentGenerator;
use takotako_core::{CoreError, ServerConfig};

#[derive(Clone)]
pub struct AppState {
    pub generator: CommentGenerator,
}

impl AppState {
    pub fn new(generator: CommentGenerator) -> Self {
        Self { generator }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/comment", post(handlers::create_comment))
        .with_state(state)
}

pub async fn serve(config: &ServerConfig, state: AppState) -> Result<(), CoreError> {
    let app = create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
