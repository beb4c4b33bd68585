pub mod comment;
pub mod openai;

use async_trait::async_trait;
use takotako_core::{CoreError, SamplingParams};

pub use comment::{parse_generation, CommentGenerator, ParseError, ParsedGeneration};
pub use openai::OpenAiProvider;

/// A text-generation backend: one system prompt, one user prompt, raw text out.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, CoreError>;
}
