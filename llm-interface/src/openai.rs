//! OpenAI chat-completions provider.

use crate::LlmProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use takotako_core::{CoreError, LlmConfig, LlmError, SamplingParams};
use tracing::{debug, error, warn};

const PROVIDER: &str = "openai";

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    /// No request timeout is set; a slow completion blocks the caller.
    pub fn new(config: &LlmConfig) -> Result<Self, CoreError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn provider_error(&self, status: u16, retry_after: Option<u64>, body: String) -> LlmError {
        match status {
            401 => LlmError::InvalidApiKey {
                provider: PROVIDER.to_string(),
            },
            404 => LlmError::ModelNotAvailable {
                model: self.model.clone(),
            },
            429 => LlmError::RateLimitExceeded {
                provider: PROVIDER.to_string(),
                retry_after: retry_after.unwrap_or(60),
            },
            400 if body.contains("content_policy") || body.contains("content_filter") => {
                LlmError::ContentFiltered { reason: body }
            }
            500..=599 => LlmError::ServiceUnavailable {
                provider: PROVIDER.to_string(),
            },
            _ => LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                status_code: status,
                body,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, CoreError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: params.temperature,
            top_p: params.top_p,
            presence_penalty: params.presence_penalty,
            frequency_penalty: params.frequency_penalty,
            max_tokens: params.max_tokens,
        };

        debug!("Requesting completion from {} ({})", PROVIDER, self.model);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            error!("Completion request failed with status {}: {}", status, body);
            return Err(self.provider_error(status.as_u16(), retry_after, body).into());
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse completion response: {}", e);
            LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
                details: e.to_string(),
            }
        })?;

        extract_content(chat)
    }
}

fn extract_content(chat: ChatResponse) -> Result<String, CoreError> {
    let choice = chat.choices.into_iter().next().ok_or_else(|| {
        LlmError::InvalidResponseFormat {
            provider: PROVIDER.to_string(),
            details: "No choices in completion response".to_string(),
        }
    })?;

    if choice.finish_reason.as_deref() == Some("content_filter") {
        warn!("Completion stopped by provider content filter");
        return Err(LlmError::ContentFiltered {
            reason: "finish_reason=content_filter".to_string(),
        }
        .into());
    }

    choice.message.content.ok_or_else(|| {
        LlmError::InvalidResponseFormat {
            provider: PROVIDER.to_string(),
            details: "Completion carried no message content".to_string(),
        }
        .into()
    })
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
