//! Groq chat-completion client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use lantern_core::{
    ChatMessage, CompletionProvider, Error, GenerationConfig, GenerationResult, Result,
    RetryConfig,
};

use crate::config::GroqConfig;

/// Groq chat-completion client
pub struct GroqClient {
    config: GroqConfig,
    endpoint: Url,
    client: Client,
    retry: RetryConfig,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u32>,
}

impl GroqClient {
    /// Model constants
    pub const LLAMA3_8B_8192: &'static str = "llama3-8b-8192";
    pub const LLAMA_3_1_8B_INSTANT: &'static str = "llama-3.1-8b-instant";

    /// Create a new Groq client from configuration
    pub fn new(config: GroqConfig) -> Result<Self> {
        let endpoint = config.completions_url()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            endpoint,
            client,
            retry: RetryConfig::default(),
        })
    }

    /// Create a new Groq client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = GroqConfig::from_env()?;
        Self::new(config)
    }

    /// Replace the transient-failure retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Perform one HTTP round trip
    async fn send_once(&self, request: &CompletionRequest<'_>) -> Result<GenerationResult> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.config.api_key)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let (text, tokens_used) = parse_completion(&body)?;
        Ok(GenerationResult {
            text,
            model_id: self.config.model.clone(),
            tokens_used,
        })
    }
}

/// Extract the first choice's message text and token usage from a response body
fn parse_completion(body: &str) -> Result<(String, Option<u32>)> {
    let response: CompletionResponse = serde_json::from_str(body)?;
    let tokens_used = response.usage.and_then(|u| u.total_tokens);

    let text = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Completion("response contained no choices".to_string()))?
        .message
        .content
        .unwrap_or_default();

    Ok((text, tokens_used))
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else {
        Error::Network(err.to_string())
    }
}

#[async_trait]
impl CompletionProvider for GroqClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        };

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.send_once(&request).await {
                Ok(result) => {
                    debug!(model = %result.model_id, attempt, "completion received");
                    return Ok(result);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!(attempt, error = %e, "transient completion failure, retrying");
                    tokio::time::sleep(self.retry.backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}
