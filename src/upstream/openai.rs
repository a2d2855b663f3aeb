//! OpenAI-compatible streaming upstream

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::{UpstreamByteStream, UpstreamProvider, classify_http_error};
use crate::config::{GenerationParams, HttpConfig, RelayConfig};
use crate::error::RelayError;
use crate::types::ConversationMessage;

/// Build the HTTP client used for upstream calls.
///
/// No total request timeout is set: it would cut long streams. Stream
/// lifetime is bounded by the relay's own limits instead.
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client, RelayError> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .user_agent(config.user_agent.as_str());

    if let Some(proxy_url) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| RelayError::ConfigurationError(format!("Invalid proxy URL: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| RelayError::ConfigurationError(format!("Failed to create HTTP client: {e}")))
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ConversationMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

/// Upstream speaking the OpenAI `/chat/completions` streaming protocol.
#[derive(Clone)]
pub struct OpenAiUpstream {
    api_key: SecretString,
    url: String,
    model: String,
    generation: GenerationParams,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiUpstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiUpstream")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("temperature", &self.generation.temperature)
            .field("max_tokens", &self.generation.max_tokens)
            .field("top_p", &self.generation.top_p)
            .finish()
    }
}

impl OpenAiUpstream {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let http_client = build_http_client(&config.http)?;
        Self::with_http_client(config, http_client)
    }

    pub fn with_http_client(
        config: &RelayConfig,
        http_client: reqwest::Client,
    ) -> Result<Self, RelayError> {
        config.validate()?;
        Ok(Self {
            api_key: config.api_key.clone(),
            url: config.chat_completions_url(),
            model: config.model.clone(),
            generation: config.generation,
            http_client,
        })
    }

    fn request_body<'a>(&'a self, messages: &'a [ConversationMessage]) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
            top_p: self.generation.top_p,
            stream: true,
        }
    }
}

#[async_trait]
impl UpstreamProvider for OpenAiUpstream {
    fn name(&self) -> &str {
        "openai"
    }

    async fn open_stream(
        &self,
        messages: &[ConversationMessage],
    ) -> Result<UpstreamByteStream, RelayError> {
        tracing::debug!(target: "chat_relay::upstream", url = %self.url, model = %self.model, messages = messages.len(), "sending request");

        let response = self
            .http_client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .header(ACCEPT, "text/event-stream")
            // Keep intermediaries from compressing the long-lived stream.
            .header(ACCEPT_ENCODING, "identity")
            .json(&self.request_body(messages))
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(target: "chat_relay::upstream", url = %self.url, status = status.as_u16(), "response received");

        if !status.is_success() {
            let body = read_error_body(response).await;
            return Err(classify_http_error(status.as_u16(), &body));
        }

        let byte_stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| RelayError::StreamError(e.to_string())));

        Ok(Box::pin(byte_stream))
    }
}

/// Body of a non-success response; empty when it cannot be read.
async fn read_error_body(response: reqwest::Response) -> String {
    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(target: "chat_relay::upstream", status, error = %e, "failed to read error body");
            String::new()
        }
    }
}
