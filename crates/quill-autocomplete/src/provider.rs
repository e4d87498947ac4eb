//! OpenAI-compatible chat completion fetcher
//!
//! Works against any server exposing `POST {base_url}/chat/completions` with
//! the OpenAI request/response shape (OpenAI itself, Ollama, LM Studio, vLLM).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::ProviderConfig;
use crate::error::FetchError;
use crate::fetcher::{SuggestionFetcher, SuggestionRequest};

const SYSTEM_PROMPT: &str = "You are an autocomplete engine inside a note-taking app. \
Continue the user's current paragraph with a short, natural continuation of a few words, \
at most one sentence. Reply with the continuation text only, without quotes or commentary. \
Start with a space if the continuation begins a new word.";

/// Fetches suggestions from a chat completion endpoint
pub struct ChatCompletionFetcher {
    client: Arc<Client>,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

impl ChatCompletionFetcher {
    /// Create a fetcher with default sampling settings
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, FetchError> {
        let defaults = ProviderConfig::default();
        Self::build(
            base_url.into(),
            model.into(),
            api_key,
            defaults.max_tokens,
            defaults.temperature,
            defaults.timeout(),
        )
    }

    /// Create a fetcher from configuration, reading the API key from the
    /// configured environment variable (a missing key is allowed for local
    /// servers)
    pub fn from_config(config: &ProviderConfig) -> Result<Self, FetchError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            debug!(env = %config.api_key_env, "No API key set, sending unauthenticated requests");
        }
        Self::build(
            config.base_url.clone(),
            config.model.clone(),
            api_key,
            config.max_tokens,
            config.temperature,
            config.timeout(),
        )
    }

    fn build(
        base_url: String,
        model: String,
        api_key: Option<String>,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        if model.trim().is_empty() {
            return Err(FetchError::ConfigError("Model is required".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::ConfigError(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            max_tokens,
            temperature,
        })
    }

    /// Override the token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Model name sent with requests
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Chat messages for a request: the system prompt plus the note context
    pub fn build_messages(request: &SuggestionRequest) -> Vec<ChatMessage> {
        let mut context = String::new();
        if !request.title.is_empty() {
            context.push_str(&format!("Note title: {}\n", request.title));
        }
        if let Some(previous) = &request.previous_paragraph {
            context.push_str(&format!("Previous paragraph: {}\n", previous));
        }
        if let Some(next) = &request.next_paragraph {
            context.push_str(&format!("Next paragraph: {}\n", next));
        }
        context.push_str(&format!(
            "Current paragraph (continue from its end): {}",
            request.current_paragraph_prefix.as_deref().unwrap_or_default()
        ));

        vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: context,
            },
        ]
    }

    fn extract_content(response: ChatCompletionResponse) -> Result<String, FetchError> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or(FetchError::EmptyResponse)
    }
}

#[async_trait]
impl SuggestionFetcher for ChatCompletionFetcher {
    async fn fetch(&self, request: SuggestionRequest) -> Result<String, FetchError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: Self::build_messages(&request),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        debug!(model = %self.model, "Sending completion request");

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            error!("Completion request failed: {}", e);
            FetchError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Completion API error ({}): {}", status, error_text);

            return match status.as_u16() {
                401 => Err(FetchError::AuthError),
                429 => Err(FetchError::RateLimited(60)),
                _ => Err(FetchError::ProviderError(format!(
                    "Completion API error: {}",
                    status
                ))),
            };
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        Self::extract_content(parsed)
    }

    fn name(&self) -> &str {
        "chat-completions"
    }
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`
    pub role: String,
    /// Message text
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
