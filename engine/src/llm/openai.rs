//! OpenAI-compatible chat provider
//!
//! Talks to any `/chat/completions` endpoint (OpenAI, Groq, local gateways).
//! The API key is read from the environment variable named in the config.

use super::{FinalAnswer, LLMError, LLMProvider, Message};
use crate::config::OpenAIConfig;
use async_trait::async_trait;
use serde_json::json;

pub struct OpenAICompatProvider {
    config: OpenAIConfig,
    api_key: Option<String>,
    temperature: f64,
    client: reqwest::Client,
}

impl OpenAICompatProvider {
    pub fn new(config: OpenAIConfig, api_key: Option<String>) -> Self {
        Self {
            config,
            api_key,
            temperature: 0.0,
            client: reqwest::Client::new(),
        }
    }

    /// Build a provider whose key comes from `config.api_key_env`
    pub fn from_env(config: OpenAIConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.is_empty());
        Self::new(config, api_key)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, messages: &[Message]) -> super::Result<FinalAnswer> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            LLMError::AuthenticationFailed(format!("{} is not set", self.config.api_key_env))
        })?;

        let url = format!("{}/chat/completions", self.config.base_url);

        let api_messages: Vec<_> = messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.to_string(),
                    "content": msg.content
                })
            })
            .collect();

        let payload = json!({
            "model": self.config.model,
            "messages": api_messages,
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(LLMError::AuthenticationFailed(text));
            } else if status.as_u16() == 429 {
                return Err(LLMError::RateLimitExceeded);
            } else {
                return Err(LLMError::InvalidRequest(text));
            }
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        let message = choice
            .get("message")
            .ok_or_else(|| LLMError::ParseError("No message in choice".to_string()))?;

        message
            .get("content")
            .and_then(|c| c.as_str())
            .map(FinalAnswer::new)
            .ok_or_else(|| LLMError::ParseError("Empty content".to_string()))
    }
}
