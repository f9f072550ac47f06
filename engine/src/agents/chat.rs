//! Chat agent backed by an LLM provider

use super::{AgentError, AgentRole, InvokeAgent, InvokeReply};
use crate::llm::{LLMProvider, Message};
use async_trait::async_trait;
use std::sync::Arc;

/// Sends the role's system prompt plus the mission prompt to a provider
pub struct ChatAgent {
    role: AgentRole,
    name: String,
    provider: Arc<dyn LLMProvider>,
}

impl ChatAgent {
    pub fn new(role: AgentRole, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            name: format!("{}:{}", role, provider.name()),
            role,
            provider,
        }
    }
}

#[async_trait]
impl InvokeAgent for ChatAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, prompt: &str) -> Result<InvokeReply, AgentError> {
        let messages = [
            Message::system(self.role.system_prompt()),
            Message::user(prompt),
        ];
        let answer = self.provider.generate(&messages).await?;
        Ok(InvokeReply::Message(answer))
    }
}
