//! Agent invocation
//!
//! An agent is anything that turns a prompt into output. Three calling
//! conventions are supported, each behind its own trait:
//!
//! - [`CompletionAgent`]: async, returns output directly
//! - [`InvokeAgent`]: async, may wrap the reply in a message envelope
//! - [`BlockingAgent`]: synchronous, run on the blocking thread pool
//!
//! The convention is resolved once, when the [`AgentHandle`] is built. From
//! then on [`invoke`] is the single entry point, and it never fails: errors
//! and panics become `ExecutionError` results, successful output goes through
//! the normalizer.

pub mod chat;
pub mod command;
pub mod fixture;

pub use chat::ChatAgent;
pub use command::CommandAgent;
pub use fixture::FixtureAgent;

use crate::config::{AgentConfig, LLMConfig};
use crate::llm::ollama::OllamaProvider;
use crate::llm::openai::OpenAICompatProvider;
use crate::llm::{FinalAnswer, LLMError};
use crate::normalizer;
use async_trait::async_trait;
use futures::FutureExt;
use sdk::types::{AgentOutput, AgentResult};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Errors raised by an agent call
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Output parsing error: {0}")]
    OutputFormat(String),

    #[error("{0}")]
    Provider(#[from] LLMError),

    #[error("Unsupported agent type: {0}")]
    Unsupported(String),

    #[error("Agent execution error: {0}")]
    Failed(String),
}

/// Reply of an [`InvokeAgent`]
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeReply {
    /// Chat-style envelope; its content is the output
    Message(FinalAnswer),

    /// Output returned as is
    Output(AgentOutput),
}

#[async_trait]
pub trait CompletionAgent: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, prompt: &str) -> Result<AgentOutput, AgentError>;
}

#[async_trait]
pub trait InvokeAgent: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(&self, prompt: &str) -> Result<InvokeReply, AgentError>;
}

/// Agent whose call blocks the current thread
pub trait BlockingAgent: Send + Sync {
    fn name(&self) -> &str;

    fn run_blocking(&self, prompt: &str) -> Result<AgentOutput, AgentError>;
}

/// Role an agent plays in a mission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    Planner,
    Researcher,
    Execution,
}

impl AgentRole {
    /// System prompt given to chat back-ends
    pub fn system_prompt(&self) -> &'static str {
        match self {
            AgentRole::Planner => {
                "You are a travel planner. Break the user's goal into a destination, \
                 a duration and concrete steps. Return only valid JSON."
            }
            AgentRole::Researcher => {
                "You are a travel researcher. Provide practical insights about the \
                 destination and cite sources. Return only valid JSON."
            }
            AgentRole::Execution => {
                "You are an execution planner. Generate a realistic day-by-day \
                 itinerary for the plan. Return only valid JSON."
            }
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRole::Planner => write!(f, "planner"),
            AgentRole::Researcher => write!(f, "researcher"),
            AgentRole::Execution => write!(f, "execution"),
        }
    }
}

/// An agent with its calling convention resolved
#[derive(Clone)]
pub enum AgentHandle {
    Completion(Arc<dyn CompletionAgent>),
    Invoke(Arc<dyn InvokeAgent>),
    Blocking(Arc<dyn BlockingAgent>),

    /// No convention matched; invoking yields an execution error
    Unsupported(String),
}

impl AgentHandle {
    pub fn completion(agent: impl CompletionAgent + 'static) -> Self {
        Self::Completion(Arc::new(agent))
    }

    pub fn invoke(agent: impl InvokeAgent + 'static) -> Self {
        Self::Invoke(Arc::new(agent))
    }

    pub fn blocking(agent: impl BlockingAgent + 'static) -> Self {
        Self::Blocking(Arc::new(agent))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Completion(agent) => agent.name(),
            Self::Invoke(agent) => agent.name(),
            Self::Blocking(agent) => agent.name(),
            Self::Unsupported(kind) => kind,
        }
    }

    /// Build the agent configured for `role`
    ///
    /// Unknown providers, and `file`/`command` agents missing their target,
    /// resolve to `Unsupported`.
    pub fn from_config(role: AgentRole, agent: &AgentConfig, llm: &LLMConfig) -> Self {
        match agent.provider.as_str() {
            "ollama" => {
                let model = agent.model.as_deref().unwrap_or(&llm.ollama.model);
                let provider = OllamaProvider::new(llm.ollama.base_url.clone(), model)
                    .with_temperature(llm.temperature);
                Self::invoke(ChatAgent::new(role, Arc::new(provider)))
            }
            "openai" => {
                let mut provider = OpenAICompatProvider::from_env(llm.openai.clone())
                    .with_temperature(llm.temperature);
                if let Some(model) = &agent.model {
                    provider = provider.with_model(model.clone());
                }
                Self::invoke(ChatAgent::new(role, Arc::new(provider)))
            }
            "file" => match &agent.path {
                Some(path) => Self::completion(FixtureAgent::new(path.clone())),
                None => {
                    warn!("{} agent uses provider 'file' without a path", role);
                    Self::Unsupported("file (no path configured)".to_string())
                }
            },
            "command" => match &agent.command {
                Some(program) => {
                    let mut command = CommandAgent::new(program.clone(), agent.args.clone());
                    if let Some(secs) = agent.timeout_secs {
                        command = command.with_timeout(Duration::from_secs(secs));
                    }
                    Self::blocking(command)
                }
                None => {
                    warn!("{} agent uses provider 'command' without a command", role);
                    Self::Unsupported("command (no command configured)".to_string())
                }
            },
            other => {
                warn!("Unsupported agent provider '{}' for {}", other, role);
                Self::Unsupported(other.to_string())
            }
        }
    }
}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Completion(_) => "Completion",
            Self::Invoke(_) => "Invoke",
            Self::Blocking(_) => "Blocking",
            Self::Unsupported(_) => "Unsupported",
        };
        f.debug_tuple(kind).field(&self.name()).finish()
    }
}

/// Run `agent` on `prompt` and normalize what it returns.
///
/// Never fails and never panics: every error, including a panic inside the
/// agent, becomes `AgentResult::ExecutionError`.
pub async fn invoke(agent: &AgentHandle, prompt: &str) -> AgentResult {
    let start = std::time::Instant::now();
    let outcome = AssertUnwindSafe(call(agent, prompt)).catch_unwind().await;

    let result = match outcome {
        Ok(Ok(output)) => normalizer::normalize(output),
        Ok(Err(e)) => {
            warn!("Agent '{}' failed: {}", agent.name(), e);
            AgentResult::execution_error(e.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!("Agent '{}' panicked: {}", agent.name(), message);
            AgentResult::execution_error(format!("Agent execution error: {}", message))
        }
    };

    debug!(
        "Agent '{}' finished in {}ms",
        agent.name(),
        start.elapsed().as_millis()
    );
    result
}

async fn call(agent: &AgentHandle, prompt: &str) -> Result<AgentOutput, AgentError> {
    match agent {
        AgentHandle::Completion(agent) => agent.run(prompt).await,
        AgentHandle::Invoke(agent) => match agent.invoke(prompt).await? {
            InvokeReply::Message(answer) => Ok(AgentOutput::Text(answer.content)),
            InvokeReply::Output(output) => Ok(output),
        },
        AgentHandle::Blocking(agent) => {
            let agent = Arc::clone(agent);
            let prompt = prompt.to_string();
            tokio::task::spawn_blocking(move || agent.run_blocking(&prompt))
                .await
                .map_err(|e| match e.try_into_panic() {
                    Ok(panic) => AgentError::Failed(panic_message(panic.as_ref())),
                    Err(e) => AgentError::Failed(e.to_string()),
                })?
        }
        AgentHandle::Unsupported(kind) => Err(AgentError::Unsupported(kind.clone())),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "agent panicked".to_string()
    }
}
