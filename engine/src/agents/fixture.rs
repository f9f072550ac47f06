//! Agent that answers with the contents of a file
//!
//! Useful for offline runs and demos: every prompt gets the same canned reply.

use super::{AgentError, CompletionAgent};
use async_trait::async_trait;
use sdk::types::AgentOutput;
use std::path::PathBuf;

pub struct FixtureAgent {
    path: PathBuf,
    name: String,
}

impl FixtureAgent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("file:{}", path.display()),
            path,
        }
    }
}

#[async_trait]
impl CompletionAgent for FixtureAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _prompt: &str) -> Result<AgentOutput, AgentError> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AgentError::Failed(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        Ok(AgentOutput::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_fixture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"destination\": \"Seoul\"}}").unwrap();

        let agent = FixtureAgent::new(file.path());
        let output = agent.run("anything").await.unwrap();
        assert_eq!(output, AgentOutput::Text("{\"destination\": \"Seoul\"}".into()));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let agent = FixtureAgent::new("/nonexistent/waypoint/plan.json");
        let err = agent.run("anything").await.unwrap_err();
        assert!(err.to_string().starts_with("Agent execution error: Failed to read"));
    }
}
