//! Agent backed by an external program
//!
//! The prompt is written to the program's stdin and its stdout is the reply.
//! The call blocks, so it always runs through `spawn_blocking`.
//!
//! The blocking thread cannot observe a mission being dropped or a branch
//! timing out, so the program gets its own wall-clock limit: once it passes,
//! the child is killed and the thread returns. That limit is the longest a
//! command can outlive its mission.

use super::{AgentError, BlockingAgent};
use sdk::types::AgentOutput;
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Wall-clock limit when none is configured
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct CommandAgent {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    name: String,
}

impl CommandAgent {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let program = program.into();
        Self {
            name: format!("command:{}", program),
            program,
            args,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wait for `child` until the deadline, killing it once the deadline passes
    fn wait(&self, child: &mut Child) -> Result<std::process::ExitStatus, AgentError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if Instant::now() >= deadline => {
                    warn!(
                        "Killing {} after {}s without a reply",
                        self.program,
                        self.timeout.as_secs()
                    );
                    if let Err(e) = child.kill() {
                        warn!("Failed to kill {}: {}", self.program, e);
                    }
                    let _ = child.wait();
                    return Err(AgentError::Failed(format!(
                        "{} timed out after {}s",
                        self.program,
                        self.timeout.as_secs()
                    )));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(AgentError::Failed(format!(
                        "Failed to wait for {}: {}",
                        self.program, e
                    )))
                }
            }
        }
    }
}

/// Drain a pipe on its own thread so a full pipe never stalls the child
fn drain(pipe: Option<impl Read + Send + 'static>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

impl BlockingAgent for CommandAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_blocking(&self, prompt: &str) -> Result<AgentOutput, AgentError> {
        debug!("Running agent command: {} {:?}", self.program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AgentError::Failed(format!("Failed to start {}: {}", self.program, e)))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        // A program may exit without reading its input; the exit status decides
        let writer = child.stdin.take().map(|mut stdin| {
            let prompt = prompt.to_string();
            thread::spawn(move || match stdin.write_all(prompt.as_bytes()) {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            })
        });

        let status = self.wait(&mut child)?;

        if let Some(Ok(Err(e))) = writer.map(JoinHandle::join) {
            return Err(AgentError::Failed(format!("Failed to write prompt: {}", e)));
        }
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(AgentError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        String::from_utf8(stdout)
            .map(AgentOutput::Text)
            .map_err(|e| {
                AgentError::OutputFormat(format!("{} wrote non UTF-8 output: {}", self.program, e))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_prompt_round_trips_through_cat() {
        let agent = CommandAgent::new("cat", Vec::new());
        let output = agent.run_blocking("{\"itinerary\": []}").unwrap();
        assert_eq!(output, AgentOutput::Text("{\"itinerary\": []}".into()));
    }

    #[cfg(unix)]
    #[test]
    fn test_large_prompt_does_not_deadlock() {
        // Larger than any pipe buffer in both directions
        let prompt = "x".repeat(4 * 1024 * 1024);
        let agent = CommandAgent::new("cat", Vec::new()).with_timeout(Duration::from_secs(30));
        let output = agent.run_blocking(&prompt).unwrap();
        assert_eq!(output, AgentOutput::Text(prompt));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_an_error() {
        let agent = CommandAgent::new("false", Vec::new());
        let err = agent.run_blocking("go").unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[cfg(unix)]
    #[test]
    fn test_slow_program_is_killed() {
        let agent = CommandAgent::new("sleep", vec!["30".to_string()])
            .with_timeout(Duration::from_millis(200));

        let start = Instant::now();
        let err = agent.run_blocking("go").unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(err.to_string().contains("timed out"), "{}", err);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_output_is_an_output_format_error() {
        let agent = CommandAgent::new("sh", vec!["-c".to_string(), "printf '\\377'".to_string()]);
        let err = agent.run_blocking("go").unwrap_err();
        assert!(matches!(err, AgentError::OutputFormat(_)));
        assert!(err.to_string().starts_with("Output parsing error: "));
    }

    #[test]
    fn test_missing_program() {
        let agent = CommandAgent::new("waypoint-no-such-program", Vec::new());
        let err = agent.run_blocking("go").unwrap_err();
        assert!(err.to_string().contains("Failed to start"));
    }
}
