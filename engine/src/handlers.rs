//! Command handlers for CLI operations
//!
//! - run: stream a mission's events as they complete
//! - config show: print the effective configuration
//! - config path: print where the configuration file lives

use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::json;
use std::path::Path;

use crate::config::Config;
use crate::mission::MissionOrchestrator;
use sdk::errors::EngineError;
use sdk::types::{AgentResult, BranchLabel, MissionEvent, Plan};

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// One JSON object per line, for machine consumption
    Json,
}

/// Run a mission and print each event as soon as its branch completes
///
/// Fails with [`EngineError::PlanInvalid`] when the planner did not produce a
/// usable plan.
pub async fn handle_run(goal: String, config: &Config, format: OutputFormat) -> Result<()> {
    let orchestrator = MissionOrchestrator::from_config(config);
    run_mission(&orchestrator, goal, format).await
}

/// Drive `orchestrator` to completion, printing as events arrive
pub async fn run_mission(
    orchestrator: &MissionOrchestrator,
    goal: String,
    format: OutputFormat,
) -> Result<()> {
    let start = std::time::Instant::now();
    let mut events = orchestrator.run(goal);
    let mut count = 0usize;
    let mut plan_error = None;

    while let Some(event) = events.next().await {
        count += 1;
        if event.label == BranchLabel::Plan {
            plan_error = Plan::from_result(&event.result).err();
        }
        println!("{}", render_event(&event, format)?);
    }

    if format == OutputFormat::Text {
        println!();
        if plan_error.is_some() {
            println!("✗ Mission stopped: no usable plan");
        } else {
            println!("✓ Mission finished");
            println!("  Events:   {}", count);
            println!("  Duration: {}ms", start.elapsed().as_millis());
        }
    }

    match plan_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Render one event in the requested format
pub fn render_event(event: &MissionEvent, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(event).context("Failed to serialize event"),
        OutputFormat::Text => {
            let marker = match &event.result {
                AgentResult::Success(_) => "✓",
                AgentResult::ParseFailure { .. } => "?",
                AgentResult::ExecutionError { .. } => "✗",
            };
            let body = match &event.result {
                AgentResult::ParseFailure { raw_text } => raw_text.clone(),
                AgentResult::ExecutionError { message } => message.clone(),
                AgentResult::Success(_) => serde_json::to_string_pretty(&event.result)
                    .context("Failed to serialize result")?,
            };
            Ok(format!("{} [{}]\n{}", marker, event.label, body))
        }
    }
}

/// Print the effective configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", config.to_toml()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}

/// Print the configuration file location
pub fn handle_config_path(custom: Option<&Path>, format: OutputFormat) -> Result<()> {
    let path = match custom {
        Some(path) => path.to_path_buf(),
        None => Config::default_config_path()?,
    };
    match format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => println!("{}", json!({ "path": path })),
    }
    Ok(())
}
