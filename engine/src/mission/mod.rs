//! Mission orchestration
//!
//! A mission turns a goal into a stream of labeled results:
//!
//! 1. the planner produces a plan, always yielded first as `plan`
//! 2. if the plan is usable, research, budget and execution run concurrently
//! 3. their results are yielded in completion order, one event per branch
//!
//! The stream is lazy: nothing happens until it is polled. Dropping it aborts
//! any branch still running. A rejected plan ends the stream after one event.

mod branches;
pub mod prompts;

use crate::agents::{self, AgentHandle, AgentRole};
use crate::budget::BudgetCalculator;
use crate::config::Config;
use crate::notes::{InMemoryNotes, NoteStore};
use crate::pricing::{converter_from_config, CurrencyConverter, PriceTable, PricingSource};
use futures::stream::{self, BoxStream, StreamExt};
use sdk::errors::EngineError;
use sdk::types::{AgentResult, BranchLabel, MissionEvent, Plan};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Finite, single-pass stream of mission events
pub type MissionStream = BoxStream<'static, MissionEvent>;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// The agent for each role
#[derive(Debug, Clone)]
pub struct MissionAgents {
    pub planner: AgentHandle,
    pub researcher: AgentHandle,
    pub execution: AgentHandle,
}

impl MissionAgents {
    pub fn from_config(config: &Config) -> Self {
        Self {
            planner: AgentHandle::from_config(
                AgentRole::Planner,
                &config.agents.planner,
                &config.llm,
            ),
            researcher: AgentHandle::from_config(
                AgentRole::Researcher,
                &config.agents.researcher,
                &config.llm,
            ),
            execution: AgentHandle::from_config(
                AgentRole::Execution,
                &config.agents.execution,
                &config.llm,
            ),
        }
    }
}

/// Runs missions against a fixed set of collaborators
#[derive(Clone)]
pub struct MissionOrchestrator {
    agents: MissionAgents,
    pricing: Arc<dyn PricingSource>,
    converter: Arc<dyn CurrencyConverter>,
    notes: Arc<dyn NoteStore>,
    calculator: BudgetCalculator,
    branch_timeout: Duration,
    plan_timeout: Duration,
}

enum Phase {
    Idle {
        ctx: Arc<MissionOrchestrator>,
        goal: String,
    },
    Streaming {
        id: Uuid,
        branches: JoinSet<MissionEvent>,
    },
    Done,
}

impl MissionOrchestrator {
    pub fn new(
        agents: MissionAgents,
        pricing: Arc<dyn PricingSource>,
        converter: Arc<dyn CurrencyConverter>,
        notes: Arc<dyn NoteStore>,
    ) -> Self {
        let calculator = BudgetCalculator::new(vec![
            pricing.name().to_string(),
            converter.name().to_string(),
        ]);
        Self {
            agents,
            pricing,
            converter,
            notes,
            calculator,
            branch_timeout: DEFAULT_TIMEOUT,
            plan_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Orchestrator wired from configuration, with a fresh in-memory note store
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            MissionAgents::from_config(config),
            Arc::new(PriceTable::from_config(&config.pricing)),
            converter_from_config(&config.pricing),
            Arc::new(InMemoryNotes::new()),
        )
        .with_branch_timeout(Duration::from_secs(config.mission.branch_timeout_secs))
        .with_plan_timeout(Duration::from_secs(config.mission.plan_timeout_secs))
    }

    pub fn with_branch_timeout(mut self, timeout: Duration) -> Self {
        self.branch_timeout = timeout;
        self
    }

    pub fn with_plan_timeout(mut self, timeout: Duration) -> Self {
        self.plan_timeout = timeout;
        self
    }

    pub fn notes(&self) -> Arc<dyn NoteStore> {
        Arc::clone(&self.notes)
    }

    /// Start a mission for `goal`
    pub fn run(&self, goal: impl Into<String>) -> MissionStream {
        let start = Phase::Idle {
            ctx: Arc::new(self.clone()),
            goal: goal.into(),
        };

        stream::unfold(start, |phase| async move {
            match phase {
                Phase::Idle { ctx, goal } => Some(plan(ctx, goal).await),
                Phase::Streaming { id, mut branches } => match branches.join_next().await {
                    Some(joined) => {
                        Some((branch_event(joined), Phase::Streaming { id, branches }))
                    }
                    None => {
                        info!(mission = %id, "Mission complete");
                        None
                    }
                },
                Phase::Done => None,
            }
        })
        .boxed()
    }
}

/// Planning step: record the goal, ask the planner, fan out if the plan holds
async fn plan(ctx: Arc<MissionOrchestrator>, goal: String) -> (MissionEvent, Phase) {
    let id = Uuid::new_v4();
    info!(mission = %id, "Starting mission for goal: {}", goal);

    if let Err(e) = ctx.notes.add(&goal).await {
        warn!("Failed to record goal: {}", e);
    }

    let prompt = prompts::plan(&goal);
    let result = match tokio::time::timeout(
        ctx.plan_timeout,
        agents::invoke(&ctx.agents.planner, &prompt),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => timed_out(BranchLabel::Plan, ctx.plan_timeout),
    };

    let next = match Plan::from_result(&result) {
        Ok(plan) => {
            debug!(mission = %id, "Plan accepted: destination={}", plan.destination);
            Phase::Streaming {
                id,
                branches: fan_out(id, ctx, goal, Arc::new(plan)),
            }
        }
        Err(e) => {
            error!(mission = %id, "Planning failed: {}", e);
            Phase::Done
        }
    };

    (MissionEvent::new(BranchLabel::Plan, result), next)
}

fn fan_out(
    id: Uuid,
    ctx: Arc<MissionOrchestrator>,
    goal: String,
    plan: Arc<Plan>,
) -> JoinSet<MissionEvent> {
    let limit = ctx.branch_timeout;
    let mut set = JoinSet::new();

    spawn_branch(
        &mut set,
        id,
        BranchLabel::Research,
        limit,
        branches::research(Arc::clone(&ctx), Arc::clone(&plan)),
    );
    spawn_branch(
        &mut set,
        id,
        BranchLabel::Budget,
        limit,
        branches::budget(Arc::clone(&ctx), Arc::clone(&plan), goal),
    );
    spawn_branch(
        &mut set,
        id,
        BranchLabel::Execution,
        limit,
        branches::execution(ctx, plan),
    );

    set
}

fn spawn_branch<F>(
    set: &mut JoinSet<MissionEvent>,
    id: Uuid,
    label: BranchLabel,
    limit: Duration,
    work: F,
) where
    F: Future<Output = AgentResult> + Send + 'static,
{
    let span = info_span!("branch", mission = %id, branch = %label);
    let task = async move {
        let start = Instant::now();
        let result = match tokio::time::timeout(limit, work).await {
            Ok(result) => result,
            Err(_) => timed_out(label, limit),
        };
        debug!("{} branch finished in {}ms", label, start.elapsed().as_millis());
        MissionEvent::new(label, result)
    };
    set.spawn(task.instrument(span));
}

fn timed_out(label: BranchLabel, limit: Duration) -> AgentResult {
    let err = EngineError::BranchTimeout {
        branch: label.to_string(),
        secs: limit.as_secs(),
    };
    warn!("{}", err);
    AgentResult::execution_error(err.to_string())
}

/// A branch task that died outside its agent call is reported as `error`
fn branch_event(joined: Result<MissionEvent, JoinError>) -> MissionEvent {
    match joined {
        Ok(event) => event,
        Err(e) => {
            warn!("Branch task failed: {}", e);
            MissionEvent::new(
                BranchLabel::Error,
                AgentResult::execution_error(format!("Branch task failed: {}", e)),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentError, CompletionAgent};
    use crate::pricing::FixedRates;
    use async_trait::async_trait;
    use sdk::types::AgentOutput;

    struct Reply(&'static str);

    #[async_trait]
    impl CompletionAgent for Reply {
        fn name(&self) -> &str {
            "reply"
        }

        async fn run(&self, _prompt: &str) -> Result<AgentOutput, AgentError> {
            Ok(AgentOutput::Text(self.0.to_string()))
        }
    }

    fn orchestrator(planner: &'static str) -> MissionOrchestrator {
        let agents = MissionAgents {
            planner: AgentHandle::completion(Reply(planner)),
            researcher: AgentHandle::completion(Reply(r#"{"insights": [], "sources": []}"#)),
            execution: AgentHandle::completion(Reply(r#"{"itinerary": []}"#)),
        };
        MissionOrchestrator::new(
            agents,
            Arc::new(PriceTable::new(Some(100.0), Some(50.0), 15.0, 10.0)),
            Arc::new(FixedRates::default()),
            Arc::new(InMemoryNotes::new()),
        )
    }

    #[tokio::test]
    async fn test_stream_is_lazy() {
        let orchestrator =
            orchestrator(r#"{"destination": "Seoul", "duration": "2 days", "steps": []}"#);
        let stream = orchestrator.run("Trip to Seoul");
        assert!(orchestrator.notes().entries().await.is_empty());

        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 4);
        assert_eq!(orchestrator.notes().entries().await, vec!["Trip to Seoul"]);
    }

    #[tokio::test]
    async fn test_plan_error_key_stops_mission() {
        let orchestrator = orchestrator(r#"{"error": "quota exceeded"}"#);
        let events: Vec<_> = orchestrator.run("Trip to Seoul").collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].label, BranchLabel::Plan);
    }

    #[test]
    fn test_timed_out_message() {
        let result = timed_out(BranchLabel::Research, Duration::from_secs(30));
        assert_eq!(
            result,
            AgentResult::execution_error("research branch timed out after 30s")
        );
    }

    #[test]
    fn test_from_config_sources() {
        let orchestrator = MissionOrchestrator::from_config(&Config::default());
        assert_eq!(
            orchestrator.calculator,
            BudgetCalculator::new(vec!["Price table".to_string(), "Fixed rates".to_string()])
        );
        assert_eq!(orchestrator.branch_timeout, Duration::from_secs(120));
    }
}
