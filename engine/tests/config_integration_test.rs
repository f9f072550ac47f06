//! Integration tests for configuration management
//!
//! These tests verify that configuration files are loaded, validated and
//! processed, and that a loaded configuration wires a working mission.

use futures::StreamExt;
use sdk::types::BranchLabel;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use waypoint_engine::agents::{AgentHandle, AgentRole};
use waypoint_engine::config::Config;
use waypoint_engine::mission::MissionOrchestrator;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_config_toml_parsing() {
    let toml_content = r#"
[core]
log_level = "debug"
data_dir = "/var/lib/waypoint"

[llm]
temperature = 0.2

[llm.ollama]
base_url = "http://192.168.1.10:11434"
model = "llama3.1:70b"

[llm.openai]
model = "mixtral-8x7b-32768"
api_key_env = "MY_GROQ_KEY"

[agents.planner]
provider = "openai"

[agents.researcher]
provider = "ollama"
model = "qwen2.5:7b"

[agents.execution]
provider = "command"
command = "itinerary-bot"
args = ["--json"]

[mission]
branch_timeout_secs = 45

[pricing]
flight_usd = 850.0
hotel_per_night_usd = 120.0
exchange_rate_url = "https://api.frankfurter.app"

[pricing.rates]
EUR = 0.92
"#;

    let config = Config::from_toml_str(toml_content).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.core.data_dir, PathBuf::from("/var/lib/waypoint"));
    assert_eq!(config.llm.temperature, 0.2);
    assert_eq!(config.llm.ollama.model, "llama3.1:70b");
    assert_eq!(config.llm.openai.api_key_env, "MY_GROQ_KEY");
    assert_eq!(
        config.llm.openai.base_url,
        "https://api.groq.com/openai/v1"
    );

    assert_eq!(config.agents.planner.provider, "openai");
    assert_eq!(config.agents.researcher.model.as_deref(), Some("qwen2.5:7b"));
    assert_eq!(config.agents.execution.command.as_deref(), Some("itinerary-bot"));
    assert_eq!(config.agents.execution.args, vec!["--json"]);

    assert_eq!(config.mission.branch_timeout_secs, 45);
    assert_eq!(config.mission.plan_timeout_secs, 120);

    assert_eq!(config.pricing.flight_usd, Some(850.0));
    assert_eq!(config.pricing.meal_per_day_usd, 15.0);
    assert_eq!(config.pricing.rates["EUR"], 0.92);
}

#[test]
fn test_empty_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.core.log_level, "info");
    assert_eq!(config.agents.execution.provider, "ollama");
    assert_eq!(config.mission.plan_timeout_secs, 120);
    assert!(config.pricing.flight_usd.is_none());
    assert!(!config.core.data_dir.starts_with("~"));
}

#[test]
fn test_invalid_configs_rejected() {
    let dir = TempDir::new().unwrap();

    for contents in [
        "[core]\nlog_level = \"loud\"\n",
        "[llm]\ntemperature = 3.5\n",
        "[mission]\nbranch_timeout_secs = 0\n",
        "[agents.execution]\nprovider = \"command\"\ncommand = \"cat\"\ntimeout_secs = 0\n",
        "[pricing.rates]\nEUR = -1.0\n",
        "[core\nlog_level = ",
    ] {
        let path = write_config(&dir, contents);
        assert!(
            Config::load_from_path(&path).is_err(),
            "accepted invalid config: {}",
            contents
        );
    }
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_relative_fixture_paths_resolve_against_data_dir() {
    let dir = TempDir::new().unwrap();
    let contents = format!(
        "[core]\ndata_dir = {:?}\n\n[agents.planner]\nprovider = \"file\"\npath = \"replies/plan.json\"\n",
        dir.path().display().to_string()
    );
    let config = Config::from_toml_str(&contents).unwrap();

    assert_eq!(
        config.agents.planner.path,
        Some(dir.path().join("replies/plan.json"))
    );
}

#[test]
fn test_toml_round_trip() {
    let mut config = Config::default();
    config.pricing.flight_usd = Some(640.0);
    config.pricing.rates.insert("JPY".to_string(), 149.5);
    config.agents.execution.provider = "command".to_string();
    config.agents.execution.command = Some("cat".to_string());

    let text = config.to_toml().unwrap();
    let parsed = Config::from_toml_str(&text).unwrap();

    assert_eq!(parsed.pricing, config.pricing);
    assert_eq!(parsed.agents, config.agents);
    assert_eq!(parsed.llm, config.llm);
    assert_eq!(parsed.mission, config.mission);
}

#[test]
fn test_agents_resolved_from_config() {
    let config = Config::from_toml_str(
        "[agents.planner]\nprovider = \"file\"\npath = \"/tmp/plan.json\"\n\n[agents.execution]\nprovider = \"carrier-pigeon\"\n",
    )
    .unwrap();

    let planner = AgentHandle::from_config(AgentRole::Planner, &config.agents.planner, &config.llm);
    assert_eq!(planner.name(), "file:/tmp/plan.json");

    let execution =
        AgentHandle::from_config(AgentRole::Execution, &config.agents.execution, &config.llm);
    assert!(matches!(execution, AgentHandle::Unsupported(kind) if kind == "carrier-pigeon"));
}

#[tokio::test]
async fn test_mission_from_fixture_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("plan.json"),
        r#"{"destination": "Lisbon", "duration": "3 days", "steps": ["Tram 28"]}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("research.json"),
        r#"{"insights": ["Bring walking shoes"], "sources": []}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("execution.txt"),
        "Itinerary follows: {'itinerary': [{'day': 1, 'activities': ['Alfama']}]}",
    )
    .unwrap();

    let contents = format!(
        r#"
[core]
data_dir = {:?}

[agents.planner]
provider = "file"
path = "plan.json"

[agents.researcher]
provider = "file"
path = "research.json"

[agents.execution]
provider = "file"
path = "execution.txt"

[pricing]
flight_usd = 300.0
"#,
        dir.path().display().to_string()
    );
    let config = Config::from_toml_str(&contents).unwrap();

    let events: Vec<_> = MissionOrchestrator::from_config(&config)
        .run("Three days in Lisbon within $800")
        .collect()
        .await;

    assert_eq!(events.len(), 4);
    assert_eq!(events[0].label, BranchLabel::Plan);
    assert!(events.iter().all(|e| e.result.is_success()), "{:?}", events);

    let budget = events
        .iter()
        .find(|e| e.label == BranchLabel::Budget)
        .and_then(|e| e.result.as_map())
        .unwrap();
    // 300 flight + 3 nights * (15 meal + 10 transport); no hotel quote
    assert_eq!(budget["total_budget"], 375.0);
    assert_eq!(budget["remaining_balance"], 425.0);
}
