//! Configuration management
//!
//! This module handles loading, validation, and management of the Waypoint
//! configuration. Configuration is stored in TOML format at
//! ~/.waypoint/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **llm**: Chat provider endpoints and sampling temperature
//! - **agents**: Which back-end serves the planner, researcher and execution roles
//! - **mission**: Planner and branch timeouts
//! - **pricing**: Price table quotes and currency conversion
//!
//! # Path Expansion
//!
//! `~` is expanded to the user's home directory for the data directory and for
//! agent fixture paths. Relative fixture paths are resolved against the data
//! directory.
//!
//! # Examples
//!
//! ```no_run
//! use waypoint_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from default location
//! let config = Config::load_or_create()?;
//!
//! // Access configuration values
//! println!("Planner provider: {}", config.agents.planner.provider);
//! println!("Branch timeout: {}s", config.mission.branch_timeout_secs);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Every section has defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Agent roles
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Mission timing
    #[serde(default)]
    pub mission: MissionConfig,

    /// Pricing and currency
    #[serde(default)]
    pub pricing: PricingConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Sampling temperature shared by every chat agent
    #[serde(default)]
    pub temperature: f64,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// OpenAI-compatible provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            ollama: OllamaConfig::default(),
            openai: OpenAIConfig::default(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for the chat completions API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Back-ends for the three agent roles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AgentsConfig {
    #[serde(default)]
    pub planner: AgentConfig,

    #[serde(default)]
    pub researcher: AgentConfig,

    #[serde(default)]
    pub execution: AgentConfig,
}

/// One agent role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent kind: ollama, openai, file or command
    #[serde(default = "default_agent_provider")]
    pub provider: String,

    /// Model override for chat providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Response file for the `file` provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Program for the `command` provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Arguments passed to `command`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Wall-clock limit for `command`, after which the program is killed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: default_agent_provider(),
            model: None,
            path: None,
            command: None,
            args: Vec::new(),
            timeout_secs: None,
        }
    }
}

/// Mission timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionConfig {
    /// Upper bound for each research, budget and execution branch
    #[serde(default = "default_timeout_secs")]
    pub branch_timeout_secs: u64,

    /// Upper bound for the planner call
    #[serde(default = "default_timeout_secs")]
    pub plan_timeout_secs: u64,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            branch_timeout_secs: default_timeout_secs(),
            plan_timeout_secs: default_timeout_secs(),
        }
    }
}

/// Price table and currency configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Flight quote in USD; unset means no quote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_usd: Option<f64>,

    /// Hotel quote per night in USD; unset means no quote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel_per_night_usd: Option<f64>,

    #[serde(default = "default_meal_per_day")]
    pub meal_per_day_usd: f64,

    #[serde(default = "default_transport_per_day")]
    pub transport_per_day_usd: f64,

    /// Exchange rate service; fixed `rates` are used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate_url: Option<String>,

    /// Units of each currency per USD
    #[serde(default)]
    pub rates: BTreeMap<String, f64>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            flight_usd: None,
            hotel_per_night_usd: None,
            meal_per_day_usd: default_meal_per_day(),
            transport_per_day_usd: default_transport_per_day(),
            exchange_rate_url: None,
            rates: BTreeMap::new(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.waypoint")
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_openai_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_agent_provider() -> String {
    "ollama".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_meal_per_day() -> f64 {
    15.0
}

fn default_transport_per_day() -> f64 {
    10.0
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.waypoint/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default();

        // Written before processing so the file keeps `~` paths
        let toml_string = config.to_toml()?;
        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        config.validate_and_process()?;
        Ok(config)
    }

    /// Serialize to pretty TOML
    pub fn to_toml(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Get the default configuration file path (~/.waypoint/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".waypoint").join("config.toml"))
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates the log level, timeouts, temperature and rates
    /// - Expands ~ in the data directory and fixture paths
    /// - Resolves relative fixture paths against the data directory
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(EngineError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.mission.branch_timeout_secs == 0 || self.mission.plan_timeout_secs == 0 {
            return Err(EngineError::Config(
                "mission timeouts must be greater than zero".to_string(),
            ));
        }

        for (currency, rate) in &self.pricing.rates {
            if !rate.is_finite() || *rate <= 0.0 {
                return Err(EngineError::Config(format!(
                    "Exchange rate for {} must be a positive number",
                    currency
                )));
            }
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;

        for agent in [
            &mut self.agents.planner,
            &mut self.agents.researcher,
            &mut self.agents.execution,
        ] {
            if agent.timeout_secs == Some(0) {
                return Err(EngineError::Config(
                    "agent timeout_secs must be greater than zero".to_string(),
                ));
            }

            if let Some(path) = agent.path.take() {
                let expanded = expand_path(&path)?;
                agent.path = Some(if expanded.is_relative() {
                    self.core.data_dir.join(expanded)
                } else {
                    expanded
                });
            }
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
