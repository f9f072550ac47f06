//! Mission data model
//!
//! Types shared by the engine and anything consuming a mission stream:
//! agent outputs and results, the plan, labeled mission events and the
//! budget shapes.

use crate::errors::EngineError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// JSON object as produced by agents
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Raw output of an agent, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutput {
    /// Free-form text, possibly containing JSON
    Text(String),

    /// An already structured mapping
    Structured(JsonMap),
}

impl From<String> for AgentOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for AgentOutput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<JsonMap> for AgentOutput {
    fn from(map: JsonMap) -> Self {
        Self::Structured(map)
    }
}

/// Outcome of one agent call, after normalization
///
/// Serializes as the mapping itself for `Success`, as `{"raw_text": ...}` for
/// `ParseFailure` and as `{"error": ...}` for `ExecutionError`.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResult {
    /// The agent produced a usable mapping
    Success(JsonMap),

    /// No normalization strategy could turn the text into a mapping
    ParseFailure { raw_text: String },

    /// The agent call itself failed
    ExecutionError { message: String },
}

impl AgentResult {
    pub fn parse_failure(raw_text: impl Into<String>) -> Self {
        Self::ParseFailure {
            raw_text: raw_text.into(),
        }
    }

    pub fn execution_error(message: impl Into<String>) -> Self {
        Self::ExecutionError {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The mapping carried by a `Success`
    pub fn as_map(&self) -> Option<&JsonMap> {
        match self {
            Self::Success(map) => Some(map),
            _ => None,
        }
    }

    /// Render as a JSON value, using the same shape as `Serialize`
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Self::Success(map) => serde_json::Value::Object(map.clone()),
            Self::ParseFailure { raw_text } => serde_json::json!({ "raw_text": raw_text }),
            Self::ExecutionError { message } => serde_json::json!({ "error": message }),
        }
    }
}

impl Serialize for AgentResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(map) => map.serialize(serializer),
            Self::ParseFailure { raw_text } => {
                let mut out = serializer.serialize_map(Some(1))?;
                out.serialize_entry("raw_text", raw_text)?;
                out.end()
            }
            Self::ExecutionError { message } => {
                let mut out = serializer.serialize_map(Some(1))?;
                out.serialize_entry("error", message)?;
                out.end()
            }
        }
    }
}

/// Label attached to every item of a mission stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchLabel {
    Plan,
    Research,
    Budget,
    Execution,
    /// A branch failed outside of its agent call
    Error,
}

impl BranchLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchLabel::Plan => "plan",
            BranchLabel::Research => "research",
            BranchLabel::Budget => "budget",
            BranchLabel::Execution => "execution",
            BranchLabel::Error => "error",
        }
    }
}

impl fmt::Display for BranchLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(label, result)` item yielded by a mission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionEvent {
    pub label: BranchLabel,
    pub result: AgentResult,
}

impl MissionEvent {
    pub fn new(label: BranchLabel, result: AgentResult) -> Self {
        Self { label, result }
    }
}

/// Travel plan produced by the planning step
///
/// Shared read-only by every branch once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub destination: String,
    pub duration: String,
    pub steps: Vec<String>,

    /// Any other keys the planner returned
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Plan {
    /// Build a plan from the planner's normalized result.
    ///
    /// Fails with `PlanInvalid` when the result is not a mapping or when the
    /// mapping carries an `error` key. Missing fields fall back to defaults.
    pub fn from_result(result: &AgentResult) -> Result<Self, EngineError> {
        let map = match result {
            AgentResult::Success(map) => map,
            AgentResult::ParseFailure { .. } => {
                return Err(EngineError::PlanInvalid(
                    "planner output could not be parsed".to_string(),
                ))
            }
            AgentResult::ExecutionError { message } => {
                return Err(EngineError::PlanInvalid(message.clone()))
            }
        };

        if let Some(error) = map.get("error") {
            return Err(EngineError::PlanInvalid(value_text(error)));
        }

        let destination = map
            .get("destination")
            .map(value_text)
            .unwrap_or_else(|| "Unknown".to_string());
        let duration = map
            .get("duration")
            .map(value_text)
            .unwrap_or_else(|| "0".to_string());
        let steps = match map.get("steps") {
            Some(serde_json::Value::Array(items)) => items.iter().map(value_text).collect(),
            Some(other) => vec![value_text(other)],
            None => Vec::new(),
        };

        let extra = map
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "destination" | "duration" | "steps"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            destination,
            duration,
            steps,
            extra,
        })
    }
}

/// Strings render bare, everything else as JSON text
fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One priced line item reported by a pricing source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PricedComponent {
    /// A numeric amount in USD
    Amount(f64),

    /// A numeric-looking string ("546.70") or an unavailability message
    Text(String),

    /// Per-category costs, e.g. `{meal, transport}`
    Breakdown(BTreeMap<String, PricedComponent>),
}

impl PricedComponent {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Text(message.into())
    }

    /// The numeric value, if this component is a finite number or a
    /// numeric-looking string with at most one decimal point.
    pub fn as_amount(&self) -> Option<f64> {
        match self {
            Self::Amount(v) if v.is_finite() => Some(*v),
            Self::Amount(_) => None,
            Self::Text(text) => parse_numeric_text(text),
            Self::Breakdown(_) => None,
        }
    }
}

fn parse_numeric_text(text: &str) -> Option<f64> {
    let text = text.trim();
    let dots = text.chars().filter(|c| *c == '.').count();
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    if dots > 1 || digits == 0 || digits + dots != text.chars().count() {
        return None;
    }
    text.parse::<f64>().ok()
}

/// A money value as reported in a budget
#[derive(Debug, Clone, PartialEq)]
pub enum Money {
    /// Amount in USD
    Amount(f64),

    /// No value could be computed; serialized as `"N/A"`
    Unavailable,

    /// USD amount paired with its conversion; `None` when conversion failed
    Converted {
        usd: f64,
        currency: String,
        converted: Option<f64>,
    },
}

impl Money {
    /// The USD amount, if any
    pub fn usd(&self) -> Option<f64> {
        match self {
            Self::Amount(v) => Some(*v),
            Self::Unavailable => None,
            Self::Converted { usd, .. } => Some(*usd),
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Amount(v) => serializer.serialize_f64(*v),
            Self::Unavailable => serializer.serialize_str("N/A"),
            Self::Converted {
                usd,
                currency,
                converted,
            } => {
                let mut out = serializer.serialize_map(Some(2))?;
                out.serialize_entry("USD", usd)?;
                match converted {
                    Some(v) => out.serialize_entry(currency, v)?,
                    None => out.serialize_entry(currency, "N/A")?,
                }
                out.end()
            }
        }
    }
}

/// Cost share for one day of the trip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCost {
    pub day: String,
    pub cost: Money,
}

/// Budget computed for a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetResult {
    pub daily_budget: Vec<DayCost>,
    pub total_budget: Money,
    pub remaining_balance: Money,

    /// Priced components as they were reported
    pub api_prices: BTreeMap<String, PricedComponent>,

    /// Where the prices came from
    pub sources: Vec<String>,

    /// Target currency, when the goal asked for one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl BudgetResult {
    /// Render as a JSON mapping
    pub fn to_map(&self) -> JsonMap {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => JsonMap::new(),
        }
    }
}
