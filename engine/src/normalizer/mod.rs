//! Response Normalizer
//!
//! Turns raw agent output into an `AgentResult`. Agents are asked for JSON but
//! routinely wrap it in markdown fences, surround it with prose, use Python
//! quoting or leave trailing commas. Each repair below is validated by a strict
//! parse, so the order only affects how quickly a reply is accepted.
//!
//! Nothing in here fails: text that cannot be recovered becomes a
//! `ParseFailure` carrying the original text.

pub mod literal;

use regex::Regex;
use sdk::types::{AgentOutput, AgentResult, JsonMap};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Opening or closing fence, with an optional language tag
fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```[A-Za-z0-9_+-]*\s*").expect("valid fence regex"))
}

fn trailing_comma_pattern() -> &'static Regex {
    static TRAILING: OnceLock<Regex> = OnceLock::new();
    TRAILING.get_or_init(|| Regex::new(r",\s*([}\]])").expect("valid trailing comma regex"))
}

/// Normalize raw agent output into a typed result.
///
/// Structured output is returned unchanged, so normalizing a `Success` mapping
/// again is a no-op.
pub fn normalize(raw: AgentOutput) -> AgentResult {
    match raw {
        AgentOutput::Structured(map) => AgentResult::Success(map),
        AgentOutput::Text(text) => match parse_text(&text) {
            Some(map) => AgentResult::Success(map),
            None => {
                let preview: String = text.chars().take(100).collect();
                warn!("Failed to parse agent output as JSON: {}...", preview);
                AgentResult::ParseFailure { raw_text: text }
            }
        },
    }
}

/// Recover a JSON object from free-form text
pub fn parse_text(text: &str) -> Option<JsonMap> {
    let candidate = extract_candidate(text);

    if let Some(map) = parse_object(&candidate) {
        return Some(map);
    }

    let requoted = candidate.replace('\'', "\"");
    if let Some(map) = parse_object(&requoted) {
        debug!("Agent output parsed after quote repair");
        return Some(map);
    }

    let without_trailing = strip_trailing_commas(&candidate);
    if let Some(map) = parse_object(&without_trailing) {
        debug!("Agent output parsed after trailing comma repair");
        return Some(map);
    }

    if let Some(map) = parse_object(&strip_trailing_commas(&requoted)) {
        debug!("Agent output parsed after combined repair");
        return Some(map);
    }

    match literal::parse(&candidate) {
        Ok(serde_json::Value::Object(map)) => {
            debug!("Agent output parsed as a literal");
            Some(map)
        }
        Ok(_) => None,
        Err(e) => {
            debug!("Literal parse failed: {}", e);
            None
        }
    }
}

/// Remove fences and cut the greedy `{ ... }` span out of the text
fn extract_candidate(text: &str) -> String {
    let cleaned = fence_pattern().replace_all(text, "");
    let cleaned = cleaned.trim();

    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => cleaned[start..=end].to_string(),
        _ => cleaned.to_string(),
    }
}

fn strip_trailing_commas(text: &str) -> String {
    trailing_comma_pattern().replace_all(text, "$1").into_owned()
}

fn parse_object(text: &str) -> Option<JsonMap> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}
