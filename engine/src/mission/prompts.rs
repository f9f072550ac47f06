//! Prompt templates for the mission agents

use sdk::types::Plan;

pub fn plan(goal: &str) -> String {
    format!(
        r#"Create a travel plan for the user's goal.
Respond with JSON in this exact schema:
{{
  "destination": "string",
  "duration": "string",
  "steps": ["step1", "step2", ...]
}}

Goal: {goal}"#
    )
}

pub fn research(plan: &Plan, notes: &[String]) -> String {
    let mut prompt = format!(
        r#"Based on the plan, provide research insights and sources.
Respond with JSON in this exact schema:
{{
  "insights": ["insight1", "insight2", ...],
  "sources": ["url1", "url2", ...]
}}

Plan: {}"#,
        plan_json(plan)
    );

    if !notes.is_empty() {
        prompt.push_str("\n\nRelated requests:");
        for note in notes {
            prompt.push_str("\n- ");
            prompt.push_str(note);
        }
    }

    prompt
}

pub fn execution(plan: &Plan) -> String {
    format!(
        r#"Generate a realistic day-by-day itinerary for this plan.
Respond with JSON in this exact schema:
{{
  "itinerary": [{{"day": 1, "activities": ["activity1", ...]}}, ...]
}}

Plan: {}"#,
        plan_json(plan)
    )
}

fn plan_json(plan: &Plan) -> String {
    serde_json::to_string_pretty(plan).unwrap_or_else(|_| plan.destination.clone())
}
