//! Work done by each fan-out branch once the plan is known

use super::{prompts, MissionOrchestrator};
use crate::agents;
use crate::budget::{apply_currency, detect_currency, PricedComponents};
use crate::pricing::PricingError;
use sdk::types::{AgentResult, Plan, PricedComponent};
use std::sync::Arc;
use tracing::{debug, warn};

/// Notes handed to the researcher as context
const RESEARCH_NOTES: usize = 2;

pub(super) async fn research(ctx: Arc<MissionOrchestrator>, plan: Arc<Plan>) -> AgentResult {
    let notes = match ctx.notes.search(&plan.destination, RESEARCH_NOTES).await {
        Ok(notes) => notes,
        Err(e) => {
            warn!("Note search failed: {}", e);
            Vec::new()
        }
    };
    debug!("Research context: {} notes", notes.len());

    let prompt = prompts::research(&plan, &notes);
    agents::invoke(&ctx.agents.researcher, &prompt).await
}

pub(super) async fn budget(
    ctx: Arc<MissionOrchestrator>,
    plan: Arc<Plan>,
    goal: String,
) -> AgentResult {
    let destination = plan.destination.as_str();

    let (flight, hotel, daily_costs) = futures::join!(
        ctx.pricing.flight_price(destination),
        ctx.pricing.hotel_price(destination),
        ctx.pricing.daily_costs(destination),
    );

    let prices = PricedComponents {
        flight: absorb(flight, "Flight price unavailable".to_string()),
        hotel: absorb(hotel, format!("Hotel price unavailable for {}", destination)),
        daily_costs: absorb(
            daily_costs,
            format!("City costs unavailable for {}", destination),
        ),
    };

    let mut result = ctx.calculator.compute(&plan, &prices, &goal);
    if let Some(currency) = detect_currency(&goal) {
        debug!("Converting budget to {}", currency);
        result = apply_currency(result, &currency, ctx.converter.as_ref()).await;
    }

    AgentResult::Success(result.to_map())
}

pub(super) async fn execution(ctx: Arc<MissionOrchestrator>, plan: Arc<Plan>) -> AgentResult {
    let prompt = prompts::execution(&plan);
    agents::invoke(&ctx.agents.execution, &prompt).await
}

/// Replace a failed or empty lookup with an unavailability message
fn absorb(outcome: Result<PricedComponent, PricingError>, fallback: String) -> PricedComponent {
    match outcome {
        Ok(component) if is_empty(&component) => PricedComponent::unavailable(fallback),
        Ok(component) => component,
        Err(e) => {
            warn!("Price lookup failed: {}", e);
            PricedComponent::unavailable(format!("{} (Error: {})", fallback, e))
        }
    }
}

fn is_empty(component: &PricedComponent) -> bool {
    match component {
        PricedComponent::Text(text) => {
            let text = text.trim();
            text.is_empty() || text == "N/A"
        }
        PricedComponent::Breakdown(parts) => parts.is_empty(),
        PricedComponent::Amount(_) => false,
    }
}
