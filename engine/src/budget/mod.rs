//! Budget calculation
//!
//! Turns a plan and a set of priced components into a [`BudgetResult`]. The
//! computation is deterministic and total: any component that is not a usable
//! number simply contributes nothing.
//!
//! Rules:
//! - `duration` is the first integer in the plan's duration text (0 if none)
//! - `nights = max(duration, 1)`, capped at [`MAX_NIGHTS`]
//! - flight counts once, hotel and daily costs count once per night
//! - the user's budget is the first integer after a `$` in the goal

pub mod currency;

pub use currency::{apply_currency, detect_currency};

use regex::Regex;
use sdk::types::{BudgetResult, DayCost, Money, Plan, PricedComponent};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Longest trip priced; planner durations beyond this are clamped
pub const MAX_NIGHTS: u32 = 366;

/// Components reported by the pricing source, in USD
#[derive(Debug, Clone, PartialEq)]
pub struct PricedComponents {
    pub flight: PricedComponent,

    /// Per night
    pub hotel: PricedComponent,

    /// Per day
    pub daily_costs: PricedComponent,
}

/// Computes budgets; `sources` is reported verbatim in every result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BudgetCalculator {
    sources: Vec<String>,
}

impl BudgetCalculator {
    pub fn new(sources: Vec<String>) -> Self {
        Self { sources }
    }

    pub fn compute(&self, plan: &Plan, prices: &PricedComponents, goal: &str) -> BudgetResult {
        let duration = parse_duration(&plan.duration);
        if duration > MAX_NIGHTS {
            warn!(
                "Plan duration of {} days exceeds {}, pricing {} nights",
                duration, MAX_NIGHTS, MAX_NIGHTS
            );
        }
        let nights = duration.clamp(1, MAX_NIGHTS);

        let contributions = [
            prices.flight.as_amount(),
            prices.hotel.as_amount().map(|v| v * nights as f64),
            daily_amount(&prices.daily_costs).map(|v| v * nights as f64),
        ];

        let mut contributed = false;
        let mut sum = 0.0;
        for value in contributions.into_iter().flatten() {
            contributed = true;
            sum += value;
        }

        let total = if contributed {
            Money::Amount(round2(sum))
        } else {
            Money::Unavailable
        };

        let per_day = match &total {
            Money::Amount(total) => Money::Amount(round2(*total / nights as f64)),
            _ => Money::Unavailable,
        };
        let daily_budget = (1..=nights)
            .map(|day| DayCost {
                day: format!("Day {}", day),
                cost: per_day.clone(),
            })
            .collect();

        let user_budget = parse_user_budget(goal);
        let remaining_balance = if user_budget > 0 {
            let spent = total.usd().unwrap_or(0.0);
            Money::Amount(round2(user_budget as f64 - spent))
        } else {
            Money::Unavailable
        };

        debug!(
            "Budget computed: duration={}, total={:?}, user_budget={}",
            duration, total, user_budget
        );

        let mut api_prices = BTreeMap::new();
        api_prices.insert("flight".to_string(), prices.flight.clone());
        api_prices.insert("hotel".to_string(), prices.hotel.clone());
        api_prices.insert("daily_costs".to_string(), prices.daily_costs.clone());

        BudgetResult {
            daily_budget,
            total_budget: total,
            remaining_balance,
            api_prices,
            sources: self.sources.clone(),
            currency: None,
        }
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn first_integer() -> &'static Regex {
    static FIRST: OnceLock<Regex> = OnceLock::new();
    FIRST.get_or_init(|| Regex::new(r"\d+").expect("valid integer regex"))
}

fn dollar_amount() -> &'static Regex {
    static DOLLAR: OnceLock<Regex> = OnceLock::new();
    DOLLAR.get_or_init(|| Regex::new(r"\$\s*(\d[\d,]*)").expect("valid dollar regex"))
}

/// First integer in the duration text; 0 when there is none
pub fn parse_duration(text: &str) -> u32 {
    first_integer()
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// First integer after a `$`, thousands separators allowed; 0 when absent
pub fn parse_user_budget(goal: &str) -> u64 {
    dollar_amount()
        .captures(goal)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
        .unwrap_or(0)
}

/// Per-day amount of the daily costs component.
///
/// A breakdown adds `meal` and `transport`; an absent part counts as 0, but
/// any present part that is not numeric voids the whole component, as does a
/// breakdown with neither part.
fn daily_amount(component: &PricedComponent) -> Option<f64> {
    match component {
        PricedComponent::Breakdown(parts) => {
            let mut found = false;
            let mut sum = 0.0;
            for key in ["meal", "transport"] {
                if let Some(part) = parts.get(key) {
                    sum += part.as_amount()?;
                    found = true;
                }
            }
            found.then_some(sum)
        }
        other => other.as_amount(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::types::JsonMap;

    fn plan(duration: &str) -> Plan {
        Plan {
            destination: "Korea".to_string(),
            duration: duration.to_string(),
            steps: Vec::new(),
            extra: JsonMap::new(),
        }
    }

    fn breakdown(meal: PricedComponent, transport: PricedComponent) -> PricedComponent {
        let mut parts = BTreeMap::new();
        parts.insert("meal".to_string(), meal);
        parts.insert("transport".to_string(), transport);
        PricedComponent::Breakdown(parts)
    }

    fn korea_prices() -> PricedComponents {
        PricedComponents {
            flight: PricedComponent::Amount(1000.0),
            hotel: PricedComponent::Amount(500.0),
            daily_costs: breakdown(PricedComponent::Amount(20.0), PricedComponent::Amount(10.0)),
        }
    }

    fn unavailable() -> PricedComponents {
        PricedComponents {
            flight: PricedComponent::unavailable("Flight price unavailable"),
            hotel: PricedComponent::unavailable("Hotel price unavailable for Korea"),
            daily_costs: PricedComponent::unavailable("City costs unavailable for Korea"),
        }
    }

    #[test]
    fn test_total_from_components() {
        let calc = BudgetCalculator::default();
        let result = calc.compute(&plan("5 days"), &korea_prices(), "Plan a trip");

        assert_eq!(result.total_budget, Money::Amount(3650.0));
        assert_eq!(result.daily_budget.len(), 5);
        assert_eq!(result.daily_budget[0].day, "Day 1");
        assert_eq!(result.daily_budget[4].day, "Day 5");
        assert_eq!(result.daily_budget[2].cost, Money::Amount(730.0));
        assert_eq!(result.remaining_balance, Money::Unavailable);
    }

    #[test]
    fn test_all_unavailable() {
        let calc = BudgetCalculator::default();
        let result = calc.compute(&plan("5 days"), &unavailable(), "Trip within $1000");

        assert_eq!(result.total_budget, Money::Unavailable);
        assert_eq!(result.remaining_balance, Money::Amount(1000.0));
        assert!(result.daily_budget.iter().all(|d| d.cost == Money::Unavailable));

        let no_budget = calc.compute(&plan("5 days"), &unavailable(), "Trip to Korea");
        assert_eq!(no_budget.remaining_balance, Money::Unavailable);
    }

    #[test]
    fn test_huge_duration_is_clamped() {
        let calc = BudgetCalculator::default();
        let result = calc.compute(&plan("4000000000 days"), &korea_prices(), "");

        assert_eq!(result.daily_budget.len(), MAX_NIGHTS as usize);
        // 1000 + 366 * (500 + 30)
        assert_eq!(result.total_budget, Money::Amount(194_980.0));
        assert_eq!(
            result.daily_budget.last().map(|d| d.day.as_str()),
            Some("Day 366")
        );
    }

    #[test]
    fn test_remaining_balance() {
        let calc = BudgetCalculator::default();
        let prices = PricedComponents {
            flight: PricedComponent::Amount(500.0),
            hotel: PricedComponent::Amount(100.0),
            daily_costs: breakdown(PricedComponent::Amount(30.0), PricedComponent::Amount(20.0)),
        };

        let result = calc.compute(&plan("1 day"), &prices, "A trip for $1000");
        assert_eq!(result.total_budget, Money::Amount(650.0));
        assert_eq!(result.remaining_balance, Money::Amount(350.0));

        let over = calc.compute(&plan("5 days"), &korea_prices(), "Korea within $1,000");
        assert_eq!(over.remaining_balance, Money::Amount(-2650.0));
    }

    #[test]
    fn test_zero_duration_still_counts_one_night() {
        let calc = BudgetCalculator::default();
        let result = calc.compute(&plan("a weekend"), &korea_prices(), "");

        assert_eq!(result.total_budget, Money::Amount(1530.0));
        assert_eq!(result.daily_budget.len(), 1);
        assert_eq!(result.daily_budget[0].cost, Money::Amount(1530.0));
    }

    #[test]
    fn test_numeric_strings_contribute() {
        let calc = BudgetCalculator::default();
        let prices = PricedComponents {
            flight: PricedComponent::Text("546.70".to_string()),
            hotel: PricedComponent::Text("Hotel price unavailable".to_string()),
            daily_costs: PricedComponent::Amount(40.0),
        };

        let result = calc.compute(&plan("2"), &prices, "");
        assert_eq!(result.total_budget, Money::Amount(626.7));
        assert_eq!(result.daily_budget[0].cost, Money::Amount(313.35));
    }

    #[test]
    fn test_non_numeric_breakdown_part_voids_daily_costs() {
        let calc = BudgetCalculator::default();
        let prices = PricedComponents {
            flight: PricedComponent::Amount(100.0),
            hotel: PricedComponent::unavailable("n/a"),
            daily_costs: breakdown(
                PricedComponent::Amount(20.0),
                PricedComponent::Text("ask a local".to_string()),
            ),
        };
        let result = calc.compute(&plan("3 days"), &prices, "");
        assert_eq!(result.total_budget, Money::Amount(100.0));

        let mut meal_only = BTreeMap::new();
        meal_only.insert("meal".to_string(), PricedComponent::Amount(20.0));
        let prices = PricedComponents {
            daily_costs: PricedComponent::Breakdown(meal_only),
            ..prices
        };
        let result = calc.compute(&plan("3 days"), &prices, "");
        assert_eq!(result.total_budget, Money::Amount(160.0));
    }

    #[test]
    fn test_parsers() {
        assert_eq!(parse_duration("5 days"), 5);
        assert_eq!(parse_duration("about 10-12 days"), 10);
        assert_eq!(parse_duration("unknown"), 0);

        assert_eq!(parse_user_budget("within $1000"), 1000);
        assert_eq!(parse_user_budget("within $ 2,500 total"), 2500);
        assert_eq!(parse_user_budget("for $1,000.50"), 1000);
        assert_eq!(parse_user_budget("no budget"), 0);
        assert_eq!(parse_user_budget("just $"), 0);
    }

    #[test]
    fn test_api_prices_and_sources_reported() {
        let calc = BudgetCalculator::new(vec!["Price table".to_string()]);
        let result = calc.compute(&plan("5 days"), &unavailable(), "");
        assert_eq!(result.sources, vec!["Price table"]);
        assert_eq!(
            result.api_prices["flight"],
            PricedComponent::unavailable("Flight price unavailable")
        );
        assert_eq!(result.api_prices.len(), 3);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005 * 1000.0), 1005.0);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }
}
