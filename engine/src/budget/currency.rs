//! Target currency detection and conversion of budget figures

use crate::pricing::CurrencyConverter;
use regex::Regex;
use sdk::types::{BudgetResult, Money};
use std::sync::OnceLock;
use tracing::warn;

const SYMBOLS: [(char, &str); 4] = [('₹', "INR"), ('€', "EUR"), ('£', "GBP"), ('¥', "JPY")];

fn currency_words() -> &'static Regex {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    WORDS.get_or_init(|| {
        Regex::new(r"(?i)\b(inr|rupees?|eur|euros?|gbp|pounds?|jpy|yen)\b")
            .expect("valid currency regex")
    })
}

fn code_for_word(word: &str) -> Option<&'static str> {
    match word.to_lowercase().as_str() {
        "inr" | "rupee" | "rupees" => Some("INR"),
        "eur" | "euro" | "euros" => Some("EUR"),
        "gbp" | "pound" | "pounds" => Some("GBP"),
        "jpy" | "yen" => Some("JPY"),
        _ => None,
    }
}

/// Non-USD currency the goal asks for, by symbol, code or name.
///
/// When several are mentioned the earliest one wins. USD yields `None`.
pub fn detect_currency(goal: &str) -> Option<String> {
    let by_symbol = SYMBOLS
        .iter()
        .filter_map(|(symbol, code)| goal.find(*symbol).map(|pos| (pos, *code)))
        .min_by_key(|(pos, _)| *pos);

    let by_word = currency_words()
        .find(goal)
        .and_then(|m| code_for_word(m.as_str()).map(|code| (m.start(), code)));

    match (by_symbol, by_word) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a.1 } else { b.1 }),
        (a, b) => a.or(b).map(|(_, code)| code),
    }
    .map(str::to_string)
}

/// Pair every USD figure of `result` with its value in `target`.
///
/// A failed conversion keeps the USD value and reports the converted value as
/// unavailable. Unavailable figures are left alone.
pub async fn apply_currency(
    mut result: BudgetResult,
    target: &str,
    converter: &dyn CurrencyConverter,
) -> BudgetResult {
    // Daily entries repeat the same amount; convert each distinct value once
    let mut seen: Vec<(f64, Option<f64>)> = Vec::new();

    let mut figures: Vec<&mut Money> =
        vec![&mut result.total_budget, &mut result.remaining_balance];
    figures.extend(result.daily_budget.iter_mut().map(|d| &mut d.cost));

    for money in figures {
        let Money::Amount(usd) = *money else {
            continue;
        };

        let converted = match seen.iter().find(|(amount, _)| *amount == usd) {
            Some((_, converted)) => *converted,
            None => {
                let converted = match converter.convert(usd, "USD", target).await {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!("Currency conversion to {} failed: {}", target, e);
                        None
                    }
                };
                seen.push((usd, converted));
                converted
            }
        };

        *money = Money::Converted {
            usd,
            currency: target.to_string(),
            converted,
        };
    }

    result.currency = Some(target.to_string());
    result
}
