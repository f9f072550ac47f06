//! Price lookups and currency conversion
//!
//! The budget branch asks a [`PricingSource`] for flight, hotel and daily
//! costs and a [`CurrencyConverter`] for foreign currency figures. Both can
//! fail; callers absorb the failure into an unavailability message.

use crate::budget::round2;
use crate::config::PricingConfig;
use crate::llm::http_client;
use async_trait::async_trait;
use sdk::types::PricedComponent;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("{0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

/// Source of USD prices for a destination
#[async_trait]
pub trait PricingSource: Send + Sync {
    fn name(&self) -> &str;

    async fn flight_price(&self, destination: &str) -> Result<PricedComponent, PricingError>;

    /// Price of one night
    async fn hotel_price(&self, destination: &str) -> Result<PricedComponent, PricingError>;

    /// Per-day costs, usually a `{meal, transport}` breakdown
    async fn daily_costs(&self, destination: &str) -> Result<PricedComponent, PricingError>;
}

#[async_trait]
pub trait CurrencyConverter: Send + Sync {
    fn name(&self) -> &str;

    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, PricingError>;
}

/// Configured quotes
///
/// Flight and hotel quotes are optional; a missing one is reported as an
/// unavailability message instead of a number.
#[derive(Debug, Clone)]
pub struct PriceTable {
    flight_usd: Option<f64>,
    hotel_per_night_usd: Option<f64>,
    meal_per_day_usd: f64,
    transport_per_day_usd: f64,
}

impl PriceTable {
    pub fn new(
        flight_usd: Option<f64>,
        hotel_per_night_usd: Option<f64>,
        meal_per_day_usd: f64,
        transport_per_day_usd: f64,
    ) -> Self {
        Self {
            flight_usd,
            hotel_per_night_usd,
            meal_per_day_usd,
            transport_per_day_usd,
        }
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(
            config.flight_usd,
            config.hotel_per_night_usd,
            config.meal_per_day_usd,
            config.transport_per_day_usd,
        )
    }
}

#[async_trait]
impl PricingSource for PriceTable {
    fn name(&self) -> &str {
        "Price table"
    }

    async fn flight_price(&self, _destination: &str) -> Result<PricedComponent, PricingError> {
        Ok(match self.flight_usd {
            Some(price) => PricedComponent::Amount(price),
            None => PricedComponent::unavailable("Flight price unavailable - no quote configured"),
        })
    }

    async fn hotel_price(&self, destination: &str) -> Result<PricedComponent, PricingError> {
        Ok(match self.hotel_per_night_usd {
            Some(price) => PricedComponent::Amount(price),
            None => PricedComponent::unavailable(format!(
                "Hotel price unavailable for {} - no quote configured",
                destination
            )),
        })
    }

    async fn daily_costs(&self, _destination: &str) -> Result<PricedComponent, PricingError> {
        let mut parts = BTreeMap::new();
        parts.insert(
            "meal".to_string(),
            PricedComponent::Amount(self.meal_per_day_usd),
        );
        parts.insert(
            "transport".to_string(),
            PricedComponent::Amount(self.transport_per_day_usd),
        );
        Ok(PricedComponent::Breakdown(parts))
    }
}

/// Fixed exchange rates, expressed as units of each currency per USD
#[derive(Debug, Clone, Default)]
pub struct FixedRates {
    rates: BTreeMap<String, f64>,
}

impl FixedRates {
    pub fn new(rates: BTreeMap<String, f64>) -> Self {
        let rates = rates
            .into_iter()
            .map(|(code, rate)| (code.to_uppercase(), rate))
            .collect();
        Self { rates }
    }

    fn per_usd(&self, code: &str) -> Result<f64, PricingError> {
        if code.eq_ignore_ascii_case("USD") {
            return Ok(1.0);
        }
        self.rates
            .get(&code.to_uppercase())
            .copied()
            .ok_or_else(|| PricingError::UnknownCurrency(code.to_string()))
    }
}

#[async_trait]
impl CurrencyConverter for FixedRates {
    fn name(&self) -> &str {
        "Fixed rates"
    }

    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, PricingError> {
        let usd = amount / self.per_usd(from)?;
        Ok(round2(usd * self.per_usd(to)?))
    }
}

/// Exchange rate service speaking `GET {base}/latest?base=USD&symbols=EUR`
pub struct HttpRateConverter {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: BTreeMap<String, f64>,
}

impl HttpRateConverter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http_client(Duration::from_secs(10)),
        }
    }
}

#[async_trait]
impl CurrencyConverter for HttpRateConverter {
    fn name(&self) -> &str {
        "Exchange rate API"
    }

    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, PricingError> {
        if from.eq_ignore_ascii_case(to) {
            return Ok(round2(amount));
        }

        let url = format!("{}/latest", self.base_url);
        debug!("Fetching exchange rate {} -> {}", from, to);

        let response = self
            .client
            .get(&url)
            .query(&[("base", from), ("symbols", to)])
            .send()
            .await
            .map_err(|e| PricingError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PricingError::Unavailable(format!(
                "exchange rate service returned {}",
                response.status()
            )));
        }

        let body: RatesResponse = response
            .json()
            .await
            .map_err(|e| PricingError::InvalidResponse(e.to_string()))?;

        let rate = body
            .rates
            .get(to)
            .copied()
            .ok_or_else(|| PricingError::UnknownCurrency(to.to_string()))?;

        Ok(round2(amount * rate))
    }
}

/// Converter selected by the pricing configuration
pub fn converter_from_config(config: &PricingConfig) -> Arc<dyn CurrencyConverter> {
    match &config.exchange_rate_url {
        Some(url) => Arc::new(HttpRateConverter::new(url.clone())),
        None => Arc::new(FixedRates::new(config.rates.clone())),
    }
}
