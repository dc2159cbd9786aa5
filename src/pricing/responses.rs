//! Response DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculators::{format_money, SitePricing};

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
    /// Rounded, grouped form as printed on slides
    pub display: String,
}

impl MoneyResponse {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
            display: format_money(amount, currency),
        }
    }
}

/// One duration tier in a quote
#[derive(Debug, Serialize)]
pub struct TierResponse {
    pub duration_months: u32,
    pub price: MoneyResponse,
}

/// Response for a site quote
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub site_code: String,
    /// `None` when the site has no base price
    pub monthly: Option<MoneyResponse>,
    pub tiers: Vec<TierResponse>,
}

impl QuoteResponse {
    pub fn new(site_code: &str, pricing: Option<SitePricing>) -> Self {
        match pricing {
            None => Self {
                site_code: site_code.to_string(),
                monthly: None,
                tiers: Vec::new(),
            },
            Some(pricing) => Self {
                site_code: site_code.to_string(),
                monthly: Some(MoneyResponse::new(pricing.monthly, &pricing.currency)),
                tiers: pricing
                    .tiers
                    .unwrap_or_default()
                    .into_iter()
                    .map(|tier| TierResponse {
                        duration_months: tier.duration_months,
                        price: MoneyResponse::new(tier.price, &pricing.currency),
                    })
                    .collect(),
            },
        }
    }
}
