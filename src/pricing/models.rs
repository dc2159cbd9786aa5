//! Pricing option models.
//!
//! These are the user-configured transformations the pricing engine applies
//! to a site's base monthly rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PricingError;

/// Base currency of every site price
pub const BASE_CURRENCY: &str = "PHP";

/// Commitment durations the rate generator accepts, in months
pub const RATE_DURATIONS: [u32; 3] = [3, 6, 12];

/// How an adjustment amount is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentType {
    Percent,
    #[default]
    Flat,
}

/// Direction of an adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
}

/// Marker for the `"ALL"` form of [`ApplyTo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllSites {
    #[serde(rename = "ALL")]
    All,
}

/// Which sites an adjustment targets: `"ALL"` or a list of site codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApplyTo {
    Sites(Vec<String>),
    All(AllSites),
}

impl Default for ApplyTo {
    fn default() -> Self {
        ApplyTo::All(AllSites::All)
    }
}

impl ApplyTo {
    pub fn covers(&self, site_code: &str) -> bool {
        match self {
            ApplyTo::All(_) => true,
            ApplyTo::Sites(codes) => codes.iter().any(|c| c == site_code),
        }
    }
}

/// Flat or percentage modification of a site's base price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAdjustment {
    pub amount: Decimal,
    #[serde(rename = "type", default)]
    pub kind: AdjustmentType,
    /// Unset means subtract
    #[serde(default)]
    pub operation: Option<Operation>,
    #[serde(default)]
    pub apply_to: ApplyTo,
}

/// One tier of the rate generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateGeneratorEntry {
    /// Commitment length in months (3, 6 or 12)
    pub duration: u32,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(rename = "type", default)]
    pub kind: AdjustmentType,
}

/// Conversion from the base currency: price / equivalent.
///
/// The equivalent is guaranteed non-zero; deserialization of a zero
/// equivalent fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCurrencyExchange")]
pub struct CurrencyExchange {
    currency: String,
    equivalent: Decimal,
}

#[derive(Deserialize)]
struct RawCurrencyExchange {
    currency: String,
    equivalent: Decimal,
}

impl TryFrom<RawCurrencyExchange> for CurrencyExchange {
    type Error = PricingError;

    fn try_from(raw: RawCurrencyExchange) -> Result<Self, Self::Error> {
        CurrencyExchange::new(raw.currency, raw.equivalent)
    }
}

impl CurrencyExchange {
    pub fn new(currency: impl Into<String>, equivalent: Decimal) -> Result<Self, PricingError> {
        let currency = currency.into();
        if equivalent.is_zero() {
            return Err(PricingError::ZeroExchangeRate { currency });
        }
        Ok(Self {
            currency,
            equivalent,
        })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn equivalent(&self) -> Decimal {
        self.equivalent
    }

    /// Base currency at 1:1 leaves prices untouched
    pub fn is_noop(&self) -> bool {
        self.equivalent == Decimal::ONE && self.currency == BASE_CURRENCY
    }

    pub fn convert(&self, price: Decimal) -> Decimal {
        if self.is_noop() {
            price
        } else {
            price / self.equivalent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_apply_to_deserializes_keyword_and_list() {
        let all: ApplyTo = serde_json::from_str(r#""ALL""#).unwrap();
        assert!(all.covers("anything"));

        let some: ApplyTo = serde_json::from_str(r#"["A-1", "B-2"]"#).unwrap();
        assert!(some.covers("B-2"));
        assert!(!some.covers("C-3"));
    }

    #[test]
    fn test_adjustment_defaults() {
        let adj: PriceAdjustment = serde_json::from_str(r#"{"amount": 20, "type": "percent"}"#).unwrap();
        assert_eq!(adj.kind, AdjustmentType::Percent);
        assert_eq!(adj.operation, None);
        assert_eq!(adj.apply_to, ApplyTo::default());
    }

    #[test]
    fn test_zero_exchange_rejected() {
        assert!(CurrencyExchange::new("USD", dec!(0)).is_err());
        let parsed: Result<CurrencyExchange, _> =
            serde_json::from_str(r#"{"currency": "USD", "equivalent": 0}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_exchange_conversion() {
        let usd = CurrencyExchange::new("USD", dec!(50)).unwrap();
        assert_eq!(usd.convert(dec!(1000)), dec!(20));

        let php = CurrencyExchange::new("PHP", dec!(1)).unwrap();
        assert!(php.is_noop());
        assert_eq!(php.convert(dec!(1000)), dec!(1000));
    }
}
