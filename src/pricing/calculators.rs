//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no database access, no hidden state.
//! The same inputs always produce the same price sequence.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

use super::models::{
    AdjustmentType, CurrencyExchange, Operation, PriceAdjustment, RateGeneratorEntry, BASE_CURRENCY,
};

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use salesdeck_web::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Apply a single flat or percentage adjustment.
///
/// A percentage is taken of `price`; a flat amount is used as-is. A missing
/// `operation` subtracts.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use salesdeck_web::pricing::{apply_adjustment, AdjustmentType, Operation};
///
/// assert_eq!(apply_adjustment(dec!(100), dec!(10), AdjustmentType::Percent, Some(Operation::Add)), dec!(110));
/// assert_eq!(apply_adjustment(dec!(100), dec!(20), AdjustmentType::Percent, None), dec!(80));
/// ```
pub fn apply_adjustment(
    price: Decimal,
    amount: Decimal,
    kind: AdjustmentType,
    operation: Option<Operation>,
) -> Decimal {
    let delta = match kind {
        AdjustmentType::Percent => price * amount / Decimal::ONE_HUNDRED,
        AdjustmentType::Flat => amount,
    };

    match operation {
        Some(Operation::Add) => price + delta,
        Some(Operation::Subtract) | None => price - delta,
    }
}

/// Everything the engine needs to price one site
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingContext<'a> {
    pub adjustments: &'a [PriceAdjustment],
    pub exchange: Option<&'a CurrencyExchange>,
    pub rate_generator: Option<&'a [RateGeneratorEntry]>,
    /// Use the single global adjustment for every site
    pub apply_to_all: bool,
}

impl<'a> PricingContext<'a> {
    /// Adjustment that applies to `site_code`.
    ///
    /// With apply-to-all only the first adjustment is meaningful; otherwise the
    /// first adjustment whose target set covers the site wins.
    pub fn adjustment_for(&self, site_code: &str) -> Option<&'a PriceAdjustment> {
        if self.apply_to_all {
            self.adjustments.first()
        } else {
            self.adjustments.iter().find(|a| a.apply_to.covers(site_code))
        }
    }

    pub fn currency(&self) -> &'a str {
        self.exchange.map_or(BASE_CURRENCY, CurrencyExchange::currency)
    }

    /// Tiers configured on the rate generator, if any
    pub fn rate_tiers(&self) -> Option<&'a [RateGeneratorEntry]> {
        self.rate_generator.filter(|entries| !entries.is_empty())
    }
}

/// Discounted monthly rate for one commitment duration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTier {
    pub duration_months: u32,
    pub price: Decimal,
}

/// Result of pricing one site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitePricing {
    /// Monthly rate after adjustment and currency conversion
    pub monthly: Decimal,
    pub currency: String,
    /// Cascading duration table; `None` without a rate generator
    pub tiers: Option<Vec<RateTier>>,
}

/// Price a site.
///
/// Order: base price, then the matching adjustment (once), then currency
/// conversion, then the rate generator. Each rate-generator discount is taken
/// from the previous tier's price, not from the base.
pub fn compute_site_pricing(base: Decimal, site_code: &str, ctx: &PricingContext<'_>) -> SitePricing {
    let mut monthly = base;

    if let Some(adjustment) = ctx.adjustment_for(site_code) {
        monthly = apply_adjustment(monthly, adjustment.amount, adjustment.kind, adjustment.operation);
    }

    if let Some(exchange) = ctx.exchange {
        monthly = exchange.convert(monthly);
    }

    let tiers = ctx.rate_tiers().map(|entries| {
        let mut running = monthly;
        entries
            .iter()
            .map(|entry| {
                if !entry.discount.is_zero() {
                    running = apply_adjustment(running, entry.discount, entry.kind, None);
                }
                RateTier {
                    duration_months: entry.duration,
                    price: running,
                }
            })
            .collect()
    });

    SitePricing {
        monthly,
        currency: ctx.currency().to_string(),
        tiers,
    }
}

/// Format an amount as `CUR 1,234,567.89`
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let rounded = round_money(amount, 2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    format!(
        "{} {}{}.{}",
        currency,
        if negative { "-" } else { "" },
        group_thousands(whole),
        fraction
    )
}

/// Format a count with thousands separators
pub fn format_count(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    if value < 0 {
        format!("-{}", group_thousands(&digits))
    } else {
        group_thousands(&digits)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::{AllSites, ApplyTo};
    use rust_decimal_macros::dec;

    fn adjustment(amount: Decimal, kind: AdjustmentType, op: Option<Operation>, apply_to: ApplyTo) -> PriceAdjustment {
        PriceAdjustment {
            amount,
            kind,
            operation: op,
            apply_to,
        }
    }

    fn tier(duration: u32, discount: Decimal, kind: AdjustmentType) -> RateGeneratorEntry {
        RateGeneratorEntry {
            duration,
            discount,
            kind,
        }
    }

    // ==================== round_money tests ====================

    #[test]
    fn test_round_money_bankers_rounding_to_even() {
        assert_eq!(round_money(dec!(2.5), 0), dec!(2));
        assert_eq!(round_money(dec!(3.5), 0), dec!(4));
        assert_eq!(round_money(dec!(2.25), 1), dec!(2.2));
        assert_eq!(round_money(dec!(2.35), 1), dec!(2.4));
    }

    #[test]
    fn test_round_money_normal_rounding() {
        assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
        assert_eq!(round_money(dec!(1.236), 2), dec!(1.24));
        assert_eq!(round_money(dec!(-1.234), 2), dec!(-1.23));
    }

    // ==================== apply_adjustment tests ====================

    #[test]
    fn test_percent_add() {
        let result = apply_adjustment(dec!(100), dec!(10), AdjustmentType::Percent, Some(Operation::Add));
        assert_eq!(result, dec!(110));
    }

    #[test]
    fn test_flat_subtract() {
        let result = apply_adjustment(dec!(100), dec!(10), AdjustmentType::Flat, Some(Operation::Subtract));
        assert_eq!(result, dec!(90));
    }

    #[test]
    fn test_missing_operation_subtracts() {
        let result = apply_adjustment(dec!(100), dec!(20), AdjustmentType::Percent, None);
        assert_eq!(result, dec!(80));
    }

    // ==================== adjustment selection tests ====================

    #[test]
    fn test_first_matching_adjustment_wins() {
        let adjustments = vec![
            adjustment(dec!(5), AdjustmentType::Flat, None, ApplyTo::Sites(vec!["B".to_string()])),
            adjustment(dec!(10), AdjustmentType::Flat, None, ApplyTo::Sites(vec!["A".to_string()])),
            adjustment(dec!(20), AdjustmentType::Flat, None, ApplyTo::Sites(vec!["A".to_string()])),
        ];
        let ctx = PricingContext {
            adjustments: &adjustments,
            ..Default::default()
        };

        assert_eq!(ctx.adjustment_for("A").unwrap().amount, dec!(10));
        assert!(ctx.adjustment_for("C").is_none());
    }

    #[test]
    fn test_apply_to_all_uses_global_adjustment() {
        let adjustments = vec![
            adjustment(dec!(7), AdjustmentType::Flat, None, ApplyTo::All(AllSites::All)),
            adjustment(dec!(99), AdjustmentType::Flat, None, ApplyTo::Sites(vec!["A".to_string()])),
        ];
        let ctx = PricingContext {
            adjustments: &adjustments,
            apply_to_all: true,
            ..Default::default()
        };

        assert_eq!(ctx.adjustment_for("A").unwrap().amount, dec!(7));
        assert_eq!(ctx.adjustment_for("Z").unwrap().amount, dec!(7));
    }

    // ==================== compute_site_pricing tests ====================

    #[test]
    fn test_no_options_returns_base() {
        let pricing = compute_site_pricing(dec!(1000), "A", &PricingContext::default());
        assert_eq!(pricing.monthly, dec!(1000));
        assert_eq!(pricing.currency, "PHP");
        assert!(pricing.tiers.is_none());
    }

    #[test]
    fn test_rate_generator_cascades() {
        let entries = vec![
            tier(3, dec!(0), AdjustmentType::Flat),
            tier(6, dec!(10), AdjustmentType::Percent),
            tier(12, dec!(5), AdjustmentType::Flat),
        ];
        let ctx = PricingContext {
            rate_generator: Some(&entries),
            ..Default::default()
        };

        let tiers = compute_site_pricing(dec!(1000), "A", &ctx).tiers.unwrap();
        let prices: Vec<(u32, Decimal)> = tiers.iter().map(|t| (t.duration_months, t.price)).collect();
        assert_eq!(prices, vec![(3, dec!(1000)), (6, dec!(900)), (12, dec!(895))]);
    }

    #[test]
    fn test_empty_rate_generator_is_not_configured() {
        let entries: Vec<RateGeneratorEntry> = Vec::new();
        let ctx = PricingContext {
            rate_generator: Some(&entries),
            ..Default::default()
        };
        assert!(compute_site_pricing(dec!(1000), "A", &ctx).tiers.is_none());
    }

    #[test]
    fn test_full_order_adjust_convert_then_tiers() {
        let adjustments = vec![adjustment(
            dec!(10),
            AdjustmentType::Percent,
            Some(Operation::Add),
            ApplyTo::Sites(vec!["A".to_string()]),
        )];
        let usd = CurrencyExchange::new("USD", dec!(55)).unwrap();
        let entries = vec![
            tier(3, dec!(0), AdjustmentType::Flat),
            tier(6, dec!(10), AdjustmentType::Percent),
            tier(12, dec!(10), AdjustmentType::Percent),
        ];
        let ctx = PricingContext {
            adjustments: &adjustments,
            exchange: Some(&usd),
            rate_generator: Some(&entries),
            apply_to_all: false,
        };

        let pricing = compute_site_pricing(dec!(50000), "A", &ctx);
        // 50,000 + 10% = 55,000 PHP -> 1,000 USD
        assert_eq!(pricing.monthly, dec!(1000));
        assert_eq!(pricing.currency, "USD");
        let tiers = pricing.tiers.unwrap();
        assert_eq!(tiers[0].price, dec!(1000));
        assert_eq!(tiers[1].price, dec!(900));
        assert_eq!(tiers[2].price, dec!(810));

        // Other sites skip the adjustment but still convert
        assert_eq!(compute_site_pricing(dec!(55000), "B", &ctx).monthly, dec!(1000));
    }

    #[test]
    fn test_pricing_is_deterministic() {
        let entries = vec![tier(3, dec!(3), AdjustmentType::Percent), tier(6, dec!(4), AdjustmentType::Percent)];
        let ctx = PricingContext {
            rate_generator: Some(&entries),
            ..Default::default()
        };
        assert_eq!(
            compute_site_pricing(dec!(12345.67), "A", &ctx),
            compute_site_pricing(dec!(12345.67), "A", &ctx)
        );
    }

    // ==================== formatting tests ====================

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec!(1234567.891), "PHP"), "PHP 1,234,567.89");
        assert_eq!(format_money(dec!(895), "USD"), "USD 895.00");
        assert_eq!(format_money(dec!(0), "PHP"), "PHP 0.00");
        assert_eq!(format_money(dec!(-1500.5), "PHP"), "PHP -1,500.50");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(350000), "350,000");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(-1000), "-1,000");
    }
}
