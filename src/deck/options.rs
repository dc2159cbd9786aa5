//! Option configuration store.
//!
//! Per-deck presentation options: price adjustments, currency exchange, the
//! rate generator and display toggles. Every write validates, so a snapshot
//! taken from the store is always safe to hand to the pricing engine.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::{CurrencyExchange, PriceAdjustment, PricingContext, PricingError, RateGeneratorEntry, RATE_DURATIONS};

/// What a slide shows besides the fixed site details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub landmarks: bool,
    /// Printing material included in the rate
    pub material_inclusion: bool,
    /// Installation included in the rate
    pub installation_inclusion: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            landmarks: true,
            material_inclusion: false,
            installation_inclusion: false,
        }
    }
}

impl DisplayOptions {
    pub fn has_inclusions(&self) -> bool {
        self.material_inclusion || self.installation_inclusion
    }
}

/// Snapshot of the option configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckOptions {
    pub price_adjustments: Vec<PriceAdjustment>,
    pub currency_exchange: Option<CurrencyExchange>,
    pub rate_generator: Option<Vec<RateGeneratorEntry>>,
    pub display: DisplayOptions,
}

impl DeckOptions {
    pub fn pricing_context(&self, apply_to_all: bool) -> PricingContext<'_> {
        PricingContext {
            adjustments: &self.price_adjustments,
            exchange: self.currency_exchange.as_ref(),
            rate_generator: self.rate_generator.as_deref(),
            apply_to_all,
        }
    }

    pub fn has_rate_generator(&self) -> bool {
        self.rate_generator.as_ref().map_or(false, |entries| !entries.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct OptionsStore {
    options: DeckOptions,
}

impl OptionsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a stored snapshot, re-running validation
    pub fn from_options(options: DeckOptions) -> Result<Self, PricingError> {
        let mut store = Self::new();
        store.options.price_adjustments = options.price_adjustments;
        store.options.currency_exchange = options.currency_exchange;
        store.options.display = options.display;
        if let Some(entries) = options.rate_generator {
            store.set_rate_generator(entries)?;
        }
        Ok(store)
    }

    pub fn options(&self) -> &DeckOptions {
        &self.options
    }

    pub fn snapshot(&self) -> DeckOptions {
        self.options.clone()
    }

    pub fn add_adjustment(&mut self, adjustment: PriceAdjustment) {
        self.options.price_adjustments.push(adjustment);
    }

    pub fn remove_adjustment(&mut self, index: usize) -> Option<PriceAdjustment> {
        (index < self.options.price_adjustments.len()).then(|| self.options.price_adjustments.remove(index))
    }

    pub fn clear_adjustments(&mut self) {
        self.options.price_adjustments.clear();
    }

    /// Set the target currency; a zero equivalent is rejected
    pub fn set_currency_exchange(&mut self, currency: &str, equivalent: Decimal) -> Result<(), PricingError> {
        self.options.currency_exchange = Some(CurrencyExchange::new(currency, equivalent)?);
        Ok(())
    }

    pub fn clear_currency_exchange(&mut self) {
        self.options.currency_exchange = None;
    }

    /// Set the rate generator tiers.
    ///
    /// Durations must be 3, 6 or 12 months and unique; tiers are stored in
    /// ascending duration order, which is the order discounts cascade in.
    pub fn set_rate_generator(&mut self, mut entries: Vec<RateGeneratorEntry>) -> Result<(), PricingError> {
        let mut seen = BTreeSet::new();
        for entry in &entries {
            if !RATE_DURATIONS.contains(&entry.duration) {
                return Err(PricingError::InvalidDuration {
                    duration: entry.duration,
                });
            }
            if !seen.insert(entry.duration) {
                return Err(PricingError::DuplicateDuration {
                    duration: entry.duration,
                });
            }
        }

        entries.sort_by_key(|entry| entry.duration);
        self.options.rate_generator = Some(entries);
        Ok(())
    }

    pub fn clear_rate_generator(&mut self) {
        self.options.rate_generator = None;
    }

    pub fn set_display(&mut self, display: DisplayOptions) {
        self.options.display = display;
    }
}
