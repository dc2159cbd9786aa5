//! Request DTOs for pricing API endpoints.

use serde::Deserialize;

use crate::deck::options::DeckOptions;
use crate::models::DeckSite;

/// Request to quote one site under a set of deck options
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub site: DeckSite,
    #[serde(default)]
    pub options: DeckOptions,
    #[serde(default)]
    pub apply_to_all: bool,
}
