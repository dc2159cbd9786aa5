//! Persisted deck models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::deck::options::DeckOptions;

use super::site::DeckSite;

/// Deck row from `decks`
#[derive(Debug, Clone, FromRow)]
pub struct Deck {
    pub id: Uuid,
    pub title: String,
    pub token: String,
    pub thumbnail: Option<String>,
    pub payload: serde_json::Value,
    pub modified_at: DateTime<Utc>,
}

/// Deck listing entry (no payload)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeckSummary {
    pub id: Uuid,
    pub title: String,
    pub token: String,
    pub thumbnail: Option<String>,
    pub modified_at: DateTime<Utc>,
}

/// Configuration payload stored with a deck: the selection plus its options.
///
/// `options: None` means the option configuration was never set up, which
/// makes generation a no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckPayload {
    #[serde(default)]
    pub sites: Vec<DeckSite>,
    #[serde(default)]
    pub options: Option<DeckOptions>,
    #[serde(default)]
    pub apply_to_all: bool,
}

impl Deck {
    /// Parse the stored JSON payload
    pub fn payload(&self) -> Result<DeckPayload, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    pub fn summary(&self) -> DeckSummary {
        DeckSummary {
            id: self.id,
            title: self.title.clone(),
            token: self.token.clone(),
            thumbnail: self.thumbnail.clone(),
            modified_at: self.modified_at,
        }
    }
}

impl DeckPayload {
    /// Thumbnail shown in deck listings: photo of the first selected site that has one
    pub fn thumbnail(&self) -> Option<String> {
        self.sites.iter().find_map(|s| s.image.clone())
    }
}
