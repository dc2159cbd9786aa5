//! Domain models shared by the deck pipeline and the data sources

pub mod deck;
pub mod site;

pub use deck::{Deck, DeckPayload, DeckSummary};
pub use site::{Booking, DeckSite, Landmark, Site, SiteContract, OPEN_LABEL};
