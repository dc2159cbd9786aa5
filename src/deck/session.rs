//! Deck session: the selection store and option store for one deck.

use crate::models::{DeckPayload, DeckSite};
use crate::pricing::PricingError;
use crate::selection::SelectionStore;

use super::options::{DeckOptions, OptionsStore};

/// Immutable copy of a session taken when generation starts.
///
/// Edits to the session after the snapshot is taken do not reach the
/// in-flight run.
#[derive(Debug, Clone)]
pub struct DeckSnapshot {
    pub sites: Vec<DeckSite>,
    pub options: DeckOptions,
    pub apply_to_all: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DeckSession {
    pub selection: SelectionStore,
    /// `None` until the user configures options
    pub options: Option<OptionsStore>,
}

impl DeckSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a session from a stored or submitted payload
    pub fn from_payload(payload: DeckPayload) -> Result<Self, PricingError> {
        let mut selection = SelectionStore::new();
        selection.set_apply_to_all(payload.apply_to_all);
        for site in payload.sites {
            selection.add(site);
        }

        let options = payload.options.map(OptionsStore::from_options).transpose()?;

        Ok(Self { selection, options })
    }

    pub fn to_payload(&self) -> DeckPayload {
        DeckPayload {
            sites: self.selection.selected().to_vec(),
            options: self.options.as_ref().map(OptionsStore::snapshot),
            apply_to_all: self.selection.apply_to_all(),
        }
    }

    /// Options store, created with defaults on first use
    pub fn options_mut(&mut self) -> &mut OptionsStore {
        self.options.get_or_insert_with(OptionsStore::new)
    }

    /// Snapshot for generation; `None` when the selection is empty or no
    /// options were configured.
    pub fn snapshot(&self) -> Option<DeckSnapshot> {
        let options = self.options.as_ref()?;
        if self.selection.selected().is_empty() {
            return None;
        }

        Some(DeckSnapshot {
            sites: self.selection.selected().to_vec(),
            options: options.snapshot(),
            apply_to_all: self.selection.apply_to_all(),
        })
    }

    /// Drop the selection and options
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::site::fixtures::deck_site;

    #[test]
    fn test_snapshot_requires_selection_and_options() {
        let mut session = DeckSession::new();
        assert!(session.snapshot().is_none());

        session.selection.add(deck_site("A", Some("1000")));
        assert!(session.snapshot().is_none());

        session.options_mut();
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.sites.len(), 1);

        session.reset();
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_edits() {
        let mut session = DeckSession::new();
        session.selection.add(deck_site("A", Some("1000")));
        session.options_mut();

        let snapshot = session.snapshot().unwrap();
        session.selection.add(deck_site("B", Some("2000")));
        session.selection.remove("A");

        assert_eq!(snapshot.sites.len(), 1);
        assert_eq!(snapshot.sites[0].site_code(), "A");
    }

    #[test]
    fn test_payload_round_trip_dedupes_sites() {
        let payload = DeckPayload {
            sites: vec![deck_site("A", None), deck_site("B", None), deck_site("A", None)],
            options: Some(DeckOptions::default()),
            apply_to_all: true,
        };

        let session = DeckSession::from_payload(payload).unwrap();
        let back = session.to_payload();
        assert_eq!(back.sites.len(), 2);
        assert!(back.apply_to_all);
        assert!(back.options.is_some());
    }
}
