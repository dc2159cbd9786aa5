//! Site catalog resolution.
//!
//! Pure derivation of each site's availability from contract and booking
//! overlays - no database access.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{Booking, DeckSite, Site, SiteContract};

/// Merge reference sites with their overlays.
///
/// Availability per site:
/// 1. the contract-derived end date (adjusted end over original end), else `None`;
/// 2. overridden by the latest active booking that has started on or before
///    `today`, as that booking's end date plus one day.
pub fn resolve_catalog(
    sites: Vec<Site>,
    contracts: &[SiteContract],
    bookings: &[Booking],
    today: NaiveDate,
) -> Vec<DeckSite> {
    let contract_ends = latest_contract_ends(contracts);
    let booking_ends = latest_started_bookings(bookings, today);

    sites
        .into_iter()
        .map(|site| {
            let code = site.site_code.as_str();
            let availability = match booking_ends.get(code) {
                Some(end) => Some(end.succ_opt().unwrap_or(*end)),
                None => contract_ends.get(code).copied(),
            };
            DeckSite::new(site, availability)
        })
        .collect()
}

fn latest_contract_ends(contracts: &[SiteContract]) -> HashMap<&str, NaiveDate> {
    let mut ends: HashMap<&str, NaiveDate> = HashMap::new();
    for contract in contracts {
        if let Some(end) = contract.effective_end() {
            ends.entry(contract.site_code.as_str())
                .and_modify(|current| *current = (*current).max(end))
                .or_insert(end);
        }
    }
    ends
}

fn latest_started_bookings(bookings: &[Booking], today: NaiveDate) -> HashMap<&str, NaiveDate> {
    let mut ends: HashMap<&str, NaiveDate> = HashMap::new();
    for booking in bookings
        .iter()
        .filter(|b| !b.is_cancelled() && b.date_from <= today)
    {
        ends.entry(booking.site_code.as_str())
            .and_modify(|current| *current = (*current).max(booking.date_to))
            .or_insert(booking.date_to);
    }
    ends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::site::fixtures::site;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 3, 1)
    }

    fn booking(code: &str, status: &str, from: NaiveDate, to: NaiveDate) -> Booking {
        Booking {
            site_code: code.to_string(),
            booking_status: status.to_string(),
            date_from: from,
            date_to: to,
        }
    }

    fn contract(code: &str, end: Option<NaiveDate>, adjusted: Option<NaiveDate>) -> SiteContract {
        SiteContract {
            site_code: code.to_string(),
            end_date: end,
            adjusted_end_date: adjusted,
        }
    }

    #[test]
    fn test_no_overlays_is_open() {
        let resolved = resolve_catalog(vec![site("A", "Makati", None)], &[], &[], today());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].availability, None);
    }

    #[test]
    fn test_contract_adjusted_end_wins() {
        let contracts = vec![contract("A", Some(date(2024, 6, 30)), Some(date(2024, 8, 31)))];
        let resolved = resolve_catalog(vec![site("A", "Makati", None)], &contracts, &[], today());
        assert_eq!(resolved[0].availability, Some(date(2024, 8, 31)));
    }

    #[test]
    fn test_started_booking_overrides_contract() {
        let contracts = vec![contract("A", Some(date(2025, 1, 31)), None)];
        let bookings = vec![booking("A", "CONFIRMED", date(2024, 2, 1), date(2024, 4, 30))];
        let resolved = resolve_catalog(vec![site("A", "Makati", None)], &contracts, &bookings, today());
        assert_eq!(resolved[0].availability, Some(date(2024, 5, 1)));
    }

    #[test]
    fn test_booking_starting_today_counts() {
        let bookings = vec![booking("A", "RESERVED", today(), date(2024, 3, 31))];
        let resolved = resolve_catalog(vec![site("A", "Makati", None)], &[], &bookings, today());
        assert_eq!(resolved[0].availability, Some(date(2024, 4, 1)));
    }

    #[test]
    fn test_future_and_cancelled_bookings_ignored() {
        let contracts = vec![contract("A", Some(date(2024, 6, 30)), None)];
        let bookings = vec![
            booking("A", "CONFIRMED", date(2024, 4, 1), date(2024, 12, 31)),
            booking("A", "CANCELLED", date(2024, 1, 1), date(2025, 12, 31)),
        ];
        let resolved = resolve_catalog(vec![site("A", "Makati", None)], &contracts, &bookings, today());
        assert_eq!(resolved[0].availability, Some(date(2024, 6, 30)));
    }

    #[test]
    fn test_overlays_keyed_by_site() {
        let bookings = vec![booking("B", "CONFIRMED", date(2024, 1, 1), date(2024, 3, 15))];
        let resolved = resolve_catalog(
            vec![site("A", "Makati", None), site("B", "Makati", None)],
            &[],
            &bookings,
            today(),
        );
        assert_eq!(resolved[0].availability, None);
        assert_eq!(resolved[1].availability, Some(date(2024, 3, 16)));
    }
}
