//! Selection & filter store.
//!
//! Owns the search string, the structured filters, the ordered selection
//! set and the apply-to-all discount flag. The visible list is recomputed
//! from the catalog on every read.

use chrono::NaiveDate;

use crate::models::{DeckSite, Landmark};

use super::filters::SiteFilters;
use super::sort::natural_cmp;

#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    search: String,
    filters: SiteFilters,
    /// Insertion order is slide order
    selected: Vec<DeckSite>,
    apply_to_all: bool,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn filters(&self) -> &SiteFilters {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: SiteFilters) {
        self.filters = filters;
    }

    pub fn apply_to_all(&self) -> bool {
        self.apply_to_all
    }

    pub fn set_apply_to_all(&mut self, apply_to_all: bool) {
        self.apply_to_all = apply_to_all;
    }

    pub fn selected(&self) -> &[DeckSite] {
        &self.selected
    }

    pub fn is_selected(&self, site_code: &str) -> bool {
        self.selected.iter().any(|s| s.site_code() == site_code)
    }

    /// Append a site to the selection.
    ///
    /// Returns `false` and leaves the selection untouched when the site code is
    /// already selected.
    pub fn add(&mut self, site: DeckSite) -> bool {
        if self.is_selected(site.site_code()) {
            return false;
        }
        self.selected.push(site);
        true
    }

    /// Remove a site, preserving the order of the others
    pub fn remove(&mut self, site_code: &str) -> Option<DeckSite> {
        let index = self.selected.iter().position(|s| s.site_code() == site_code)?;
        Some(self.selected.remove(index))
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Attach the chosen photo to a selected site
    pub fn attach_image(&mut self, site_code: &str, image: Option<String>) -> bool {
        self.with_selected(site_code, |site| site.image = image)
    }

    /// Attach the rendered map to a selected site
    pub fn attach_map_image(&mut self, site_code: &str, map_image: Option<String>) -> bool {
        self.with_selected(site_code, |site| site.map_image = map_image)
    }

    /// Replace the landmark list shown for a selected site
    pub fn attach_landmarks(&mut self, site_code: &str, landmarks: Vec<String>) -> bool {
        self.with_selected(site_code, |site| site.landmarks = landmarks)
    }

    fn with_selected(&mut self, site_code: &str, f: impl FnOnce(&mut DeckSite)) -> bool {
        match self.selected.iter_mut().find(|s| s.site_code() == site_code) {
            Some(site) => {
                f(site);
                true
            }
            None => false,
        }
    }

    /// Filtered candidates, naturally sorted by site code
    pub fn visible(&self, catalog: &[DeckSite], landmarks: &[Landmark], today: NaiveDate) -> Vec<DeckSite> {
        let relevant = self.filters.relevant_landmarks(landmarks);
        let needle = self.search.trim().to_lowercase();

        let mut sites: Vec<DeckSite> = catalog
            .iter()
            .filter(|site| needle.is_empty() || matches_search(site, &needle))
            .filter(|site| self.filters.matches(site, &relevant, today))
            .cloned()
            .collect();

        sites.sort_by(|a, b| natural_cmp(a.site_code(), b.site_code()));
        sites
    }
}

fn matches_search(site: &DeckSite, needle: &str) -> bool {
    [
        site.site.site_code.as_str(),
        site.site.structure_code.as_str(),
        site.site.address.as_str(),
        site.site.city.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}
