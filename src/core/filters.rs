//! Dependent filter state for the company and location slots
//!
//! The dependency is directional: company narrows location, never the
//! reverse. Setting company to a different value (including back to "all")
//! resets the location slot, so a location filter can never reference a
//! location outside the selected company's scope. Clearing everything is a
//! single call with no observable intermediate state.

use crate::core::identity::{CompanyId, LocationId};
use crate::core::store::EntityStore;
use crate::entities::Location;

/// One entry in a filter's option list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

/// Filter state: two dependent slots plus the map's selected location
#[derive(Debug, Clone, Default)]
pub struct FilterCascade {
    company: Option<CompanyId>,
    location: Option<LocationId>,
    map_location: Option<LocationId>,
}

impl FilterCascade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn company(&self) -> Option<&CompanyId> {
        self.company.as_ref()
    }

    pub fn location(&self) -> Option<&LocationId> {
        self.location.as_ref()
    }

    pub fn selected_map_location(&self) -> Option<&LocationId> {
        self.map_location.as_ref()
    }

    /// Set the company slot. An empty-string value means "all" and
    /// normalizes to `None`. A changed value cascades: the location slot
    /// resets so it cannot point outside the new company's scope. Setting
    /// the current value again is a no-op.
    pub fn set_company(&mut self, value: Option<CompanyId>) {
        let value = value.filter(|c| !c.as_str().is_empty());
        if value == self.company {
            return;
        }
        self.company = value;
        self.location = None;
    }

    /// Set the location slot. Never touches the company slot.
    pub fn set_location(&mut self, value: Option<LocationId>) {
        self.location = value.filter(|l| !l.as_str().is_empty());
    }

    pub fn set_map_location(&mut self, value: Option<LocationId>) {
        self.map_location = value.filter(|l| !l.as_str().is_empty());
    }

    /// Reset both filter slots at once
    pub fn clear(&mut self) {
        self.company = None;
        self.location = None;
    }

    /// Option list for the company slot, sorted by name. Never filtered by
    /// the location slot.
    pub fn company_options(&self, store: &EntityStore) -> Vec<FilterOption> {
        let mut companies: Vec<_> = store.companies().collect();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        companies
            .into_iter()
            .map(|c| FilterOption {
                value: c.id.to_string(),
                label: c.name.clone(),
            })
            .collect()
    }

    /// Option list for the location slot: locations restricted by the
    /// company slot, labeled "Name (Company)".
    pub fn location_options(&self, store: &EntityStore) -> Vec<FilterOption> {
        let mut locations: Vec<_> = store
            .locations()
            .filter(|l| match &self.company {
                Some(company) => &l.company_id == company,
                None => true,
            })
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        locations
            .into_iter()
            .map(|l| FilterOption {
                value: l.id.to_string(),
                label: match store.company(&l.company_id) {
                    Some(company) => format!("{} ({})", l.name, company.name),
                    None => l.name.clone(),
                },
            })
            .collect()
    }

    /// Location ids the current selection scopes views to: the selected
    /// location alone, else the selected company's locations, else all
    /// loaded locations. Sorted by name for stable rendering.
    pub fn scope_locations(&self, store: &EntityStore) -> Vec<LocationId> {
        if let Some(location) = &self.location {
            return vec![location.clone()];
        }
        let mut locations: Vec<&Location> = store
            .locations()
            .filter(|l| match &self.company {
                Some(company) => &l.company_id == company,
                None => true,
            })
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        locations.into_iter().map(|l| l.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Company, Criticality};

    fn store_with_two_companies() -> EntityStore {
        let mut store = EntityStore::new();
        store.merge_companies(vec![
            Company {
                id: CompanyId::new("cmp-1"),
                name: "Globex".to_string(),
            },
            Company {
                id: CompanyId::new("cmp-2"),
                name: "Initech".to_string(),
            },
        ]);
        store.merge_locations(vec![
            Location {
                id: LocationId::new("loc-hq"),
                company_id: CompanyId::new("cmp-1"),
                name: "HQ".to_string(),
                city: "Austin".to_string(),
                state: "TX".to_string(),
                criticality: Criticality::High,
            },
            Location {
                id: LocationId::new("loc-br"),
                company_id: CompanyId::new("cmp-2"),
                name: "Branch".to_string(),
                city: "Tulsa".to_string(),
                state: "OK".to_string(),
                criticality: Criticality::Low,
            },
        ]);
        store
    }

    #[test]
    fn test_company_change_resets_location() {
        let mut filters = FilterCascade::new();
        filters.set_location(Some(LocationId::new("loc-hq")));
        filters.set_company(Some(CompanyId::new("cmp-2")));
        assert!(filters.location().is_none());
        assert_eq!(filters.company(), Some(&CompanyId::new("cmp-2")));
    }

    #[test]
    fn test_company_cleared_also_resets_location() {
        let mut filters = FilterCascade::new();
        filters.set_company(Some(CompanyId::new("cmp-1")));
        filters.set_location(Some(LocationId::new("loc-hq")));
        filters.set_company(None);
        assert!(filters.company().is_none());
        assert!(filters.location().is_none());
    }

    #[test]
    fn test_same_company_value_does_not_cascade() {
        let mut filters = FilterCascade::new();
        filters.set_company(Some(CompanyId::new("cmp-1")));
        filters.set_location(Some(LocationId::new("loc-hq")));
        filters.set_company(Some(CompanyId::new("cmp-1")));
        assert_eq!(filters.location(), Some(&LocationId::new("loc-hq")));
    }

    #[test]
    fn test_empty_string_normalizes_to_all() {
        let mut filters = FilterCascade::new();
        filters.set_company(Some(CompanyId::new("")));
        assert!(filters.company().is_none());
    }

    #[test]
    fn test_location_options_respect_company_scope() {
        let store = store_with_two_companies();
        let mut filters = FilterCascade::new();
        filters.set_company(Some(CompanyId::new("cmp-1")));

        let options = filters.location_options(&store);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value, "loc-hq");
        assert_eq!(options[0].label, "HQ (Globex)");
    }

    #[test]
    fn test_company_options_ignore_location_filter() {
        let store = store_with_two_companies();
        let mut filters = FilterCascade::new();
        filters.set_location(Some(LocationId::new("loc-hq")));

        let options = filters.company_options(&store);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].label, "Globex");
    }

    #[test]
    fn test_clear_resets_both_slots() {
        let mut filters = FilterCascade::new();
        filters.set_company(Some(CompanyId::new("cmp-1")));
        filters.set_location(Some(LocationId::new("loc-hq")));
        filters.clear();
        assert!(filters.company().is_none());
        assert!(filters.location().is_none());
    }

    #[test]
    fn test_map_location_is_independent_of_slots() {
        let mut filters = FilterCascade::new();
        filters.set_map_location(Some(LocationId::new("loc-hq")));
        filters.set_location(Some(LocationId::new("loc-br")));
        filters.clear();
        assert_eq!(
            filters.selected_map_location(),
            Some(&LocationId::new("loc-hq"))
        );
    }

    #[test]
    fn test_scope_locations_prefers_selected_location() {
        let store = store_with_two_companies();
        let mut filters = FilterCascade::new();
        filters.set_location(Some(LocationId::new("loc-br")));
        assert_eq!(
            filters.scope_locations(&store),
            vec![LocationId::new("loc-br")]
        );

        filters.clear();
        filters.set_company(Some(CompanyId::new("cmp-1")));
        assert_eq!(
            filters.scope_locations(&store),
            vec![LocationId::new("loc-hq")]
        );
    }
}
