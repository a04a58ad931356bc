//! Provider catalog: the site and vehicle-type enumerations discovered at
//! startup, with their upstream identifiers.
//!
//! The catalog is the single source of truth for what a valid `Key` is:
//! client input is always validated against the catalog current at the time
//! of validation, never against a hardcoded list.

use crate::error::ValidationError;
use crate::key::{ControlType, Key, Organism, UserType};
use std::collections::BTreeMap;

/// Enumerations currently known from the provider. Replaced wholesale on a
/// catalog refresh; an empty catalog means discovery has not succeeded yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// (organism, normalized site name) -> upstream site id.
    sites: BTreeMap<(Organism, String), i64>,
    /// Normalized vehicle type -> upstream vehicle-type id.
    vehicle_types: BTreeMap<String, i64>,
}

impl Catalog {
    pub fn new(
        sites: BTreeMap<(Organism, String), i64>,
        vehicle_types: BTreeMap<String, i64>,
    ) -> Self {
        Self { sites, vehicle_types }
    }

    /// A catalog is usable once both enumerations are populated.
    pub fn is_complete(&self) -> bool {
        !self.sites.is_empty() && !self.vehicle_types.is_empty()
    }

    pub fn site_id(&self, organism: Organism, site: &str) -> Option<i64> {
        self.sites.get(&(organism, site.to_string())).copied()
    }

    pub fn vehicle_type_id(&self, vehicle_type: &str) -> Option<i64> {
        self.vehicle_types.get(vehicle_type).copied()
    }

    /// Sites grouped by organism, for the listing endpoint.
    pub fn sites_by_organism(&self) -> BTreeMap<Organism, Vec<String>> {
        let mut grouped: BTreeMap<Organism, Vec<String>> = BTreeMap::new();
        for (organism, site) in self.sites.keys() {
            grouped.entry(*organism).or_default().push(site.clone());
        }
        grouped
    }

    pub fn vehicle_types(&self) -> Vec<String> {
        self.vehicle_types.keys().cloned().collect()
    }

    /// The full key space: cartesian product of the enumerations, paired
    /// with the upstream ids needed to query each combination.
    pub fn keys_with_ids(&self) -> Vec<(Key, i64, i64)> {
        let mut out =
            Vec::with_capacity(4 * self.vehicle_types.len() * self.sites.len());
        for user_type in UserType::ALL {
            for control_type in ControlType::ALL {
                for (vehicle_type, vehicle_id) in &self.vehicle_types {
                    for ((organism, site), site_id) in &self.sites {
                        out.push((
                            Key {
                                user_type,
                                control_type,
                                vehicle_type: vehicle_type.clone(),
                                organism: *organism,
                                site: site.clone(),
                            },
                            *vehicle_id,
                            *site_id,
                        ));
                    }
                }
            }
        }
        out
    }

    /// Validate raw key fields against the current enumerations. Fails on the
    /// first invalid field with its allowed values.
    pub fn validate_key(
        &self,
        user_type: &str,
        control_type: &str,
        vehicle_type: &str,
        organism: &str,
        site: &str,
    ) -> Result<Key, ValidationError> {
        let user_type = UserType::parse(user_type)?;
        let control_type = ControlType::parse(control_type)?;
        let organism = Organism::parse(organism)?;

        if self.vehicle_type_id(vehicle_type).is_none() {
            return Err(ValidationError::unknown_value(
                "vehicle_type",
                self.vehicle_types.keys(),
            ));
        }
        if self.site_id(organism, site).is_none() {
            return Err(ValidationError::unknown_value(
                "site",
                self.sites
                    .keys()
                    .filter(|(org, _)| *org == organism)
                    .map(|(_, name)| name),
            ));
        }

        Ok(Key {
            user_type,
            control_type,
            vehicle_type: vehicle_type.to_string(),
            organism,
            site: site.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        let mut sites = BTreeMap::new();
        sites.insert((Organism::Snct, "esch_sur_alzette".to_string()), 1);
        sites.insert((Organism::Snct, "sandweiler".to_string()), 2);
        let mut vehicle_types = BTreeMap::new();
        vehicle_types.insert("car".to_string(), 10);
        vehicle_types.insert("bus".to_string(), 11);
        Catalog::new(sites, vehicle_types)
    }

    #[test]
    fn empty_catalog_is_incomplete() {
        assert!(!Catalog::default().is_complete());
        assert!(sample().is_complete());
    }

    #[test]
    fn key_space_is_the_full_cartesian_product() {
        let keys = sample().keys_with_ids();
        // 2 user types x 2 control types x 2 vehicle types x 2 sites
        assert_eq!(keys.len(), 16);
        assert!(keys.iter().any(|(key, vehicle_id, site_id)| {
            key.user_type == UserType::Professional
                && key.control_type == ControlType::Rejected
                && key.vehicle_type == "bus"
                && key.site == "sandweiler"
                && *vehicle_id == 11
                && *site_id == 2
        }));
    }

    #[test]
    fn validate_key_accepts_known_combination() {
        let key = sample()
            .validate_key("private", "regular", "car", "snct", "esch_sur_alzette")
            .unwrap();
        assert_eq!(key.user_type, UserType::Private);
        assert_eq!(key.site, "esch_sur_alzette");
    }

    #[test]
    fn validate_key_rejects_unknown_site_with_allowed_list() {
        let err = sample()
            .validate_key("private", "regular", "car", "snct", "paris")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "site must be one of: esch_sur_alzette, sandweiler"
        );
    }

    #[test]
    fn validate_key_rejects_unknown_vehicle_type() {
        let err = sample()
            .validate_key("private", "regular", "spaceship", "snct", "sandweiler")
            .unwrap_err();
        assert_eq!(err.to_string(), "vehicle_type must be one of: bus, car");
    }

    #[test]
    fn validate_key_rejects_unknown_organism_before_site_lookup() {
        let err = sample()
            .validate_key("private", "regular", "car", "dekra", "sandweiler")
            .unwrap_err();
        assert_eq!(err.to_string(), "organism must be one of: snct");
    }
}
