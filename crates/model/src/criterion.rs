//! Subscriber criteria: wire shape, validation, matching.

use crate::catalog::Catalog;
use crate::error::ValidationError;
use crate::key::Key;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// One validated interest filter: exact-match key fields plus an inclusive
/// `[start, end]` timestamp window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub key: Key,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Criterion {
    pub fn matches(&self, key: &Key, timestamp: NaiveDateTime) -> bool {
        self.key == *key && self.start <= timestamp && timestamp <= self.end
    }
}

/// Criterion as received on the wire, before validation. Field names follow
/// the subscribe-stream schema; everything is kept as strings so a rejected
/// value can be reported with the field name and the allowed alternatives.
#[derive(Debug, Clone, Deserialize)]
pub struct CriterionSpec {
    pub user_type: String,
    pub control_type: String,
    pub vehicle_type: String,
    pub organism: String,
    pub site: String,
    pub start_date: String,
    pub end_date: String,
}

impl CriterionSpec {
    /// Validate against the catalog current right now. Fails on the first
    /// invalid field.
    pub fn validate(&self, catalog: &Catalog) -> Result<Criterion, ValidationError> {
        let key = catalog.validate_key(
            &self.user_type,
            &self.control_type,
            &self.vehicle_type,
            &self.organism,
            &self.site,
        )?;
        let start = parse_timestamp("start_date", &self.start_date)?;
        let end = parse_timestamp("end_date", &self.end_date)?;
        if start > end {
            return Err(ValidationError::InvertedRange);
        }
        Ok(Criterion { key, start, end })
    }
}

/// Accepts `2026-08-20T10:30:00`, the seconds-less short form, and full
/// RFC 3339 with an offset (offset discarded, provider times are local).
pub fn parse_timestamp(
    field: &'static str,
    value: &str,
) -> Result<NaiveDateTime, ValidationError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    Err(ValidationError::BadTimestamp {
        field,
        value: value.to_string(),
    })
}

/// Plain `YYYY-MM-DD`, as taken by the REST query route.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::BadDate {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{ControlType, Organism, UserType};
    use std::collections::BTreeMap;

    fn catalog() -> Catalog {
        let mut sites = BTreeMap::new();
        sites.insert((Organism::Snct, "esch_sur_alzette".to_string()), 1);
        let mut vehicle_types = BTreeMap::new();
        vehicle_types.insert("car".to_string(), 10);
        Catalog::new(sites, vehicle_types)
    }

    fn spec() -> CriterionSpec {
        CriterionSpec {
            user_type: "PRIVATE".into(),
            control_type: "REGULAR".into(),
            vehicle_type: "car".into(),
            organism: "snct".into(),
            site: "esch_sur_alzette".into(),
            start_date: "2026-08-20T08:00:00".into(),
            end_date: "2026-08-27T18:00:00".into(),
        }
    }

    #[test]
    fn valid_spec_produces_typed_criterion() {
        let criterion = spec().validate(&catalog()).unwrap();
        assert_eq!(criterion.key.user_type, UserType::Private);
        assert_eq!(criterion.key.control_type, ControlType::Regular);
        assert!(criterion.start < criterion.end);
    }

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let criterion = spec().validate(&catalog()).unwrap();
        let key = criterion.key.clone();
        assert!(criterion.matches(&key, criterion.start));
        assert!(criterion.matches(&key, criterion.end));
        assert!(!criterion.matches(&key, criterion.end + chrono::Duration::seconds(1)));
    }

    #[test]
    fn other_key_never_matches() {
        let criterion = spec().validate(&catalog()).unwrap();
        let mut other = criterion.key.clone();
        other.site = "sandweiler".into();
        assert!(!criterion.matches(&other, criterion.start));
    }

    #[test]
    fn unknown_organism_is_rejected_with_allowed_list() {
        let mut bad = spec();
        bad.organism = "dekra".into();
        let err = bad.validate(&catalog()).unwrap_err();
        assert_eq!(err.to_string(), "organism must be one of: snct");
    }

    #[test]
    fn unparseable_start_names_the_field() {
        let mut bad = spec();
        bad.start_date = "next tuesday".into();
        let err = bad.validate(&catalog()).unwrap_err();
        assert!(err.to_string().starts_with("start_date must be an ISO-8601 timestamp"));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut bad = spec();
        bad.start_date = "2026-08-27T18:00:00".into();
        bad.end_date = "2026-08-20T08:00:00".into();
        assert_eq!(bad.validate(&catalog()).unwrap_err(), ValidationError::InvertedRange);
    }

    #[test]
    fn rfc3339_offset_is_accepted() {
        let dt = parse_timestamp("start_date", "2026-08-20T10:30:00+02:00").unwrap();
        assert_eq!(dt.to_string(), "2026-08-20 10:30:00");
    }
}
