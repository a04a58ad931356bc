//! Category key: the fixed-shape tuple identifying one slice of the
//! provider's appointment offer.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of user booking the inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Private,
    Professional,
}

impl UserType {
    pub const ALL: [UserType; 2] = [UserType::Private, UserType::Professional];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Private => "PRIVATE",
            UserType::Professional => "PROFESSIONAL",
        }
    }

    /// Case-insensitive parse, rejecting unknown values with the allowed list.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.to_ascii_uppercase().as_str() {
            "PRIVATE" => Ok(UserType::Private),
            "PROFESSIONAL" => Ok(UserType::Professional),
            _ => Err(ValidationError::unknown_value(
                "user_type",
                UserType::ALL.iter().map(|v| v.as_str()),
            )),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of control: first inspection or re-test of a rejected vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlType {
    Regular,
    Rejected,
}

impl ControlType {
    pub const ALL: [ControlType; 2] = [ControlType::Regular, ControlType::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlType::Regular => "REGULAR",
            ControlType::Rejected => "REJECTED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.to_ascii_uppercase().as_str() {
            "REGULAR" => Ok(ControlType::Regular),
            "REJECTED" => Ok(ControlType::Rejected),
            _ => Err(ValidationError::unknown_value(
                "control_type",
                ControlType::ALL.iter().map(|v| v.as_str()),
            )),
        }
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inspection organism. Only SNCT today; private competitors would slot in
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Organism {
    Snct,
}

impl Organism {
    pub const ALL: [Organism; 1] = [Organism::Snct];

    pub fn as_str(&self) -> &'static str {
        match self {
            Organism::Snct => "snct",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.to_ascii_lowercase().as_str() {
            "snct" => Ok(Organism::Snct),
            _ => Err(ValidationError::unknown_value(
                "organism",
                Organism::ALL.iter().map(|v| v.as_str()),
            )),
        }
    }
}

impl fmt::Display for Organism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One category out of the finite key space. Vehicle type and site are
/// normalized identifiers validated against the current [`Catalog`]
/// (`crate::Catalog`); the other fields are closed enums.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key {
    pub user_type: UserType,
    pub control_type: ControlType,
    pub vehicle_type: String,
    pub organism: Organism,
    pub site: String,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.user_type, self.control_type, self.vehicle_type, self.organism, self.site
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(UserType::parse("private").unwrap(), UserType::Private);
        assert_eq!(UserType::parse("PRIVATE").unwrap(), UserType::Private);
        assert_eq!(ControlType::parse("Rejected").unwrap(), ControlType::Rejected);
        assert_eq!(Organism::parse("SNCT").unwrap(), Organism::Snct);
    }

    #[test]
    fn parse_errors_name_field_and_allowed_values() {
        let err = UserType::parse("company").unwrap_err();
        assert_eq!(err.to_string(), "user_type must be one of: PRIVATE, PROFESSIONAL");

        let err = Organism::parse("dekra").unwrap_err();
        assert_eq!(err.to_string(), "organism must be one of: snct");
    }

    #[test]
    fn keys_compare_structurally() {
        let key = Key {
            user_type: UserType::Private,
            control_type: ControlType::Regular,
            vehicle_type: "car".into(),
            organism: Organism::Snct,
            site: "esch_sur_alzette".into(),
        };
        assert_eq!(key, key.clone());
        let other = Key {
            site: "sandweiler".into(),
            ..key.clone()
        };
        assert_ne!(key, other);
        assert!(key < other);
    }

    #[test]
    fn enums_serialize_to_wire_casing() {
        assert_eq!(serde_json::to_string(&UserType::Professional).unwrap(), "\"PROFESSIONAL\"");
        assert_eq!(serde_json::to_string(&ControlType::Regular).unwrap(), "\"REGULAR\"");
        assert_eq!(serde_json::to_string(&Organism::Snct).unwrap(), "\"snct\"");
    }
}
