//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types and incoming records.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A required field was not supplied.
    #[error("{field} is required")]
    Missing { field: &'static str },

    /// The time zone name is not a known IANA zone.
    #[error("unknown time zone: {name}")]
    UnknownTimeZone { name: String },

    /// The end instant is not strictly after the start instant.
    #[error("endTime must be after startTime")]
    EndNotAfterStart,

    /// A numeric amount was negative or not a number.
    #[error("{field} must be a non-negative number, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },

    /// An enum-like string field had an unrecognised value.
    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Parses an IANA time zone name.
pub fn parse_time_zone(name: &str) -> Result<Tz, ValidationError> {
    Tz::from_str(name.trim()).map_err(|_| ValidationError::UnknownTimeZone {
        name: name.to_string(),
    })
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated event identifier.
    EventId, "event ID"
);

define_string_id!(
    /// A validated plan identifier.
    PlanId, "plan ID"
);

define_string_id!(
    /// A validated user identifier.
    UserId, "user ID"
);

define_string_id!(
    /// A validated invitation identifier.
    InvitationId, "invitation ID"
);

/// Whether an event cost is a guess or a settled amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostType {
    #[default]
    Estimated,
    Actual,
}

impl CostType {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Estimated => "estimated",
            Self::Actual => "actual",
        }
    }
}

impl fmt::Display for CostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CostType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "estimated" => Ok(Self::Estimated),
            "actual" => Ok(Self::Actual),
            _ => Err(ValidationError::InvalidValue {
                field: "costType",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_reject_empty() {
        assert!(EventId::new("").is_err());
        assert!(PlanId::new("   ").is_err());
        assert!(UserId::new("user-1").is_ok());
        assert!(InvitationId::new("inv-1").is_ok());
    }

    #[test]
    fn event_id_serde_rejects_empty() {
        let result: Result<EventId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn plan_id_serializes_as_plain_string() {
        let id = PlanId::new("plan-abc").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"plan-abc\"");
    }

    #[test]
    fn parse_time_zone_accepts_iana_names() {
        assert_eq!(parse_time_zone("Europe/London").unwrap(), chrono_tz::Europe::London);
        assert_eq!(
            parse_time_zone(" America/New_York ").unwrap(),
            chrono_tz::America::New_York
        );
    }

    #[test]
    fn parse_time_zone_rejects_unknown_names() {
        let err = parse_time_zone("Mars/Olympus_Mons").unwrap_err();
        assert_eq!(err.to_string(), "unknown time zone: Mars/Olympus_Mons");
        assert!(parse_time_zone("").is_err());
    }

    #[test]
    fn cost_type_parses_and_defaults() {
        assert_eq!("actual".parse::<CostType>().unwrap(), CostType::Actual);
        assert_eq!(CostType::default(), CostType::Estimated);
        assert!("guess".parse::<CostType>().is_err());
    }
}
