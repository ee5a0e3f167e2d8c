//! Plans: trips and venue-based event plans.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{PlanId, UserId, ValidationError, parse_time_zone};

/// Whether a plan is a trip (has a destination) or a venue event (has a location).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    Trip,
    Plan,
}

impl PlanKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trip => "trip",
            Self::Plan => "plan",
        }
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trip" => Ok(Self::Trip),
            "plan" => Ok(Self::Plan),
            _ => Err(ValidationError::InvalidValue {
                field: "type",
                value: s.to_string(),
            }),
        }
    }
}

/// Progress of the planning work itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanningState {
    #[default]
    Initial,
    Reviewing,
    Complete,
}

impl PlanningState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Reviewing => "reviewing",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for PlanningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanningState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(Self::Initial),
            "reviewing" => Ok(Self::Reviewing),
            "complete" => Ok(Self::Complete),
            _ => Err(ValidationError::InvalidValue {
                field: "planningState",
                value: s.to_string(),
            }),
        }
    }
}

/// A container of scheduled events shared by a group of participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    #[serde(rename = "type")]
    pub kind: PlanKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Home zone; the day frame for every non-flight event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub auto_calculate_start_date: bool,
    pub auto_calculate_end_date: bool,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub planning_state: PlanningState,
    pub owner_id: UserId,
}

/// Unvalidated input for creating a plan.
#[derive(Debug, Clone)]
pub struct PlanDraft {
    pub kind: PlanKind,
    pub name: String,
    pub destination: Option<String>,
    pub location: Option<String>,
    pub time_zone: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub auto_calculate_start_date: bool,
    pub auto_calculate_end_date: bool,
    pub budget: Option<f64>,
}

impl PlanDraft {
    /// Creates a draft with both auto-calculate flags switched on.
    pub fn new(kind: PlanKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            destination: None,
            location: None,
            time_zone: None,
            start_date: None,
            end_date: None,
            auto_calculate_start_date: true,
            auto_calculate_end_date: true,
            budget: None,
        }
    }

    /// Validates the draft and turns it into a plan owned by `owner_id`.
    pub fn validate(self, id: PlanId, owner_id: UserId) -> Result<Plan, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }

        let destination = self.destination.filter(|d| !d.trim().is_empty());
        let location = self.location.filter(|l| !l.trim().is_empty());
        match self.kind {
            PlanKind::Trip if destination.is_none() => {
                return Err(ValidationError::Missing { field: "destination" });
            }
            PlanKind::Plan if location.is_none() => {
                return Err(ValidationError::Missing { field: "location" });
            }
            _ => {}
        }

        let time_zone = match self.time_zone.filter(|tz| !tz.trim().is_empty()) {
            Some(tz) => Some(parse_time_zone(&tz)?.name().to_string()),
            None => None,
        };

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ValidationError::EndNotAfterStart);
            }
        }

        let budget = self.budget.unwrap_or(0.0);
        if !budget.is_finite() || budget < 0.0 {
            return Err(ValidationError::InvalidAmount { field: "budget", value: budget });
        }

        Ok(Plan {
            id,
            kind: self.kind,
            name,
            destination,
            location,
            time_zone,
            start_date: self.start_date,
            end_date: self.end_date,
            auto_calculate_start_date: self.auto_calculate_start_date,
            auto_calculate_end_date: self.auto_calculate_end_date,
            budget,
            planning_state: PlanningState::Initial,
            owner_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (PlanId, UserId) {
        (PlanId::new("plan-1").unwrap(), UserId::new("user-1").unwrap())
    }

    #[test]
    fn trip_requires_destination() {
        let (id, owner) = ids();
        let draft = PlanDraft::new(PlanKind::Trip, "London");
        assert_eq!(
            draft.validate(id, owner).unwrap_err(),
            ValidationError::Missing { field: "destination" }
        );
    }

    #[test]
    fn event_plan_requires_location() {
        let (id, owner) = ids();
        let mut draft = PlanDraft::new(PlanKind::Plan, "Wedding");
        draft.destination = Some("Lisbon".to_string());
        assert_eq!(
            draft.validate(id, owner).unwrap_err(),
            ValidationError::Missing { field: "location" }
        );
    }

    #[test]
    fn valid_trip_defaults_to_auto_dates() {
        let (id, owner) = ids();
        let mut draft = PlanDraft::new(PlanKind::Trip, "  Autumn in London ");
        draft.destination = Some("London".to_string());
        draft.time_zone = Some("Europe/London".to_string());
        let plan = draft.validate(id, owner).unwrap();

        assert_eq!(plan.name, "Autumn in London");
        assert!(plan.auto_calculate_start_date);
        assert!(plan.auto_calculate_end_date);
        assert_eq!(plan.planning_state, PlanningState::Initial);
        assert_eq!(plan.time_zone.as_deref(), Some("Europe/London"));
    }

    #[test]
    fn unknown_zone_is_rejected() {
        let (id, owner) = ids();
        let mut draft = PlanDraft::new(PlanKind::Trip, "Lost");
        draft.destination = Some("Atlantis".to_string());
        draft.time_zone = Some("Ocean/Atlantis".to_string());
        assert!(matches!(
            draft.validate(id, owner).unwrap_err(),
            ValidationError::UnknownTimeZone { .. }
        ));
    }

    #[test]
    fn kind_and_state_parse() {
        assert_eq!("trip".parse::<PlanKind>().unwrap(), PlanKind::Trip);
        assert!("cruise".parse::<PlanKind>().is_err());
        assert_eq!(
            "reviewing".parse::<PlanningState>().unwrap(),
            PlanningState::Reviewing
        );
    }
}
