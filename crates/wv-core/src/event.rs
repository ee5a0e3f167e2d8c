//! Scheduled events attached to a plan.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::event_type::EventType;
use crate::types::{CostType, EventId, PlanId, ValidationError, parse_time_zone};

/// Optional booking/navigation links for an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uber: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking: Option<String>,
}

impl ResourceLinks {
    pub const fn is_empty(&self) -> bool {
        self.maps.is_none() && self.uber.is_none() && self.booking.is_none()
    }
}

/// A single scheduled activity belonging to exactly one plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub plan_id: PlanId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "type")]
    pub kind: EventType,
    /// User-defined category name, present for `custom` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_type: Option<String>,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub cost_type: CostType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Duration in minutes when the end was derived from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "ResourceLinks::is_empty")]
    pub resource_links: ResourceLinks,
}

impl Event {
    /// Name of the zone whose calendar decides this event's day.
    ///
    /// Flights use their destination zone, everything else the plan zone.
    pub fn relevant_time_zone<'a>(&'a self, plan_time_zone: Option<&'a str>) -> Option<&'a str> {
        if self.kind.is_flight() {
            self.destination_time_zone.as_deref()
        } else {
            plan_time_zone
        }
    }

    /// Display label: the custom type name for custom events, else the type.
    pub fn category(&self) -> &str {
        match (&self.kind, self.custom_type.as_deref()) {
            (EventType::Custom, Some(custom)) => custom,
            (kind, _) => kind.as_str(),
        }
    }

    /// Applies a partial update and re-validates the merged event.
    ///
    /// When only the start moves and the event was created from a duration,
    /// the duration is kept and the end follows the start.
    pub fn apply(&self, patch: EventPatch) -> Result<Self, ValidationError> {
        let start_time = patch.start_time.unwrap_or(self.start_time);
        let end = patch.end.unwrap_or(match self.duration_minutes {
            Some(minutes) if patch.start_time.is_some() => EventEnd::DurationMinutes(minutes),
            _ => EventEnd::At(self.end_time),
        });

        let draft = EventDraft {
            plan_id: self.plan_id.clone(),
            title: patch.title.unwrap_or_else(|| self.title.clone()),
            location: patch.location.or_else(|| self.location.clone()),
            details: patch.details.or_else(|| self.details.clone()),
            kind: patch.kind.unwrap_or(self.kind),
            custom_type: patch.custom_type.or_else(|| self.custom_type.clone()),
            cost: Some(patch.cost.unwrap_or(self.cost)),
            cost_type: Some(patch.cost_type.unwrap_or(self.cost_type)),
            start_time: Some(start_time),
            end: Some(end),
            origin_time_zone: patch
                .origin_time_zone
                .or_else(|| self.origin_time_zone.clone()),
            destination_time_zone: patch
                .destination_time_zone
                .or_else(|| self.destination_time_zone.clone()),
            resource_links: ResourceLinks {
                maps: patch.resource_links.maps.or_else(|| self.resource_links.maps.clone()),
                uber: patch.resource_links.uber.or_else(|| self.resource_links.uber.clone()),
                booking: patch
                    .resource_links
                    .booking
                    .or_else(|| self.resource_links.booking.clone()),
            },
        };
        draft.validate(self.id.clone())
    }
}

/// How the end of a new event is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventEnd {
    At(DateTime<Utc>),
    DurationMinutes(i64),
}

/// Unvalidated input for creating an event.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub plan_id: PlanId,
    pub title: String,
    pub location: Option<String>,
    pub details: Option<String>,
    pub kind: EventType,
    pub custom_type: Option<String>,
    pub cost: Option<f64>,
    pub cost_type: Option<CostType>,
    pub start_time: Option<DateTime<Utc>>,
    pub end: Option<EventEnd>,
    pub origin_time_zone: Option<String>,
    pub destination_time_zone: Option<String>,
    pub resource_links: ResourceLinks,
}

impl EventDraft {
    /// Creates a draft with only the always-required fields filled in.
    pub fn new(plan_id: PlanId, title: impl Into<String>, kind: EventType) -> Self {
        Self {
            plan_id,
            title: title.into(),
            location: None,
            details: None,
            kind,
            custom_type: None,
            cost: None,
            cost_type: None,
            start_time: None,
            end: None,
            origin_time_zone: None,
            destination_time_zone: None,
            resource_links: ResourceLinks::default(),
        }
    }

    /// Validates the draft and turns it into an event with the given ID.
    pub fn validate(self, id: EventId) -> Result<Event, ValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }

        let location = non_blank(self.location);
        let details = non_blank(self.details);
        let custom_type = non_blank(self.custom_type);
        if self.kind == EventType::Custom {
            if custom_type.is_none() {
                return Err(ValidationError::Missing { field: "customType" });
            }
            if location.is_none() {
                return Err(ValidationError::Missing { field: "location" });
            }
            if details.is_none() {
                return Err(ValidationError::Missing { field: "details" });
            }
        }

        let start_time = self
            .start_time
            .ok_or(ValidationError::Missing { field: "startTime" })?;
        let (end_time, duration_minutes) =
            match self.end.ok_or(ValidationError::Missing { field: "endTime or duration" })? {
                EventEnd::At(end) => (end, None),
                EventEnd::DurationMinutes(minutes) => {
                    let end = Duration::try_minutes(minutes)
                        .and_then(|d| start_time.checked_add_signed(d))
                        .ok_or(ValidationError::EndNotAfterStart)?;
                    (end, Some(minutes))
                }
            };
        if end_time <= start_time {
            return Err(ValidationError::EndNotAfterStart);
        }

        let cost = self.cost.unwrap_or(0.0);
        if !cost.is_finite() || cost < 0.0 {
            return Err(ValidationError::InvalidAmount { field: "cost", value: cost });
        }

        let (origin_time_zone, destination_time_zone) = if self.kind.is_flight() {
            let origin = non_blank(self.origin_time_zone)
                .ok_or(ValidationError::Missing { field: "originTimeZone" })?;
            let destination = non_blank(self.destination_time_zone)
                .ok_or(ValidationError::Missing { field: "destinationTimeZone" })?;
            parse_time_zone(&origin)?;
            parse_time_zone(&destination)?;
            (Some(origin), Some(destination))
        } else {
            (None, None)
        };

        Ok(Event {
            id,
            plan_id: self.plan_id,
            title,
            location,
            details,
            kind: self.kind,
            custom_type: if self.kind == EventType::Custom { custom_type } else { None },
            cost,
            cost_type: self.cost_type.unwrap_or_default(),
            start_time,
            end_time,
            duration_minutes,
            origin_time_zone,
            destination_time_zone,
            resource_links: self.resource_links,
        })
    }
}

/// Partial update for an existing event. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub location: Option<String>,
    pub details: Option<String>,
    pub kind: Option<EventType>,
    pub custom_type: Option<String>,
    pub cost: Option<f64>,
    pub cost_type: Option<CostType>,
    pub start_time: Option<DateTime<Utc>>,
    pub end: Option<EventEnd>,
    pub origin_time_zone: Option<String>,
    pub destination_time_zone: Option<String>,
    pub resource_links: ResourceLinks,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
