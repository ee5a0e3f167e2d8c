//! Itinerary day numbering.
//!
//! Turns an unordered set of events into a day-numbered itinerary.
//!
//! # Algorithm Summary
//!
//! 1. Resolve each event's relevant zone (destination zone for flights, the
//!    plan's home zone otherwise) and reject the whole set if any zone is
//!    missing or unknown.
//! 2. Sort by start time, then by id.
//! 3. Walk the sorted events. The first event is day 1. A later event starts a
//!    new day when its zone-local start date is strictly after the previous
//!    event's end, read in the *current* event's zone.
//! 4. Bucket by day number.
//!
//! Day numbers are relative: day 1 is the first event's day, never the plan's
//! declared start date. They are view data and are never stored.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;

use crate::event::Event;
use crate::types::{EventId, parse_time_zone};

/// Reasons an itinerary cannot be computed. Any of them rejects the request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItineraryError {
    /// No zone to judge the event's day in.
    #[error("event {event_id} has no time zone to evaluate its day in")]
    MissingTimeZone { event_id: EventId },

    /// The zone name does not resolve to an IANA zone.
    #[error("event {event_id} uses unknown time zone {name:?}")]
    UnknownTimeZone { event_id: EventId, name: String },

    /// End instant is not strictly after the start.
    #[error("event {event_id} ends before it starts")]
    InvalidTimeRange { event_id: EventId },
}

impl ItineraryError {
    /// The event that caused the failure.
    pub const fn event_id(&self) -> &EventId {
        match self {
            Self::MissingTimeZone { event_id }
            | Self::UnknownTimeZone { event_id, .. }
            | Self::InvalidTimeRange { event_id } => event_id,
        }
    }
}

/// An event annotated with its place in the itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryEvent {
    #[serde(flatten)]
    pub event: Event,
    pub day_number: u32,
    pub relevant_time_zone: String,
    /// Start date as seen in the relevant zone.
    pub local_date: NaiveDate,
}

/// Day-numbered events: a flat ordered list plus per-day buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Itinerary {
    pub events: Vec<ItineraryEvent>,
    pub grouped: BTreeMap<u32, Vec<ItineraryEvent>>,
}

impl Itinerary {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of distinct days.
    pub fn day_count(&self) -> usize {
        self.grouped.len()
    }
}

/// Computes day numbers for a plan's events.
///
/// `plan_time_zone` is the plan's home zone; it is only consulted for
/// non-flight events. Events sharing a start instant are ordered by id, so
/// the result depends only on the event set, not on input order.
pub fn compute_itinerary(
    events: &[Event],
    plan_time_zone: Option<&str>,
) -> Result<Itinerary, ItineraryError> {
    let mut resolved = events
        .iter()
        .map(|event| resolve(event, plan_time_zone).map(|tz| (event, tz)))
        .collect::<Result<Vec<_>, _>>()?;

    resolved.sort_by(|(a, _), (b, _)| {
        a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id))
    });

    let mut annotated = Vec::with_capacity(resolved.len());
    let mut day_number = 0_u32;
    let mut previous_end: Option<DateTime<Utc>> = None;
    for (event, tz) in resolved {
        let local_date = event.start_time.with_timezone(&tz).date_naive();
        let is_new_day = previous_end.is_none_or(|end| {
            local_date > end.with_timezone(&tz).date_naive()
        });
        if is_new_day {
            day_number += 1;
        }
        previous_end = Some(event.end_time);

        annotated.push(ItineraryEvent {
            event: event.clone(),
            day_number,
            relevant_time_zone: tz.name().to_string(),
            local_date,
        });
    }

    let mut grouped: BTreeMap<u32, Vec<ItineraryEvent>> = BTreeMap::new();
    for item in &annotated {
        grouped.entry(item.day_number).or_default().push(item.clone());
    }

    tracing::debug!(
        events = annotated.len(),
        days = grouped.len(),
        "computed itinerary"
    );

    Ok(Itinerary {
        events: annotated,
        grouped,
    })
}

fn resolve(event: &Event, plan_time_zone: Option<&str>) -> Result<Tz, ItineraryError> {
    if event.end_time <= event.start_time {
        return Err(ItineraryError::InvalidTimeRange {
            event_id: event.id.clone(),
        });
    }
    let name = event
        .relevant_time_zone(plan_time_zone)
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ItineraryError::MissingTimeZone {
            event_id: event.id.clone(),
        })?;
    parse_time_zone(name).map_err(|_| ItineraryError::UnknownTimeZone {
        event_id: event.id.clone(),
        name: name.to_string(),
    })
}
