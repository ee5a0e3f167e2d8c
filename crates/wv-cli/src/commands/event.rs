//! Event creation, update and deletion.
//!
//! Every change re-derives the plan's auto-calculated dates. That rollup is
//! best-effort: a failure is logged and the event change still stands.

use std::io::Write;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use clap::Args;

use wv_core::{
    Channel, CostType, EventDraft, EventEnd, EventId, EventPatch, EventType, Notifier, Plan,
    PlanDatePatch, ResourceLinks, sync_plan_dates,
};
use wv_db::Database;

use super::util::{
    acting_user, display_zone, open_database, parse_datetime, parse_duration, parse_zone,
    participant_plan,
};
use crate::Config;

/// Fields shared by `event add` and `event update`.
#[derive(Debug, Default, Args)]
pub struct EventFields {
    /// Free-form location.
    #[arg(long)]
    pub location: Option<String>,
    /// Notes and details.
    #[arg(long)]
    pub details: Option<String>,
    /// Category name for `custom` events.
    #[arg(long)]
    pub custom_type: Option<String>,
    /// Cost amount.
    #[arg(long)]
    pub cost: Option<f64>,
    /// `estimated` or `actual`.
    #[arg(long)]
    pub cost_type: Option<CostType>,
    /// Start (RFC 3339, or local time in the origin/plan zone).
    #[arg(long)]
    pub start: Option<String>,
    /// End (RFC 3339, or local time in the destination/plan zone).
    #[arg(long, conflicts_with = "duration")]
    pub end: Option<String>,
    /// Duration instead of an end, e.g. `90`, `2h`, `1h30m`.
    #[arg(long)]
    pub duration: Option<String>,
    /// Departure zone for flights.
    #[arg(long = "origin-tz")]
    pub origin_time_zone: Option<String>,
    /// Arrival zone for flights.
    #[arg(long = "destination-tz")]
    pub destination_time_zone: Option<String>,
    /// Map link.
    #[arg(long)]
    pub maps: Option<String>,
    /// Ride-hailing link.
    #[arg(long)]
    pub uber: Option<String>,
    /// Booking link.
    #[arg(long)]
    pub booking: Option<String>,
}

impl EventFields {
    fn resource_links(&self) -> ResourceLinks {
        ResourceLinks {
            maps: self.maps.clone(),
            uber: self.uber.clone(),
            booking: self.booking.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct AddEventArgs {
    /// Plan ID.
    pub plan_id: String,
    /// Event title.
    #[arg(long)]
    pub title: String,
    /// Event type (flight, hotel, dining, tour, custom, ...).
    #[arg(long = "type")]
    pub kind: EventType,
    #[command(flatten)]
    pub fields: EventFields,
}

#[derive(Debug, Args)]
pub struct UpdateEventArgs {
    /// Event ID.
    pub event_id: String,
    /// New title.
    #[arg(long)]
    pub title: Option<String>,
    /// New event type.
    #[arg(long = "type")]
    pub kind: Option<EventType>,
    #[command(flatten)]
    pub fields: EventFields,
}

#[derive(Debug, Args)]
pub struct DeleteEventArgs {
    /// Event ID.
    pub event_id: String,
}

pub fn add<W: Write>(writer: &mut W, args: &AddEventArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let user = acting_user(&db, config)?;
    let (plan, _) = participant_plan(&db, &args.plan_id, &user)?;

    let fields = &args.fields;
    let zones = InputZones::resolve(&plan, config, args.kind, fields, None)?;

    let mut draft = EventDraft::new(plan.id.clone(), args.title.clone(), args.kind);
    draft.location.clone_from(&fields.location);
    draft.details.clone_from(&fields.details);
    draft.custom_type.clone_from(&fields.custom_type);
    draft.cost = fields.cost;
    draft.cost_type = fields.cost_type;
    draft.start_time = fields
        .start
        .as_deref()
        .map(|s| parse_datetime(s, zones.start))
        .transpose()?;
    draft.end = parse_end(fields, zones.end)?;
    draft.origin_time_zone.clone_from(&fields.origin_time_zone);
    draft.destination_time_zone.clone_from(&fields.destination_time_zone);
    draft.resource_links = fields.resource_links();

    let event = db.create_event(draft)?;
    tracing::info!(event_id = %event.id, plan_id = %plan.id, "event created");
    writeln!(
        writer,
        "Added {} \"{}\" ({}) to \"{}\"",
        event.category(),
        event.title,
        event.id,
        plan.name
    )?;

    let message = format!("New event added: {} ({})", event.title, event.category());
    after_event_change(writer, &mut db, &plan, Some(&message))
}

pub fn update<W: Write>(writer: &mut W, args: &UpdateEventArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let user = acting_user(&db, config)?;
    let event_id = EventId::new(args.event_id.clone())?;
    let current = db
        .find_event(&event_id)?
        .with_context(|| format!("event not found: {event_id}"))?;
    let (plan, _) = participant_plan(&db, current.plan_id.as_str(), &user)?;

    let fields = &args.fields;
    let kind = args.kind.unwrap_or(current.kind);
    let zones = InputZones::resolve(&plan, config, kind, fields, Some(&current))?;

    let patch = EventPatch {
        title: args.title.clone(),
        location: fields.location.clone(),
        details: fields.details.clone(),
        kind: args.kind,
        custom_type: fields.custom_type.clone(),
        cost: fields.cost,
        cost_type: fields.cost_type,
        start_time: fields
            .start
            .as_deref()
            .map(|s| parse_datetime(s, zones.start))
            .transpose()?,
        end: parse_end(fields, zones.end)?,
        origin_time_zone: fields.origin_time_zone.clone(),
        destination_time_zone: fields.destination_time_zone.clone(),
        resource_links: fields.resource_links(),
    };
    let event = current.apply(patch)?;

    if !db.update_event(&event)? {
        anyhow::bail!("event not found: {event_id}");
    }
    tracing::info!(event_id = %event.id, plan_id = %plan.id, "event updated");
    writeln!(writer, "Updated {} \"{}\"", event.category(), event.title)?;

    let message = format!("Event updated: {} ({})", event.title, event.category());
    after_event_change(writer, &mut db, &plan, Some(&message))
}

pub fn delete<W: Write>(writer: &mut W, args: &DeleteEventArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let user = acting_user(&db, config)?;
    let event_id = EventId::new(args.event_id.clone())?;
    let event = db
        .find_event(&event_id)?
        .with_context(|| format!("event not found: {event_id}"))?;
    let (plan, _) = participant_plan(&db, event.plan_id.as_str(), &user)?;

    db.delete_event(&event.id)?;
    tracing::info!(event_id = %event.id, plan_id = %plan.id, "event deleted");
    writeln!(writer, "Deleted \"{}\" from \"{}\"", event.title, plan.name)?;

    after_event_change(writer, &mut db, &plan, None)
}

/// Zones used to read zone-less `--start` / `--end` values.
struct InputZones {
    start: Tz,
    end: Tz,
}

impl InputZones {
    /// Flights read the start in the origin zone and the end in the
    /// destination zone. Everything else uses the plan zone.
    fn resolve(
        plan: &Plan,
        config: &Config,
        kind: EventType,
        fields: &EventFields,
        current: Option<&wv_core::Event>,
    ) -> Result<Self> {
        let home = parse_zone(
            &plan
                .time_zone
                .clone()
                .unwrap_or_else(|| config.time_zone()),
        )?;
        if !kind.is_flight() {
            return Ok(Self { start: home, end: home });
        }

        let pick = |given: Option<&String>, stored: Option<&String>| -> Result<Tz> {
            given
                .or(stored)
                .map_or(Ok(home), |name| parse_zone(name))
        };
        Ok(Self {
            start: pick(
                fields.origin_time_zone.as_ref(),
                current.and_then(|e| e.origin_time_zone.as_ref()),
            )?,
            end: pick(
                fields.destination_time_zone.as_ref(),
                current.and_then(|e| e.destination_time_zone.as_ref()),
            )?,
        })
    }
}

fn parse_end(fields: &EventFields, tz: Tz) -> Result<Option<EventEnd>> {
    if let Some(duration) = fields.duration.as_deref() {
        return Ok(Some(EventEnd::DurationMinutes(parse_duration(duration)?)));
    }
    fields
        .end
        .as_deref()
        .map(|s| parse_datetime(s, tz).map(EventEnd::At))
        .transpose()
}

/// Re-derives plan dates and tells participants about the change.
///
/// Neither step can fail the command: the event change is already stored.
fn after_event_change<W: Write>(
    writer: &mut W,
    db: &mut Database,
    plan: &Plan,
    message: Option<&str>,
) -> Result<()> {
    match sync_plan_dates(db, &plan.id) {
        Ok(Some(patch)) => write_patch(writer, plan, &patch)?,
        Ok(None) => {}
        Err(err) => tracing::warn!(plan_id = %plan.id, error = %err, "plan date rollup failed"),
    }

    if let Some(message) = message {
        match db.participant_ids(&plan.id) {
            Ok(recipients) => db.notify(&recipients, message, Channel::Email),
            Err(err) => tracing::warn!(plan_id = %plan.id, error = %err, "could not load participants to notify"),
        }
    }
    Ok(())
}

fn write_patch<W: Write>(writer: &mut W, plan: &Plan, patch: &PlanDatePatch) -> Result<()> {
    let tz = display_zone(plan.time_zone.as_deref());
    if let Some(start) = patch.start_date {
        writeln!(writer, "Plan start date is now {}", start.with_timezone(&tz).format("%Y-%m-%d"))?;
    }
    if let Some(end) = patch.end_date {
        writeln!(writer, "Plan end date is now {}", end.with_timezone(&tz).format("%Y-%m-%d"))?;
    }
    Ok(())
}
