//! Itinerary command: a plan's events numbered by day.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use clap::Args;

use wv_core::{Itinerary, ItineraryEvent, Plan, fetch_itinerary};

use super::util::{acting_user, display_zone, open_database, participant_plan};
use crate::Config;

#[derive(Debug, Args)]
pub struct ItineraryArgs {
    /// Plan ID.
    pub plan_id: String,
    /// Output as JSON (`{"events": [...], "grouped": {...}}`).
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &ItineraryArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let user = acting_user(&db, config)?;
    let (plan, _) = participant_plan(&db, &args.plan_id, &user)?;

    let (plan, itinerary) = fetch_itinerary(&db, &plan.id)?;
    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&itinerary)?)?;
    } else {
        write!(writer, "{}", format_itinerary(&plan, &itinerary))?;
    }
    Ok(())
}

// ========== Human-Readable Output ==========

pub fn format_itinerary(plan: &Plan, itinerary: &Itinerary) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{} ({})",
        plan.name,
        plan.time_zone.as_deref().unwrap_or("no home zone")
    );

    if itinerary.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No events scheduled yet.");
        return output;
    }

    for (day, events) in &itinerary.grouped {
        let _ = writeln!(output);
        let first_date = events.first().map(|e| e.local_date.format("%a %Y-%m-%d").to_string());
        let _ = writeln!(output, "Day {day}  {}", first_date.unwrap_or_default());
        for item in events {
            let _ = writeln!(output, "  {}", format_entry(item, plan.time_zone.as_deref()));
        }
    }
    output
}

fn format_entry(item: &ItineraryEvent, plan_time_zone: Option<&str>) -> String {
    let tz = display_zone(Some(&item.relevant_time_zone));
    let start = item.event.start_time.with_timezone(&tz);
    let end = item.event.end_time.with_timezone(&tz);
    let end = if end.date_naive() == start.date_naive() {
        end.format("%H:%M").to_string()
    } else {
        end.format("%m-%d %H:%M").to_string()
    };

    let mut line = format!(
        "{}-{end}  {:<10}  {}",
        start.format("%H:%M"),
        item.event.category(),
        item.event.title
    );
    if plan_time_zone != Some(item.relevant_time_zone.as_str()) {
        let _ = write!(line, "  [{}]", item.relevant_time_zone);
    }
    line
}
