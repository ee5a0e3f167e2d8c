//! Plan creation and inspection.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::Args;

use wv_core::{Channel, Notifier, Plan, PlanDraft, PlanKind, Role};

use super::util::{
    acting_user, display_zone, open_database, parse_datetime, parse_zone, participant_plan,
};
use crate::Config;

#[derive(Debug, Args)]
pub struct CreatePlanArgs {
    /// `trip` (travel, needs --destination) or `plan` (venue event, needs --location).
    #[arg(long)]
    pub kind: PlanKind,
    /// Plan name.
    #[arg(long)]
    pub name: String,
    /// Where the trip goes.
    #[arg(long)]
    pub destination: Option<String>,
    /// Where the event takes place.
    #[arg(long)]
    pub location: Option<String>,
    /// IANA home zone (defaults to the configured zone).
    #[arg(long)]
    pub time_zone: Option<String>,
    /// Explicit start (RFC 3339 or local time in the plan zone).
    #[arg(long)]
    pub start: Option<String>,
    /// Explicit end (RFC 3339 or local time in the plan zone).
    #[arg(long)]
    pub end: Option<String>,
    /// Budget amount.
    #[arg(long)]
    pub budget: Option<f64>,
    /// Keep the start date fixed instead of deriving it from events.
    #[arg(long)]
    pub no_auto_start: bool,
    /// Keep the end date fixed instead of deriving it from events.
    #[arg(long)]
    pub no_auto_end: bool,
}

#[derive(Debug, Args)]
pub struct ListPlansArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowPlanArgs {
    /// Plan ID.
    pub plan_id: String,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn create<W: Write>(writer: &mut W, args: &CreatePlanArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let owner = acting_user(&db, config)?;

    let time_zone = args.time_zone.clone().unwrap_or_else(|| config.time_zone());
    let tz = parse_zone(&time_zone)?;

    let mut draft = PlanDraft::new(args.kind, args.name.clone());
    draft.destination.clone_from(&args.destination);
    draft.location.clone_from(&args.location);
    draft.time_zone = Some(time_zone);
    draft.start_date = args.start.as_deref().map(|s| parse_datetime(s, tz)).transpose()?;
    draft.end_date = args.end.as_deref().map(|s| parse_datetime(s, tz)).transpose()?;
    draft.budget = args.budget;
    draft.auto_calculate_start_date = !args.no_auto_start;
    draft.auto_calculate_end_date = !args.no_auto_end;

    let plan = db.create_plan(draft, &owner.id)?;
    tracing::info!(plan_id = %plan.id, kind = %plan.kind, "plan created");

    db.notify(
        &[owner.id.clone()],
        &format!("Your {} \"{}\" has been created! ID: {}", plan.kind, plan.name, plan.id),
        Channel::Email,
    );
    writeln!(writer, "Created {} \"{}\" ({})", plan.kind, plan.name, plan.id)?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, args: &ListPlansArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let user = acting_user(&db, config)?;
    let plans = db.list_plans_for_user(&user.id)?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&plans)?)?;
    } else {
        write!(writer, "{}", format_plan_list(&plans))?;
    }
    Ok(())
}

pub fn show<W: Write>(writer: &mut W, args: &ShowPlanArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let user = acting_user(&db, config)?;
    let (plan, role) = participant_plan(&db, &args.plan_id, &user)?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&plan)?)?;
    } else {
        write!(writer, "{}", format_plan(&plan, role))?;
    }
    Ok(())
}

// ========== Human-Readable Output ==========

fn plan_zone(plan: &Plan) -> Tz {
    display_zone(plan.time_zone.as_deref())
}

fn format_date(date: Option<DateTime<Utc>>, tz: Tz) -> String {
    date.map_or_else(
        || "?".to_string(),
        |d| d.with_timezone(&tz).format("%Y-%m-%d").to_string(),
    )
}

fn format_span(plan: &Plan) -> String {
    if plan.start_date.is_none() && plan.end_date.is_none() {
        return "(no dates yet)".to_string();
    }
    let tz = plan_zone(plan);
    format!(
        "{} → {}",
        format_date(plan.start_date, tz),
        format_date(plan.end_date, tz)
    )
}

pub fn format_plan_list(plans: &[Plan]) -> String {
    let mut output = String::new();
    if plans.is_empty() {
        let _ = writeln!(output, "No plans yet.");
        let _ = writeln!(
            output,
            "Hint: Run 'wv plan create --kind trip --name <name> --destination <place>' to start one."
        );
        return output;
    }

    for plan in plans {
        let _ = writeln!(
            output,
            "{}  {}  {}  {}",
            plan.id,
            plan.kind,
            plan.name,
            format_span(plan)
        );
    }
    output
}

pub fn format_plan(plan: &Plan, role: Role) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{} ({})", plan.name, plan.kind);
    let _ = writeln!(output, "ID:          {}", plan.id);
    match plan.kind {
        PlanKind::Trip => {
            let _ = writeln!(output, "Destination: {}", plan.destination.as_deref().unwrap_or("-"));
        }
        PlanKind::Plan => {
            let _ = writeln!(output, "Location:    {}", plan.location.as_deref().unwrap_or("-"));
        }
    }
    let _ = writeln!(output, "Time zone:   {}", plan.time_zone.as_deref().unwrap_or("-"));

    let mut auto = Vec::new();
    if plan.auto_calculate_start_date {
        auto.push("start");
    }
    if plan.auto_calculate_end_date {
        auto.push("end");
    }
    let auto = if auto.is_empty() {
        "fixed".to_string()
    } else {
        format!("auto {}", auto.join("+"))
    };
    let _ = writeln!(output, "Dates:       {}  [{auto}]", format_span(plan));
    let _ = writeln!(output, "Budget:      {:.2}", plan.budget);
    let _ = writeln!(output, "State:       {}", plan.planning_state);
    let _ = writeln!(output, "Your role:   {role}");
    output
}
