//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;

use wv_core::types::parse_time_zone;
use wv_core::{PermissionError, Plan, PlanId, Role, User};
use wv_db::Database;

use crate::Config;

/// Pre-compiled regex for durations such as `90`, `45m`, `2h` or `1h30m`.
static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d+)h)?\s*(?:(\d+)m?)?$").expect("valid duration regex"));

/// Zone-less formats accepted for local wall-clock times.
const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Upper bound for a single event duration (one year).
const MAX_DURATION_MINUTES: i64 = 366 * 24 * 60;

/// Opens the configured database, creating its directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// Resolves the user commands act as (`--as` or the `user` config key).
pub fn acting_user(db: &Database, config: &Config) -> Result<User> {
    let Some(email) = config.user.as_deref() else {
        bail!("no acting user: pass --as <email> or set `user` in the config file");
    };
    db.find_user_by_email(email)?
        .with_context(|| format!("unknown user: {email}"))
}

/// Loads a plan the user participates in, with their role on it.
pub fn participant_plan(db: &Database, plan_id: &str, user: &User) -> Result<(Plan, Role)> {
    let plan_id = PlanId::new(plan_id)?;
    let plan = db
        .find_plan(&plan_id)?
        .with_context(|| format!("plan not found: {plan_id}"))?;
    let role = db
        .participant_role(&plan_id, &user.id)?
        .ok_or(PermissionError::NotParticipant)?;
    Ok((plan, role))
}

/// Looks up a registered user by email.
pub fn user_by_email(db: &Database, email: &str) -> Result<User> {
    db.find_user_by_email(email)?
        .with_context(|| format!("user not found: {email}"))
}

/// Parses an IANA zone name given on the command line.
pub fn parse_zone(name: &str) -> Result<Tz> {
    Ok(parse_time_zone(name)?)
}

/// Parses a datetime as RFC 3339, or as wall-clock time in `tz`.
///
/// Supports:
/// - RFC 3339: "2025-10-11T03:00:00Z", "2025-10-10T23:00:00-04:00"
/// - Local: "2025-10-11 09:30", "2025-10-11T09:30:00"
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant.
pub fn parse_datetime(s: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let Some(naive) = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    else {
        bail!(
            "Invalid datetime: {s}. Use RFC 3339 (e.g., 2025-10-11T03:00:00Z) or local time (e.g., '2025-10-11 09:30')"
        );
    };

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => bail!("{s} does not exist in {} (DST gap)", tz.name()),
    }
}

/// Parses a duration into whole minutes.
pub fn parse_duration(s: &str) -> Result<i64> {
    let s = s.trim();
    let caps = DURATION_RE
        .captures(s)
        .filter(|_| !s.is_empty())
        .with_context(|| format!("Invalid duration: {s}. Use minutes (90) or hours (1h30m)"))?;

    let hours: i64 = caps
        .get(1)
        .map_or(Ok(0), |m| m.as_str().parse())
        .context("failed to parse hours")?;
    let minutes: i64 = caps
        .get(2)
        .map_or(Ok(0), |m| m.as_str().parse())
        .context("failed to parse minutes")?;

    let total = hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .filter(|total| *total <= MAX_DURATION_MINUTES)
        .with_context(|| format!("Duration too large: {s}"))?;
    if total == 0 {
        bail!("Duration must be positive: {s}");
    }
    Ok(total)
}

/// Zone for displaying stored times. A plan without a zone shows UTC; a
/// stored name that no longer parses is logged and also shows UTC.
pub fn display_zone(name: Option<&str>) -> Tz {
    let Some(name) = name else {
        return Tz::UTC;
    };
    parse_time_zone(name).unwrap_or_else(|err| {
        tracing::warn!(zone = name, error = %err, "showing times in UTC");
        Tz::UTC
    })
}

/// Formats an instant as wall-clock time in `tz`.
pub fn format_local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn display_zone_uses_stored_zone() {
        assert_eq!(display_zone(Some("Asia/Tokyo")), chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn display_zone_falls_back_to_utc() {
        assert_eq!(display_zone(None), Tz::UTC);
        assert_eq!(display_zone(Some("Atlantis/Capital")), Tz::UTC);
    }

    #[test]
    fn parse_datetime_accepts_rfc3339() {
        let dt = parse_datetime("2025-10-10T23:00:00-04:00", chrono_tz::Asia::Tokyo).unwrap();
        assert_eq!(dt, at("2025-10-11T03:00:00Z"));
    }

    #[test]
    fn parse_datetime_reads_local_time_in_zone() {
        let dt = parse_datetime("2025-10-11 09:30", chrono_tz::Europe::London).unwrap();
        assert_eq!(dt, at("2025-10-11T08:30:00Z"));

        let dt = parse_datetime("2025-01-11T09:30:00", chrono_tz::Europe::London).unwrap();
        assert_eq!(dt, at("2025-01-11T09:30:00Z"));
    }

    #[test]
    fn parse_datetime_picks_earlier_instant_when_ambiguous() {
        // 01:30 happens twice in New York on 2025-11-02.
        let dt = parse_datetime("2025-11-02 01:30", chrono_tz::America::New_York).unwrap();
        assert_eq!(dt, at("2025-11-02T05:30:00Z"));
    }

    #[test]
    fn parse_datetime_rejects_dst_gap() {
        let err = parse_datetime("2025-03-09 02:30", chrono_tz::America::New_York).unwrap_err();
        assert!(err.to_string().contains("DST gap"));
    }

    #[test]
    fn parse_datetime_rejects_garbage() {
        assert!(parse_datetime("next tuesday", chrono_tz::UTC).is_err());
    }

    #[test]
    fn parse_duration_variants() {
        assert_eq!(parse_duration("90").unwrap(), 90);
        assert_eq!(parse_duration("45m").unwrap(), 45);
        assert_eq!(parse_duration("2h").unwrap(), 120);
        assert_eq!(parse_duration("1h30m").unwrap(), 90);
        assert_eq!(parse_duration("7h 5m").unwrap(), 425);
    }

    #[test]
    fn parse_duration_rejects_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("99999999h").is_err());
    }

    #[test]
    fn format_local_uses_zone() {
        let instant = at("2025-10-11T10:00:00Z");
        assert_eq!(format_local(instant, chrono_tz::Europe::London), "2025-10-11 11:00");
        assert_eq!(format_local(instant, chrono_tz::Asia::Tokyo), "2025-10-11 19:00");
    }
}
