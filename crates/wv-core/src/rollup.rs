//! Plan date rollup from event extremes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::Event;
use crate::plan::Plan;

/// Advisory date update for a plan. Absent fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl PlanDatePatch {
    pub const fn is_empty(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none()
    }
}

/// Derives plan dates from the earliest start and latest end of `events`.
///
/// Each field is only set when the plan opted into auto-calculating it.
/// Returns `None` when there is nothing to write.
pub fn rollup_plan_dates(plan: &Plan, events: &[Event]) -> Option<PlanDatePatch> {
    let earliest_start = events.iter().map(|e| e.start_time).min()?;
    let latest_end = events.iter().map(|e| e.end_time).max()?;

    let patch = PlanDatePatch {
        start_date: plan.auto_calculate_start_date.then_some(earliest_start),
        end_date: plan.auto_calculate_end_date.then_some(latest_end),
    };
    (!patch.is_empty()).then_some(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::event::{EventDraft, EventEnd};
    use crate::event_type::EventType;
    use crate::plan::{PlanDraft, PlanKind};
    use crate::types::{EventId, PlanId, UserId};

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn plan(auto_start: bool, auto_end: bool) -> Plan {
        let mut draft = PlanDraft::new(PlanKind::Trip, "Spring break");
        draft.destination = Some("Lisbon".to_string());
        draft.auto_calculate_start_date = auto_start;
        draft.auto_calculate_end_date = auto_end;
        draft
            .validate(PlanId::new("plan-1").unwrap(), UserId::new("user-1").unwrap())
            .unwrap()
    }

    fn event(id: &str, start: &str, end: &str) -> Event {
        let mut draft = EventDraft::new(PlanId::new("plan-1").unwrap(), id, EventType::Tour);
        draft.start_time = Some(at(start));
        draft.end = Some(EventEnd::At(at(end)));
        draft.validate(EventId::new(id).unwrap()).unwrap()
    }

    fn three_events() -> Vec<Event> {
        vec![
            event("b", "2025-04-02T09:00:00Z", "2025-04-02T18:00:00Z"),
            // Longest-running event is not the last to start.
            event("a", "2025-04-01T09:00:00Z", "2025-04-06T10:00:00Z"),
            event("c", "2025-04-03T09:00:00Z", "2025-04-03T12:00:00Z"),
        ]
    }

    #[test]
    fn empty_events_produce_no_patch() {
        assert_eq!(rollup_plan_dates(&plan(true, true), &[]), None);
    }

    #[test]
    fn both_flags_take_min_start_and_max_end() {
        let patch = rollup_plan_dates(&plan(true, true), &three_events()).unwrap();
        assert_eq!(patch.start_date, Some(at("2025-04-01T09:00:00Z")));
        assert_eq!(patch.end_date, Some(at("2025-04-06T10:00:00Z")));
    }

    #[test]
    fn start_only_flag_patches_start_only() {
        let patch = rollup_plan_dates(&plan(true, false), &three_events()).unwrap();
        assert_eq!(
            patch,
            PlanDatePatch {
                start_date: Some(at("2025-04-01T09:00:00Z")),
                end_date: None,
            }
        );
    }

    #[test]
    fn start_never_patched_when_flag_off() {
        for events in [three_events(), vec![event("solo", "2030-01-01T00:00:00Z", "2030-01-01T01:00:00Z")]] {
            let patch = rollup_plan_dates(&plan(false, true), &events).unwrap();
            assert_eq!(patch.start_date, None);
            assert!(patch.end_date.is_some());
        }
    }

    #[test]
    fn no_flags_means_no_patch() {
        assert_eq!(rollup_plan_dates(&plan(false, false), &three_events()), None);
    }

    #[test]
    fn patch_json_omits_unset_fields() {
        let patch = rollup_plan_dates(&plan(true, false), &three_events()).unwrap();
        let json = serde_json::to_string(&patch).unwrap();
        insta::assert_snapshot!(json, @r#"{"startDate":"2025-04-01T09:00:00Z"}"#);
    }
}
