//! Persistence collaborator and the store-driven itinerary operations.

use std::error::Error as StdError;

use thiserror::Error;

use crate::event::Event;
use crate::itinerary::{Itinerary, ItineraryError, compute_itinerary};
use crate::plan::Plan;
use crate::rollup::{PlanDatePatch, rollup_plan_dates};
use crate::types::PlanId;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Storage the scheduler reads plans and events from.
///
/// No transaction is required: `patch_plan_dates` is a single last-write-wins
/// update.
pub trait PlanStore {
    type Error: StdError + Send + Sync + 'static;

    fn find_plan(&self, plan_id: &PlanId) -> Result<Option<Plan>, Self::Error>;

    /// Events of the plan, ordered by start time then ID.
    fn find_events_by_plan(&self, plan_id: &PlanId) -> Result<Vec<Event>, Self::Error>;

    /// Writes the patched fields. Returns `false` if the plan no longer exists.
    fn patch_plan_dates(
        &mut self,
        plan_id: &PlanId,
        patch: &PlanDatePatch,
    ) -> Result<bool, Self::Error>;
}

/// Failure while applying a plan date rollup.
///
/// Rollups are best-effort: callers log these and keep the event change that
/// triggered them.
#[derive(Debug, Error)]
pub enum RollupError {
    #[error("plan {0} not found")]
    PlanNotFound(PlanId),

    #[error("plan store unavailable during date rollup for plan {plan_id}")]
    UpstreamUnavailable {
        plan_id: PlanId,
        #[source]
        source: BoxError,
    },
}

/// Failure while fetching a plan's itinerary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("plan {0} not found")]
    PlanNotFound(PlanId),

    #[error("failed to load plan {plan_id}")]
    Store {
        plan_id: PlanId,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Itinerary(#[from] ItineraryError),
}

/// Recomputes and stores the plan's auto-calculated dates.
///
/// Returns the patch that was written, or `None` when the plan has no events
/// or has opted out of both dates.
pub fn sync_plan_dates<S: PlanStore>(
    store: &mut S,
    plan_id: &PlanId,
) -> Result<Option<PlanDatePatch>, RollupError> {
    let upstream = |source: S::Error| RollupError::UpstreamUnavailable {
        plan_id: plan_id.clone(),
        source: Box::new(source),
    };

    let plan = store
        .find_plan(plan_id)
        .map_err(upstream)?
        .ok_or_else(|| RollupError::PlanNotFound(plan_id.clone()))?;
    let events = store.find_events_by_plan(plan_id).map_err(upstream)?;

    let Some(patch) = rollup_plan_dates(&plan, &events) else {
        tracing::debug!(%plan_id, "no plan date rollup needed");
        return Ok(None);
    };

    if !store.patch_plan_dates(plan_id, &patch).map_err(upstream)? {
        return Err(RollupError::PlanNotFound(plan_id.clone()));
    }
    tracing::info!(
        %plan_id,
        start_date = ?patch.start_date,
        end_date = ?patch.end_date,
        "plan dates auto-updated"
    );
    Ok(Some(patch))
}

/// Loads a plan with its events and computes the itinerary.
pub fn fetch_itinerary<S: PlanStore>(
    store: &S,
    plan_id: &PlanId,
) -> Result<(Plan, Itinerary), FetchError> {
    let load_failed = |source: S::Error| FetchError::Store {
        plan_id: plan_id.clone(),
        source: Box::new(source),
    };

    let plan = store
        .find_plan(plan_id)
        .map_err(load_failed)?
        .ok_or_else(|| FetchError::PlanNotFound(plan_id.clone()))?;
    let events = store.find_events_by_plan(plan_id).map_err(load_failed)?;
    let itinerary = compute_itinerary(&events, plan.time_zone.as_deref())?;
    Ok((plan, itinerary))
}
