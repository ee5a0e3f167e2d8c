//! Core domain logic for the WanderVibe planner.
//!
//! This crate contains the fundamental types and logic for:
//! - Itinerary: zone-aware day numbering of a plan's events
//! - Rollup: deriving plan start/end dates from event extremes
//! - Roles: who may invite, remove, and reassign participants
//! - Collaborator traits for plan storage and notifications

pub mod event;
pub mod event_type;
pub mod invitation;
mod itinerary;
pub mod notify;
pub mod plan;
pub mod role;
mod rollup;
mod store;
pub mod types;
pub mod user;

pub use event::{Event, EventDraft, EventEnd, EventPatch, ResourceLinks};
pub use event_type::{EventType, UnknownEventType};
pub use invitation::{Invitation, InvitationStatus, RespondError};
pub use itinerary::{Itinerary, ItineraryError, ItineraryEvent, compute_itinerary};
pub use notify::{Channel, Notifier};
pub use plan::{Plan, PlanDraft, PlanKind, PlanningState};
pub use role::{PermissionError, Role};
pub use rollup::{PlanDatePatch, rollup_plan_dates};
pub use store::{FetchError, PlanStore, RollupError, fetch_itinerary, sync_plan_dates};
pub use types::{CostType, EventId, InvitationId, PlanId, UserId, ValidationError};
pub use user::{NotificationPreferences, User};
