//! Participant roles and the permission rules between them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ValidationError;

/// A participant's role on a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Plan owner. Exactly one per plan.
    VibeCoordinator,
    /// Co-planner who can invite and manage Wanderers.
    VibePlanner,
    /// Traveller along for the ride.
    Wanderer,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VibeCoordinator => "VibeCoordinator",
            Self::VibePlanner => "VibePlanner",
            Self::Wanderer => "Wanderer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VibeCoordinator" | "coordinator" => Ok(Self::VibeCoordinator),
            "VibePlanner" | "planner" => Ok(Self::VibePlanner),
            "Wanderer" | "wanderer" => Ok(Self::Wanderer),
            _ => Err(ValidationError::InvalidValue {
                field: "role",
                value: s.to_string(),
            }),
        }
    }
}

/// A rejected participant action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("access denied: not a plan participant")]
    NotParticipant,

    #[error("only the VibeCoordinator can invite VibePlanners")]
    InvitePlannerRequiresCoordinator,

    #[error("only a VibeCoordinator or VibePlanner can invite Wanderers")]
    InviteWandererRequiresPlanner,

    #[error("the VibeCoordinator role cannot be granted by invitation")]
    CoordinatorNotInvitable,

    #[error("cannot remove yourself")]
    RemoveSelf,

    #[error("cannot remove the VibeCoordinator; reassign the role instead")]
    RemoveCoordinator,

    #[error("VibePlanners can only remove Wanderers")]
    PlannerRemovesWanderersOnly,

    #[error("only the VibeCoordinator can reassign the coordinator role")]
    ReassignRequiresCoordinator,

    #[error("the new VibeCoordinator must currently be a VibePlanner")]
    ReassignTargetNotPlanner,
}

/// Checks whether `inviter` may invite someone as `role`.
pub const fn check_invite(inviter: Role, role: Role) -> Result<(), PermissionError> {
    match (inviter, role) {
        (_, Role::VibeCoordinator) => Err(PermissionError::CoordinatorNotInvitable),
        (Role::VibeCoordinator, _) | (Role::VibePlanner, Role::Wanderer) => Ok(()),
        (_, Role::VibePlanner) => Err(PermissionError::InvitePlannerRequiresCoordinator),
        (Role::Wanderer, Role::Wanderer) => Err(PermissionError::InviteWandererRequiresPlanner),
    }
}

/// Checks whether `caller` may remove `target` from a plan.
pub const fn check_remove(
    caller: Role,
    target: Role,
    removing_self: bool,
) -> Result<(), PermissionError> {
    if removing_self {
        return Err(PermissionError::RemoveSelf);
    }
    match (caller, target) {
        (_, Role::VibeCoordinator) => Err(PermissionError::RemoveCoordinator),
        (Role::VibeCoordinator, _) | (_, Role::Wanderer) => Ok(()),
        _ => Err(PermissionError::PlannerRemovesWanderersOnly),
    }
}

/// Checks whether `caller` may hand the coordinator role to `target`.
pub const fn check_reassign(caller: Role, target: Role) -> Result<(), PermissionError> {
    match (caller, target) {
        (Role::VibeCoordinator, Role::VibePlanner) => Ok(()),
        (Role::VibeCoordinator, _) => Err(PermissionError::ReassignTargetNotPlanner),
        _ => Err(PermissionError::ReassignRequiresCoordinator),
    }
}
