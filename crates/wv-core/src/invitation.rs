//! Plan invitations and their response workflow.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::role::Role;
use crate::types::{InvitationId, PlanId, UserId, ValidationError};

/// Lifecycle state of an invitation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl InvitationStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InvitationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" | "accept" => Ok(Self::Accepted),
            "rejected" | "reject" => Ok(Self::Rejected),
            _ => Err(ValidationError::InvalidValue {
                field: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// An offer for a user to join a plan in a given role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: InvitationId,
    pub plan_id: PlanId,
    /// Invitee.
    pub user_id: UserId,
    pub invited_by: UserId,
    pub role: Role,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}

/// Why a response to an invitation was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RespondError {
    #[error("invitation not found or already responded")]
    NotPending,

    #[error("access denied: not your invitation")]
    NotInvitee,

    #[error("response must be accepted or rejected")]
    InvalidResponse,
}

impl Invitation {
    /// Records `responder`'s answer, returning the updated invitation.
    pub fn respond(
        &self,
        responder: &UserId,
        response: InvitationStatus,
    ) -> Result<Self, RespondError> {
        if response == InvitationStatus::Pending {
            return Err(RespondError::InvalidResponse);
        }
        if self.status != InvitationStatus::Pending {
            return Err(RespondError::NotPending);
        }
        if &self.user_id != responder {
            return Err(RespondError::NotInvitee);
        }
        Ok(Self {
            status: response,
            ..self.clone()
        })
    }
}
