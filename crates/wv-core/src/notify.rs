//! Notification collaborator.
//!
//! Callers notify participants after the core has returned. Delivery is
//! fire-and-forget: implementations log their own failures and never fail the
//! request that triggered them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{UserId, ValidationError};

/// Delivery channel for a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Email,
    Sms,
}

impl Channel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            _ => Err(ValidationError::InvalidValue {
                field: "channel",
                value: s.to_string(),
            }),
        }
    }
}

/// Something that can tell users about changes to their plans.
pub trait Notifier {
    /// Sends `message` to every recipient. Must not fail the caller.
    fn notify(&self, recipients: &[UserId], message: &str, channel: Channel);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_roundtrip() {
        for channel in [Channel::Email, Channel::Sms] {
            assert_eq!(channel.as_str().parse::<Channel>().unwrap(), channel);
        }
        assert!("pigeon".parse::<Channel>().is_err());
    }
}
