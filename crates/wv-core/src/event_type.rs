//! Event type enum as the single source of truth for event category strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Flight,
    Car,
    Dining,
    Hotel,
    Tour,
    Attraction,
    Cruise,
    Setup,
    Ceremony,
    Reception,
    Vendor,
    Custom,
}

impl EventType {
    /// All variants, in display order.
    pub const ALL: [Self; 12] = [
        Self::Flight,
        Self::Car,
        Self::Dining,
        Self::Hotel,
        Self::Tour,
        Self::Attraction,
        Self::Cruise,
        Self::Setup,
        Self::Ceremony,
        Self::Reception,
        Self::Vendor,
        Self::Custom,
    ];

    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Car => "car",
            Self::Dining => "dining",
            Self::Hotel => "hotel",
            Self::Tour => "tour",
            Self::Attraction => "attraction",
            Self::Cruise => "cruise",
            Self::Setup => "setup",
            Self::Ceremony => "ceremony",
            Self::Reception => "reception",
            Self::Vendor => "vendor",
            Self::Custom => "custom",
        }
    }

    /// Flights are judged in their destination zone.
    #[must_use]
    pub const fn is_flight(&self) -> bool {
        matches!(self, Self::Flight)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown event type strings.
#[derive(Debug, Clone)]
pub struct UnknownEventType(String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for UnknownEventType {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_variants() {
        for variant in EventType::ALL {
            let s = variant.to_string();
            let parsed: EventType = s.parse().expect("should parse");
            assert_eq!(parsed, variant, "roundtrip failed for {variant:?}");
        }
    }

    #[test]
    fn only_flight_is_flight() {
        let flights: Vec<_> = EventType::ALL.iter().filter(|t| t.is_flight()).collect();
        assert_eq!(flights, vec![&EventType::Flight]);
    }

    #[test]
    fn unknown_type_errors() {
        let result: Result<EventType, _> = "spaceship".parse();
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "unknown event type: spaceship");
    }

    #[test]
    fn deserialize_rejects_unknown_type() {
        let result: Result<EventType, _> = serde_json::from_str("\"teleport\"");
        assert!(result.is_err());
        let parsed: EventType = serde_json::from_str("\"hotel\"").unwrap();
        assert_eq!(parsed, EventType::Hotel);
    }
}
