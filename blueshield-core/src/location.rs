//! Position source types
//!
//! The position source is external; the core only sees samples and a
//! status flag. Degraded states never stop monitoring, positions simply
//! go stale.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// One sample from a position source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    pub lat: f64,
    pub lng: f64,
    /// Reported accuracy in meters, ignored by the core
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Capture time (milliseconds since epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl PositionSample {
    pub fn new(lat: f64, lng: f64) -> Self {
        PositionSample {
            lat,
            lng,
            accuracy: None,
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// State of the position source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStatus {
    Requesting,
    Granted,
    Denied,
    Unavailable,
    Timeout,
    Unsupported,
}

impl Default for LocationStatus {
    fn default() -> Self {
        LocationStatus::Requesting
    }
}

impl LocationStatus {
    /// True when no fresh positions can be expected
    pub fn is_degraded(self) -> bool {
        matches!(
            self,
            LocationStatus::Denied
                | LocationStatus::Unavailable
                | LocationStatus::Timeout
                | LocationStatus::Unsupported
        )
    }

    pub fn message(self) -> &'static str {
        match self {
            LocationStatus::Requesting => "Requesting location access",
            LocationStatus::Granted => "GPS tracking active",
            LocationStatus::Denied => "Location access denied",
            LocationStatus::Unavailable => "GPS unavailable",
            LocationStatus::Timeout => "Location request timed out",
            LocationStatus::Unsupported => "GPS not supported",
        }
    }
}

impl std::fmt::Display for LocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_states() {
        assert!(!LocationStatus::Granted.is_degraded());
        assert!(!LocationStatus::Requesting.is_degraded());
        assert!(LocationStatus::Denied.is_degraded());
        assert!(LocationStatus::Unsupported.is_degraded());
    }

    #[test]
    fn test_sample_json() {
        let sample: PositionSample =
            serde_json::from_str(r#"{"lat": 13.08, "lng": 80.27, "accuracy": 12.5}"#).unwrap();
        assert_eq!(sample.coordinate(), Coordinate::new(13.08, 80.27));
        assert_eq!(sample.accuracy, Some(12.5));
        assert!(sample.timestamp.is_none());
    }
}
