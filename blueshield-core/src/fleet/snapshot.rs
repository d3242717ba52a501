//! Vessel snapshot types

use serde::{Deserialize, Serialize};

use super::clamp_speed;
use crate::geo::{self, Coordinate, MS_TO_KN};
use crate::CoreError;

/// Length of an AIS (MMSI) identifier
pub const AIS_ID_DIGITS: usize = 9;

pub const MIN_BOAT_ID_LEN: usize = 3;

/// Safety classification of a vessel, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyStatus {
    Safe,
    Warning,
    Danger,
}

impl Default for SafetyStatus {
    fn default() -> Self {
        SafetyStatus::Safe
    }
}

impl SafetyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SafetyStatus::Safe => "safe",
            SafetyStatus::Warning => "warning",
            SafetyStatus::Danger => "danger",
        }
    }
}

impl std::fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SafetyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "safe" => Ok(SafetyStatus::Safe),
            "warning" => Ok(SafetyStatus::Warning),
            "danger" => Ok(SafetyStatus::Danger),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Which writer set the current status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSource {
    Registration,
    Zones,
    Analyzer,
    Patrol,
    /// A partial update carrying a status
    Update,
}

impl std::fmt::Display for StatusSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusSource::Registration => "registration",
            StatusSource::Zones => "zones",
            StatusSource::Analyzer => "analyzer",
            StatusSource::Patrol => "patrol",
            StatusSource::Update => "update",
        };
        f.write_str(s)
    }
}

/// A position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Capture time (milliseconds since epoch)
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// Latest known state of one vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselSnapshot {
    /// AIS signal identifier, the fleet key
    pub ais_id: String,

    /// Registration number assigned by the authority
    pub boat_id: String,

    pub position: Position,

    /// Speed over ground in knots
    pub speed: f64,

    /// Heading in degrees, [0, 360)
    pub heading: f64,

    pub status: SafetyStatus,

    pub status_source: StatusSource,

    /// Time of the last mutation (milliseconds since epoch)
    pub last_update: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
}

impl VesselSnapshot {
    pub fn coordinate(&self) -> Coordinate {
        self.position.coordinate
    }

    /// Merge a partial update.
    ///
    /// Speed and heading are derived from the previous fix when the update
    /// moves the vessel without reporting them.
    pub(crate) fn apply(&mut self, update: VesselUpdate, now: u64) {
        if let Some(coordinate) = update.position {
            if coordinate.is_valid() {
                let timestamp = update.timestamp.unwrap_or(now);
                let previous = self.position;
                if timestamp > previous.timestamp {
                    let seconds = (timestamp - previous.timestamp) as f64 / 1000.0;
                    let meters = geo::distance_m(previous.coordinate, coordinate);
                    if update.speed.is_none() {
                        self.speed = clamp_speed(meters / seconds * MS_TO_KN);
                    }
                    if update.heading.is_none() && meters > 0.0 {
                        self.heading = geo::bearing(previous.coordinate, coordinate);
                    }
                }
                self.position = Position {
                    coordinate,
                    timestamp,
                };
            } else {
                log::warn!(
                    "{}: ignoring invalid position {}, {}",
                    self.ais_id,
                    coordinate.lat,
                    coordinate.lng
                );
            }
        }
        if let Some(speed) = update.speed {
            self.speed = clamp_speed(speed);
        }
        if let Some(heading) = update.heading {
            if heading.is_finite() {
                self.heading = geo::normalize_heading(heading);
            }
        }
        if let Some(status) = update.status {
            self.status = status;
            self.status_source = StatusSource::Update;
        }
        if let Some(owner) = update.owner {
            self.owner = Some(owner);
        }
        self.last_update = now;
    }
}

/// Registration request from the operator portal or a fleet file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselRegistration {
    pub ais_id: String,
    pub boat_id: String,
    #[serde(default)]
    pub position: Option<Coordinate>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub owner: Option<Owner>,
}

impl VesselRegistration {
    pub fn new(ais_id: impl Into<String>, boat_id: impl Into<String>) -> Self {
        VesselRegistration {
            ais_id: ais_id.into(),
            boat_id: boat_id.into(),
            position: None,
            speed: None,
            heading: None,
            owner: None,
        }
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.position = Some(Coordinate::new(lat, lng));
        self
    }

    pub fn with_kinematics(mut self, speed: f64, heading: f64) -> Self {
        self.speed = Some(speed);
        self.heading = Some(heading);
        self
    }

    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Registration form rules: a 9-digit AIS id and a boat id of at least
    /// three characters, both after trimming.
    ///
    /// [`FleetStateStore::register`](super::FleetStateStore::register) only
    /// requires non-empty ids, since feeds create vessels from whatever id
    /// they carry.
    pub fn validate(&self) -> Result<(), CoreError> {
        let ais_id = self.ais_id.trim();
        if ais_id.len() != AIS_ID_DIGITS || !ais_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidAisId(ais_id.to_string()));
        }
        let boat_id = self.boat_id.trim();
        if boat_id.chars().count() < MIN_BOAT_ID_LEN {
            return Err(CoreError::InvalidBoatId(boat_id.to_string()));
        }
        Ok(())
    }
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VesselUpdate {
    pub position: Option<Coordinate>,
    /// Capture time of `position`, defaults to the update time
    pub timestamp: Option<u64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub status: Option<SafetyStatus>,
    pub owner: Option<Owner>,
}

impl VesselUpdate {
    pub fn position(lat: f64, lng: f64) -> Self {
        VesselUpdate {
            position: Some(Coordinate::new(lat, lng)),
            ..Default::default()
        }
    }

    pub fn captured_at(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_status(mut self, status: SafetyStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Vessel counts per status for the patrol overview
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub total: usize,
    pub safe: usize,
    pub warning: usize,
    pub danger: usize,
}
