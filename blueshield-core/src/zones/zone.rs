//! Zone definition

use serde::{Deserialize, Serialize};

use crate::geo::{self, Coordinate};
use crate::CoreError;

/// How a zone came to exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ZoneOrigin {
    /// Fixed in place
    Static,
    /// Centered on a vessel, rebuilt every pass
    #[serde(rename_all = "camelCase")]
    Dynamic {
        /// AIS id of the followed vessel
        tracked_vessel: String,
        /// True when following the operator's own (live) vessel
        live: bool,
    },
}

impl Default for ZoneOrigin {
    fn default() -> Self {
        ZoneOrigin::Static
    }
}

/// Circular restricted zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Display name, also carried on alerts
    pub label: String,
    pub center: Coordinate,
    /// Radius in meters
    pub radius: f64,
    #[serde(default)]
    pub origin: ZoneOrigin,
}

impl Zone {
    /// Create a validated static zone
    pub fn new_static(
        label: impl Into<String>,
        center: Coordinate,
        radius: f64,
    ) -> Result<Self, CoreError> {
        let zone = Zone {
            label: label.into(),
            center,
            radius,
            origin: ZoneOrigin::Static,
        };
        zone.validate()?;
        Ok(zone)
    }

    /// Zone following a vessel's current position
    pub fn following(label: impl Into<String>, vessel: &str, center: Coordinate, radius: f64, live: bool) -> Self {
        Zone {
            label: label.into(),
            center,
            radius,
            origin: ZoneOrigin::Dynamic {
                tracked_vessel: vessel.to_string(),
                live,
            },
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.label.trim().is_empty() {
            return Err(CoreError::EmptyZoneLabel);
        }
        if !self.center.is_valid() {
            return Err(CoreError::InvalidCoordinate {
                lat: self.center.lat,
                lng: self.center.lng,
            });
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(CoreError::InvalidRadius {
                label: self.label.clone(),
                radius: self.radius,
            });
        }
        Ok(())
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.origin, ZoneOrigin::Dynamic { .. })
    }

    /// AIS id of the vessel this zone follows, if any
    pub fn tracked_vessel(&self) -> Option<&str> {
        match &self.origin {
            ZoneOrigin::Static => None,
            ZoneOrigin::Dynamic { tracked_vessel, .. } => Some(tracked_vessel),
        }
    }

    /// Distance from the zone center in meters
    pub fn distance_from_center(&self, point: Coordinate) -> f64 {
        geo::distance_m(self.center, point)
    }
}
