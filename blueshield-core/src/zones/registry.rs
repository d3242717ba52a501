//! Active zone derivation

use serde::{Deserialize, Serialize};

use super::{Zone, ZoneOrigin};
use crate::fleet::VesselSnapshot;
use crate::geo::Coordinate;
use crate::CoreError;

pub const MARINE_PROTECTED_AREA: &str = "Marine Protected Area";
pub const SPAWNING_GROUND: &str = "Spawning Ground";
pub const RESTRICTED_FISHING_ZONE: &str = "Restricted Fishing Zone";

/// Radius of the zone following the operator's own vessel (meters)
pub const LIVE_ZONE_RADIUS: f64 = 1500.0;

/// Radius of the fallback zone following the first vessel in the fleet (meters)
pub const FALLBACK_ZONE_RADIUS: f64 = 1200.0;

/// Settings for the vessel-following zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicZoneSettings {
    pub enabled: bool,
    pub live_label: String,
    pub live_radius: f64,
    pub fallback_label: String,
    pub fallback_radius: f64,
}

impl Default for DynamicZoneSettings {
    fn default() -> Self {
        DynamicZoneSettings {
            enabled: true,
            live_label: "Live Vessel Restricted Zone".to_string(),
            live_radius: LIVE_ZONE_RADIUS,
            fallback_label: "Dynamic Restricted Fishing Zone".to_string(),
            fallback_radius: FALLBACK_ZONE_RADIUS,
        }
    }
}

/// Zone configuration file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneConfig {
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub dynamic: Option<DynamicZoneSettings>,
}

/// Source of the zone set for each evaluation pass.
///
/// Holds only the static baseline; dynamic zones are never stored but
/// derived from the fleet passed to [`ZoneRegistry::active_zones`].
#[derive(Debug, Clone)]
pub struct ZoneRegistry {
    static_zones: Vec<Zone>,
    dynamic: DynamicZoneSettings,
}

impl Default for ZoneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneRegistry {
    /// Registry with the baseline protected area, spawning ground and
    /// restricted fishing zone
    pub fn new() -> Self {
        ZoneRegistry {
            static_zones: baseline_zones(),
            dynamic: DynamicZoneSettings::default(),
        }
    }

    /// Registry with a custom static set; every zone is validated
    pub fn with_static_zones(zones: Vec<Zone>) -> Result<Self, CoreError> {
        for zone in &zones {
            zone.validate()?;
        }
        Ok(ZoneRegistry {
            static_zones: zones,
            dynamic: DynamicZoneSettings::default(),
        })
    }

    pub fn with_dynamic_settings(mut self, settings: DynamicZoneSettings) -> Result<Self, CoreError> {
        for (label, radius) in [
            (&settings.live_label, settings.live_radius),
            (&settings.fallback_label, settings.fallback_radius),
        ] {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(CoreError::InvalidRadius {
                    label: label.clone(),
                    radius,
                });
            }
        }
        self.dynamic = settings;
        Ok(self)
    }

    /// Parse a [`ZoneConfig`] JSON document
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: ZoneConfig = serde_json::from_str(json)?;
        let registry = Self::with_static_zones(config.zones)?;
        match config.dynamic {
            Some(settings) => registry.with_dynamic_settings(settings),
            None => Ok(registry),
        }
    }

    pub fn static_zones(&self) -> &[Zone] {
        &self.static_zones
    }

    pub fn dynamic_settings(&self) -> &DynamicZoneSettings {
        &self.dynamic
    }

    /// Zones active for one pass.
    ///
    /// The static baseline plus at most one dynamic zone: centered on the
    /// live vessel when it is part of the fleet, otherwise on the first
    /// vessel in fleet order.
    pub fn active_zones(&self, fleet: &[VesselSnapshot], live_vessel: Option<&str>) -> Vec<Zone> {
        let mut zones = self.static_zones.clone();
        if !self.dynamic.enabled {
            return zones;
        }

        let live = live_vessel.and_then(|id| fleet.iter().find(|v| v.ais_id == id));
        if let Some(vessel) = live {
            zones.push(Zone::following(
                self.dynamic.live_label.clone(),
                &vessel.ais_id,
                vessel.coordinate(),
                self.dynamic.live_radius,
                true,
            ));
        } else if let Some(vessel) = fleet.first() {
            zones.push(Zone::following(
                self.dynamic.fallback_label.clone(),
                &vessel.ais_id,
                vessel.coordinate(),
                self.dynamic.fallback_radius,
                false,
            ));
        }
        zones
    }
}

fn baseline_zones() -> Vec<Zone> {
    vec![
        Zone {
            label: MARINE_PROTECTED_AREA.to_string(),
            center: Coordinate::new(37.7749, -122.4194),
            radius: 1000.0,
            origin: ZoneOrigin::Static,
        },
        Zone {
            label: SPAWNING_GROUND.to_string(),
            center: Coordinate::new(37.7849, -122.4094),
            radius: 800.0,
            origin: ZoneOrigin::Static,
        },
        Zone {
            label: RESTRICTED_FISHING_ZONE.to_string(),
            center: Coordinate::new(37.7649, -122.4294),
            radius: 1200.0,
            origin: ZoneOrigin::Static,
        },
    ]
}
