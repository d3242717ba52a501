//! Zone Monitoring
//!
//! Evaluates one vessel's position against the active zones and derives
//! its status for the pass.
//!
//! | Distance `d` to center     | Event   | Status  |
//! |----------------------------|---------|---------|
//! | `d <= r`                   | Entry   | danger  |
//! | `r < d <= 1.5 r`           | Approach| warning |
//! | `d > 1.5 r`                | none    | safe    |
//!
//! Every zone is evaluated independently and the most severe outcome wins,
//! so an entry anywhere keeps the vessel in danger even when other zones
//! only report an approach. Distances and radii are both in meters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::alerts::{AlertKind, AlertRecord};
use crate::fleet::{SafetyStatus, VesselSnapshot};
use crate::zones::Zone;

/// Approach band as a multiple of the zone radius
pub const APPROACH_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneEventKind {
    /// Inside the zone
    Entry,
    /// Inside the approach band around the zone
    Approach,
}

impl ZoneEventKind {
    pub fn status(self) -> SafetyStatus {
        match self {
            ZoneEventKind::Entry => SafetyStatus::Danger,
            ZoneEventKind::Approach => SafetyStatus::Warning,
        }
    }

    pub fn alert_kind(self) -> AlertKind {
        match self {
            ZoneEventKind::Entry => AlertKind::Danger,
            ZoneEventKind::Approach => AlertKind::Warning,
        }
    }
}

/// One zone finding for one vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneEvent {
    pub kind: ZoneEventKind,
    pub zone: String,
    /// Distance to the zone center in meters
    pub distance: f64,
    /// Zone radius in meters
    pub radius: f64,
}

impl ZoneEvent {
    pub fn message(&self) -> String {
        match self.kind {
            ZoneEventKind::Entry => {
                format!("PROHIBITED ZONE ENTRY: Vessel has entered {}", self.zone)
            }
            ZoneEventKind::Approach => format!(
                "ZONE WARNING: Approaching {} - maintain safe distance",
                self.zone
            ),
        }
    }

    /// Alert for the bus, targeted at the evaluated vessel
    pub fn to_alert(&self, ais_id: &str, now: u64) -> AlertRecord {
        AlertRecord::new(self.kind.alert_kind(), self.message(), now)
            .with_zone(self.zone.clone())
            .for_vessel(ais_id)
    }
}

/// Outcome of one evaluation pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneEvaluation {
    pub events: Vec<ZoneEvent>,
    pub derived_status: SafetyStatus,
}

impl ZoneEvaluation {
    pub fn has_entry(&self) -> bool {
        self.events.iter().any(|e| e.kind == ZoneEventKind::Entry)
    }
}

/// Evaluate a vessel against zones.
///
/// A dynamic zone following the evaluated vessel itself is skipped, a
/// vessel can never be inside its own exclusion zone.
pub fn evaluate(vessel: &VesselSnapshot, zones: &[Zone]) -> ZoneEvaluation {
    let position = vessel.coordinate();
    let mut evaluation = ZoneEvaluation::default();

    for zone in zones {
        if zone.tracked_vessel() == Some(vessel.ais_id.as_str()) {
            continue;
        }
        let distance = zone.distance_from_center(position);
        // NaN distances fall through both comparisons and yield no event
        let kind = if distance <= zone.radius {
            ZoneEventKind::Entry
        } else if distance <= zone.radius * APPROACH_FACTOR {
            ZoneEventKind::Approach
        } else {
            continue;
        };

        log::debug!(
            "{}: {:?} {} at {:.0} m (radius {:.0} m)",
            vessel.ais_id,
            kind,
            zone.label,
            distance,
            zone.radius
        );
        evaluation.derived_status = evaluation.derived_status.max(kind.status());
        evaluation.events.push(ZoneEvent {
            kind,
            zone: zone.label.clone(),
            distance,
            radius: zone.radius,
        });
    }

    evaluation
}

/// Runs [`evaluate`] and keeps the last evaluation per vessel for display
#[derive(Debug, Default)]
pub struct ZoneMonitor {
    last: HashMap<String, ZoneEvaluation>,
}

impl ZoneMonitor {
    pub fn new() -> Self {
        ZoneMonitor::default()
    }

    pub fn check(&mut self, vessel: &VesselSnapshot, zones: &[Zone]) -> ZoneEvaluation {
        let evaluation = evaluate(vessel, zones);
        self.last.insert(vessel.ais_id.clone(), evaluation.clone());
        evaluation
    }

    pub fn last_evaluation(&self, ais_id: &str) -> Option<&ZoneEvaluation> {
        self.last.get(ais_id)
    }

    pub fn forget(&mut self, ais_id: &str) {
        self.last.remove(ais_id);
    }
}
