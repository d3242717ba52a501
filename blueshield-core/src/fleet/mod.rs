//! Fleet State
//!
//! This module owns the canonical snapshot of every registered vessel.
//! Snapshots are mutated by position updates, by zone-derived status and
//! by patrol overrides.
//!
//! # Status writers
//!
//! Independent writers set [`SafetyStatus`]: the zone monitor (on every
//! evaluation), the patrol role (via [`FleetStateStore::set_status`]) and
//! partial updates carrying a status. There is no precedence between them,
//! the most recent write wins. The writer is recorded in
//! [`VesselSnapshot::status_source`] for display.
//!
//! # Identity
//!
//! AIS ids are trimmed on every entry point, so `" 987654321 "` and
//! `"987654321"` address the same snapshot. An empty id never creates one.
//!
//! # Example
//!
//! ```rust,ignore
//! use blueshield_core::fleet::{FleetStateStore, VesselRegistration, VesselUpdate};
//!
//! let mut fleet = FleetStateStore::new();
//! fleet.register(VesselRegistration::new("987654321", "FISHER-002"), now)?;
//! fleet.upsert("987654321", VesselUpdate::position(37.78, -122.41), now + 5000);
//! ```

mod snapshot;

pub use snapshot::*;

use crate::geo::{self, Coordinate};
use crate::CoreError;

/// Where a freshly registered vessel is placed until its first fix arrives
pub const REGISTRATION_HARBOUR: Coordinate = Coordinate::new(13.0827, 80.2707);

/// Upper bound for reported speeds
pub const MAX_SPEED_KN: f64 = 25.0;

/// Owner of all vessel snapshots, kept in registration order
#[derive(Debug, Default, Clone)]
pub struct FleetStateStore {
    vessels: Vec<VesselSnapshot>,
}

impl FleetStateStore {
    pub fn new() -> Self {
        FleetStateStore::default()
    }

    /// Snapshots in registration order
    pub fn vessels(&self) -> &[VesselSnapshot] {
        &self.vessels
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn get(&self, ais_id: &str) -> Option<&VesselSnapshot> {
        let ais_id = ais_id.trim();
        self.vessels.iter().find(|v| v.ais_id == ais_id)
    }

    fn get_mut(&mut self, ais_id: &str) -> Option<&mut VesselSnapshot> {
        let ais_id = ais_id.trim();
        self.vessels.iter_mut().find(|v| v.ais_id == ais_id)
    }

    /// Register a vessel.
    ///
    /// Re-registering a known AIS id keeps both identities and only refreshes
    /// the owner metadata.
    pub fn register(
        &mut self,
        registration: VesselRegistration,
        now: u64,
    ) -> Result<VesselSnapshot, CoreError> {
        let ais_id = registration.ais_id.trim();
        let boat_id = registration.boat_id.trim();
        if ais_id.is_empty() {
            return Err(CoreError::EmptyIdentity("AIS id"));
        }
        if boat_id.is_empty() {
            return Err(CoreError::EmptyIdentity("boat id"));
        }
        let position = registration.position.unwrap_or(REGISTRATION_HARBOUR);
        if !position.is_valid() {
            return Err(CoreError::InvalidCoordinate {
                lat: position.lat,
                lng: position.lng,
            });
        }

        if let Some(existing) = self.get_mut(ais_id) {
            if existing.boat_id != boat_id {
                log::warn!(
                    "{}: already registered as {}, ignoring new boat id {}",
                    ais_id,
                    existing.boat_id,
                    boat_id
                );
            }
            if registration.owner.is_some() {
                existing.owner = registration.owner;
            }
            return Ok(existing.clone());
        }

        let snapshot = VesselSnapshot {
            ais_id: ais_id.to_string(),
            boat_id: boat_id.to_string(),
            position: Position {
                coordinate: position,
                timestamp: now,
            },
            speed: clamp_speed(registration.speed.unwrap_or(0.0)),
            heading: geo::normalize_heading(registration.heading.unwrap_or(0.0)),
            status: SafetyStatus::Safe,
            status_source: StatusSource::Registration,
            last_update: now,
            owner: registration.owner,
        };
        log::info!("{}: registered as {}", snapshot.ais_id, snapshot.boat_id);
        self.vessels.push(snapshot.clone());
        Ok(snapshot)
    }

    /// Merge a partial update into the vessel, creating it on first sight.
    ///
    /// An implicitly created vessel uses its AIS id as boat id until a
    /// registration supplies one. Returns `None` for an empty AIS id.
    pub fn upsert(&mut self, ais_id: &str, update: VesselUpdate, now: u64) -> Option<&VesselSnapshot> {
        let ais_id = ais_id.trim();
        if ais_id.is_empty() {
            log::warn!("ignoring vessel update without AIS id");
            return None;
        }
        let index = match self.vessels.iter().position(|v| v.ais_id == ais_id) {
            Some(index) => index,
            None => {
                log::debug!("{}: unknown vessel, creating on first update", ais_id);
                let coordinate = update
                    .position
                    .filter(Coordinate::is_valid)
                    .unwrap_or(REGISTRATION_HARBOUR);
                self.vessels.push(VesselSnapshot {
                    ais_id: ais_id.to_string(),
                    boat_id: ais_id.to_string(),
                    position: Position {
                        coordinate,
                        timestamp: now,
                    },
                    speed: 0.0,
                    heading: 0.0,
                    status: SafetyStatus::Safe,
                    status_source: StatusSource::Registration,
                    last_update: now,
                    owner: None,
                });
                self.vessels.len() - 1
            }
        };

        let vessel = &mut self.vessels[index];
        vessel.apply(update, now);
        Some(vessel)
    }

    /// Patrol override. Unknown vessels are ignored and `false` is returned.
    pub fn set_status(&mut self, ais_id: &str, status: SafetyStatus, now: u64) -> bool {
        self.write_status(ais_id, status, StatusSource::Patrol, now)
    }

    /// Status computed by the zone monitor or analyzer
    pub(crate) fn set_derived_status(
        &mut self,
        ais_id: &str,
        status: SafetyStatus,
        source: StatusSource,
        now: u64,
    ) -> bool {
        self.write_status(ais_id, status, source, now)
    }

    fn write_status(
        &mut self,
        ais_id: &str,
        status: SafetyStatus,
        source: StatusSource,
        now: u64,
    ) -> bool {
        match self.get_mut(ais_id) {
            Some(vessel) => {
                if vessel.status != status {
                    log::debug!(
                        "{}: status {} -> {} ({})",
                        ais_id,
                        vessel.status,
                        status,
                        source
                    );
                }
                vessel.status = status;
                vessel.status_source = source;
                vessel.last_update = now;
                true
            }
            None => {
                log::debug!("{}: status {} for unknown vessel ignored", ais_id, status);
                false
            }
        }
    }

    /// Remove a vessel, e.g. when its operator logs out
    pub fn remove(&mut self, ais_id: &str) -> Option<VesselSnapshot> {
        let ais_id = ais_id.trim();
        let index = self.vessels.iter().position(|v| v.ais_id == ais_id)?;
        log::info!("{}: removed from fleet", ais_id);
        Some(self.vessels.remove(index))
    }

    /// Vessel counts per status
    pub fn summary(&self) -> FleetSummary {
        let mut summary = FleetSummary::default();
        for vessel in &self.vessels {
            match vessel.status {
                SafetyStatus::Safe => summary.safe += 1,
                SafetyStatus::Warning => summary.warning += 1,
                SafetyStatus::Danger => summary.danger += 1,
            }
        }
        summary.total = self.vessels.len();
        summary
    }
}

pub(crate) fn clamp_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed.clamp(0.0, MAX_SPEED_KN)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet_with_two() -> FleetStateStore {
        let mut fleet = FleetStateStore::new();
        fleet
            .register(VesselRegistration::new("987654321", "FISHER-002"), 1000)
            .unwrap();
        fleet
            .register(VesselRegistration::new("456789123", "VESSEL-003"), 1000)
            .unwrap();
        fleet
    }

    #[test]
    fn test_register_defaults() {
        let fleet = fleet_with_two();
        let vessel = fleet.get("987654321").unwrap();
        assert_eq!(vessel.boat_id, "FISHER-002");
        assert_eq!(vessel.position.coordinate, REGISTRATION_HARBOUR);
        assert_eq!(vessel.status, SafetyStatus::Safe);
        assert_eq!(vessel.speed, 0.0);
        assert_eq!(fleet.len(), 2);
    }

    #[test]
    fn test_register_rejects_empty_identity() {
        let mut fleet = FleetStateStore::new();
        assert!(matches!(
            fleet.register(VesselRegistration::new("  ", "FISHER-002"), 0),
            Err(CoreError::EmptyIdentity(_))
        ));
        assert!(matches!(
            fleet.register(VesselRegistration::new("1", ""), 0),
            Err(CoreError::EmptyIdentity(_))
        ));
        assert!(fleet.is_empty());
    }

    #[test]
    fn test_reregister_keeps_identity() {
        let mut fleet = fleet_with_two();
        let owner = Owner {
            name: "Captain Rodriguez".to_string(),
            contact: Some("+1-555-0102".to_string()),
        };
        let snapshot = fleet
            .register(
                VesselRegistration::new("987654321", "OTHER").with_owner(owner.clone()),
                2000,
            )
            .unwrap();
        assert_eq!(snapshot.boat_id, "FISHER-002");
        assert_eq!(snapshot.owner, Some(owner));
        assert_eq!(fleet.len(), 2);
    }

    #[test]
    fn test_upsert_creates_unknown_vessel() {
        let mut fleet = FleetStateStore::new();
        let v = fleet
            .upsert("111", VesselUpdate::position(37.0, -122.0), 500)
            .unwrap();
        assert_eq!(v.ais_id, "111");
        assert_eq!(v.boat_id, "111");
        assert_eq!(v.position.coordinate, Coordinate::new(37.0, -122.0));
        assert_eq!(fleet.len(), 1);
    }

    #[test]
    fn test_upsert_merges_partial_fields() {
        let mut fleet = fleet_with_two();
        fleet.upsert(
            "987654321",
            VesselUpdate::default().with_speed(8.5).with_heading(180.0),
            2000,
        );
        let v = fleet.get("987654321").unwrap();
        assert_eq!(v.speed, 8.5);
        assert_eq!(v.heading, 180.0);
        assert_eq!(v.position.coordinate, REGISTRATION_HARBOUR);
        assert_eq!(v.last_update, 2000);
    }

    #[test]
    fn test_upsert_derives_kinematics() {
        let mut fleet = FleetStateStore::new();
        fleet.upsert("1", VesselUpdate::position(0.0, 0.0), 0);
        // One minute of latitude north in one hour is one knot
        let v = fleet
            .upsert("1", VesselUpdate::position(1.0 / 60.0, 0.0), 3_600_000)
            .unwrap();
        assert!((v.speed - 1.0).abs() < 0.01, "speed {}", v.speed);
        assert!(v.heading.abs() < 1e-6);
    }

    #[test]
    fn test_upsert_ignores_invalid_position() {
        let mut fleet = fleet_with_two();
        fleet.upsert("987654321", VesselUpdate::position(f64::NAN, 0.0), 3000);
        let v = fleet.get("987654321").unwrap();
        assert_eq!(v.position.coordinate, REGISTRATION_HARBOUR);
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut fleet = fleet_with_two();
        fleet.upsert("987654321", VesselUpdate::default().with_speed(40.0), 2000);
        assert_eq!(fleet.get("987654321").unwrap().speed, MAX_SPEED_KN);
        fleet.upsert("987654321", VesselUpdate::default().with_speed(-3.0), 2000);
        assert_eq!(fleet.get("987654321").unwrap().speed, 0.0);
    }

    #[test]
    fn test_set_status_unknown_is_noop() {
        let mut fleet = fleet_with_two();
        assert!(!fleet.set_status("000", SafetyStatus::Danger, 2000));
        assert_eq!(fleet.len(), 2);
        assert_eq!(fleet.summary().danger, 0);
    }

    #[test]
    fn test_last_status_writer_wins() {
        let mut fleet = fleet_with_two();
        assert!(fleet.set_derived_status("987654321", SafetyStatus::Danger, StatusSource::Zones, 1));
        assert!(fleet.set_status("987654321", SafetyStatus::Safe, 2));
        let v = fleet.get("987654321").unwrap();
        assert_eq!(v.status, SafetyStatus::Safe);
        assert_eq!(v.status_source, StatusSource::Patrol);

        fleet.set_derived_status("987654321", SafetyStatus::Warning, StatusSource::Zones, 3);
        assert_eq!(fleet.get("987654321").unwrap().status, SafetyStatus::Warning);
    }

    #[test]
    fn test_remove_and_summary() {
        let mut fleet = fleet_with_two();
        fleet.set_status("456789123", SafetyStatus::Warning, 2);
        let summary = fleet.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.safe, 1);
        assert_eq!(summary.warning, 1);

        assert!(fleet.remove("987654321").is_some());
        assert!(fleet.remove("987654321").is_none());
        assert_eq!(fleet.vessels()[0].ais_id, "456789123");
    }

    #[test]
    fn test_padded_id_addresses_registered_vessel() {
        let mut fleet = FleetStateStore::new();
        fleet
            .register(VesselRegistration::new(" 123456789 ", "FISHER-001"), 0)
            .unwrap();
        let v = fleet
            .upsert(" 123456789 ", VesselUpdate::position(13.1, 80.3), 1000)
            .unwrap();
        assert_eq!(v.ais_id, "123456789");
        assert_eq!(fleet.len(), 1);
        assert_eq!(
            fleet.get("123456789").unwrap().position.coordinate,
            Coordinate::new(13.1, 80.3)
        );

        assert!(fleet.set_status("123456789 ", SafetyStatus::Warning, 2000));
        assert_eq!(fleet.get(" 123456789").unwrap().status, SafetyStatus::Warning);
        assert!(fleet.remove("\t123456789").is_some());
        assert!(fleet.is_empty());
    }

    #[test]
    fn test_upsert_refuses_empty_id() {
        let mut fleet = fleet_with_two();
        assert!(fleet.upsert("", VesselUpdate::position(1.0, 1.0), 10).is_none());
        assert!(fleet.upsert("   ", VesselUpdate::position(1.0, 1.0), 10).is_none());
        assert_eq!(fleet.len(), 2);
        assert!(fleet.get("").is_none());
    }

    #[test]
    fn test_upsert_merges_status() {
        let mut fleet = fleet_with_two();
        let v = fleet
            .upsert(
                "987654321",
                VesselUpdate::position(37.0, -122.0).with_status(SafetyStatus::Warning),
                2000,
            )
            .unwrap();
        assert_eq!(v.status, SafetyStatus::Warning);
        assert_eq!(v.status_source, StatusSource::Update);

        // Updates without a status leave it alone
        fleet.upsert("987654321", VesselUpdate::default().with_speed(3.0), 3000);
        let v = fleet.get("987654321").unwrap();
        assert_eq!(v.status, SafetyStatus::Warning);
        assert_eq!(v.status_source, StatusSource::Update);
    }
}
