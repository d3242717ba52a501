//! Startup configuration
//!
//! Zone and fleet files are plain JSON, read once at startup and never
//! written back.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use blueshield_core::fleet::Owner;
use blueshield_core::{VesselRegistration, ZoneRegistry};

/// Load a zone configuration, or the built-in protected areas without a file
pub fn load_zones(path: Option<&Path>) -> Result<ZoneRegistry> {
    let Some(path) = path else {
        return Ok(ZoneRegistry::new());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read zone file {}", path.display()))?;
    let registry = ZoneRegistry::from_json(&json)
        .with_context(|| format!("Invalid zone file {}", path.display()))?;
    log::info!(
        "Loaded {} zones from {}",
        registry.static_zones().len(),
        path.display()
    );
    Ok(registry)
}

/// Load a JSON list of vessel registrations
pub fn load_fleet(path: &Path) -> Result<Vec<VesselRegistration>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read fleet file {}", path.display()))?;
    let fleet: Vec<VesselRegistration> = serde_json::from_str(&json)
        .with_context(|| format!("Invalid fleet file {}", path.display()))?;
    for registration in &fleet {
        registration
            .validate()
            .with_context(|| format!("Invalid fleet file {}", path.display()))?;
    }
    log::info!("Loaded {} vessels from {}", fleet.len(), path.display());
    Ok(fleet)
}

fn owner(name: &str, contact: &str) -> Owner {
    Owner {
        name: name.to_string(),
        contact: Some(contact.to_string()),
    }
}

/// Demonstration fleet used with `--simulate` when no fleet file is given
pub fn demo_fleet() -> Vec<VesselRegistration> {
    vec![
        VesselRegistration::new("987654321", "FISHER-002")
            .at(37.7849, -122.4194)
            .with_kinematics(8.5, 180.0)
            .with_owner(owner("Captain Rodriguez", "+1-555-0102")),
        VesselRegistration::new("456789123", "VESSEL-003")
            .at(37.7649, -122.4294)
            .with_kinematics(12.3, 90.0)
            .with_owner(owner("Captain Chen", "+1-555-0103")),
        VesselRegistration::new("789123456", "BOAT-004")
            .at(37.7949, -122.4094)
            .with_kinematics(6.7, 270.0)
            .with_owner(owner("Captain Johnson", "+1-555-0104")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_zones_without_file() {
        let registry = load_zones(None).unwrap();
        assert_eq!(registry.static_zones().len(), 3);
    }

    #[test]
    fn test_load_zones_file() {
        let file = file_with(
            r#"{"zones": [
                {"label": "Harbour Exclusion", "center": {"lat": 13.09, "lng": 80.29}, "radius": 500},
                {"label": "Reef", "center": {"lat": 13.2, "lng": 80.3}, "radius": 1200}
            ]}"#,
        );
        let registry = load_zones(Some(file.path())).unwrap();
        assert_eq!(registry.static_zones().len(), 2);
        assert_eq!(registry.static_zones()[1].label, "Reef");
        assert!(registry.dynamic_settings().enabled);
    }

    #[test]
    fn test_load_zones_rejects_invalid_radius() {
        let file = file_with(
            r#"{"zones": [{"label": "Bad", "center": {"lat": 0, "lng": 0}, "radius": 0}]}"#,
        );
        let err = load_zones(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid radius"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("zones.json");
        assert!(load_zones(Some(&missing)).is_err());
        assert!(load_fleet(&missing).is_err());
    }

    #[test]
    fn test_load_fleet_file() {
        let file = file_with(
            r#"[
                {"aisId": "111111111", "boatId": "FISHER-010"},
                {"aisId": "222222222", "boatId": "FISHER-011",
                 "position": {"lat": 13.1, "lng": 80.3}, "speed": 4.0, "heading": 45}
            ]"#,
        );
        let fleet = load_fleet(file.path()).unwrap();
        assert_eq!(fleet.len(), 2);
        assert!(fleet[0].position.is_none());
        assert_eq!(fleet[1].speed, Some(4.0));
    }

    #[test]
    fn test_load_fleet_rejects_malformed_ids() {
        let file = file_with(r#"[{"aisId": "12345", "boatId": "FISHER-010"}]"#);
        let err = load_fleet(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("9 digits"));

        let file = file_with(r#"[{"aisId": "111111111", "boatId": "F1"}]"#);
        assert!(load_fleet(file.path()).is_err());
    }

    #[test]
    fn test_demo_fleet() {
        let fleet = demo_fleet();
        assert!(fleet.iter().all(|v| v.validate().is_ok()));
        assert_eq!(fleet.len(), 3);
        assert!(fleet.iter().all(|v| v.position.is_some() && v.owner.is_some()));
        assert_eq!(fleet[2].boat_id, "BOAT-004");
    }
}
