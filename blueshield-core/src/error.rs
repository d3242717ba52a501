use thiserror::Error;

/// Errors raised while building zones or registering vessels.
///
/// Monitoring itself never fails; these only surface from configuration
/// and registration paths.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Zone '{label}' has invalid radius {radius} m")]
    InvalidRadius { label: String, radius: f64 },
    #[error("Invalid coordinate {lat}, {lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },
    #[error("Zone label must not be empty")]
    EmptyZoneLabel,
    #[error("Vessel {0} must not be empty")]
    EmptyIdentity(&'static str),
    #[error("AIS id '{0}' must be exactly 9 digits")]
    InvalidAisId(String),
    #[error("Boat id '{0}' must be at least 3 characters")]
    InvalidBoatId(String),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
