//! Blue Shield Core
//!
//! Platform-independent vessel safety monitoring. This crate contains the
//! zone geometry, fleet state, behavior analysis and alert log shared by
//! the operator and patrol roles. It performs no I/O and never reads a
//! clock: callers pass `now` (milliseconds since the Unix epoch) into every
//! time-dependent operation.
//!
//! # Modules
//!
//! - [`geo`]: great-circle distance and bearing
//! - [`zones`]: restricted zones and the active zone set
//! - [`fleet`]: canonical vessel snapshots
//! - [`analysis`]: per-vessel behavior analysis
//! - [`monitor`]: zone entry/approach evaluation
//! - [`alerts`]: capped alert log and patrol commands
//! - [`engine`]: wires everything together and owns the deadlines
//!
//! # Example
//!
//! ```rust,ignore
//! use blueshield_core::{EngineSettings, KinematicScorer, MonitoringEngine, ZoneRegistry};
//!
//! let mut engine = MonitoringEngine::new(
//!     ZoneRegistry::new(),
//!     KinematicScorer::from_seed(42),
//!     EngineSettings::default(),
//! );
//! engine.register_vessel(VesselRegistration::new("987654321", "FISHER-002"), now)?;
//! engine.start_tracking(now);
//! ```

pub mod alerts;
pub mod analysis;
pub mod engine;
pub mod fleet;
pub mod geo;
pub mod location;
pub mod monitor;
pub mod views;
pub mod zones;

mod error;

pub use error::CoreError;

pub use alerts::{AlertBus, AlertKind, AlertRecord, CommandMessage, DeliveryStatus, Priority};
pub use analysis::{BehaviorAnalysis, BehaviorAnalyzer, KinematicScorer, RiskLevel, RiskScorer};
pub use engine::{EngineSettings, MonitoringEngine, TickOutcome};
pub use fleet::{FleetStateStore, SafetyStatus, VesselRegistration, VesselSnapshot, VesselUpdate};
pub use geo::Coordinate;
pub use location::{LocationStatus, PositionSample};
pub use monitor::{ZoneEvaluation, ZoneEvent, ZoneEventKind, ZoneMonitor};
pub use views::{OperatorView, PatrolView};
pub use zones::{Zone, ZoneRegistry};
