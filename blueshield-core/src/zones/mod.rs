//! Restricted Zones
//!
//! This module defines circular restricted zones and the registry that
//! derives the active zone set for an evaluation pass.
//!
//! # Features
//!
//! - Static zones (protected areas, spawning grounds) configured at start
//! - Dynamic zones that follow a vessel, recomputed on every call
//! - Radii always in meters
//!
//! # Example
//!
//! ```rust,ignore
//! use blueshield_core::zones::ZoneRegistry;
//!
//! let registry = ZoneRegistry::new();
//!
//! // Zones for this pass, with the operator's own vessel as the live vessel
//! let zones = registry.active_zones(fleet.vessels(), Some("987654321"));
//! ```

mod registry;
mod zone;

pub use registry::*;
pub use zone::*;
