//! Role projections
//!
//! Read-only, serializable views of engine state for the two consumer
//! roles. The vessel operator sees one vessel; the patrol sees the fleet.

use serde::Serialize;

use crate::alerts::{AlertRecord, CommandMessage};
use crate::analysis::{BehaviorAnalysis, RiskScorer};
use crate::engine::MonitoringEngine;
use crate::fleet::{FleetSummary, VesselSnapshot};
use crate::location::LocationStatus;
use crate::monitor::ZoneEvaluation;
use crate::zones::Zone;

/// What the operator of one vessel sees
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorView {
    pub vessel: VesselSnapshot,
    /// Broadcasts and alerts targeted at this vessel, newest first
    pub alerts: Vec<AlertRecord>,
    /// Patrol messages for this vessel, newest first
    pub commands: Vec<CommandMessage>,
    /// Last analysis, nominal until the first pass completes
    pub analysis: BehaviorAnalysis,
    pub analyzing: bool,
    /// Zones the engine evaluates this vessel against
    pub zones: Vec<Zone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluation: Option<ZoneEvaluation>,
    pub tracking: bool,
    pub location_status: LocationStatus,
}

/// Analyzer state of one vessel as seen by the patrol
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselAnalysis {
    pub ais_id: String,
    pub analyzing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<BehaviorAnalysis>,
}

/// What the patrol console sees
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatrolView {
    pub vessels: Vec<VesselSnapshot>,
    pub summary: FleetSummary,
    pub alerts: Vec<AlertRecord>,
    pub commands: Vec<CommandMessage>,
    pub zones: Vec<Zone>,
    pub analyses: Vec<VesselAnalysis>,
    pub tracking: bool,
    pub location_status: LocationStatus,
}

impl<S: RiskScorer> MonitoringEngine<S> {
    /// Operator view of one vessel, `None` when it is not in the fleet
    pub fn operator_view(&self, ais_id: &str) -> Option<OperatorView> {
        let vessel = self.fleet().get(ais_id)?.clone();
        let analyzer = self.analyzer();

        Some(OperatorView {
            alerts: self.alerts().for_vessel(ais_id).into_iter().cloned().collect(),
            commands: self.alerts().commands_for(ais_id).into_iter().cloned().collect(),
            analysis: analyzer.last_analysis(ais_id).cloned().unwrap_or_default(),
            analyzing: analyzer.is_analyzing(ais_id),
            zones: self.active_zones(),
            last_evaluation: self.monitor().last_evaluation(ais_id).cloned(),
            tracking: self.is_tracking(),
            location_status: self.location_status(),
            vessel,
        })
    }

    pub fn patrol_view(&self) -> PatrolView {
        let analyzer = self.analyzer();
        let vessels = self.fleet().vessels().to_vec();
        let analyses = vessels
            .iter()
            .map(|v| VesselAnalysis {
                ais_id: v.ais_id.clone(),
                analyzing: analyzer.is_analyzing(&v.ais_id),
                analysis: analyzer.last_analysis(&v.ais_id).cloned(),
            })
            .collect();

        PatrolView {
            summary: self.fleet().summary(),
            alerts: self.alerts().alerts().cloned().collect(),
            commands: self.alerts().commands().cloned().collect(),
            zones: self.active_zones(),
            analyses,
            tracking: self.is_tracking(),
            location_status: self.location_status(),
            vessels,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::alerts::Priority;
    use crate::analysis::{KinematicScorer, RiskLevel};
    use crate::engine::{EngineSettings, MonitoringEngine};
    use crate::fleet::{SafetyStatus, VesselRegistration};
    use crate::location::PositionSample;
    use crate::zones::ZoneRegistry;

    fn engine() -> MonitoringEngine<KinematicScorer<rand::rngs::StdRng>> {
        let mut engine = MonitoringEngine::new(
            ZoneRegistry::new(),
            KinematicScorer::from_seed(9).with_probabilities(0.0, 0.0),
            EngineSettings::default(),
        );
        engine
            .register_vessel(VesselRegistration::new("A", "FISHER-001"), 0)
            .unwrap();
        engine
            .register_vessel(VesselRegistration::new("B", "FISHER-002").at(40.0, -70.0), 0)
            .unwrap();
        engine
    }

    #[test]
    fn test_operator_sees_own_alerts_only() {
        let mut engine = engine();
        engine.update_position("B", PositionSample::new(37.7749, -122.4194), 10);
        engine.send_command("A", "Routine check: Please confirm your current status", Priority::Low, 20);

        let view = engine.operator_view("A").unwrap();
        assert_eq!(view.vessel.boat_id, "FISHER-001");
        assert_eq!(view.alerts.len(), 1);
        assert!(view.alerts[0].from_patrol);
        assert_eq!(view.commands.len(), 1);
        assert_eq!(view.analysis.risk_level, RiskLevel::Low);
        assert!(!view.analyzing);
        // Static baseline plus the fallback zone following A, first in the fleet
        assert_eq!(view.zones, engine.active_zones());
        assert_eq!(view.zones.len(), 4);
        assert_eq!(view.zones[3].tracked_vessel(), Some("A"));

        assert!(engine.operator_view("missing").is_none());
    }

    #[test]
    fn test_patrol_sees_everything() {
        let mut engine = engine();
        engine.update_position("B", PositionSample::new(37.7749, -122.4194), 10);
        engine.send_command("A", "Weather advisory", Priority::Medium, 20);

        let view = engine.patrol_view();
        assert_eq!(view.vessels.len(), 2);
        assert_eq!(view.summary.total, 2);
        assert_eq!(view.summary.danger, 1);
        // Protected area entry, restricted fishing zone approach, command
        assert_eq!(view.alerts.len(), 3);
        assert_eq!(view.commands.len(), 1);
        assert_eq!(view.analyses.len(), 2);
        assert!(view.analyses.iter().all(|a| a.analysis.is_none()));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["summary"]["danger"], 1);
        assert_eq!(json["locationStatus"], "granted");
    }

    #[test]
    fn test_operator_view_lists_zones_that_flag_the_vessel() {
        let mut engine = MonitoringEngine::new(
            ZoneRegistry::new(),
            KinematicScorer::from_seed(9).with_probabilities(0.0, 0.0),
            EngineSettings::default(),
        );
        engine
            .register_vessel(VesselRegistration::new("A", "FISHER-001").at(10.0, 10.0), 0)
            .unwrap();
        engine
            .register_vessel(VesselRegistration::new("B", "FISHER-002").at(40.0, -70.0), 0)
            .unwrap();
        // About 550 m from A, inside the fallback zone following A
        engine.update_position("B", PositionSample::new(10.0, 10.005), 10);

        let view = engine.operator_view("B").unwrap();
        assert_eq!(view.vessel.status, SafetyStatus::Danger);
        let evaluation = view.last_evaluation.as_ref().unwrap();
        assert!(!evaluation.events.is_empty());
        for event in &evaluation.events {
            assert!(
                view.zones.iter().any(|z| z.label == event.zone),
                "{} missing from the operator view",
                event.zone
            );
        }
        assert!(view.zones.iter().all(|z| z.tracked_vessel() != Some("B")));
    }
}
