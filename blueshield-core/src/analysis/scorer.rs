//! Risk scoring strategies

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{BehaviorAnalysis, RiskLevel};
use crate::fleet::VesselSnapshot;

/// Speed above which transit is flagged (knots)
pub const HIGH_SPEED_KN: f64 = 15.0;

/// Speed below which a moving vessel is considered drifting (knots)
pub const DRIFT_SPEED_KN: f64 = 2.0;

pub const HIGH_SPEED_PATTERN: &str = "High speed operation detected";
pub const SLOW_DRIFT_PATTERN: &str = "Slow drift pattern - possible fishing activity";
pub const ZONE_APPROACH_PATTERN: &str = "Potential prohibited zone approach";

/// Descriptive patterns the placeholder scorer may attach
pub const PATTERN_CATALOG: [&str; 5] = [
    "Circular movement pattern detected",
    "Consistent heading maintained",
    "Normal transit behavior",
    "Irregular speed variations",
    "Route deviation from planned course",
];

/// Capability that turns one vessel's state into a behavior analysis
pub trait RiskScorer {
    fn analyze(&mut self, vessel: &VesselSnapshot) -> BehaviorAnalysis;
}

impl<F> RiskScorer for F
where
    F: FnMut(&VesselSnapshot) -> BehaviorAnalysis,
{
    fn analyze(&mut self, vessel: &VesselSnapshot) -> BehaviorAnalysis {
        self(vessel)
    }
}

/// Kinematic rules plus stochastic placeholder patterns.
///
/// Speed rules are deterministic. With `pattern_probability` one entry of
/// [`PATTERN_CATALOG`] is appended; with `escalation_probability` the risk
/// is forced to high. Confidence is drawn from [0.7, 1.0], or [0.8, 1.0]
/// for high risk.
#[derive(Debug, Clone)]
pub struct KinematicScorer<R> {
    rng: R,
    pattern_probability: f64,
    escalation_probability: f64,
}

impl KinematicScorer<StdRng> {
    /// Scorer with a deterministic random source
    pub fn from_seed(seed: u64) -> Self {
        KinematicScorer::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> KinematicScorer<R> {
    pub fn new(rng: R) -> Self {
        KinematicScorer {
            rng,
            pattern_probability: 0.3,
            escalation_probability: 0.15,
        }
    }

    /// Override the stochastic probabilities; values are clamped to [0, 1]
    pub fn with_probabilities(mut self, pattern: f64, escalation: f64) -> Self {
        self.pattern_probability = clamp_probability(pattern);
        self.escalation_probability = clamp_probability(escalation);
        self
    }
}

impl<R: Rng> RiskScorer for KinematicScorer<R> {
    fn analyze(&mut self, vessel: &VesselSnapshot) -> BehaviorAnalysis {
        let speed = vessel.speed;
        if !speed.is_finite() {
            log::warn!("{}: speed unavailable, analysis skipped", vessel.ais_id);
            return BehaviorAnalysis::nominal();
        }

        let mut patterns = Vec::new();
        let mut risk = RiskLevel::Low;

        if speed > HIGH_SPEED_KN {
            patterns.push(HIGH_SPEED_PATTERN.to_string());
            risk = risk.max(RiskLevel::Medium);
        }
        if speed > 0.0 && speed < DRIFT_SPEED_KN {
            patterns.push(SLOW_DRIFT_PATTERN.to_string());
            risk = risk.max(RiskLevel::Medium);
        }

        if self.rng.random_bool(self.pattern_probability) {
            let index = self.rng.random_range(0..PATTERN_CATALOG.len());
            patterns.push(PATTERN_CATALOG[index].to_string());
        }

        if self.rng.random_bool(self.escalation_probability) {
            risk = RiskLevel::High;
            patterns.push(ZONE_APPROACH_PATTERN.to_string());
        }

        let confidence = if risk == RiskLevel::High {
            self.rng.random_range(0.8..=1.0)
        } else {
            self.rng.random_range(0.7..=1.0)
        };

        BehaviorAnalysis::new(risk, patterns, confidence)
    }
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::{FleetStateStore, VesselRegistration};

    fn vessel(speed: f64) -> VesselSnapshot {
        let mut fleet = FleetStateStore::new();
        let mut v = fleet
            .register(VesselRegistration::new("123456789", "FISHER-001"), 0)
            .unwrap();
        v.speed = speed;
        v
    }

    fn quiet() -> KinematicScorer<StdRng> {
        KinematicScorer::from_seed(7).with_probabilities(0.0, 0.0)
    }

    #[test]
    fn test_stationary_vessel_is_low_risk() {
        let analysis = quiet().analyze(&vessel(0.0));
        assert_eq!(analysis.risk_level, RiskLevel::Low);
        assert!(analysis.patterns.is_empty());
        assert_eq!(
            analysis.recommendation,
            "Continue normal operation - all systems nominal"
        );
        assert!((0.7..=1.0).contains(&analysis.confidence));
    }

    #[test]
    fn test_high_speed_is_medium_risk() {
        let analysis = quiet().analyze(&vessel(18.0));
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.patterns, vec![HIGH_SPEED_PATTERN.to_string()]);
    }

    #[test]
    fn test_slow_drift_is_medium_risk() {
        let analysis = quiet().analyze(&vessel(1.2));
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.patterns, vec![SLOW_DRIFT_PATTERN.to_string()]);
        assert_eq!(
            analysis.recommendation,
            "Monitor closely - verify operational compliance"
        );
    }

    #[test]
    fn test_boundary_speeds_are_not_flagged() {
        for speed in [2.0, 15.0, 8.5] {
            let analysis = quiet().analyze(&vessel(speed));
            assert_eq!(analysis.risk_level, RiskLevel::Low, "speed {}", speed);
        }
    }

    #[test]
    fn test_forced_escalation() {
        let mut scorer = KinematicScorer::from_seed(1).with_probabilities(0.0, 1.0);
        let analysis = scorer.analyze(&vessel(0.0));
        assert_eq!(analysis.risk_level, RiskLevel::High);
        assert_eq!(analysis.patterns.last().unwrap(), ZONE_APPROACH_PATTERN);
        assert!((0.8..=1.0).contains(&analysis.confidence));
    }

    #[test]
    fn test_forced_catalog_pattern() {
        let mut scorer = KinematicScorer::from_seed(3).with_probabilities(1.0, 0.0);
        let analysis = scorer.analyze(&vessel(0.0));
        assert_eq!(analysis.patterns.len(), 1);
        assert!(PATTERN_CATALOG.contains(&analysis.patterns[0].as_str()));
        assert_eq!(analysis.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_same_seed_same_result() {
        let mut a = KinematicScorer::from_seed(42);
        let mut b = KinematicScorer::from_seed(42);
        for speed in [0.0, 1.0, 20.0] {
            assert_eq!(a.analyze(&vessel(speed)), b.analyze(&vessel(speed)));
        }
    }

    #[test]
    fn test_nan_speed_degrades_to_nominal() {
        let analysis = quiet().analyze(&vessel(f64::NAN));
        assert_eq!(analysis, BehaviorAnalysis::nominal());
    }

    #[test]
    fn test_closure_scorer() {
        let mut scorer = |_: &VesselSnapshot| BehaviorAnalysis::new(RiskLevel::High, vec![], 0.9);
        assert_eq!(scorer.analyze(&vessel(0.0)).risk_level, RiskLevel::High);
    }
}
