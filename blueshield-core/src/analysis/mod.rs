//! Behavior Analysis
//!
//! Periodic risk scoring of a vessel's kinematic state. Each vessel runs a
//! small state machine:
//!
//! ```text
//!   Idle --begin()--> Analyzing --complete()--> Idle (result cached)
//! ```
//!
//! The host enters `Analyzing` on every [`ANALYSIS_PERIOD`] tick and calls
//! `complete` once [`ANALYSIS_DELAY`] has elapsed, so displays can show the
//! transient "analyzing" indicator. Scoring itself is delegated to a
//! [`RiskScorer`], which makes the random placeholder replaceable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

mod scorer;

pub use scorer::*;

use crate::fleet::VesselSnapshot;

/// Interval between analysis passes
pub const ANALYSIS_PERIOD: Duration = Duration::from_secs(10);

/// Time spent in the analyzing state before a result is produced
pub const ANALYSIS_DELAY: Duration = Duration::from_millis(1500);

/// Qualitative risk, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn recommendation(self) -> &'static str {
        match self {
            RiskLevel::High => "Immediate attention required - review current activity",
            RiskLevel::Medium => "Monitor closely - verify operational compliance",
            RiskLevel::Low => "Continue normal operation - all systems nominal",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(s)
    }
}

/// Result of one analysis pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorAnalysis {
    pub risk_level: RiskLevel,
    pub patterns: Vec<String>,
    pub recommendation: String,
    /// Confidence score in [0, 1]
    pub confidence: f64,
}

impl BehaviorAnalysis {
    /// Recommendation is always derived from the risk level
    pub fn new(risk_level: RiskLevel, patterns: Vec<String>, confidence: f64) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        BehaviorAnalysis {
            risk_level,
            patterns,
            recommendation: risk_level.recommendation().to_string(),
            confidence,
        }
    }

    /// Low risk, no patterns. Used before the first pass and whenever a
    /// pass cannot run.
    pub fn nominal() -> Self {
        BehaviorAnalysis::new(RiskLevel::Low, Vec::new(), 0.0)
    }
}

impl Default for BehaviorAnalysis {
    fn default() -> Self {
        Self::nominal()
    }
}

/// Per-vessel analyzer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum AnalyzerPhase {
    Idle,
    #[serde(rename_all = "camelCase")]
    Analyzing { started_at: u64 },
}

impl Default for AnalyzerPhase {
    fn default() -> Self {
        AnalyzerPhase::Idle
    }
}

#[derive(Debug, Clone, Default)]
struct AnalyzerSlot {
    phase: AnalyzerPhase,
    last: Option<BehaviorAnalysis>,
    completed_at: Option<u64>,
}

/// Drives the per-vessel analysis state machines and caches the last
/// result of each for display.
#[derive(Debug)]
pub struct BehaviorAnalyzer<S> {
    scorer: S,
    slots: HashMap<String, AnalyzerSlot>,
}

impl<S: RiskScorer> BehaviorAnalyzer<S> {
    pub fn new(scorer: S) -> Self {
        BehaviorAnalyzer {
            scorer,
            slots: HashMap::new(),
        }
    }

    /// Enter the analyzing state. Returns false when a pass is already in
    /// flight for this vessel.
    pub fn begin(&mut self, ais_id: &str, now: u64) -> bool {
        let slot = self.slots.entry(ais_id.to_string()).or_default();
        match slot.phase {
            AnalyzerPhase::Analyzing { .. } => false,
            AnalyzerPhase::Idle => {
                log::trace!("{}: analyzing", ais_id);
                slot.phase = AnalyzerPhase::Analyzing { started_at: now };
                true
            }
        }
    }

    /// Score the vessel and return to idle, caching the result.
    ///
    /// Completing a vessel that was not analyzing still produces a result.
    pub fn complete(&mut self, vessel: &VesselSnapshot, now: u64) -> BehaviorAnalysis {
        let analysis = self.scorer.analyze(vessel);
        if analysis.risk_level > RiskLevel::Low {
            log::info!(
                "{}: {} risk ({:.0}% confidence): {}",
                vessel.ais_id,
                analysis.risk_level,
                analysis.confidence * 100.0,
                analysis.patterns.join(", ")
            );
        }
        let slot = self.slots.entry(vessel.ais_id.clone()).or_default();
        slot.phase = AnalyzerPhase::Idle;
        slot.last = Some(analysis.clone());
        slot.completed_at = Some(now);
        analysis
    }

    /// Abandon an in-flight pass without producing a result
    pub fn cancel(&mut self, ais_id: &str) {
        if let Some(slot) = self.slots.get_mut(ais_id) {
            slot.phase = AnalyzerPhase::Idle;
        }
    }

    pub fn cancel_all(&mut self) {
        for slot in self.slots.values_mut() {
            slot.phase = AnalyzerPhase::Idle;
        }
    }

    pub fn phase(&self, ais_id: &str) -> AnalyzerPhase {
        self.slots
            .get(ais_id)
            .map(|slot| slot.phase)
            .unwrap_or_default()
    }

    pub fn is_analyzing(&self, ais_id: &str) -> bool {
        matches!(self.phase(ais_id), AnalyzerPhase::Analyzing { .. })
    }

    /// Last completed analysis, if any
    pub fn last_analysis(&self, ais_id: &str) -> Option<&BehaviorAnalysis> {
        self.slots.get(ais_id).and_then(|slot| slot.last.as_ref())
    }

    pub fn last_completed_at(&self, ais_id: &str) -> Option<u64> {
        self.slots.get(ais_id).and_then(|slot| slot.completed_at)
    }

    /// Drop all state for a vessel that left the fleet
    pub fn forget(&mut self, ais_id: &str) {
        self.slots.remove(ais_id);
    }

    pub fn scorer_mut(&mut self) -> &mut S {
        &mut self.scorer
    }
}
