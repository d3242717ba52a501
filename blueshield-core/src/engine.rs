//! Monitoring Engine
//!
//! Wires the fleet, zone registry, zone monitor, behavior analyzer and
//! alert bus together and owns every deferred task as an explicit deadline.
//! All mutation happens through `&mut self`, so the host runs the engine
//! from a single event context and alert order follows call order.
//!
//! The engine never reads a clock. The host passes `now` (milliseconds
//! since epoch) into every call, sleeps until [`MonitoringEngine::next_deadline`]
//! and then calls [`MonitoringEngine::tick`]:
//!
//! ```rust,ignore
//! let mut engine = MonitoringEngine::new(ZoneRegistry::new(), scorer, EngineSettings::default());
//! engine.start_tracking(now);
//! engine.update_position("987654321", PositionSample::new(37.77, -122.41), now);
//!
//! loop {
//!     sleep_until(engine.next_deadline()).await;
//!     let outcome = engine.tick(clock_now());
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::alerts::{AlertBus, AlertKind, AlertRecord, CommandMessage, Priority, DELIVERY_DELAY};
use crate::analysis::{
    BehaviorAnalysis, BehaviorAnalyzer, RiskLevel, RiskScorer, ANALYSIS_DELAY, ANALYSIS_PERIOD,
};
use crate::fleet::{
    FleetStateStore, SafetyStatus, StatusSource, VesselRegistration, VesselSnapshot, VesselUpdate,
};
use crate::location::{LocationStatus, PositionSample};
use crate::monitor::{ZoneEvaluation, ZoneMonitor};
use crate::zones::{Zone, ZoneRegistry};
use crate::CoreError;

/// Engine tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    pub analysis_period: Duration,
    pub analysis_delay: Duration,
    pub delivery_delay: Duration,
    /// AIS id of the operator's own vessel, followed by the live zone
    pub live_vessel: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            analysis_period: ANALYSIS_PERIOD,
            analysis_delay: ANALYSIS_DELAY,
            delivery_delay: DELIVERY_DELAY,
            live_vessel: None,
        }
    }
}

/// What a call to [`MonitoringEngine::tick`] did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// Vessels that entered the analyzing state
    pub analyses_started: Vec<String>,
    /// Completed analyses
    pub analyses_completed: Vec<(String, BehaviorAnalysis)>,
    /// Commands moved to delivered
    pub delivered: Vec<String>,
}

impl TickOutcome {
    pub fn is_empty(&self) -> bool {
        self.analyses_started.is_empty()
            && self.analyses_completed.is_empty()
            && self.delivered.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum Due {
    AnalysisPass,
    Completion(usize),
    Delivery(usize),
}

pub struct MonitoringEngine<S> {
    settings: EngineSettings,
    fleet: FleetStateStore,
    alerts: AlertBus,
    zones: ZoneRegistry,
    monitor: ZoneMonitor,
    analyzer: BehaviorAnalyzer<S>,
    tracking: bool,
    location_status: LocationStatus,
    next_analysis_at: Option<u64>,
    /// (deadline, AIS id) of in-flight analyses
    pending_completions: Vec<(u64, String)>,
    /// (deadline, command id) of sent commands
    pending_deliveries: Vec<(u64, String)>,
}

impl<S: RiskScorer> MonitoringEngine<S> {
    pub fn new(zones: ZoneRegistry, scorer: S, settings: EngineSettings) -> Self {
        MonitoringEngine {
            settings,
            fleet: FleetStateStore::new(),
            alerts: AlertBus::new(),
            zones,
            monitor: ZoneMonitor::new(),
            analyzer: BehaviorAnalyzer::new(scorer),
            tracking: false,
            location_status: LocationStatus::default(),
            next_analysis_at: None,
            pending_completions: Vec::new(),
            pending_deliveries: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Fleet
    // -------------------------------------------------------------------------

    /// Register a vessel and evaluate its initial position
    pub fn register_vessel(
        &mut self,
        registration: VesselRegistration,
        now: u64,
    ) -> Result<VesselSnapshot, CoreError> {
        let mut snapshot = self.fleet.register(registration, now)?;
        let evaluation = self.evaluate_zones(&snapshot.ais_id, now);
        snapshot.status = evaluation.derived_status;
        snapshot.status_source = StatusSource::Zones;
        Ok(snapshot)
    }

    /// Remove a vessel and everything the engine tracks for it
    pub fn remove_vessel(&mut self, ais_id: &str) -> Option<VesselSnapshot> {
        let ais_id = ais_id.trim();
        let removed = self.fleet.remove(ais_id)?;
        self.analyzer.forget(ais_id);
        self.monitor.forget(ais_id);
        self.pending_completions.retain(|(_, id)| id != ais_id);
        if self.settings.live_vessel.as_deref() == Some(ais_id) {
            self.settings.live_vessel = None;
        }
        Some(removed)
    }

    /// Apply a position sample, then re-evaluate the vessel's zones.
    ///
    /// Unknown vessels are created on first sight.
    pub fn update_position(&mut self, ais_id: &str, sample: PositionSample, now: u64) -> ZoneEvaluation {
        let update = VesselUpdate {
            position: Some(sample.coordinate()),
            timestamp: Some(sample.timestamp.unwrap_or(now)),
            ..Default::default()
        };
        self.apply_update(ais_id, update, now)
    }

    /// Merge a partial update, then re-evaluate the vessel's zones.
    ///
    /// A status carried by the update is written first, so the zone
    /// evaluation that follows has the last word.
    pub fn apply_update(&mut self, ais_id: &str, update: VesselUpdate, now: u64) -> ZoneEvaluation {
        let ais_id = ais_id.trim();
        let has_position = update.position.is_some();
        if self.fleet.upsert(ais_id, update, now).is_none() {
            return ZoneEvaluation::default();
        }
        if has_position && self.location_status != LocationStatus::Granted {
            self.set_location_status(LocationStatus::Granted);
        }
        self.evaluate_zones(ais_id, now)
    }

    /// Patrol status override. The next evaluation may overwrite it.
    pub fn set_status_override(&mut self, ais_id: &str, status: SafetyStatus, now: u64) -> bool {
        let ais_id = ais_id.trim();
        let applied = self.fleet.set_status(ais_id, status, now);
        if applied {
            log::info!("{}: status set to {} by patrol", ais_id, status);
        }
        applied
    }

    fn evaluate_zones(&mut self, ais_id: &str, now: u64) -> ZoneEvaluation {
        let Some(vessel) = self.fleet.get(ais_id) else {
            return ZoneEvaluation::default();
        };
        let zones = self
            .zones
            .active_zones(self.fleet.vessels(), self.settings.live_vessel.as_deref());
        let evaluation = self.monitor.check(vessel, &zones);

        for event in &evaluation.events {
            self.alerts.append(event.to_alert(ais_id, now));
        }
        self.fleet
            .set_derived_status(ais_id, evaluation.derived_status, StatusSource::Zones, now);
        evaluation
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Send a patrol command and schedule its delivery
    pub fn send_command(
        &mut self,
        target_vessel: &str,
        text: &str,
        priority: Priority,
        now: u64,
    ) -> CommandMessage {
        let target_vessel = target_vessel.trim();
        if self.fleet.get(target_vessel).is_none() {
            log::warn!("{}: command sent to unregistered vessel", target_vessel);
        }
        let message = self.alerts.send_command(target_vessel, text, priority, now);
        self.pending_deliveries
            .push((now + millis(self.settings.delivery_delay), message.id.clone()));
        message
    }

    /// Append a broadcast or targeted alert from outside the engine
    pub fn raise_alert(&mut self, record: AlertRecord) {
        self.alerts.append(record);
    }

    // -------------------------------------------------------------------------
    // Tracking and timers
    // -------------------------------------------------------------------------

    /// Start the periodic analysis timer; the first pass is one period from now
    pub fn start_tracking(&mut self, now: u64) {
        if self.tracking {
            return;
        }
        log::info!("tracking started");
        self.tracking = true;
        self.next_analysis_at = Some(now + self.period_ms());
    }

    /// Cancel the analysis timer and any in-flight analyses
    pub fn stop_tracking(&mut self) {
        if !self.tracking {
            return;
        }
        log::info!("tracking stopped");
        self.tracking = false;
        self.next_analysis_at = None;
        self.pending_completions.clear();
        self.analyzer.cancel_all();
    }

    /// Stop tracking and drop every pending deferred task
    pub fn end_session(&mut self) {
        self.stop_tracking();
        self.pending_deliveries.clear();
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<u64> {
        self.next_due().map(|(at, _)| at)
    }

    /// Fire every deadline that is due at `now`, in deadline order
    pub fn tick(&mut self, now: u64) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        while let Some((at, due)) = self.next_due() {
            if at > now {
                break;
            }
            match due {
                Due::AnalysisPass => {
                    self.next_analysis_at = Some(at + self.period_ms());
                    let ids: Vec<String> =
                        self.fleet.vessels().iter().map(|v| v.ais_id.clone()).collect();
                    for ais_id in ids {
                        if self.analyzer.begin(&ais_id, at) {
                            self.pending_completions
                                .push((at + millis(self.settings.analysis_delay), ais_id.clone()));
                            outcome.analyses_started.push(ais_id);
                        }
                    }
                }
                Due::Completion(index) => {
                    let (_, ais_id) = self.pending_completions.remove(index);
                    if let Some(analysis) = self.complete_analysis(&ais_id, now) {
                        outcome.analyses_completed.push((ais_id, analysis));
                    }
                }
                Due::Delivery(index) => {
                    let (_, command_id) = self.pending_deliveries.remove(index);
                    if self.alerts.mark_delivered(&command_id) {
                        outcome.delivered.push(command_id);
                    }
                }
            }
        }

        outcome
    }

    fn next_due(&self) -> Option<(u64, Due)> {
        let pass = self.next_analysis_at.map(|at| (at, Due::AnalysisPass));
        let completions = self
            .pending_completions
            .iter()
            .enumerate()
            .map(|(i, (at, _))| (*at, Due::Completion(i)));
        let deliveries = self
            .pending_deliveries
            .iter()
            .enumerate()
            .map(|(i, (at, _))| (*at, Due::Delivery(i)));

        pass.into_iter()
            .chain(completions)
            .chain(deliveries)
            .min_by_key(|(at, _)| *at)
    }

    /// Finish an analysis pass: score, re-check zones, raise findings and
    /// write the combined status.
    fn complete_analysis(&mut self, ais_id: &str, now: u64) -> Option<BehaviorAnalysis> {
        let vessel = match self.fleet.get(ais_id) {
            Some(vessel) => vessel.clone(),
            None => {
                self.analyzer.cancel(ais_id);
                return None;
            }
        };
        let analysis = self.analyzer.complete(&vessel, now);
        let evaluation = self.evaluate_zones(ais_id, now);

        let risk_floor = if analysis.risk_level == RiskLevel::High {
            let pattern = analysis
                .patterns
                .first()
                .map(String::as_str)
                .unwrap_or("unclassified behavior");
            self.alerts.append(
                AlertRecord::new(
                    AlertKind::Warning,
                    format!("AI ALERT: High risk behavior detected - {}", pattern),
                    now,
                )
                .for_vessel(ais_id),
            );
            SafetyStatus::Warning
        } else {
            SafetyStatus::Safe
        };

        let status = evaluation.derived_status.max(risk_floor);
        if status != evaluation.derived_status {
            self.fleet
                .set_derived_status(ais_id, status, StatusSource::Analyzer, now);
        }
        Some(analysis)
    }

    fn period_ms(&self) -> u64 {
        millis(self.settings.analysis_period).max(1)
    }

    // -------------------------------------------------------------------------
    // Position source
    // -------------------------------------------------------------------------

    pub fn set_location_status(&mut self, status: LocationStatus) {
        if status == self.location_status {
            return;
        }
        if status.is_degraded() {
            log::warn!("position source: {}, positions will go stale", status);
        } else {
            log::info!("position source: {}", status);
        }
        self.location_status = status;
    }

    pub fn location_status(&self) -> LocationStatus {
        self.location_status
    }

    // -------------------------------------------------------------------------
    // Read-only projections
    // -------------------------------------------------------------------------

    pub fn fleet(&self) -> &FleetStateStore {
        &self.fleet
    }

    pub fn alerts(&self) -> &AlertBus {
        &self.alerts
    }

    pub fn zones(&self) -> &ZoneRegistry {
        &self.zones
    }

    /// Zones active right now, with the configured live vessel
    pub fn active_zones(&self) -> Vec<Zone> {
        self.zones
            .active_zones(self.fleet.vessels(), self.settings.live_vessel.as_deref())
    }

    pub fn analyzer(&self) -> &BehaviorAnalyzer<S> {
        &self.analyzer
    }

    pub fn monitor(&self) -> &ZoneMonitor {
        &self.monitor
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn set_live_vessel(&mut self, ais_id: Option<String>) {
        self.settings.live_vessel = ais_id;
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}
