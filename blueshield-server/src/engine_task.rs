//! Engine subsystem
//!
//! Owns the [`MonitoringEngine`] and is the only place it is mutated.
//! Everything else sends [`EngineCommand`]s over a channel, so all state
//! changes happen in one event context and alert order follows arrival
//! order. Between commands the task sleeps until the engine's next
//! deadline and then ticks it.

use rand::rngs::StdRng;
use std::fmt::Write;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tokio_graceful_shutdown::SubsystemHandle;

use blueshield_core::alerts::QUICK_MESSAGES;
use blueshield_core::{
    KinematicScorer, LocationStatus, MonitoringEngine, PatrolView, PositionSample, TickOutcome,
    VesselUpdate,
};

use crate::console::ConsoleCommand;
use crate::{format_time, now_ms, ServerError};

pub type Engine = MonitoringEngine<KinematicScorer<StdRng>>;

const COMMAND_QUEUE: usize = 64;

// Used when the engine has nothing scheduled
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(Debug)]
pub enum EngineCommand {
    Position {
        ais_id: String,
        sample: PositionSample,
    },
    Update {
        ais_id: String,
        update: VesselUpdate,
    },
    LocationStatus(LocationStatus),
    Console {
        command: ConsoleCommand,
        reply_tx: oneshot::Sender<String>,
    },
    PatrolView {
        reply_tx: oneshot::Sender<PatrolView>,
    },
}

/// Cloneable sender side of the engine subsystem
#[derive(Clone, Debug)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    #[cfg(test)]
    pub(crate) fn from_sender(tx: mpsc::Sender<EngineCommand>) -> Self {
        EngineHandle { tx }
    }

    async fn send(&self, command: EngineCommand) -> Result<(), ServerError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| ServerError::ChannelClosed)
    }

    pub async fn position(&self, ais_id: &str, sample: PositionSample) -> Result<(), ServerError> {
        self.send(EngineCommand::Position {
            ais_id: ais_id.to_string(),
            sample,
        })
        .await
    }

    pub async fn update(&self, ais_id: &str, update: VesselUpdate) -> Result<(), ServerError> {
        self.send(EngineCommand::Update {
            ais_id: ais_id.to_string(),
            update,
        })
        .await
    }

    pub async fn location_status(&self, status: LocationStatus) -> Result<(), ServerError> {
        self.send(EngineCommand::LocationStatus(status)).await
    }

    /// Run a console command and wait for its printable reply
    pub async fn console(&self, command: ConsoleCommand) -> Result<String, ServerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(EngineCommand::Console { command, reply_tx }).await?;
        reply_rx.await.map_err(|_| ServerError::ChannelClosed)
    }

    pub async fn patrol_view(&self) -> Result<PatrolView, ServerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(EngineCommand::PatrolView { reply_tx }).await?;
        reply_rx.await.map_err(|_| ServerError::ChannelClosed)
    }
}

pub struct EngineTask {
    engine: Engine,
    rx: mpsc::Receiver<EngineCommand>,
}

impl EngineTask {
    pub fn new(engine: Engine) -> (Self, EngineHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        (EngineTask { engine, rx }, EngineHandle { tx })
    }

    pub async fn run(mut self, subsys: SubsystemHandle) -> Result<(), ServerError> {
        log::debug!(
            "engine: running with {} vessels, tracking {}",
            self.engine.fleet().len(),
            if self.engine.is_tracking() { "on" } else { "off" }
        );

        loop {
            let deadline = match self.engine.next_deadline() {
                Some(at) => Instant::now() + Duration::from_millis(at.saturating_sub(now_ms())),
                None => Instant::now() + FAR_FUTURE,
            };

            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::debug!("engine: shutdown");
                    self.engine.end_session();
                    return Ok(());
                },

                _ = sleep_until(deadline) => {
                    let outcome = self.engine.tick(now_ms());
                    log_outcome(&outcome);
                },

                r = self.rx.recv() => {
                    match r {
                        Some(command) => self.process(command, now_ms()),
                        None => {
                            log::debug!("engine: all handles dropped");
                            self.engine.end_session();
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    fn process(&mut self, command: EngineCommand, now: u64) {
        match command {
            EngineCommand::Position { ais_id, sample } => {
                self.engine.update_position(&ais_id, sample, now);
            }
            EngineCommand::Update { ais_id, update } => {
                self.engine.apply_update(&ais_id, update, now);
            }
            EngineCommand::LocationStatus(status) => {
                self.engine.set_location_status(status);
            }
            EngineCommand::Console { command, reply_tx } => {
                let reply = self.execute(command, now);
                let _ = reply_tx.send(reply);
            }
            EngineCommand::PatrolView { reply_tx } => {
                let _ = reply_tx.send(self.engine.patrol_view());
            }
        }
    }

    /// Apply a patrol console command and describe the result
    pub fn execute(&mut self, command: ConsoleCommand, now: u64) -> String {
        match command {
            ConsoleCommand::Send {
                ais_id,
                priority,
                text,
            } => {
                let message = self.engine.send_command(&ais_id, &text, priority, now);
                format!("Sent {} ({} priority) to {}", message.id, priority, ais_id)
            }
            ConsoleCommand::Quick { index, ais_id } => match QUICK_MESSAGES.get(index) {
                Some((text, priority)) => {
                    let message = self.engine.send_command(&ais_id, text, *priority, now);
                    format!("Sent {} ({} priority) to {}: {}", message.id, priority, ais_id, text)
                }
                None => format!("No quick message {}", index + 1),
            },
            ConsoleCommand::Status { ais_id, status } => {
                if self.engine.set_status_override(&ais_id, status, now) {
                    format!("{} is now {}", ais_id, status)
                } else {
                    format!("Unknown vessel {}", ais_id)
                }
            }
            ConsoleCommand::Track(true) => {
                self.engine.start_tracking(now);
                "Tracking on".to_string()
            }
            ConsoleCommand::Track(false) => {
                self.engine.stop_tracking();
                "Tracking off".to_string()
            }
            ConsoleCommand::Fleet => self.describe_fleet(),
            ConsoleCommand::Alerts(filter) => self.describe_alerts(filter.as_deref()),
            ConsoleCommand::Help | ConsoleCommand::Quit => String::new(),
        }
    }

    fn describe_fleet(&self) -> String {
        let fleet = self.engine.fleet();
        let summary = fleet.summary();
        let mut out = format!(
            "{} vessels: {} safe, {} warning, {} danger ({})",
            summary.total,
            summary.safe,
            summary.warning,
            summary.danger,
            self.engine.location_status()
        );
        for vessel in fleet.vessels() {
            let analysis = match self.engine.analyzer().last_analysis(&vessel.ais_id) {
                _ if self.engine.analyzer().is_analyzing(&vessel.ais_id) => "analyzing".to_string(),
                Some(a) => format!("{} risk", a.risk_level),
                None => "-".to_string(),
            };
            let _ = write!(
                out,
                "\n  {:<10} {:<11} {:<8} {} {:>5.1} kn {:>3.0}° {} {}",
                vessel.ais_id,
                vessel.boat_id,
                vessel.status.as_str(),
                vessel.coordinate(),
                vessel.speed,
                vessel.heading,
                analysis,
                format_time(vessel.last_update)
            );
        }
        out
    }

    fn describe_alerts(&self, ais_id: Option<&str>) -> String {
        let alerts = match ais_id {
            Some(ais_id) => self.engine.alerts().for_vessel(ais_id),
            None => self.engine.alerts().alerts().collect(),
        };
        if alerts.is_empty() {
            return "No alerts".to_string();
        }
        let mut out = String::new();
        for (i, alert) in alerts.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = write!(
                out,
                "{} [{}] {}{}",
                format_time(alert.timestamp),
                alert.kind,
                alert
                    .target_vessel
                    .as_deref()
                    .map(|t| format!("{}: ", t))
                    .unwrap_or_default(),
                alert.message
            );
        }
        out
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

fn log_outcome(outcome: &TickOutcome) {
    for ais_id in &outcome.analyses_started {
        log::trace!("{}: analysis started", ais_id);
    }
    for (ais_id, analysis) in &outcome.analyses_completed {
        log::debug!(
            "{}: analysis complete, {} risk, {:.0}% confidence",
            ais_id,
            analysis.risk_level,
            analysis.confidence * 100.0
        );
    }
    for command_id in &outcome.delivered {
        log::debug!("engine: command {} delivered", command_id);
    }
}
