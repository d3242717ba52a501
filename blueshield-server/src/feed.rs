//! Position feeds
//!
//! Two sources stand in for a live position provider:
//!
//! - [`SimulatedFeed`] nudges every vessel of a fleet by a small random
//!   step every [`FEED_INTERVAL`](crate::FEED_INTERVAL)
//! - [`ReplayFeed`] plays back recorded samples from a JSON-lines file
//!
//! A feed that cannot run, or a replay that reaches the end of its file,
//! reports a degraded [`LocationStatus`] to the engine and ends; monitoring
//! continues on the last known positions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::cmp::min;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{sleep_until, Instant};
use tokio_graceful_shutdown::SubsystemHandle;

use blueshield_core::fleet::MAX_SPEED_KN;
use blueshield_core::geo::{normalize_heading, Coordinate};
use blueshield_core::{LocationStatus, PositionSample, VesselRegistration, VesselUpdate};

use crate::{now_ms, EngineHandle, ServerError, FEED_INTERVAL};

/// Largest position step per update, in degrees of latitude and longitude
pub const POSITION_STEP: f64 = 0.0005;

/// Largest speed change per update (knots)
pub const SPEED_STEP: f64 = 1.0;

/// Largest heading change per update (degrees)
pub const HEADING_STEP: f64 = 10.0;

/// Kinematic state of one simulated vessel
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedVessel {
    pub ais_id: String,
    pub position: Coordinate,
    pub speed: f64,
    pub heading: f64,
}

impl SimulatedVessel {
    pub fn from_registration(registration: &VesselRegistration) -> Self {
        SimulatedVessel {
            ais_id: registration.ais_id.clone(),
            position: registration
                .position
                .unwrap_or(blueshield_core::fleet::REGISTRATION_HARBOUR),
            speed: registration.speed.unwrap_or(0.0),
            heading: registration.heading.unwrap_or(0.0),
        }
    }

    /// Apply one random step
    pub fn drift<R: Rng>(&mut self, rng: &mut R) {
        self.position = self.position.offset(
            rng.random_range(-POSITION_STEP..=POSITION_STEP),
            rng.random_range(-POSITION_STEP..=POSITION_STEP),
        );
        self.speed = (self.speed + rng.random_range(-SPEED_STEP..=SPEED_STEP)).clamp(0.0, MAX_SPEED_KN);
        self.heading = normalize_heading(self.heading + rng.random_range(-HEADING_STEP..=HEADING_STEP));
    }

    fn update(&self, now: u64) -> VesselUpdate {
        VesselUpdate::position(self.position.lat, self.position.lng)
            .captured_at(now)
            .with_speed(self.speed)
            .with_heading(self.heading)
    }
}

pub struct SimulatedFeed {
    vessels: Vec<SimulatedVessel>,
    rng: StdRng,
    engine: EngineHandle,
}

impl SimulatedFeed {
    pub fn new(registrations: &[VesselRegistration], seed: Option<u64>, engine: EngineHandle) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        SimulatedFeed {
            vessels: registrations.iter().map(SimulatedVessel::from_registration).collect(),
            rng,
            engine,
        }
    }

    pub async fn run(mut self, subsys: SubsystemHandle) -> Result<(), ServerError> {
        log::info!("feed: simulating {} vessels", self.vessels.len());
        let mut next = Instant::now() + FEED_INTERVAL;

        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::debug!("feed: shutdown");
                    return Ok(());
                },

                _ = sleep_until(next) => {
                    next += FEED_INTERVAL;
                    let now = now_ms();
                    for vessel in &mut self.vessels {
                        vessel.drift(&mut self.rng);
                        log::trace!(
                            "{}: simulated {} {:.1} kn {:.0}°",
                            vessel.ais_id,
                            vessel.position,
                            vessel.speed,
                            vessel.heading
                        );
                        self.engine.update(&vessel.ais_id, vessel.update(now)).await?;
                    }
                },
            }
        }
    }
}

/// One line of a replay file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRecord {
    pub ais_id: String,
    #[serde(flatten)]
    pub sample: PositionSample,
}

impl ReplayRecord {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Wait between two consecutive samples: the recorded gap, capped at one
/// feed interval. Samples without timestamps are spaced one interval apart.
pub fn replay_delay(previous: Option<u64>, current: Option<u64>) -> Duration {
    match (previous, current) {
        (Some(previous), Some(current)) => min(
            Duration::from_millis(current.saturating_sub(previous)),
            FEED_INTERVAL,
        ),
        _ => FEED_INTERVAL,
    }
}

pub struct ReplayFeed {
    path: PathBuf,
    engine: EngineHandle,
}

impl ReplayFeed {
    pub fn new(path: PathBuf, engine: EngineHandle) -> Self {
        ReplayFeed { path, engine }
    }

    pub async fn run(self, subsys: SubsystemHandle) -> Result<(), ServerError> {
        let file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) => {
                log::error!("feed: cannot open {}: {}", self.path.display(), e);
                self.engine.location_status(LocationStatus::Unavailable).await?;
                return Ok(());
            }
        };
        log::info!("feed: replaying {}", self.path.display());

        let mut lines = BufReader::new(file).lines();
        let mut previous: Option<u64> = None;
        let mut started = false;
        let mut line_number = 0;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let record = match ReplayRecord::parse(&line) {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("feed: {}:{}: {}", self.path.display(), line_number, e);
                    continue;
                }
            };

            let delay = if started {
                replay_delay(previous, record.sample.timestamp)
            } else {
                Duration::ZERO
            };
            started = true;
            previous = record.sample.timestamp;

            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::debug!("feed: shutdown");
                    return Ok(());
                },
                _ = sleep_until(Instant::now() + delay) => {
                    self.engine.position(&record.ais_id, record.sample).await?;
                },
            }
        }

        log::info!("feed: replay of {} finished", self.path.display());
        self.engine.location_status(LocationStatus::Unavailable).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineCommand;
    use std::io::Write;
    use tokio::sync::mpsc;
    use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};

    #[test]
    fn test_drift_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let start = SimulatedVessel {
            ais_id: "987654321".to_string(),
            position: Coordinate::new(37.7849, -122.4194),
            speed: 24.5,
            heading: 355.0,
        };
        let mut vessel = start.clone();
        for _ in 0..100 {
            let before = vessel.clone();
            vessel.drift(&mut rng);
            assert!((vessel.position.lat - before.position.lat).abs() <= POSITION_STEP + 1e-12);
            assert!((vessel.position.lng - before.position.lng).abs() <= POSITION_STEP + 1e-12);
            assert!((0.0..=MAX_SPEED_KN).contains(&vessel.speed));
            assert!((0.0..360.0).contains(&vessel.heading));
        }
        assert_ne!(vessel, start);
    }

    #[test]
    fn test_drift_is_deterministic_with_seed() {
        let registration = VesselRegistration::new("A", "FISHER-001")
            .at(13.0, 80.0)
            .with_kinematics(5.0, 90.0);
        let mut a = SimulatedVessel::from_registration(&registration);
        let mut b = a.clone();
        a.drift(&mut StdRng::seed_from_u64(1));
        b.drift(&mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_replay_record_parse() {
        let record =
            ReplayRecord::parse(r#"{"aisId":"456789123","lat":37.7649,"lng":-122.4294,"timestamp":1000}"#)
                .unwrap();
        assert_eq!(record.ais_id, "456789123");
        assert_eq!(record.sample.coordinate(), Coordinate::new(37.7649, -122.4294));
        assert_eq!(record.sample.timestamp, Some(1000));
        assert!(record.sample.accuracy.is_none());

        assert!(ReplayRecord::parse(r#"{"lat":1,"lng":2}"#).is_err());
    }

    #[test]
    fn test_replay_delay() {
        assert_eq!(replay_delay(None, Some(5)), FEED_INTERVAL);
        assert_eq!(replay_delay(Some(1000), Some(3000)), Duration::from_secs(2));
        assert_eq!(replay_delay(Some(0), Some(60_000)), FEED_INTERVAL);
        assert_eq!(replay_delay(Some(1000), None), FEED_INTERVAL);
        // Out-of-order timestamps do not wait
        assert_eq!(replay_delay(Some(3000), Some(1000)), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_finished_replay_degrades_location_status() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"aisId":"456789123","lat":37.7649,"lng":-122.4294,"timestamp":1000}}"#
        )
        .unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let feed = ReplayFeed::new(file.path().to_path_buf(), EngineHandle::from_sender(tx));
        Toplevel::new(move |s: SubsystemHandle| async move {
            s.start(SubsystemBuilder::new("feed", |a| feed.run(a)));
        })
        .handle_shutdown_requests(Duration::from_secs(1))
        .await
        .unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(EngineCommand::Position { ais_id, .. }) if ais_id == "456789123"
        ));
        assert!(matches!(
            rx.recv().await,
            Some(EngineCommand::LocationStatus(LocationStatus::Unavailable))
        ));
    }
}
