//! Blue Shield host process
//!
//! Runs a [`MonitoringEngine`](blueshield_core::MonitoringEngine) inside a
//! tokio runtime. The engine lives in a single subsystem and is only ever
//! touched from there; position feeds, the patrol console and the
//! dashboard talk to it through an [`EngineHandle`].

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use blueshield_core::CoreError;

pub mod config;
pub mod console;
pub mod dashboard;
pub mod engine_task;
pub mod feed;

pub use engine_task::{EngineCommand, EngineHandle, EngineTask};

/// Interval between simulated position updates
pub const FEED_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,

    /// Zone configuration (JSON) replacing the built-in protected areas
    #[arg(long)]
    pub zones: Option<PathBuf>,

    /// Fleet file (JSON list of vessel registrations)
    #[arg(long)]
    pub fleet: Option<PathBuf>,

    /// Seed the demonstration fleet and drive it with simulated positions
    #[arg(long, default_value_t = false)]
    pub simulate: bool,

    /// Replay position samples from a JSON-lines file
    #[arg(long, conflicts_with = "simulate")]
    pub replay: Option<PathBuf>,

    /// AIS id of the operator's own vessel, followed by the live zone
    #[arg(long)]
    pub live_vessel: Option<String>,

    /// Print the patrol dashboard as JSON lines on stdout
    #[arg(long, default_value_t = false)]
    pub output: bool,

    /// Seconds between dashboard lines
    #[arg(long, default_value_t = 5)]
    pub dashboard_interval: u64,

    /// Seed for the analyzer and simulation random sources
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start with tracking (periodic analysis) disabled
    #[arg(long, default_value_t = false)]
    pub no_tracking: bool,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Shutdown")]
    Shutdown,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Engine is no longer running")]
    ChannelClosed,
}

/// Wall clock in milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Render a millisecond timestamp as local wall time for console output
pub fn format_time(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}
