//! Patrol dashboard output
//!
//! Periodically prints the patrol view as one JSON document per line, for
//! an external display to consume. Nothing else is written to stdout while
//! the dashboard runs.

use std::io::Write;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_graceful_shutdown::SubsystemHandle;

use blueshield_core::PatrolView;

use crate::{EngineHandle, ServerError};

/// Write one view as a single JSON line
pub fn write_view<W: Write>(out: &mut W, view: &PatrolView) -> Result<(), ServerError> {
    let line = serde_json::to_string(view)?;
    writeln!(out, "{}", line)?;
    out.flush()?;
    Ok(())
}

pub struct Dashboard {
    engine: EngineHandle,
    interval: Duration,
}

impl Dashboard {
    pub fn new(engine: EngineHandle, interval: Duration) -> Self {
        Dashboard {
            engine,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    pub async fn run(self, subsys: SubsystemHandle) -> Result<(), ServerError> {
        log::debug!("dashboard: every {:?}", self.interval);
        let mut next = Instant::now();

        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::debug!("dashboard: shutdown");
                    return Ok(());
                },

                _ = sleep_until(next) => {
                    next += self.interval;
                    let view = self.engine.patrol_view().await?;
                    write_view(&mut std::io::stdout().lock(), &view)?;
                },
            }
        }
    }
}
