use clap::Parser;
use miette::Result;
use std::time::Duration;
use tokio_graceful_shutdown::{SubsystemBuilder, SubsystemHandle, Toplevel};

use blueshield_core::{
    EngineSettings, KinematicScorer, LocationStatus, MonitoringEngine, VesselRegistration,
};
use blueshield_server::console::{Console, ReplyOutput};
use blueshield_server::dashboard::Dashboard;
use blueshield_server::feed::{ReplayFeed, SimulatedFeed};
use blueshield_server::{config, now_ms, Cli, EngineTask};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .parse_default_env()
        .init();

    let zones = config::load_zones(args.zones.as_deref()).map_err(|e| miette::miette!("{:#}", e))?;
    let mut fleet: Vec<VesselRegistration> = match &args.fleet {
        Some(path) => config::load_fleet(path).map_err(|e| miette::miette!("{:#}", e))?,
        None => Vec::new(),
    };
    if args.simulate && fleet.is_empty() {
        fleet = config::demo_fleet();
    }

    let scorer = match args.seed {
        Some(seed) => KinematicScorer::from_seed(seed),
        None => KinematicScorer::from_seed(rand::random()),
    };
    let settings = EngineSettings {
        live_vessel: args.live_vessel.clone(),
        ..Default::default()
    };
    let mut engine = MonitoringEngine::new(zones, scorer, settings);

    let now = now_ms();
    for registration in &fleet {
        if let Err(e) = engine.register_vessel(registration.clone(), now) {
            log::error!("Skipping vessel {}: {}", registration.ais_id, e);
        }
    }
    if !args.simulate && args.replay.is_none() {
        engine.set_location_status(LocationStatus::Unsupported);
    }
    if !args.no_tracking {
        engine.start_tracking(now);
    }

    log::info!(
        "Blue Shield monitoring {} vessels against {} zones",
        engine.fleet().len(),
        engine.active_zones().len()
    );

    Toplevel::new(move |s: SubsystemHandle| async move {
        let (engine_task, handle) = EngineTask::new(engine);
        s.start(SubsystemBuilder::new("engine", |a| engine_task.run(a)));

        if args.simulate {
            let feed = SimulatedFeed::new(&fleet, args.seed, handle.clone());
            s.start(SubsystemBuilder::new("feed", |a| feed.run(a)));
        } else if let Some(path) = args.replay.clone() {
            let feed = ReplayFeed::new(path, handle.clone());
            s.start(SubsystemBuilder::new("feed", |a| feed.run(a)));
        }

        if args.output {
            let dashboard = Dashboard::new(
                handle.clone(),
                Duration::from_secs(args.dashboard_interval),
            );
            s.start(SubsystemBuilder::new("dashboard", |a| dashboard.run(a)));
        }

        let console = Console::new(handle, ReplyOutput::with_dashboard(args.output));
        s.start(SubsystemBuilder::new("console", |a| console.run(a)));
    })
    .catch_signals()
    .handle_shutdown_requests(Duration::from_millis(1000))
    .await
    .map_err(Into::into)
}
