use std::process::ExitCode;

use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rail_scheduler::clock::SystemClock;
use rail_scheduler::config::SchedulerConfig;
use rail_scheduler::engine::{CapacityConflict, Resolution, resolve_capacity_conflict};
use rail_scheduler::network::Layout;
use rail_scheduler::schedule::Schedule;

/// What the capacity scan found, printed as JSON.
#[derive(Serialize)]
struct Report {
    window_mins: u32,
    conflicts: Vec<CapacityConflict>,
    resolutions: Vec<Resolution>,
    /// Conflicts starting within the configured horizon of now.
    upcoming: Vec<CapacityConflict>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Capacity scan failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::var("RAIL_LAYOUT").map_err(|_| "RAIL_LAYOUT is not set")?;
    let config = SchedulerConfig::from_env();

    let (network, runs) = Layout::load(&path)?.into_parts()?;
    info!(
        layout = %path,
        stations = network.len(),
        segments = network.segments().len(),
        runs = runs.len(),
        "Loaded layout"
    );

    let window_mins = config.capacity_window_mins;
    let schedule = Schedule::new(network, runs, config);
    let conflicts = schedule.capacity_report(window_mins).await?;

    let mut resolutions = Vec::with_capacity(conflicts.len());
    for conflict in &conflicts {
        let resolution = resolve_capacity_conflict(conflict);
        if resolution.unresolved {
            warn!(
                station = %conflict.station,
                window_start = %conflict.window_start,
                excess = conflict.excess,
                remaining_excess = resolution.remaining_excess,
                "Capacity conflict needs an operator"
            );
        } else {
            let removed: Vec<String> = resolution.remove.iter().map(|id| id.to_string()).collect();
            info!(
                station = %conflict.station,
                window_start = %conflict.window_start,
                excess = conflict.excess,
                remove = ?removed,
                "Capacity conflict can be resolved"
            );
        }
        resolutions.push(resolution);
    }

    let upcoming = schedule.upcoming_capacity_report(&SystemClock).await?;
    info!(
        conflicts = conflicts.len(),
        upcoming = upcoming.len(),
        "Capacity scan complete"
    );

    let report = Report {
        window_mins,
        conflicts,
        resolutions,
        upcoming,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
