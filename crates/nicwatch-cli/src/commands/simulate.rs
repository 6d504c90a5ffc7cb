//! Simulate command implementation.

use nicwatch_core::replay::spawn_replay;
use nicwatch_core::{DeviceRegistry, DispatchMode, Pipeline, PipelineConfig};
use tokio::sync::mpsc;
use tracing::debug;

use super::watch::spawn_display;
use crate::cli::SimulateArgs;
use crate::error::CliError;
use crate::output::get_formatter;

/// Run the simulate command
///
/// Concurrent dispatch unless `--sequential` is given. The device table goes
/// to stdout; the run summary goes to stderr.
pub async fn run_simulate(
    args: SimulateArgs,
    config: PipelineConfig,
    json: bool,
) -> Result<(), CliError> {
    let mode = if args.sequential {
        DispatchMode::Sequential
    } else {
        DispatchMode::Concurrent
    };
    let config = config.with_mode(mode);
    let formatter = get_formatter(json);

    let (frame_tx, frame_rx) = mpsc::channel(config.frame_queue_capacity);
    let (update_tx, update_rx) = mpsc::channel(config.update_queue_capacity);

    let display = spawn_display(update_rx, args.watch.then(|| get_formatter(json)));
    let replay = spawn_replay(args.file.clone(), frame_tx);

    let (stats, registry) = Pipeline::default()
        .with_max_in_flight(config.max_in_flight)
        .run(config.mode, frame_rx, DeviceRegistry::new(update_tx))
        .await?;

    let replayed = replay
        .await
        .map_err(|e| CliError::Other(format!("Replay task failed: {}", e)))??;
    debug!(replayed, "Replay complete");

    let devices = registry.snapshot();
    drop(registry);

    let notifications = display
        .await
        .map_err(|e| CliError::Other(format!("Display task failed: {}", e)))?;
    debug!(notifications, "Update stream closed");

    if !args.watch {
        println!("{}", formatter.format_devices(&devices));
    }
    eprintln!("{}", formatter.format_stats(&stats, config.mode));

    Ok(())
}
