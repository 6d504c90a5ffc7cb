//! Monitor command implementation.

use nicwatch_core::capture::{resolve_interfaces, spawn_capture};
use nicwatch_core::{DeviceRegistry, DispatchMode, Pipeline, PipelineConfig};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::watch::spawn_display;
use crate::cli::MonitorArgs;
use crate::error::CliError;
use crate::output::get_formatter;

/// Run the monitor command
///
/// Live capture always runs in sequential mode. Stops on Ctrl+C or when
/// every capture thread has ended.
pub async fn run_monitor(
    args: MonitorArgs,
    config: PipelineConfig,
    json: bool,
) -> Result<(), CliError> {
    let config = config.with_mode(DispatchMode::Sequential);
    let interfaces = resolve_interfaces(&args.interfaces)?;
    if interfaces.is_empty() {
        return Err(CliError::NoInterfaces);
    }

    let (frame_tx, frame_rx) = mpsc::channel(config.frame_queue_capacity);
    let (update_tx, update_rx) = mpsc::channel(config.update_queue_capacity);

    let mut producers = Vec::new();
    let mut first_error = None;
    for iface in interfaces {
        let name = iface.name.clone();
        match spawn_capture(iface, frame_tx.clone()) {
            Ok(handle) => producers.push(handle),
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    drop(frame_tx);

    if producers.is_empty() {
        return Err(match first_error {
            Some(e) => e.into(),
            None => CliError::NoInterfaces,
        });
    }

    info!("Monitoring {} interface(s)", producers.len());

    let display = spawn_display(update_rx, Some(get_formatter(json)));
    let registry = DeviceRegistry::new(update_tx);
    let pipeline = Pipeline::default();

    tokio::select! {
        result = pipeline.run(config.mode, frame_rx, registry) => {
            let (stats, _registry) = result?;
            warn!(
                frames = stats.frames_received,
                "All capture threads stopped"
            );
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping capture");
        }
    }

    // Dropping the pipeline closed the frame and update queues.
    display
        .await
        .map_err(|e| CliError::Other(format!("Display task failed: {}", e)))?;

    Ok(())
}
