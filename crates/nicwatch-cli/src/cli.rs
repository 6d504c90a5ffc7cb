//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use nicwatch_core::config::{
    DEFAULT_FRAME_QUEUE_CAPACITY, DEFAULT_MAX_IN_FLIGHT, DEFAULT_UPDATE_QUEUE_CAPACITY,
};
use nicwatch_core::PipelineConfig;

/// nicwatch - passive discovery of devices on the local network
#[derive(Parser, Debug)]
#[command(name = "nicwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Frames buffered between capture and processing
    #[arg(long, global = true, default_value_t = DEFAULT_FRAME_QUEUE_CAPACITY, env = "NICWATCH_FRAME_QUEUE")]
    pub frame_queue: usize,

    /// Device records buffered between the registry and the display
    #[arg(long, global = true, default_value_t = DEFAULT_UPDATE_QUEUE_CAPACITY, env = "NICWATCH_UPDATE_QUEUE")]
    pub update_queue: usize,

    /// Frame tasks allowed at once during concurrent replay
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_IN_FLIGHT, env = "NICWATCH_MAX_IN_FLIGHT")]
    pub max_in_flight: usize,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Queue sizing from the global flags; the mode is chosen per command.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            frame_queue_capacity: self.frame_queue,
            update_queue_capacity: self.update_queue,
            max_in_flight: self.max_in_flight,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List capture interfaces
    List,

    /// Watch live traffic and show devices as they are discovered
    Monitor(MonitorArgs),

    /// Replay a pcap capture through the discovery pipeline
    Simulate(SimulateArgs),
}

// ==================== Monitor ====================

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Interface to capture on; repeat for several, or "all"
    #[arg(short, long = "interface", default_value = "all")]
    pub interfaces: Vec<String>,
}

// ==================== Simulate ====================

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Classic pcap file with Ethernet framing
    pub file: PathBuf,

    /// Process frames one at a time instead of one task per frame
    #[arg(long)]
    pub sequential: bool,

    /// Redraw the device table on every update instead of once at the end
    #[arg(short, long)]
    pub watch: bool,
}
