//! Output formatting for CLI results.

pub mod json;
pub mod table;

pub use json::JsonOutput;
pub use table::TableOutput;

use nicwatch_core::capture::InterfaceSummary;
use nicwatch_core::{Device, DispatchMode, PipelineStats};

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format the full device list
    fn format_devices(&self, devices: &[Device]) -> String;

    /// Format one watch-mode frame after `latest` changed
    fn format_watch(&self, devices: &[Device], latest: &Device) -> String;

    /// Format capture interfaces
    fn format_interfaces(&self, interfaces: &[InterfaceSummary]) -> String;

    /// Format the counters of a finished run
    fn format_stats(&self, stats: &PipelineStats, mode: DispatchMode) -> String;
}

/// Get the appropriate formatter based on JSON flag
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonOutput::new())
    } else {
        Box::new(TableOutput::new())
    }
}
