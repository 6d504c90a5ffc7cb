//! JSON-formatted output for CLI.
//!
//! Watch mode emits one compact record per line so the stream can be piped
//! into line-oriented tools.

use nicwatch_core::capture::InterfaceSummary;
use nicwatch_core::{Device, DispatchMode, PipelineStats};
use serde::Serialize;
use serde_json::json;

use super::OutputFormatter;

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }

    fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutput {
    fn format_devices(&self, devices: &[Device]) -> String {
        let output = json!({
            "devices": devices,
            "count": devices.len()
        });
        Self::to_json(&output)
    }

    fn format_watch(&self, _devices: &[Device], latest: &Device) -> String {
        serde_json::to_string(latest).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_interfaces(&self, interfaces: &[InterfaceSummary]) -> String {
        let output = json!({
            "interfaces": interfaces,
            "count": interfaces.len()
        });
        Self::to_json(&output)
    }

    fn format_stats(&self, stats: &PipelineStats, mode: DispatchMode) -> String {
        let output = json!({
            "mode": mode.as_str(),
            "stats": stats
        });
        Self::to_json(&output)
    }
}
