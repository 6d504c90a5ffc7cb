//! Table-formatted output for CLI.

use std::collections::BTreeSet;

use chrono::Local;
use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use nicwatch_core::capture::InterfaceSummary;
use nicwatch_core::{Device, DispatchMode, PipelineStats};

use super::OutputFormatter;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct TableOutput;

impl TableOutput {
    pub fn new() -> Self {
        Self
    }

    fn device_table(devices: &[Device]) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            "MAC",
            "IP Addresses",
            "Hostnames",
            "Vendor Hints",
            "User Agents",
            "Frames",
            "Last Seen",
        ]);

        for device in devices {
            let last_seen = device
                .last_seen
                .map(|ts| ts.with_timezone(&Local).format(TIME_FORMAT).to_string())
                .unwrap_or_else(|| "-".to_string());

            table.add_row(vec![
                Cell::new(device.hardware_address).fg(Color::Cyan),
                Cell::new(join(&device.ip_addresses)),
                Cell::new(join(&device.hostnames)),
                Cell::new(join(&device.vendor_hints)),
                Cell::new(join(&device.user_agents)),
                Cell::new(device.frame_count),
                Cell::new(last_seen),
            ]);
        }

        table
    }
}

impl Default for TableOutput {
    fn default() -> Self {
        Self::new()
    }
}

fn join(values: &BTreeSet<String>) -> String {
    if values.is_empty() {
        "-".to_string()
    } else {
        values.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

impl OutputFormatter for TableOutput {
    fn format_devices(&self, devices: &[Device]) -> String {
        if devices.is_empty() {
            return "No devices found.".to_string();
        }

        format!(
            "{}\n\nFound {} device(s)",
            Self::device_table(devices),
            devices.len()
        )
    }

    fn format_watch(&self, devices: &[Device], latest: &Device) -> String {
        let mut lines = Vec::new();

        // Clear screen and print header
        lines.push(format!("\x1B[2J\x1B[1;1H{}", "nicwatch device monitor".bold()));
        lines.push("Press Ctrl+C to stop".dimmed().to_string());
        lines.push(String::new());
        lines.push(self.format_devices(devices));
        lines.push(String::new());
        lines.push(format!(
            "Last update: {}",
            latest.hardware_address.to_string().green()
        ));

        lines.join("\n")
    }

    fn format_interfaces(&self, interfaces: &[InterfaceSummary]) -> String {
        if interfaces.is_empty() {
            return "No interfaces found.".to_string();
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Name", "MAC", "State", "Addresses"]);

        for iface in interfaces {
            let state = match (iface.is_up, iface.is_loopback) {
                (true, true) => Cell::new("up (loopback)").fg(Color::Yellow),
                (true, false) => Cell::new("up").fg(Color::Green),
                (false, _) => Cell::new("down").fg(Color::Red),
            };

            table.add_row(vec![
                Cell::new(&iface.name),
                Cell::new(
                    iface
                        .mac
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
                state,
                Cell::new(if iface.addresses.is_empty() {
                    "-".to_string()
                } else {
                    iface.addresses.join("\n")
                }),
            ]);
        }

        format!("{}\n\n{} interface(s)", table, interfaces.len())
    }

    fn format_stats(&self, stats: &PipelineStats, mode: DispatchMode) -> String {
        let dropped = if stats.frames_dropped > 0 {
            stats.frames_dropped.to_string().yellow()
        } else {
            stats.frames_dropped.to_string().normal()
        };

        format!(
            "{} frames received ({} processed, {} dropped), {} updates applied [{}]",
            stats.frames_received,
            stats.frames_processed,
            dropped,
            stats.updates_applied,
            mode.as_str()
        )
    }
}
