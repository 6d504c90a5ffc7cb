//! Device registry.
//!
//! The registry is the single authority for device identity state. It owns
//! the hardware-address to record mapping and republishes the affected
//! record on the update sink after every operation.
//!
//! Notifications are at-least-once per observation, not per change: calling
//! `apply_update` with a value that is already present still publishes the
//! record. Consumers should treat every message as "this record may have
//! changed, re-read it" and deduplicate or debounce on their side.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{AttributeUpdate, Device, HardwareAddr};

/// Owns every device record seen during one monitoring session.
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: HashMap<HardwareAddr, Device>,
    updates: mpsc::Sender<Device>,
    sink_closed: bool,
}

impl DeviceRegistry {
    /// Create an empty registry publishing to `updates`.
    pub fn new(updates: mpsc::Sender<Device>) -> Self {
        Self {
            devices: HashMap::new(),
            updates,
            sink_closed: false,
        }
    }

    /// Return the record for `addr`, creating a zero-valued one if needed.
    ///
    /// Publishes the record to the update sink.
    pub async fn get_or_create(&mut self, addr: HardwareAddr) -> &mut Device {
        self.entry(addr);
        self.publish(addr).await;
        self.entry(addr)
    }

    /// Add `update.value` to the named set of the record for `addr`.
    ///
    /// Returns whether the set content changed. Publishes either way.
    pub async fn apply_update(&mut self, addr: HardwareAddr, update: &AttributeUpdate) -> bool {
        let changed = self.entry(addr).apply(update);
        self.publish(addr).await;
        changed
    }

    /// Count one frame from `addr` observed at `timestamp`.
    pub async fn record_frame(&mut self, addr: HardwareAddr, timestamp: DateTime<Utc>) {
        self.entry(addr).observe(timestamp);
        self.publish(addr).await;
    }

    pub fn get(&self, addr: &HardwareAddr) -> Option<&Device> {
        self.devices.get(addr)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Copy of every record, sorted by hardware address.
    pub fn snapshot(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self.devices.values().cloned().collect();
        devices.sort_by(|a, b| a.hardware_address.cmp(&b.hardware_address));
        devices
    }

    fn entry(&mut self, addr: HardwareAddr) -> &mut Device {
        self.devices
            .entry(addr)
            .or_insert_with(|| Device::new(addr))
    }

    async fn publish(&mut self, addr: HardwareAddr) {
        if self.sink_closed {
            return;
        }

        let Some(device) = self.devices.get(&addr) else {
            return;
        };

        if self.updates.send(device.clone()).await.is_err() {
            debug!("Update sink closed, continuing without notifications");
            self.sink_closed = true;
        }
    }
}
