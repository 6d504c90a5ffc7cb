//! Update-stream consumer shared by `monitor` and `simulate`.

use std::collections::BTreeMap;
use std::io::{self, Write};

use nicwatch_core::{Device, HardwareAddr};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::output::OutputFormatter;

/// Latest published record per hardware address.
#[derive(Debug, Default)]
pub struct DeviceBoard {
    devices: BTreeMap<HardwareAddr, Device>,
}

impl DeviceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored record for the device's address.
    pub fn update(&mut self, device: Device) -> &Device {
        let addr = device.hardware_address;
        self.devices.insert(addr, device);
        &self.devices[&addr]
    }

    /// Records sorted by hardware address.
    pub fn devices(&self) -> Vec<Device> {
        self.devices.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }
}

/// Drain `updates` until every registry sender is gone.
///
/// With a formatter, every notification redraws the output. Returns the
/// number of notifications received.
pub fn spawn_display(
    mut updates: mpsc::Receiver<Device>,
    formatter: Option<Box<dyn OutputFormatter>>,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut board = DeviceBoard::new();
        let mut received = 0u64;

        while let Some(device) = updates.recv().await {
            received += 1;
            let latest = board.update(device).clone();

            if let Some(formatter) = &formatter {
                println!("{}", formatter.format_watch(&board.devices(), &latest));
                io::stdout().flush().ok();
            }
        }

        received
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nicwatch_core::AttributeUpdate;

    fn device(addr: &str, frames: u64) -> Device {
        let mut device = Device::new(addr.parse().unwrap());
        device.frame_count = frames;
        device
    }

    #[test]
    fn test_board_keeps_latest_record() {
        let mut board = DeviceBoard::new();
        board.update(device("aa:bb:cc:dd:ee:ff", 1));
        board.update(device("00:11:22:33:44:55", 1));

        let mut newer = device("aa:bb:cc:dd:ee:ff", 2);
        newer.apply(&AttributeUpdate::hostname("laptop1"));
        let stored = board.update(newer);
        assert_eq!(stored.frame_count, 2);

        let devices = board.devices();
        assert_eq!(board.len(), 2);
        assert_eq!(devices[0].hardware_address.to_string(), "00:11:22:33:44:55");
        assert!(devices[1].hostnames.contains("laptop1"));
    }

    #[tokio::test]
    async fn test_display_counts_until_senders_drop() {
        let (tx, rx) = mpsc::channel(2);
        let display = spawn_display(rx, None);

        for frames in 1..=5 {
            tx.send(device("aa:bb:cc:dd:ee:ff", frames)).await.unwrap();
        }
        drop(tx);

        assert_eq!(display.await.unwrap(), 5);
    }
}
