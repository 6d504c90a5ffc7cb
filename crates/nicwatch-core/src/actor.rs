//! Single-writer registry actor.
//!
//! Concurrent frame tasks never touch the registry directly. They send
//! commands through a cloneable `RegistryHandle`; one task owns the
//! `DeviceRegistry` and applies the commands one at a time.

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::registry::DeviceRegistry;
use crate::types::{AttributeUpdate, Device, HardwareAddr};

/// Mutation or query handled by the registry actor.
#[derive(Debug)]
pub enum RegistryCommand {
    RecordFrame {
        addr: HardwareAddr,
        timestamp: DateTime<Utc>,
    },
    Apply {
        addr: HardwareAddr,
        update: AttributeUpdate,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<Device>>,
    },
}

/// Cloneable sender side of the registry actor.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    commands: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    pub async fn record_frame(&self, addr: HardwareAddr, timestamp: DateTime<Utc>) -> Result<()> {
        self.send(RegistryCommand::RecordFrame { addr, timestamp }).await
    }

    pub async fn apply_update(&self, addr: HardwareAddr, update: AttributeUpdate) -> Result<()> {
        self.send(RegistryCommand::Apply { addr, update }).await
    }

    /// Current records, sorted by hardware address.
    pub async fn snapshot(&self) -> Result<Vec<Device>> {
        let (reply, rx) = oneshot::channel();
        self.send(RegistryCommand::Snapshot { reply }).await?;
        rx.await
            .map_err(|_| CoreError::ChannelClosed("registry actor dropped snapshot".to_string()))
    }

    async fn send(&self, command: RegistryCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CoreError::ChannelClosed("registry actor stopped".to_string()))
    }
}

/// Move `registry` into its own task.
///
/// The task ends once every handle has been dropped and hands the registry
/// back through the join handle.
pub fn spawn_registry(
    registry: DeviceRegistry,
    capacity: usize,
) -> (RegistryHandle, JoinHandle<DeviceRegistry>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(run(registry, rx));
    (RegistryHandle { commands: tx }, task)
}

async fn run(
    mut registry: DeviceRegistry,
    mut commands: mpsc::Receiver<RegistryCommand>,
) -> DeviceRegistry {
    while let Some(command) = commands.recv().await {
        match command {
            RegistryCommand::RecordFrame { addr, timestamp } => {
                registry.record_frame(addr, timestamp).await;
            }
            RegistryCommand::Apply { addr, update } => {
                registry.apply_update(addr, &update).await;
            }
            RegistryCommand::Snapshot { reply } => {
                let _ = reply.send(registry.snapshot());
            }
        }
    }

    debug!("Registry actor stopping with {} device(s)", registry.len());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> HardwareAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_actor_applies_commands() {
        let (tx, mut rx) = mpsc::channel(64);
        let (handle, task) = spawn_registry(DeviceRegistry::new(tx), 8);
        let a = addr("aa:bb:cc:dd:ee:ff");

        handle.record_frame(a, Utc::now()).await.unwrap();
        handle.apply_update(a, AttributeUpdate::ip("10.0.0.9")).await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].frame_count, 1);
        assert!(snapshot[0].ip_addresses.contains("10.0.0.9"));

        drop(handle);
        let registry = task.await.unwrap();
        assert_eq!(registry.len(), 1);

        let mut published = 0;
        while rx.try_recv().is_ok() {
            published += 1;
        }
        assert_eq!(published, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_do_not_lose_updates() {
        let (tx, mut rx) = mpsc::channel(16);
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });
        let (handle, task) = spawn_registry(DeviceRegistry::new(tx), 4);
        let a = addr("aa:bb:cc:dd:ee:ff");

        let mut writers = Vec::new();
        for i in 0..50u32 {
            let handle = handle.clone();
            writers.push(tokio::spawn(async move {
                handle.record_frame(a, Utc::now()).await.unwrap();
                handle
                    .apply_update(a, AttributeUpdate::ip(format!("10.0.{}.{}", i / 10, i % 10)))
                    .await
                    .unwrap();
            }));
        }
        for writer in writers {
            writer.await.unwrap();
        }
        drop(handle);

        let registry = task.await.unwrap();
        let device = registry.get(&a).unwrap();
        assert_eq!(device.frame_count, 50);
        assert_eq!(device.ip_addresses.len(), 50);

        drop(registry);
        drain.await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_errors_after_actor_stops() {
        let (tx, _rx) = mpsc::channel(4);
        let (handle, task) = spawn_registry(DeviceRegistry::new(tx), 1);
        task.abort();
        let _ = task.await;

        let result = handle.record_frame(addr("aa:bb:cc:dd:ee:ff"), Utc::now()).await;
        assert!(matches!(result, Err(CoreError::ChannelClosed(_))));
    }
}
