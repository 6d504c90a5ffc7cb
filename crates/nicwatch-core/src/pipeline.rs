//! Pipeline driver.
//!
//! For each decoded frame: resolve the source hardware address, count the
//! frame against its record, then dispatch the frame through the protocol
//! multiplexer and apply every extracted attribute. Frames without a
//! link-layer header are dropped without touching the registry.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::actor::{spawn_registry, RegistryHandle};
use crate::config::{DispatchMode, DEFAULT_MAX_IN_FLIGHT};
use crate::error::{CoreError, Result};
use crate::extract::default_mux;
use crate::frame::DecodedFrame;
use crate::mux::ProtocolMux;
use crate::registry::DeviceRegistry;
use crate::types::HardwareAddr;

/// Command queue between frame tasks and the registry actor
const ACTOR_QUEUE_CAPACITY: usize = 64;

/// Counters reported when a pipeline run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub frames_received: u64,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub updates_applied: u64,
}

impl PipelineStats {
    fn record(&mut self, outcome: Option<usize>) {
        self.frames_received += 1;
        match outcome {
            Some(updates) => {
                self.frames_processed += 1;
                self.updates_applied += updates as u64;
            }
            None => self.frames_dropped += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    mux: Arc<ProtocolMux>,
    max_in_flight: usize,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(default_mux())
    }
}

impl Pipeline {
    pub fn new(mux: ProtocolMux) -> Self {
        Self {
            mux: Arc::new(mux),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Cap the frame tasks running at once in concurrent mode.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn mux(&self) -> &ProtocolMux {
        &self.mux
    }

    /// Drive one frame through the registry.
    ///
    /// Returns the number of attribute updates applied, or `None` when the
    /// frame had no link-layer header and was dropped.
    pub async fn process_frame(
        &self,
        registry: &mut DeviceRegistry,
        frame: &DecodedFrame,
    ) -> Option<usize> {
        let Some(source) = frame.source() else {
            debug!("Dropping frame without link-layer header");
            return None;
        };

        registry.record_frame(source, frame.timestamp).await;

        let updates = self.mux.dispatch(frame);
        for update in &updates {
            registry.apply_update(source, update).await;
        }

        Some(updates.len())
    }

    /// Process frames one at a time, in delivery order, until every producer
    /// has dropped its sender.
    pub async fn run_sequential(
        &self,
        mut frames: mpsc::Receiver<DecodedFrame>,
        registry: &mut DeviceRegistry,
    ) -> PipelineStats {
        let mut stats = PipelineStats::default();

        while let Some(frame) = frames.recv().await {
            let outcome = self.process_frame(registry, &frame).await;
            stats.record(outcome);
        }

        debug!(?stats, "Sequential pipeline finished");
        stats
    }

    /// Process every frame on its own task.
    ///
    /// Extraction runs inside the task; mutations go through the registry
    /// actor, so the registry itself is never shared. Within one frame the
    /// frame count is recorded before its attributes are applied. At most
    /// `max_in_flight` tasks run at once; while at the cap no frame is
    /// dequeued, so a stalled registry blocks the producers. Returns once
    /// the feed is exhausted and every spawned task has finished.
    pub async fn run_concurrent(
        &self,
        mut frames: mpsc::Receiver<DecodedFrame>,
        registry: RegistryHandle,
    ) -> PipelineStats {
        let mut stats = PipelineStats::default();
        let mut tasks: JoinSet<Result<usize>> = JoinSet::new();

        loop {
            tokio::select! {
                frame = frames.recv(), if tasks.len() < self.max_in_flight => {
                    let Some(frame) = frame else { break };

                    let Some(source) = frame.source() else {
                        debug!("Dropping frame without link-layer header");
                        stats.record(None);
                        continue;
                    };

                    stats.frames_received += 1;
                    stats.frames_processed += 1;
                    tasks.spawn(process_via_actor(
                        Arc::clone(&self.mux),
                        registry.clone(),
                        source,
                        frame,
                    ));
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    stats.updates_applied += task_updates(joined);
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            stats.updates_applied += task_updates(joined);
        }

        debug!(?stats, "Concurrent pipeline finished");
        stats
    }

    /// Drain `frames` with the given discipline and hand the registry back.
    ///
    /// In concurrent mode the registry is moved into an actor for the
    /// duration of the run.
    pub async fn run(
        &self,
        mode: DispatchMode,
        frames: mpsc::Receiver<DecodedFrame>,
        mut registry: DeviceRegistry,
    ) -> Result<(PipelineStats, DeviceRegistry)> {
        match mode {
            DispatchMode::Sequential => {
                let stats = self.run_sequential(frames, &mut registry).await;
                Ok((stats, registry))
            }
            DispatchMode::Concurrent => {
                let (handle, actor) = spawn_registry(registry, ACTOR_QUEUE_CAPACITY);
                let stats = self.run_concurrent(frames, handle).await;
                let registry = actor
                    .await
                    .map_err(|e| CoreError::Other(format!("Registry actor failed: {}", e)))?;
                Ok((stats, registry))
            }
        }
    }
}

async fn process_via_actor(
    mux: Arc<ProtocolMux>,
    registry: RegistryHandle,
    source: HardwareAddr,
    frame: DecodedFrame,
) -> Result<usize> {
    registry.record_frame(source, frame.timestamp).await?;

    let updates = mux.dispatch(&frame);
    let count = updates.len();
    for update in updates {
        registry.apply_update(source, update).await?;
    }

    Ok(count)
}

fn task_updates(joined: std::result::Result<Result<usize>, tokio::task::JoinError>) -> u64 {
    match joined {
        Ok(Ok(count)) => count as u64,
        Ok(Err(e)) => {
            warn!("Frame task failed: {}", e);
            0
        }
        Err(e) => {
            warn!("Frame task panicked or was cancelled: {}", e);
            0
        }
    }
}
