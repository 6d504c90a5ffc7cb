//! Passive local-network device discovery.
//!
//! Decoded frames flow through the protocol multiplexer into per-protocol
//! extractors; the resulting attribute updates accumulate in a device
//! registry keyed by hardware address, which republishes every touched record
//! on a bounded update channel.

pub mod actor;
pub mod capture;
pub mod config;
pub mod decode;
pub mod error;
pub mod extract;
pub mod frame;
pub mod mux;
pub mod pipeline;
pub mod registry;
pub mod replay;
pub mod types;

pub use actor::{spawn_registry, RegistryHandle};
pub use config::{DispatchMode, PipelineConfig};
pub use error::{CoreError, Result};
pub use frame::{DecodedFrame, Layer, LayerTag};
pub use mux::{Extractor, ProtocolMux};
pub use pipeline::{Pipeline, PipelineStats};
pub use registry::DeviceRegistry;
pub use types::{AttributeKind, AttributeUpdate, Device, HardwareAddr};
