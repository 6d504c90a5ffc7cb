//! Error types for nicwatch core.
//!
//! Only the frame producers (live capture, pcap replay) and the plumbing
//! around them can fail. Extractors and the decoder never return errors:
//! malformed input degrades to "no update".

use thiserror::Error;

/// Core error type for shared operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Replay error: {0}")]
    Replay(#[from] ReplayError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    #[error("{0}")]
    Other(String),
}

/// Live capture errors
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("Unsupported channel type on {0}")]
    UnsupportedChannel(String),

    #[error("Failed to open {interface}: {source}")]
    Open {
        interface: String,
        #[source]
        source: std::io::Error,
    },
}

/// Pcap replay errors
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to open {path}: {message}")]
    Open { path: String, message: String },

    #[error("Failed to read packet {index}: {message}")]
    Read { index: u64, message: String },

    #[error("Unsupported link type: {0}")]
    UnsupportedLinkType(String),
}

/// Pipeline configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
