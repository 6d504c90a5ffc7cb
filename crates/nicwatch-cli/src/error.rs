//! Error types for the nicwatch CLI.
//!
//! CliError wraps CoreError from the library and adds CLI-specific variants.

use nicwatch_core::error::CoreError;
use thiserror::Error;

pub use nicwatch_core::error::{CaptureError, ConfigError, ReplayError};

/// Exit codes for the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const CAPTURE_ERROR: i32 = 2;
    pub const INVALID_ARGS: i32 = 4;
}

/// Main error type for the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No interfaces available for capture")]
    NoInterfaces,

    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(e) => match e {
                CoreError::Capture(_) => exit_codes::CAPTURE_ERROR,
                CoreError::Config(_) => exit_codes::INVALID_ARGS,
                CoreError::Replay(_) => exit_codes::GENERAL_ERROR,
                CoreError::Io(_) => exit_codes::GENERAL_ERROR,
                CoreError::ChannelClosed(_) => exit_codes::GENERAL_ERROR,
                CoreError::Other(_) => exit_codes::GENERAL_ERROR,
            },
            CliError::Io(_) => exit_codes::GENERAL_ERROR,
            CliError::InvalidArgument(_) => exit_codes::INVALID_ARGS,
            CliError::NoInterfaces => exit_codes::CAPTURE_ERROR,
            CliError::Other(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

// Conversions from core error subtypes to CliError
impl From<CaptureError> for CliError {
    fn from(e: CaptureError) -> Self {
        CliError::Core(CoreError::Capture(e))
    }
}

impl From<ReplayError> for CliError {
    fn from(e: ReplayError) -> Self {
        CliError::Core(CoreError::Replay(e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Core(CoreError::Config(e))
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_errors_map_to_capture_exit_code() {
        let err: CliError = CaptureError::InterfaceNotFound("eth9".to_string()).into();
        assert_eq!(err.exit_code(), exit_codes::CAPTURE_ERROR);
        assert_eq!(CliError::NoInterfaces.exit_code(), exit_codes::CAPTURE_ERROR);
    }

    #[test]
    fn test_invalid_config_maps_to_invalid_args() {
        let err: CliError = ConfigError::InvalidValue {
            name: "frameQueueCapacity".to_string(),
            message: "must be at least 1".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::INVALID_ARGS);
    }

    #[test]
    fn test_replay_errors_are_general() {
        let err: CliError = ReplayError::UnsupportedLinkType("RAW".to_string()).into();
        assert_eq!(err.exit_code(), exit_codes::GENERAL_ERROR);
        assert!(err.to_string().contains("Unsupported link type"));
    }
}
