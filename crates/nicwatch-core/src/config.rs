//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default capacity of the decoded-frame queue shared by all producers
pub const DEFAULT_FRAME_QUEUE_CAPACITY: usize = 10;

/// Default capacity of the device update queue
pub const DEFAULT_UPDATE_QUEUE_CAPACITY: usize = 10;

/// Default cap on frame tasks in flight in concurrent mode
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// How the consumer drains the frame queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DispatchMode {
    /// One frame at a time, in delivery order
    #[default]
    Sequential,
    /// One task per frame, registry mutations serialized by the actor
    Concurrent,
}

impl DispatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchMode::Sequential => "sequential",
            DispatchMode::Concurrent => "concurrent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub frame_queue_capacity: usize,
    pub update_queue_capacity: usize,
    /// Frame tasks allowed to run at once in concurrent mode
    pub max_in_flight: usize,
    pub mode: DispatchMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_queue_capacity: DEFAULT_FRAME_QUEUE_CAPACITY,
            update_queue_capacity: DEFAULT_UPDATE_QUEUE_CAPACITY,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            mode: DispatchMode::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Parse a JSON config, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Bounded queues must hold at least one item.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: "frameQueueCapacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.update_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: "updateQueueCapacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.max_in_flight == 0 {
            return Err(ConfigError::InvalidValue {
                name: "maxInFlight".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.frame_queue_capacity, 10);
        assert_eq!(config.update_queue_capacity, 10);
        assert_eq!(config.max_in_flight, DEFAULT_MAX_IN_FLIGHT);
        assert_eq!(config.mode, DispatchMode::Sequential);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = PipelineConfig::from_json(r#"{"mode":"concurrent","frameQueueCapacity":64}"#)
            .unwrap();
        assert_eq!(config.mode, DispatchMode::Concurrent);
        assert_eq!(config.frame_queue_capacity, 64);
        assert_eq!(config.update_queue_capacity, DEFAULT_UPDATE_QUEUE_CAPACITY);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = PipelineConfig::from_json(r#"{"updateQueueCapacity":0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "updateQueueCapacity"));
    }

    #[test]
    fn test_zero_in_flight_rejected() {
        let err = PipelineConfig::from_json(r#"{"maxInFlight":0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "maxInFlight"));
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            PipelineConfig::from_json("not json"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
