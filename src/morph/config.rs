//! Configuration for the morph engine

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::types::MotionMode;

/// Errors that can occur while loading or validating a [`MorphConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Configuration options for morph computation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MorphConfig {
    /// Motion model selected at start-up
    pub mode: MotionMode,

    /// Number of frame steps between the two drawings
    pub total_frames: u32,

    /// Scheduler ticks per second
    pub frame_rate: f64,

    /// Expected size of the convex solver's boundary ring
    ///
    /// The stitched frame has four nodes; a count that does not match the ring
    /// fails when the session is armed.
    pub boundary_count: Option<usize>,

    /// Gap between a drawing's bounding box and its stitched frame
    pub frame_margin: f64,

    /// Steiner insertion passes before giving up
    pub max_steiner_passes: usize,

    /// Node guard, Steiner and frame nodes included
    pub max_nodes: usize,

    /// Edge guard, Steiner edges included
    pub max_edges: usize,

    /// Angle-sum tolerance of the point-in-triangle test
    pub inside_tolerance: f64,

    /// Smallest pivot accepted by Gaussian elimination
    pub pivot_epsilon: f64,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            mode: MotionMode::Linear,
            total_frames: 100,
            frame_rate: 25.0,
            boundary_count: None,
            frame_margin: 20.0,
            max_steiner_passes: 16,
            max_nodes: 200,
            max_edges: 800,
            inside_tolerance: 1e-9,
            pivot_epsilon: 1e-12,
        }
    }
}

impl MorphConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML config text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: MorphConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_mode(mut self, mode: MotionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_total_frames(mut self, frames: u32) -> Self {
        self.total_frames = frames;
        self
    }

    pub fn with_frame_rate(mut self, rate: f64) -> Self {
        self.frame_rate = rate;
        self
    }

    pub fn with_boundary_count(mut self, count: usize) -> Self {
        self.boundary_count = Some(count);
        self
    }

    pub fn with_frame_margin(mut self, margin: f64) -> Self {
        self.frame_margin = margin;
        self
    }

    pub fn with_max_steiner_passes(mut self, passes: usize) -> Self {
        self.max_steiner_passes = passes;
        self
    }

    /// Set the node and edge guards
    pub fn with_capacity(mut self, max_nodes: usize, max_edges: usize) -> Self {
        self.max_nodes = max_nodes;
        self.max_edges = max_edges;
        self
    }

    /// Duration of one scheduler tick
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.frame_rate)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_frames == 0 {
            return Err(ConfigError::Invalid {
                field: "total_frames",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(ConfigError::Invalid {
                field: "frame_rate",
                reason: format!("must be a positive number, got {}", self.frame_rate),
            });
        }
        if !(self.frame_margin.is_finite() && self.frame_margin > 0.0) {
            return Err(ConfigError::Invalid {
                field: "frame_margin",
                reason: format!("must be a positive number, got {}", self.frame_margin),
            });
        }
        if let Some(count) = self.boundary_count.filter(|&count| count < 3) {
            return Err(ConfigError::Invalid {
                field: "boundary_count",
                reason: format!("must be at least 3, got {}", count),
            });
        }
        // A stitched triangle plus its frame is the smallest useful input.
        if self.max_nodes < 7 {
            return Err(ConfigError::Invalid {
                field: "max_nodes",
                reason: format!("must be at least 7, got {}", self.max_nodes),
            });
        }
        if self.max_edges < 11 {
            return Err(ConfigError::Invalid {
                field: "max_edges",
                reason: format!("must be at least 11, got {}", self.max_edges),
            });
        }
        if self.max_steiner_passes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_steiner_passes",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MorphConfig::default();
        assert_eq!(config.mode, MotionMode::Linear);
        assert_eq!(config.total_frames, 100);
        assert_eq!(config.frame_rate, 25.0);
        assert_eq!(config.boundary_count, None);
        assert_eq!(config.frame_margin, 20.0);
        assert_eq!(config.max_nodes, 200);
        assert_eq!(config.max_edges, 800);
        assert_eq!(config.tick_interval(), std::time::Duration::from_millis(40));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = MorphConfig::new()
            .with_mode(MotionMode::Hybrid)
            .with_total_frames(40)
            .with_boundary_count(4);

        assert_eq!(config.mode, MotionMode::Hybrid);
        assert_eq!(config.total_frames, 40);
        assert_eq!(config.boundary_count, Some(4));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = MorphConfig::from_toml("mode = \"convex\"\ntotal_frames = 12\n").unwrap();
        assert_eq!(config.mode, MotionMode::Convex);
        assert_eq!(config.total_frames, 12);
        assert_eq!(config.max_steiner_passes, 16);
    }

    #[test]
    fn test_from_toml_rejects_unknown_field() {
        assert!(matches!(
            MorphConfig::from_toml("speed = 3"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_frames() {
        let err = MorphConfig::new().with_total_frames(0).validate().unwrap_err();
        assert!(err.to_string().contains("total_frames"));
    }

    #[test]
    fn test_validate_rejects_bad_rate() {
        assert!(MorphConfig::new().with_frame_rate(0.0).validate().is_err());
        assert!(MorphConfig::new().with_frame_rate(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_tiny_boundary() {
        let err = MorphConfig::new().with_boundary_count(2).validate().unwrap_err();
        assert!(err.to_string().contains("boundary_count"));
        assert!(MorphConfig::new().with_boundary_count(4).validate().is_ok());
    }
}
