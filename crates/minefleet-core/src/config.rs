//! Engine configuration, loaded from TOML or JSON.
//!
//! ```toml
//! tick_ms = 250
//! max_step = 1.5
//! seed = 42
//!
//! [topics]
//! root = "truck"
//! planner_root = "planner/truck"
//!
//! [geometry]
//! canvas_width = 760
//! canvas_height = 390
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use minefleet_logic::constants::motion;
use minefleet_logic::geometry::GeometryConfig;
use minefleet_logic::map::MapLayout;
use minefleet_logic::telemetry::TopicScheme;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Simulator tick period in milliseconds.
    pub tick_ms: u64,
    /// Largest per-axis random-walk displacement, in logical units.
    pub max_step: f64,
    /// Fixed simulator seed; entropy-seeded when absent.
    pub seed: Option<u64>,
    pub topics: TopicScheme,
    pub geometry: GeometryConfig,
    /// JSON wall layout. The default maze is used when absent.
    pub map_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: motion::TICK_MS,
            max_step: motion::MAX_STEP,
            seed: None,
            topics: TopicScheme::default(),
            geometry: GeometryConfig::default(),
            map_file: None,
        }
    }
}

impl EngineConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from disk. `.json` files are read as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }

    /// The wall layout named by `map_file`, or the default maze.
    pub fn load_layout(&self) -> Result<MapLayout> {
        match &self.map_file {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Ok(MapLayout::from_json(&text)?)
            }
            None => Ok(MapLayout::maze(
                self.geometry.canvas_width,
                self.geometry.canvas_height,
            )),
        }
    }

    /// Returns the config unchanged when [`validate_config`] finds nothing.
    pub fn validated(self) -> Result<Self> {
        let errors = validate_config(&self);
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(EngineError::InvalidConfig(errors))
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("tick period must be non-zero")]
    ZeroTickPeriod,

    #[error("max_step must be positive and finite, got {0}")]
    InvalidMaxStep(f64),

    #[error("coordinate space must be positive, got {x} x {y}")]
    InvalidCoordinateSpace { x: f64, y: f64 },

    #[error("canvas {width} x {height} is too small for the projection inset")]
    CanvasTooSmall { width: i32, height: i32 },

    #[error("truck icon size must be positive, got {0}")]
    InvalidTruckSize(i32),

    #[error("collision radius must be positive, got {0}")]
    InvalidCollisionRadius(f64),

    #[error("collectible size must be positive, got {0}")]
    InvalidCollectibleSize(i32),

    #[error("topic root must not be empty")]
    EmptyTopicRoot,
}

/// Validate an engine configuration, returning all errors found.
pub fn validate_config(config: &EngineConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    let g = &config.geometry;

    if config.tick_ms == 0 {
        errors.push(ConfigError::ZeroTickPeriod);
    }
    if !(config.max_step.is_finite() && config.max_step > 0.0) {
        errors.push(ConfigError::InvalidMaxStep(config.max_step));
    }
    if !(g.coord_max_x > 0.0 && g.coord_max_y > 0.0 && g.coord_max_x.is_finite() && g.coord_max_y.is_finite()) {
        errors.push(ConfigError::InvalidCoordinateSpace {
            x: g.coord_max_x,
            y: g.coord_max_y,
        });
    }
    if g.canvas_width <= g.inset + g.margin || g.canvas_height <= g.inset + g.margin {
        errors.push(ConfigError::CanvasTooSmall {
            width: g.canvas_width,
            height: g.canvas_height,
        });
    }
    if g.truck_size <= 0 {
        errors.push(ConfigError::InvalidTruckSize(g.truck_size));
    }
    if !(g.collision_radius.is_finite() && g.collision_radius > 0.0) {
        errors.push(ConfigError::InvalidCollisionRadius(g.collision_radius));
    }
    if g.collectible_size <= 0 {
        errors.push(ConfigError::InvalidCollectibleSize(g.collectible_size));
    }
    if config.topics.root.trim().is_empty() || config.topics.planner_root.trim().is_empty() {
        errors.push(ConfigError::EmptyTopicRoot);
    }

    errors
}
