//! Error types for the fleet engine

use minefleet_logic::command::CommandError;
use minefleet_logic::map::ValidationError;
use minefleet_logic::telemetry::TelemetryError;
use minefleet_logic::TruckId;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Invalid configuration: {0:?}")]
    InvalidConfig(Vec<ConfigError>),

    #[error("Invalid map layout: {0:?}")]
    InvalidLayout(Vec<ValidationError>),

    #[error("Unknown truck: {0}")]
    UnknownTruck(TruckId),

    #[error("Failed to spawn simulator thread: {0}")]
    SimulatorSpawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
