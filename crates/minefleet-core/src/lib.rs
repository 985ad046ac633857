//! MineFleet Core - Truck State Synchronization & Collision Engine
//!
//! Keeps one consistent picture of a haul-truck fleet while three kinds of
//! producer write to it concurrently: external telemetry, operator manual
//! commands and the local random-walk simulator.
//!
//! # Architecture
//!
//! - **Registry**: authoritative truck records plus one gate (mutex) per truck
//! - **Dispatcher**: the only write path; arbitrates, checks collisions, commits, notifies
//! - **Producers**: [`telemetry::TelemetryAdapter`], [`commands::CommandHandler`],
//!   [`simulator::MotionSimulator`], each submitting [`update::ProposedUpdate`]s
//! - **Map**: immutable walls and projection, plus a `hecs` world of collectibles
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use minefleet_core::prelude::*;
//!
//! let engine = FleetEngine::new(EngineConfig::default(), Arc::new(NullOutbound)).unwrap();
//! let updates = engine.subscribe();
//! let truck = engine.add_truck();
//!
//! engine.telemetry().handle_message("planner/truck/1/position", "42.3,12.5").unwrap();
//! engine.commands().toggle_motion(truck).unwrap();
//! let _simulator = engine.start_simulator().unwrap();
//!
//! for notification in updates.iter() {
//!     println!("{:?}", notification);
//! }
//! ```

pub mod collectibles;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod map;
pub mod observer;
pub mod outbound;
pub mod registry;
pub mod simulator;
pub mod telemetry;
pub mod update;

mod sync;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::collectibles::{Collectible, CollectibleId};
    pub use crate::commands::{CommandHandler, CommandOutcome};
    pub use crate::config::{validate_config, ConfigError, EngineConfig};
    pub use crate::dispatcher::{Dispatcher, DropReason, Resolution};
    pub use crate::engine::{FleetEngine, FleetSnapshot};
    pub use crate::error::{EngineError, Result};
    pub use crate::outbound::{ChannelOutbound, NullOutbound, Outbound, OutboundMessage};
    pub use crate::registry::{Truck, TruckRegistry};
    pub use crate::simulator::{MotionSimulator, SimulatorHandle, TickReport};
    pub use crate::update::{AcceptedUpdate, Notification, PositionChange, ProposedUpdate, Reading};
    pub use minefleet_logic::arbiter::{Authority, OperatingMode, OwnershipConflict, UpdateSource};
    pub use minefleet_logic::command::FailureKind;
    pub use minefleet_logic::geometry::{GeometryConfig, LogicalPoint, PixelPoint, PixelRect};
    pub use minefleet_logic::map::MapLayout;
    pub use minefleet_logic::TruckId;
}
