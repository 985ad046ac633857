//! Fleet engine - main entry point wiring registry, map, dispatcher and producers

use std::sync::Arc;

use crossbeam_channel::Receiver;
use serde::Serialize;
use minefleet_logic::geometry::PixelPoint;
use minefleet_logic::map::MapLayout;
use minefleet_logic::TruckId;

use crate::collectibles::{Collectible, CollectibleId};
use crate::commands::CommandHandler;
use crate::config::EngineConfig;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::map::FleetMap;
use crate::outbound::Outbound;
use crate::registry::{Truck, TruckRegistry};
use crate::simulator::{MotionSimulator, SimulatorHandle};
use crate::telemetry::TelemetryAdapter;
use crate::update::Notification;

/// Main fleet engine
pub struct FleetEngine {
    config: EngineConfig,
    dispatcher: Arc<Dispatcher>,
    commands: CommandHandler,
    telemetry: TelemetryAdapter,
    simulator: Arc<MotionSimulator>,
}

impl FleetEngine {
    /// Build an engine using the layout named in the config (or the default maze).
    pub fn new(config: EngineConfig, outbound: Arc<dyn Outbound>) -> Result<Self> {
        let config = config.validated()?;
        let layout = config.load_layout()?;
        Self::with_layout(config, layout, outbound)
    }

    /// Build an engine over an explicit wall layout.
    pub fn with_layout(config: EngineConfig, layout: MapLayout, outbound: Arc<dyn Outbound>) -> Result<Self> {
        let config = config.validated()?;
        let map = Arc::new(FleetMap::new(config.geometry.clone(), layout)?);
        let registry = Arc::new(TruckRegistry::new(map.bounds().center()));
        let dispatcher = Arc::new(Dispatcher::new(registry, map));

        let commands = CommandHandler::new(Arc::clone(&dispatcher), outbound, config.topics.clone());
        let telemetry = TelemetryAdapter::new(Arc::clone(&dispatcher), config.topics.clone());
        let simulator = Arc::new(MotionSimulator::new(
            Arc::clone(&dispatcher),
            config.max_step,
            config.seed,
        )?);

        log::info!(
            "Fleet engine ready: {} walls, {}x{} canvas",
            dispatcher.map().walls().len(),
            config.geometry.canvas_width,
            config.geometry.canvas_height
        );

        Ok(Self {
            config,
            dispatcher,
            commands,
            telemetry,
            simulator,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn registry(&self) -> &Arc<TruckRegistry> {
        self.dispatcher.registry()
    }

    pub fn map(&self) -> &Arc<FleetMap> {
        self.dispatcher.map()
    }

    pub fn commands(&self) -> &CommandHandler {
        &self.commands
    }

    pub fn telemetry(&self) -> &TelemetryAdapter {
        &self.telemetry
    }

    pub fn simulator(&self) -> &Arc<MotionSimulator> {
        &self.simulator
    }

    /// Start ticking the simulator at the configured period.
    pub fn start_simulator(&self) -> Result<SimulatorHandle> {
        self.simulator.spawn(self.config.tick_period())
    }

    pub fn subscribe(&self) -> Receiver<Notification> {
        self.dispatcher.subscribe()
    }

    // Convenience accessors

    pub fn add_truck(&self) -> TruckId {
        self.commands.add_truck()
    }

    pub fn truck(&self, id: TruckId) -> Option<Truck> {
        self.registry().get(id)
    }

    pub fn trucks(&self) -> Vec<Truck> {
        self.registry().snapshot()
    }

    pub fn truck_count(&self) -> usize {
        self.registry().len()
    }

    pub fn add_collectible(&self, position: PixelPoint) -> Option<CollectibleId> {
        self.map().add_collectible(position)
    }

    pub fn collectibles(&self) -> Vec<Collectible> {
        self.map().list_collectibles()
    }

    /// Point-in-time copy of every truck and collectible.
    pub fn snapshot(&self) -> FleetSnapshot {
        FleetSnapshot {
            trucks: self.trucks(),
            collectibles: self.collectibles(),
        }
    }

    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}

/// Fleet state for dumps and diagnostics. Trucks and collectibles are read
/// separately, so the two halves may straddle an update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSnapshot {
    pub trucks: Vec<Truck>,
    pub collectibles: Vec<Collectible>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use minefleet_logic::geometry::LogicalPoint;

    use crate::config::ConfigError;
    use crate::error::EngineError;
    use crate::outbound::NullOutbound;

    #[test]
    fn test_engine_creation() {
        let engine = FleetEngine::new(EngineConfig::default(), Arc::new(NullOutbound)).unwrap();
        assert_eq!(engine.truck_count(), 0);
        assert_eq!(engine.map().walls().len(), 11);
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let config = EngineConfig {
            tick_ms: 0,
            ..Default::default()
        };
        match FleetEngine::new(config, Arc::new(NullOutbound)) {
            Err(EngineError::InvalidConfig(errors)) => {
                assert_eq!(errors, vec![ConfigError::ZeroTickPeriod]);
            }
            _ => panic!("expected InvalidConfig"),
        }
    }

    #[test]
    fn test_trucks_spawn_at_map_center() {
        let engine = FleetEngine::new(EngineConfig::default(), Arc::new(NullOutbound)).unwrap();
        let id = engine.add_truck();
        assert_eq!(engine.truck(id).unwrap().position, LogicalPoint::new(50.0, 50.0));
        assert_eq!(engine.trucks().len(), 1);
    }

    #[test]
    fn test_snapshot_json_lists_trucks_and_collectibles() {
        let engine = FleetEngine::with_layout(EngineConfig::default(), MapLayout::open(), Arc::new(NullOutbound)).unwrap();
        let id = engine.add_truck();
        engine.add_collectible(PixelPoint::new(100, 100)).unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.trucks.len(), 1);
        assert_eq!(snapshot.collectibles.len(), 1);

        let json: serde_json::Value = serde_json::from_str(&engine.snapshot_json().unwrap()).unwrap();
        assert_eq!(json["trucks"][0]["id"], id);
        assert_eq!(json["trucks"][0]["position"]["x"], 50.0);
        assert_eq!(json["collectibles"][0]["position"]["x"], 100);
    }

    #[test]
    fn test_simulator_handle_from_engine() {
        let config = EngineConfig {
            tick_ms: 5,
            seed: Some(1),
            ..Default::default()
        };
        let engine = FleetEngine::with_layout(config, MapLayout::open(), Arc::new(NullOutbound)).unwrap();
        let handle = engine.start_simulator().unwrap();
        assert!(handle.is_running());
        handle.stop();
    }
}
