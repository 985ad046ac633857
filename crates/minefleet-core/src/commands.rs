//! Operator commands: the engine side of the control panel.
//!
//! Every command is validated before anything is sent or changed. A
//! validated command goes to the outbound sink and, where it has a local
//! effect, through the dispatcher.

use std::sync::Arc;

use minefleet_logic::arbiter::OperatingMode;
use minefleet_logic::command::{Command, CommandError, FailureKind};
use minefleet_logic::geometry::LogicalPoint;
use minefleet_logic::telemetry::{format_position_payload, TopicScheme};
use minefleet_logic::TruckId;

use crate::dispatcher::{Dispatcher, Resolution};
use crate::error::{EngineError, Result};
use crate::outbound::Outbound;
use crate::update::ProposedUpdate;

/// What a replayed command line did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    TruckAdded(TruckId),
    Resolved(Resolution),
    ModeChanged { truck: TruckId, mode: OperatingMode },
    FailureInjected { truck: TruckId, kind: FailureKind },
}

#[derive(Clone)]
pub struct CommandHandler {
    dispatcher: Arc<Dispatcher>,
    outbound: Arc<dyn Outbound>,
    topics: TopicScheme,
}

impl CommandHandler {
    pub fn new(dispatcher: Arc<Dispatcher>, outbound: Arc<dyn Outbound>, topics: TopicScheme) -> Self {
        Self {
            dispatcher,
            outbound,
            topics,
        }
    }

    /// Register a new truck and tell the mine simulation about it.
    pub fn add_truck(&self) -> TruckId {
        let id = self.dispatcher.registry().create_truck();
        self.send(&Command::AddTruck);
        id
    }

    /// Put a truck in manual mode at an operator-chosen pose.
    ///
    /// The mode switch stays even when the pose itself is refused on geometry.
    pub fn set_manual(&self, truck: TruckId, x: f64, y: f64, angle: i32) -> Result<Resolution> {
        let command = Command::set_manual(truck, x, y, angle, &self.dispatcher.map().bounds())
            .inspect_err(|err| log::warn!("Rejected manual command for truck {}: {}", truck, err))?;
        self.require_truck(truck)?;
        self.send(&command);
        self.dispatcher.set_mode(truck, OperatingMode::Manual);
        let proposal = ProposedUpdate::manual(truck, LogicalPoint::new(x, y)).with_angle(Some(angle));
        Ok(self.dispatcher.submit(proposal))
    }

    /// Hand a truck back to automatic driving.
    pub fn set_auto(&self, truck: TruckId) -> Result<()> {
        self.require_truck(truck)?;
        self.send(&Command::SetAuto { truck });
        self.dispatcher.set_mode(truck, OperatingMode::Automatic);
        Ok(())
    }

    pub fn inject_failure(&self, truck: TruckId, kind: FailureKind) -> Result<()> {
        self.require_truck(truck)?;
        self.send(&Command::InjectFailure { truck, kind });
        Ok(())
    }

    /// Flip local motion for a truck, returning the new setting.
    pub fn toggle_motion(&self, truck: TruckId) -> Result<bool> {
        self.dispatcher
            .toggle_motion(truck)
            .ok_or(EngineError::UnknownTruck(truck))
    }

    /// Publish a navigation target for the planner.
    pub fn send_setpoint(&self, truck: TruckId, x: f64, y: f64) -> Result<()> {
        let target = LogicalPoint::new(x, y);
        if !self.dispatcher.map().bounds().contains(target) {
            log::warn!("Rejected setpoint ({}, {}) for truck {}", x, y, truck);
            return Err(CommandError::CoordinateOutOfRange { x, y }.into());
        }
        self.require_truck(truck)?;
        self.outbound
            .publish(self.topics.setpoint_topic(truck), format_position_payload(target));
        Ok(())
    }

    /// Parse and perform one operator command line.
    pub fn execute_line(&self, line: &str) -> Result<CommandOutcome> {
        let command = line
            .parse::<Command>()
            .inspect_err(|err| log::warn!("Rejected command line {:?}: {}", line, err))?;
        match command {
            Command::AddTruck => Ok(CommandOutcome::TruckAdded(self.add_truck())),
            Command::SetManual { truck, x, y, angle } => {
                Ok(CommandOutcome::Resolved(self.set_manual(truck, x, y, angle)?))
            }
            Command::SetAuto { truck } => {
                self.set_auto(truck)?;
                Ok(CommandOutcome::ModeChanged {
                    truck,
                    mode: OperatingMode::Automatic,
                })
            }
            Command::InjectFailure { truck, kind } => {
                self.inject_failure(truck, kind)?;
                Ok(CommandOutcome::FailureInjected { truck, kind })
            }
        }
    }

    fn require_truck(&self, truck: TruckId) -> Result<()> {
        if self.dispatcher.registry().contains(truck) {
            Ok(())
        } else {
            log::warn!("Command for unknown truck {}", truck);
            Err(EngineError::UnknownTruck(truck))
        }
    }

    fn send(&self, command: &Command) {
        self.outbound.send_command(command.to_string());
    }
}
