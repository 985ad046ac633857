//! Line-oriented operator commands for the mine-simulation socket.
//!
//! ```text
//! add_truck
//! set_manual:{id}:{x}:{y}:{angle}
//! set_auto:{id}
//! inject_temp_failure:{id}
//! inject_electric_failure:{id}
//! inject_hydraulic_failure:{id}
//! ```
//!
//! Values are validated before a command is built, so a command that fails
//! validation is never handed to the transport.
//!
//! ```
//! use minefleet_logic::command::Command;
//!
//! let cmd: Command = "set_manual:3:0:0:0".parse().unwrap();
//! assert_eq!(cmd.to_string(), "set_manual:3:0:0:0");
//! assert!("set_manual:3:0:0:181".parse::<Command>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::is_valid_angle;
use crate::geometry::{LogicalBounds, LogicalPoint};
use crate::TruckId;

/// Subsystem a failure is injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Temperature,
    Electric,
    Hydraulic,
}

impl FailureKind {
    pub const ALL: [FailureKind; 3] = [
        FailureKind::Temperature,
        FailureKind::Electric,
        FailureKind::Hydraulic,
    ];

    fn wire_name(self) -> &'static str {
        match self {
            FailureKind::Temperature => "temp",
            FailureKind::Electric => "electric",
            FailureKind::Hydraulic => "hydraulic",
        }
    }

    fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.wire_name() == name)
    }
}

/// An outbound operator command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddTruck,
    SetManual {
        truck: TruckId,
        x: f64,
        y: f64,
        angle: i32,
    },
    SetAuto {
        truck: TruckId,
    },
    InjectFailure {
        truck: TruckId,
        kind: FailureKind,
    },
}

/// Command validation and parse errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{command} expects {expected} fields, got {found}")]
    FieldCount {
        command: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid truck id: {0}")]
    BadTruckId(String),

    #[error("invalid {field} value: {value}")]
    BadNumber { field: &'static str, value: String },

    #[error("angle {0} outside [-180, 180]")]
    AngleOutOfRange(i32),

    #[error("position ({x}, {y}) outside the map")]
    CoordinateOutOfRange { x: f64, y: f64 },
}

impl Command {
    /// Build a validated `set_manual` command.
    pub fn set_manual(
        truck: TruckId,
        x: f64,
        y: f64,
        angle: i32,
        bounds: &LogicalBounds,
    ) -> Result<Self, CommandError> {
        let cmd = Command::SetManual { truck, x, y, angle };
        cmd.validate(bounds)?;
        Ok(cmd)
    }

    /// Check value ranges against the map.
    pub fn validate(&self, bounds: &LogicalBounds) -> Result<(), CommandError> {
        if let Command::SetManual { x, y, angle, .. } = *self {
            if !is_valid_angle(angle) {
                return Err(CommandError::AngleOutOfRange(angle));
            }
            if !bounds.contains(LogicalPoint::new(x, y)) {
                return Err(CommandError::CoordinateOutOfRange { x, y });
            }
        }
        Ok(())
    }

    pub fn truck(&self) -> Option<TruckId> {
        match *self {
            Command::AddTruck => None,
            Command::SetManual { truck, .. }
            | Command::SetAuto { truck }
            | Command::InjectFailure { truck, .. } => Some(truck),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::AddTruck => write!(f, "add_truck"),
            Command::SetManual { truck, x, y, angle } => {
                write!(f, "set_manual:{}:{}:{}:{}", truck, x, y, angle)
            }
            Command::SetAuto { truck } => write!(f, "set_auto:{}", truck),
            Command::InjectFailure { truck, kind } => {
                write!(f, "inject_{}_failure:{}", kind.wire_name(), truck)
            }
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    /// Parse a command line. Angles are range-checked; coordinates are only
    /// checked for being numbers (use [`Command::validate`] against the map).
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }
        let mut parts = line.split(':');
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match name {
            "add_truck" => {
                expect_fields("add_truck", &args, 0)?;
                Ok(Command::AddTruck)
            }
            "set_manual" => {
                expect_fields("set_manual", &args, 4)?;
                let truck = parse_truck(args[0])?;
                let x = parse_number("x", args[1])?;
                let y = parse_number("y", args[2])?;
                let angle: i32 = args[3].parse().map_err(|_| CommandError::BadNumber {
                    field: "angle",
                    value: args[3].to_string(),
                })?;
                if !is_valid_angle(angle) {
                    return Err(CommandError::AngleOutOfRange(angle));
                }
                Ok(Command::SetManual { truck, x, y, angle })
            }
            "set_auto" => {
                expect_fields("set_auto", &args, 1)?;
                Ok(Command::SetAuto {
                    truck: parse_truck(args[0])?,
                })
            }
            other => {
                let kind = other
                    .strip_prefix("inject_")
                    .and_then(|rest| rest.strip_suffix("_failure"))
                    .and_then(FailureKind::from_wire)
                    .ok_or_else(|| CommandError::Unknown(other.to_string()))?;
                expect_fields("inject_failure", &args, 1)?;
                Ok(Command::InjectFailure {
                    truck: parse_truck(args[0])?,
                    kind,
                })
            }
        }
    }
}

fn expect_fields(command: &'static str, args: &[&str], expected: usize) -> Result<(), CommandError> {
    if args.len() != expected {
        return Err(CommandError::FieldCount {
            command,
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn parse_truck(s: &str) -> Result<TruckId, CommandError> {
    s.parse().map_err(|_| CommandError::BadTruckId(s.to_string()))
}

fn parse_number(field: &'static str, s: &str) -> Result<f64, CommandError> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(CommandError::BadNumber {
            field,
            value: s.to_string(),
        }),
    }
}
