//! Values that flow through the dispatcher: proposals in, accepted updates
//! and observer notifications out.

use std::time::Instant;

use minefleet_logic::arbiter::{Authority, UpdateSource};
use minefleet_logic::geometry::{LogicalPoint, PixelPoint};
use minefleet_logic::telemetry::ReadingChannel;
use minefleet_logic::TruckId;

use crate::collectibles::{Collectible, CollectibleId};

/// A scalar reading carried alongside an external proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub channel: ReadingChannel,
    pub field: String,
    pub value: String,
}

/// How a proposal moves its truck. Resolved against the record only once
/// the dispatcher holds the truck's gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionChange {
    Keep,
    SetX(f64),
    SetY(f64),
    To(LogicalPoint),
}

impl PositionChange {
    pub fn resolve(self, current: LogicalPoint) -> LogicalPoint {
        match self {
            PositionChange::Keep => current,
            PositionChange::SetX(x) => LogicalPoint::new(x, current.y),
            PositionChange::SetY(y) => LogicalPoint::new(current.x, y),
            PositionChange::To(p) => p,
        }
    }
}

impl From<LogicalPoint> for PositionChange {
    fn from(p: LogicalPoint) -> Self {
        PositionChange::To(p)
    }
}

/// A candidate new state for one truck. Never mutates anything by itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedUpdate {
    pub truck: TruckId,
    pub position: PositionChange,
    /// `None` keeps the current heading.
    pub angle: Option<i32>,
    pub source: UpdateSource,
    /// Diagnostic only. Proposals are resolved in lock-acquisition order.
    pub timestamp: Instant,
    pub reading: Option<Reading>,
}

impl ProposedUpdate {
    pub fn new(truck: TruckId, position: impl Into<PositionChange>, source: UpdateSource) -> Self {
        Self {
            truck,
            position: position.into(),
            angle: None,
            source,
            timestamp: Instant::now(),
            reading: None,
        }
    }

    pub fn external(truck: TruckId, position: impl Into<PositionChange>) -> Self {
        Self::new(truck, position, UpdateSource::External)
    }

    pub fn manual(truck: TruckId, position: impl Into<PositionChange>) -> Self {
        Self::new(truck, position, UpdateSource::Manual)
    }

    pub fn simulated(truck: TruckId, position: impl Into<PositionChange>) -> Self {
        Self::new(truck, position, UpdateSource::Simulated)
    }

    pub fn with_angle(mut self, angle: Option<i32>) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_reading(mut self, reading: Reading) -> Self {
        self.reading = Some(reading);
        self
    }
}

/// A proposal that passed arbitration and collision detection and was written.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedUpdate {
    pub truck: TruckId,
    pub position: LogicalPoint,
    /// Heading after the update (the previous one when the proposal had none).
    pub angle: Option<i32>,
    pub authority: Authority,
    pub source: UpdateSource,
    pub reading: Option<Reading>,
    /// Collectibles removed by this move.
    pub collected: Vec<Collectible>,
}

/// Observer events, published in resolution order per truck.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    TruckUpdated {
        truck: TruckId,
        position: LogicalPoint,
        angle: Option<i32>,
        authority: Authority,
    },
    CollectibleRemoved {
        id: CollectibleId,
        position: PixelPoint,
    },
}

impl Notification {
    pub(crate) fn truck_updated(update: &AcceptedUpdate) -> Self {
        Notification::TruckUpdated {
            truck: update.truck,
            position: update.position,
            angle: update.angle,
            authority: update.authority,
        }
    }
}
