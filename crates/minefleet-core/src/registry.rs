//! Truck Registry: the authoritative map from truck id to truck record.
//!
//! Records are read through snapshots (clones) so no caller ever holds a
//! reference into the map. Writes go through the crate-private `commit`,
//! `apply` and `set_control` paths, which the dispatcher only calls while
//! holding the truck's gate (its per-truck mutex).
//!
//! Lock order: truck gate, then `records`, then the collectible field. A
//! thread never holds two truck gates at once.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use minefleet_logic::arbiter::{Authority, OperatingMode, TruckControl};
use minefleet_logic::geometry::LogicalPoint;
use minefleet_logic::telemetry::ReadingChannel;
use minefleet_logic::TruckId;
use serde::Serialize;

use crate::sync::{read, write};
use crate::update::AcceptedUpdate;

/// A haul truck as the engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Truck {
    pub id: TruckId,
    pub position: LogicalPoint,
    /// Heading in degrees, unset until a reading or manual command sets it.
    pub angle: Option<i32>,
    pub mode: OperatingMode,
    pub motion_enabled: bool,
    pub authority: Authority,
    /// Last value seen on each sensor key.
    pub sensors: BTreeMap<String, String>,
    /// Last value seen on each failure key.
    pub failures: BTreeMap<String, String>,
}

impl Truck {
    fn new(id: TruckId, position: LogicalPoint) -> Self {
        Self {
            id,
            position,
            angle: None,
            mode: OperatingMode::Automatic,
            motion_enabled: false,
            authority: Authority::Local,
            sensors: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }

    pub fn control(&self) -> TruckControl {
        TruckControl {
            authority: self.authority,
            mode: self.mode,
            motion_enabled: self.motion_enabled,
        }
    }

    fn apply(&mut self, update: &AcceptedUpdate) {
        self.position = update.position;
        self.angle = update.angle;
        self.authority = update.authority;
        if let Some(reading) = &update.reading {
            let readings = match reading.channel {
                ReadingChannel::Sensor => &mut self.sensors,
                ReadingChannel::Failure => &mut self.failures,
            };
            readings.insert(reading.field.clone(), reading.value.clone());
        }
    }
}

/// Operator-driven changes that bypass arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlChange {
    Mode(OperatingMode),
    MotionEnabled(bool),
}

pub struct TruckRegistry {
    next_id: AtomicU32,
    spawn_point: LogicalPoint,
    records: RwLock<BTreeMap<TruckId, Truck>>,
    gates: RwLock<BTreeMap<TruckId, Arc<Mutex<()>>>>,
}

impl TruckRegistry {
    /// New trucks are placed at `spawn_point` (the map centre in practice).
    pub fn new(spawn_point: LogicalPoint) -> Self {
        Self {
            next_id: AtomicU32::new(1),
            spawn_point,
            records: RwLock::new(BTreeMap::new()),
            gates: RwLock::new(BTreeMap::new()),
        }
    }

    /// Allocate an id and insert a fresh truck. Ids are never reused.
    pub fn create_truck(&self) -> TruckId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        // gate first: a truck visible in `records` always has a gate
        write(&self.gates).insert(id, Arc::new(Mutex::new(())));
        write(&self.records).insert(id, Truck::new(id, self.spawn_point));
        log::info!("Truck {} created at ({}, {})", id, self.spawn_point.x, self.spawn_point.y);
        id
    }

    pub fn spawn_point(&self) -> LogicalPoint {
        self.spawn_point
    }

    /// Snapshot of one truck.
    pub fn get(&self, id: TruckId) -> Option<Truck> {
        read(&self.records).get(&id).cloned()
    }

    pub fn contains(&self, id: TruckId) -> bool {
        read(&self.records).contains_key(&id)
    }

    pub fn len(&self) -> usize {
        read(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> Vec<TruckId> {
        read(&self.records).keys().copied().collect()
    }

    /// Snapshot of every truck, ordered by id.
    pub fn snapshot(&self) -> Vec<Truck> {
        read(&self.records).values().cloned().collect()
    }

    /// Every truck's position, ordered by id.
    pub fn positions(&self) -> Vec<(TruckId, LogicalPoint)> {
        read(&self.records)
            .values()
            .map(|t| (t.id, t.position))
            .collect()
    }

    /// Trucks the local simulator may currently move.
    pub fn simulation_candidates(&self) -> Vec<(TruckId, LogicalPoint)> {
        read(&self.records)
            .values()
            .filter(|t| t.control().simulation_eligible())
            .map(|t| (t.id, t.position))
            .collect()
    }

    pub(crate) fn gate(&self, id: TruckId) -> Option<Arc<Mutex<()>>> {
        read(&self.gates).get(&id).cloned()
    }

    /// Run `decide` against the live records under the write lock and apply
    /// its accepted update. `None` when the truck does not exist.
    pub(crate) fn commit<E, F>(&self, id: TruckId, decide: F) -> Option<Result<AcceptedUpdate, E>>
    where
        F: FnOnce(&BTreeMap<TruckId, Truck>) -> Result<AcceptedUpdate, E>,
    {
        let mut records = write(&self.records);
        if !records.contains_key(&id) {
            return None;
        }
        let outcome = decide(&records);
        if let (Ok(update), Some(truck)) = (&outcome, records.get_mut(&id)) {
            truck.apply(update);
        }
        Some(outcome)
    }

    pub(crate) fn set_control(&self, id: TruckId, change: ControlChange) -> Option<Truck> {
        let mut records = write(&self.records);
        let truck = records.get_mut(&id)?;
        match change {
            ControlChange::Mode(mode) => truck.mode = mode,
            ControlChange::MotionEnabled(enabled) => truck.motion_enabled = enabled,
        }
        Some(truck.clone())
    }
}
