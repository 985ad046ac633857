//! Update Dispatcher: the single path by which truck state changes.
//!
//! Resolving a proposal for truck `T`:
//!
//! 1. take `T`'s gate, so every write to `T` is serialized
//! 2. arbitrate the source against `T`'s authority, mode and motion flag
//! 3. resolve the proposed change against `T`'s record and reject
//!    positions outside the logical bounds
//! 4. for a real move, project to pixels and check truck-vs-truck then
//!    truck-vs-wall against a snapshot of the other trucks
//! 5. under the registry write lock, re-check truck-vs-truck against the
//!    live records, remove collectibles and write the record
//! 6. publish notifications, still holding the gate
//!
//! Step 5 closes the window in which two trucks could each pass step 4
//! against the other's stale position and land inside each other.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use minefleet_logic::arbiter::{arbitrate, OperatingMode, OwnershipConflict};
use minefleet_logic::collision::{check_move, truck_contact, Contact};
use minefleet_logic::geometry::PixelPoint;
use minefleet_logic::TruckId;

use crate::map::FleetMap;
use crate::observer::ObserverSet;
use crate::registry::{ControlChange, Truck, TruckRegistry};
use crate::sync::lock;
use crate::update::{AcceptedUpdate, Notification, ProposedUpdate};

/// Why a proposal was dropped. Drops are outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    UnknownTruck,
    Ownership(OwnershipConflict),
    OutOfBounds,
    TruckContact(TruckId),
    WallContact(usize),
}

impl From<Contact> for DropReason {
    fn from(contact: Contact) -> Self {
        match contact {
            Contact::Truck(id) => DropReason::TruckContact(id),
            Contact::Wall(index) => DropReason::WallContact(index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Applied(AcceptedUpdate),
    Dropped(DropReason),
}

impl Resolution {
    pub fn is_applied(&self) -> bool {
        matches!(self, Resolution::Applied(_))
    }

    pub fn accepted(&self) -> Option<&AcceptedUpdate> {
        match self {
            Resolution::Applied(update) => Some(update),
            Resolution::Dropped(_) => None,
        }
    }

    pub fn drop_reason(&self) -> Option<DropReason> {
        match self {
            Resolution::Applied(_) => None,
            Resolution::Dropped(reason) => Some(*reason),
        }
    }
}

pub struct Dispatcher {
    registry: Arc<TruckRegistry>,
    map: Arc<FleetMap>,
    observers: ObserverSet,
}

impl Dispatcher {
    pub fn new(registry: Arc<TruckRegistry>, map: Arc<FleetMap>) -> Self {
        Self {
            registry,
            map,
            observers: ObserverSet::new(),
        }
    }

    pub fn registry(&self) -> &Arc<TruckRegistry> {
        &self.registry
    }

    pub fn map(&self) -> &Arc<FleetMap> {
        &self.map
    }

    pub fn subscribe(&self) -> Receiver<Notification> {
        self.observers.subscribe()
    }

    /// Resolve one proposal: apply it entirely or drop it entirely.
    pub fn submit(&self, proposal: ProposedUpdate) -> Resolution {
        let id = proposal.truck;
        let Some(gate) = self.registry.gate(id) else {
            return self.dropped(&proposal, DropReason::UnknownTruck);
        };
        let _guard = lock(&gate);

        let Some(current) = self.registry.get(id) else {
            return self.dropped(&proposal, DropReason::UnknownTruck);
        };
        let authority = match arbitrate(proposal.source, &current.control()) {
            Ok(authority) => authority,
            Err(conflict) => return self.dropped(&proposal, DropReason::Ownership(conflict)),
        };
        let position = proposal.position.resolve(current.position);
        if !self.map.bounds().contains(position) {
            return self.dropped(&proposal, DropReason::OutOfBounds);
        }

        let moving = position != current.position;
        let candidate = self.map.to_pixel(position);
        if moving {
            let others = self
                .registry
                .positions()
                .into_iter()
                .filter(|(other, _)| *other != id)
                .map(|(other, p)| (other, self.map.to_pixel(p)));
            if let Err(contact) = check_move(candidate, others, self.map.walls(), self.map.geometry()) {
                return self.dropped(&proposal, contact.into());
            }
        }

        let angle = proposal.angle.or(current.angle);
        let committed = self.registry.commit(id, |records| {
            if moving {
                let others = records
                    .values()
                    .filter(|t| t.id != id)
                    .map(|t| (t.id, self.map.to_pixel(t.position)));
                if let Some(other) = truck_contact(candidate, others, self.map.geometry().collision_radius) {
                    return Err(DropReason::TruckContact(other));
                }
            }
            let collected = if moving {
                self.map.collectibles().collect_at(candidate)
            } else {
                Vec::new()
            };
            Ok(AcceptedUpdate {
                truck: id,
                position,
                angle,
                authority,
                source: proposal.source,
                reading: proposal.reading.clone(),
                collected,
            })
        });

        match committed {
            None => self.dropped(&proposal, DropReason::UnknownTruck),
            Some(Err(reason)) => self.dropped(&proposal, reason),
            Some(Ok(update)) => {
                self.publish(&update, candidate);
                Resolution::Applied(update)
            }
        }
    }

    /// Switch a truck between automatic and manual driving.
    pub fn set_mode(&self, id: TruckId, mode: OperatingMode) -> Option<Truck> {
        self.change_control(id, ControlChange::Mode(mode))
    }

    pub fn set_motion_enabled(&self, id: TruckId, enabled: bool) -> Option<Truck> {
        self.change_control(id, ControlChange::MotionEnabled(enabled))
    }

    /// Flip the motion-enabled flag, returning the new value.
    pub fn toggle_motion(&self, id: TruckId) -> Option<bool> {
        let gate = self.registry.gate(id)?;
        let _guard = lock(&gate);
        let enabled = !self.registry.get(id)?.motion_enabled;
        self.registry
            .set_control(id, ControlChange::MotionEnabled(enabled))
            .map(|t| t.motion_enabled)
    }

    fn change_control(&self, id: TruckId, change: ControlChange) -> Option<Truck> {
        let gate = self.registry.gate(id)?;
        let _guard = lock(&gate);
        self.registry.set_control(id, change)
    }

    fn publish(&self, update: &AcceptedUpdate, candidate: PixelPoint) {
        for item in &update.collected {
            log::info!(
                "Truck {} collected item {:?} at ({}, {})",
                update.truck,
                item.id,
                candidate.x,
                candidate.y
            );
            self.observers.publish(Notification::CollectibleRemoved {
                id: item.id,
                position: item.position,
            });
        }
        self.observers.publish(Notification::truck_updated(update));
    }

    fn dropped(&self, proposal: &ProposedUpdate, reason: DropReason) -> Resolution {
        log::debug!(
            "Dropped {:?} update for truck {} ({:?}): {:?}",
            proposal.source,
            proposal.truck,
            proposal.position,
            reason
        );
        Resolution::Dropped(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minefleet_logic::arbiter::Authority;
    use minefleet_logic::geometry::{GeometryConfig, LogicalPoint, PixelRect};
    use minefleet_logic::map::MapLayout;

    fn dispatcher_with(layout: MapLayout) -> Dispatcher {
        let geometry = GeometryConfig::default();
        let registry = Arc::new(TruckRegistry::new(geometry.bounds().center()));
        let map = Arc::new(FleetMap::new(geometry, layout).unwrap());
        Dispatcher::new(registry, map)
    }

    fn dispatcher() -> Dispatcher {
        dispatcher_with(MapLayout::open())
    }

    fn p(x: f64, y: f64) -> LogicalPoint {
        LogicalPoint::new(x, y)
    }

    #[test]
    fn test_external_update_applies_and_taints() {
        let d = dispatcher();
        let id = d.registry().create_truck();
        let res = d.submit(ProposedUpdate::external(id, p(20.0, 30.0)));
        assert!(res.is_applied());
        let truck = d.registry().get(id).unwrap();
        assert_eq!(truck.position, p(20.0, 30.0));
        assert_eq!(truck.authority, Authority::External);
    }

    #[test]
    fn test_unknown_truck_is_dropped() {
        let d = dispatcher();
        let res = d.submit(ProposedUpdate::external(42, p(1.0, 1.0)));
        assert_eq!(res, Resolution::Dropped(DropReason::UnknownTruck));
        assert!(d.registry().is_empty());
    }

    #[test]
    fn test_out_of_bounds_is_dropped() {
        let d = dispatcher();
        let id = d.registry().create_truck();
        let res = d.submit(ProposedUpdate::manual(id, p(100.5, 10.0)));
        assert_eq!(res.drop_reason(), Some(DropReason::OutOfBounds));
        assert_eq!(d.registry().get(id).unwrap().position, p(50.0, 50.0));
    }

    #[test]
    fn test_simulated_needs_motion_enabled() {
        let d = dispatcher();
        let id = d.registry().create_truck();
        let res = d.submit(ProposedUpdate::simulated(id, p(51.0, 50.0)));
        assert_eq!(
            res,
            Resolution::Dropped(DropReason::Ownership(OwnershipConflict::MotionDisabled))
        );

        d.set_motion_enabled(id, true);
        assert!(d.submit(ProposedUpdate::simulated(id, p(51.0, 50.0))).is_applied());
        assert_eq!(d.registry().get(id).unwrap().authority, Authority::Local);
    }

    #[test]
    fn test_truck_contact_blocks_move() {
        let d = dispatcher();
        let a = d.registry().create_truck();
        let b = d.registry().create_truck();
        assert!(d.submit(ProposedUpdate::external(a, p(20.0, 20.0))).is_applied());

        // (21, 20) projects 7 px from truck a
        let res = d.submit(ProposedUpdate::external(b, p(21.0, 20.0)));
        assert_eq!(res, Resolution::Dropped(DropReason::TruckContact(a)));
        assert_eq!(d.registry().get(b).unwrap().position, p(50.0, 50.0));
        assert_eq!(d.registry().get(b).unwrap().authority, Authority::Local);
    }

    #[test]
    fn test_wall_contact_blocks_move() {
        let wall = PixelRect::new(100, 100, 50, 50);
        let d = dispatcher_with(MapLayout::open().with_wall(wall));
        let id = d.registry().create_truck();
        // (15, 30) projects to (117, 115), inside the wall
        let res = d.submit(ProposedUpdate::external(id, p(15.0, 30.0)));
        assert_eq!(res, Resolution::Dropped(DropReason::WallContact(0)));
    }

    #[test]
    fn test_unchanged_position_skips_geometry() {
        let d = dispatcher();
        let a = d.registry().create_truck();
        let b = d.registry().create_truck();
        // both stacked at spawn; a re-report of the same position still applies
        let res = d.submit(ProposedUpdate::external(a, p(50.0, 50.0)).with_angle(Some(45)));
        assert!(res.is_applied());
        let truck = d.registry().get(a).unwrap();
        assert_eq!(truck.angle, Some(45));
        assert_eq!(truck.authority, Authority::External);
        assert_eq!(d.registry().get(b).unwrap().authority, Authority::Local);
    }

    #[test]
    fn test_angle_is_kept_when_absent() {
        let d = dispatcher();
        let id = d.registry().create_truck();
        d.submit(ProposedUpdate::manual(id, p(10.0, 10.0)).with_angle(Some(-90)));
        d.submit(ProposedUpdate::manual(id, p(12.0, 10.0)));
        assert_eq!(d.registry().get(id).unwrap().angle, Some(-90));
    }

    #[test]
    fn test_pickup_removes_collectible_once_and_notifies() {
        let d = dispatcher();
        let rx = d.subscribe();
        let id = d.registry().create_truck();
        let target = p(20.0, 20.0);
        let px = d.map().to_pixel(target);
        let item = d.map().add_collectible(PixelPoint::new(px.x + 3, px.y - 3)).unwrap();

        let res = d.submit(ProposedUpdate::external(id, target));
        let update = res.accepted().unwrap();
        assert_eq!(update.collected.len(), 1);
        assert_eq!(update.collected[0].id, item);
        assert!(d.map().collectibles().is_empty());

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Notification::CollectibleRemoved { id, .. } if id == item));
        assert!(matches!(events[1], Notification::TruckUpdated { truck, .. } if truck == id));
    }

    #[test]
    fn test_dropped_update_has_no_side_effects() {
        let d = dispatcher();
        let rx = d.subscribe();
        let a = d.registry().create_truck();
        let b = d.registry().create_truck();
        d.submit(ProposedUpdate::external(a, p(20.0, 20.0)));
        let _ = rx.try_iter().count();

        let px = d.map().to_pixel(p(21.0, 20.0));
        d.map().add_collectible(px).unwrap();
        let res = d.submit(ProposedUpdate::external(b, p(21.0, 20.0)));
        assert!(!res.is_applied());
        assert_eq!(d.map().collectibles().len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_toggle_motion() {
        let d = dispatcher();
        let id = d.registry().create_truck();
        assert_eq!(d.toggle_motion(id), Some(true));
        assert_eq!(d.toggle_motion(id), Some(false));
        assert_eq!(d.toggle_motion(99), None);
    }

    #[test]
    fn test_mode_changes() {
        let d = dispatcher();
        let id = d.registry().create_truck();
        d.set_motion_enabled(id, true);
        d.set_mode(id, OperatingMode::Manual);
        assert_eq!(
            d.submit(ProposedUpdate::simulated(id, p(51.0, 50.0))).drop_reason(),
            Some(DropReason::Ownership(OwnershipConflict::ManualMode))
        );
        d.set_mode(id, OperatingMode::Automatic);
        assert!(d.submit(ProposedUpdate::simulated(id, p(51.0, 50.0))).is_applied());
    }
}
