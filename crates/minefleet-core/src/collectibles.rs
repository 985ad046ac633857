//! Collectible items ("pellets") scattered on the map.
//!
//! Each collectible is an entity in a `hecs` world. Pickup removes it with
//! `despawn`, which succeeds once per entity: two trucks racing for the
//! same item can never both be credited.

use std::sync::Mutex;

use hecs::{Entity, World};
use minefleet_logic::collision::{collectibles_clash, within_pickup};
use minefleet_logic::geometry::PixelPoint;
use serde::Serialize;

use crate::sync::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CollectibleId(u64);

impl CollectibleId {
    fn from_entity(entity: Entity) -> Self {
        Self(entity.to_bits().get())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Collectible {
    pub id: CollectibleId,
    pub position: PixelPoint,
}

/// Marker component for collectible entities
struct Pellet;

pub struct CollectibleField {
    world: Mutex<World>,
    size: i32,
}

impl CollectibleField {
    /// `size` is the pellet edge in pixels; it is also the pickup radius.
    pub fn new(size: i32) -> Self {
        Self {
            world: Mutex::new(World::new()),
            size,
        }
    }

    /// Place a collectible. `None` when it would sit on top of another one.
    pub fn add(&self, position: PixelPoint) -> Option<CollectibleId> {
        let mut world = lock(&self.world);
        let crowded = world
            .query::<(&Pellet, &PixelPoint)>()
            .iter()
            .any(|(_, (_, existing))| collectibles_clash(*existing, position, self.size));
        if crowded {
            return None;
        }
        Some(CollectibleId::from_entity(world.spawn((Pellet, position))))
    }

    /// Remove and return every collectible a truck at `candidate` picks up.
    pub fn collect_at(&self, candidate: PixelPoint) -> Vec<Collectible> {
        let mut world = lock(&self.world);
        let hits: Vec<(Entity, PixelPoint)> = world
            .query::<(&Pellet, &PixelPoint)>()
            .iter()
            .filter(|(_, (_, p))| within_pickup(candidate, **p, self.size))
            .map(|(entity, (_, p))| (entity, *p))
            .collect();

        hits.into_iter()
            .filter(|(entity, _)| world.despawn(*entity).is_ok())
            .map(|(entity, position)| Collectible {
                id: CollectibleId::from_entity(entity),
                position,
            })
            .collect()
    }

    pub fn list(&self) -> Vec<Collectible> {
        let world = lock(&self.world);
        let mut items: Vec<Collectible> = world
            .query::<(&Pellet, &PixelPoint)>()
            .iter()
            .map(|(entity, (_, p))| Collectible {
                id: CollectibleId::from_entity(entity),
                position: *p,
            })
            .collect();
        items.sort_by_key(|c| c.id);
        items
    }

    pub fn len(&self) -> usize {
        lock(&self.world).len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
