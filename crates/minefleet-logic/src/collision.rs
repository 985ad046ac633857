//! Collision predicates in pixel space.
//!
//! Checks run in a fixed order, cheapest and most common first:
//! 1. truck-vs-truck (Euclidean distance against the collision radius)
//! 2. truck-vs-wall (AABB overlap of the centred truck box)
//! 3. truck-vs-collectible (per-axis pickup radius; never blocks movement)
//!
//! The detector never corrects a position. A contact in step 1 or 2 drops
//! the whole update and the truck stays where it was.

use crate::geometry::{GeometryConfig, PixelPoint, PixelRect};
use crate::TruckId;

/// Why a candidate position was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Too close to another truck.
    Truck(TruckId),
    /// Truck box overlaps the wall at this index of the layout.
    Wall(usize),
}

/// First other truck closer than `radius` to `candidate`, if any.
pub fn truck_contact<I>(candidate: PixelPoint, others: I, radius: f64) -> Option<TruckId>
where
    I: IntoIterator<Item = (TruckId, PixelPoint)>,
{
    others
        .into_iter()
        .find(|(_, other)| candidate.distance(other) < radius)
        .map(|(id, _)| id)
}

/// Index of the first wall overlapping `bbox`, if any.
pub fn wall_contact(bbox: &PixelRect, walls: &[PixelRect]) -> Option<usize> {
    walls.iter().position(|w| w.overlaps(bbox))
}

/// Truck-vs-truck then truck-vs-wall for a candidate pixel position.
///
/// `others` must not contain the moving truck itself.
pub fn check_move<I>(
    candidate: PixelPoint,
    others: I,
    walls: &[PixelRect],
    geometry: &GeometryConfig,
) -> Result<(), Contact>
where
    I: IntoIterator<Item = (TruckId, PixelPoint)>,
{
    if let Some(id) = truck_contact(candidate, others, geometry.collision_radius) {
        return Err(Contact::Truck(id));
    }
    if let Some(i) = wall_contact(&geometry.truck_box(candidate), walls) {
        return Err(Contact::Wall(i));
    }
    Ok(())
}

/// Whether a truck at `candidate` picks up a collectible at `collectible`.
pub fn within_pickup(candidate: PixelPoint, collectible: PixelPoint, radius: i32) -> bool {
    (candidate.x - collectible.x).abs() < radius && (candidate.y - collectible.y).abs() < radius
}

/// Whether two collectibles of edge `size` would be placed on top of each other.
pub fn collectibles_clash(a: PixelPoint, b: PixelPoint, size: i32) -> bool {
    (a.x - b.x).abs() < size * 2 && (a.y - b.y).abs() < size * 2
}
