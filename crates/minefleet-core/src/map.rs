//! The shared map: immutable walls and projection plus the mutable collectible field.

use minefleet_logic::geometry::{GeometryConfig, LogicalBounds, LogicalPoint, PixelPoint, PixelRect, Projection};
use minefleet_logic::map::{is_layout_usable, validate_layout, MapLayout, Severity};

use crate::collectibles::{Collectible, CollectibleField, CollectibleId};
use crate::error::{EngineError, Result};

pub struct FleetMap {
    geometry: GeometryConfig,
    projection: Projection,
    layout: MapLayout,
    collectibles: CollectibleField,
}

impl FleetMap {
    /// Build a map, refusing layouts with error-severity problems.
    pub fn new(geometry: GeometryConfig, layout: MapLayout) -> Result<Self> {
        let problems = validate_layout(&layout, &geometry);
        if !is_layout_usable(&problems) {
            return Err(EngineError::InvalidLayout(problems));
        }
        for warning in problems.iter().filter(|p| p.severity == Severity::Warning) {
            log::warn!("{}", warning.message);
        }
        Ok(Self {
            projection: geometry.projection(),
            collectibles: CollectibleField::new(geometry.collectible_size),
            geometry,
            layout,
        })
    }

    pub fn geometry(&self) -> &GeometryConfig {
        &self.geometry
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn bounds(&self) -> LogicalBounds {
        self.projection.bounds()
    }

    pub fn walls(&self) -> &[PixelRect] {
        &self.layout.walls
    }

    pub fn to_pixel(&self, p: LogicalPoint) -> PixelPoint {
        self.projection.to_pixel(p)
    }

    pub fn collectibles(&self) -> &CollectibleField {
        &self.collectibles
    }

    pub fn add_collectible(&self, position: PixelPoint) -> Option<CollectibleId> {
        self.collectibles.add(position)
    }

    pub fn list_collectibles(&self) -> Vec<Collectible> {
        self.collectibles.list()
    }
}
