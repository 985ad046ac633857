//! Logical and pixel geometry.
//!
//! Truck positions live in a logical space (0..=COORD_MAX on each axis).
//! Every geometric check runs in pixel space after projecting through
//! [`Projection`], the same projection a renderer uses, so a collision
//! verdict always agrees with what is drawn.

use serde::{Deserialize, Serialize};

use crate::constants::{canvas, coords, sizes};

/// A position in logical map units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicalPoint {
    pub x: f64,
    pub y: f64,
}

impl LogicalPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// The logical map rectangle `[0, max_x] × [0, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalBounds {
    pub max_x: f64,
    pub max_y: f64,
}

impl LogicalBounds {
    pub fn new(max_x: f64, max_y: f64) -> Self {
        Self { max_x, max_y }
    }

    pub fn contains(&self, p: LogicalPoint) -> bool {
        p.is_finite() && (0.0..=self.max_x).contains(&p.x) && (0.0..=self.max_y).contains(&p.y)
    }

    /// Clamp each component into the bounds independently.
    pub fn clamp(&self, p: LogicalPoint) -> LogicalPoint {
        LogicalPoint {
            x: p.x.max(0.0).min(self.max_x),
            y: p.y.max(0.0).min(self.max_y),
        }
    }

    pub fn center(&self) -> LogicalPoint {
        LogicalPoint::new(self.max_x / 2.0, self.max_y / 2.0)
    }
}

impl Default for LogicalBounds {
    fn default() -> Self {
        Self::new(coords::COORD_MAX_X, coords::COORD_MAX_Y)
    }
}

/// An integer pixel position on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned pixel rectangle, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A `size × size` square centred on `center`.
    pub fn centered(center: PixelPoint, size: i32) -> Self {
        let half = size / 2;
        Self::new(center.x - half, center.y - half, size, size)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Strict AABB overlap: touching edges do not count.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains(&self, p: PixelPoint) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }
}

/// Tunable geometry of the map, canvas and icons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub coord_max_x: f64,
    pub coord_max_y: f64,
    pub canvas_width: i32,
    pub canvas_height: i32,
    pub margin: i32,
    pub inset: i32,
    /// Truck icon edge length in pixels.
    pub truck_size: i32,
    /// Minimum truck separation in pixels.
    pub collision_radius: f64,
    /// Collectible edge length / pickup radius in pixels.
    pub collectible_size: i32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            coord_max_x: coords::COORD_MAX_X,
            coord_max_y: coords::COORD_MAX_Y,
            canvas_width: canvas::WIDTH,
            canvas_height: canvas::HEIGHT,
            margin: canvas::MARGIN,
            inset: canvas::INSET,
            truck_size: sizes::TRUCK_ICON,
            collision_radius: sizes::COLLISION_RADIUS,
            collectible_size: sizes::COLLECTIBLE,
        }
    }
}

impl GeometryConfig {
    pub fn bounds(&self) -> LogicalBounds {
        LogicalBounds::new(self.coord_max_x, self.coord_max_y)
    }

    pub fn projection(&self) -> Projection {
        Projection {
            bounds: self.bounds(),
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            margin: self.margin,
            inset: self.inset,
        }
    }

    /// Bounding box of a truck whose icon is centred on `center`.
    pub fn truck_box(&self, center: PixelPoint) -> PixelRect {
        PixelRect::centered(center, self.truck_size)
    }
}

/// Affine logical→pixel mapping with a fixed margin, clamped to the drawable area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    bounds: LogicalBounds,
    canvas_width: i32,
    canvas_height: i32,
    margin: i32,
    inset: i32,
}

impl Projection {
    pub fn to_pixel(&self, p: LogicalPoint) -> PixelPoint {
        PixelPoint {
            x: project_axis(p.x, self.bounds.max_x, self.canvas_width, self.margin, self.inset),
            y: project_axis(p.y, self.bounds.max_y, self.canvas_height, self.margin, self.inset),
        }
    }

    pub fn bounds(&self) -> LogicalBounds {
        self.bounds
    }
}

impl Default for Projection {
    fn default() -> Self {
        GeometryConfig::default().projection()
    }
}

fn project_axis(value: f64, max: f64, extent: i32, margin: i32, inset: i32) -> i32 {
    let span = f64::from(extent - inset);
    let scaled = value / max * span + f64::from(margin);
    // f64::clamp panics when margin > span
    let clamped = scaled.max(f64::from(margin)).min(span);
    clamped as i32
}
