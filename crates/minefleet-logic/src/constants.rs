//! Fleet constants: coordinate space, canvas, icon sizes and wire keys.
//!
//! Plain constants with no runtime dependency. Both the engine and the
//! headless harness use these, and [`crate::geometry::GeometryConfig`]
//! defaults to them.

pub mod coords {
    /// Logical X coordinates run from 0 to this value.
    pub const COORD_MAX_X: f64 = 100.0;
    /// Logical Y coordinates run from 0 to this value.
    pub const COORD_MAX_Y: f64 = 100.0;
}

pub mod canvas {
    /// Drawable map width in pixels.
    pub const WIDTH: i32 = 760;
    /// Drawable map height in pixels.
    pub const HEIGHT: i32 = 390;
    /// Left/top margin added after scaling.
    pub const MARGIN: i32 = 8;
    /// Pixels removed from the scaled span; also the right/bottom clamp inset.
    pub const INSET: i32 = 32;
    /// Thickness of the maze's outer walls.
    pub const OUTER_WALL_THICKNESS: i32 = 12;
}

pub mod sizes {
    /// Truck icon edge length in pixels (bounding box for wall checks).
    pub const TRUCK_ICON: i32 = 22;
    /// Minimum centre-to-centre separation between two trucks, in pixels.
    pub const COLLISION_RADIUS: f64 = 22.0;
    /// Collectible edge length; also its pickup radius on each axis.
    pub const COLLECTIBLE: i32 = 10;
}

pub mod motion {
    /// Default simulator tick period.
    pub const TICK_MS: u64 = 250;
    /// Default bound of the per-axis random displacement, logical units.
    pub const MAX_STEP: f64 = 1.5;
}

pub mod topics {
    /// Root of per-truck telemetry topics (`truck/{id}/sensor/{field}`).
    pub const ROOT: &str = "truck";
    /// Root of route-planner topics (`planner/truck/{id}/position`).
    pub const PLANNER_ROOT: &str = "planner/truck";
}

/// Scalar keys the mine simulator publishes on the sensor and failure channels.
pub mod fields {
    pub const POSITION_X: &str = "i_posicao_x";
    pub const POSITION_Y: &str = "i_posicao_y";
    pub const ANGLE: &str = "i_angulo";
    pub const TEMPERATURE: &str = "i_temperatura";
    pub const ELECTRIC_FAILURE: &str = "i_falha_eletrica";
    pub const HYDRAULIC_FAILURE: &str = "i_falha_hidraulica";
}

/// Valid heading range, degrees inclusive.
pub const ANGLE_MIN: i32 = -180;
pub const ANGLE_MAX: i32 = 180;

pub fn is_valid_angle(angle: i32) -> bool {
    (ANGLE_MIN..=ANGLE_MAX).contains(&angle)
}
