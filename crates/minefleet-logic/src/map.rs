//! Static map layout with walls in pixel space.
//!
//! Walls are loaded once and never change. Collectibles are dynamic and
//! live in the engine crate; this module only describes the fixed maze
//! and validates it against the canvas.

use serde::{Deserialize, Serialize};

use crate::constants::canvas;
use crate::geometry::{GeometryConfig, PixelRect};

/// Internal maze walls of the default layout (x, y, width, height).
const MAZE_WALLS: [(i32, i32, i32, i32); 7] = [
    (60, 60, 640, 16),
    (60, 120, 240, 16),
    (580, 120, 120, 16),
    (300, 200, 160, 16),
    (120, 260, 520, 16),
    (60, 300, 200, 16),
    (500, 300, 200, 16),
];

/// Wall rectangles of a map, in pixel coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapLayout {
    #[serde(default)]
    pub walls: Vec<PixelRect>,
}

impl MapLayout {
    /// A map without walls.
    pub fn open() -> Self {
        Self { walls: Vec::new() }
    }

    /// The default maze: four outer walls framing the canvas plus the internal walls.
    pub fn maze(canvas_width: i32, canvas_height: i32) -> Self {
        let t = canvas::OUTER_WALL_THICKNESS;
        let mut walls = vec![
            PixelRect::new(0, 0, canvas_width, t),
            PixelRect::new(0, canvas_height - t, canvas_width, t),
            PixelRect::new(0, 0, t, canvas_height),
            PixelRect::new(canvas_width - t, 0, t, canvas_height),
        ];
        walls.extend(
            MAZE_WALLS
                .iter()
                .map(|&(x, y, w, h)| PixelRect::new(x, y, w, h)),
        );
        Self { walls }
    }

    pub fn with_wall(mut self, wall: PixelRect) -> Self {
        self.walls.push(wall);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A layout validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub wall: usize,
    pub severity: Severity,
    pub message: String,
}

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

/// Check every wall against the canvas, returning all problems found.
pub fn validate_layout(layout: &MapLayout, geometry: &GeometryConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let canvas = PixelRect::new(0, 0, geometry.canvas_width, geometry.canvas_height);
    for (i, w) in layout.walls.iter().enumerate() {
        if w.width <= 0 || w.height <= 0 {
            errors.push(ValidationError {
                wall: i,
                severity: Severity::Error,
                message: format!(
                    "Wall #{} has non-positive dimensions: {}×{}",
                    i, w.width, w.height
                ),
            });
            continue;
        }
        if !w.overlaps(&canvas) {
            errors.push(ValidationError {
                wall: i,
                severity: Severity::Error,
                message: format!(
                    "Wall #{} lies entirely outside the {}×{} canvas",
                    i, geometry.canvas_width, geometry.canvas_height
                ),
            });
        } else if w.x < 0 || w.y < 0 || w.right() > canvas.right() || w.bottom() > canvas.bottom() {
            errors.push(ValidationError {
                wall: i,
                severity: Severity::Warning,
                message: format!(
                    "Wall #{} extends past the canvas: ({},{})→({},{})",
                    i,
                    w.x,
                    w.y,
                    w.right(),
                    w.bottom()
                ),
            });
        }
    }
    errors
}

/// True when the layout has no error-severity problems.
pub fn is_layout_usable(errors: &[ValidationError]) -> bool {
    errors.iter().all(|e| e.severity != Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LogicalPoint, PixelPoint};

    #[test]
    fn maze_has_outer_and_inner_walls() {
        let maze = MapLayout::maze(canvas::WIDTH, canvas::HEIGHT);
        assert_eq!(maze.walls.len(), 11);
        assert_eq!(maze.walls[3], PixelRect::new(748, 0, 12, 390));
    }

    #[test]
    fn default_maze_is_valid() {
        let geometry = GeometryConfig::default();
        let maze = MapLayout::maze(geometry.canvas_width, geometry.canvas_height);
        let errors = validate_layout(&maze, &geometry);
        assert!(errors.is_empty(), "default maze should be valid: {errors:?}");
    }

    #[test]
    fn map_center_is_clear_in_maze() {
        let geometry = GeometryConfig::default();
        let maze = MapLayout::maze(geometry.canvas_width, geometry.canvas_height);
        let center = geometry.projection().to_pixel(LogicalPoint::new(50.0, 50.0));
        assert_eq!(center, PixelPoint::new(372, 187));
        let bbox = geometry.truck_box(center);
        assert!(maze.walls.iter().all(|w| !w.overlaps(&bbox)));
    }

    #[test]
    fn degenerate_wall_rejected() {
        let geometry = GeometryConfig::default();
        let layout = MapLayout::open().with_wall(PixelRect::new(10, 10, 0, 5));
        let errors = validate_layout(&layout, &geometry);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, Severity::Error);
        assert!(!is_layout_usable(&errors));
    }

    #[test]
    fn wall_outside_canvas() {
        let geometry = GeometryConfig::default();
        let layout = MapLayout::open()
            .with_wall(PixelRect::new(2000, 10, 10, 10))
            .with_wall(PixelRect::new(750, 10, 20, 10));
        let errors = validate_layout(&layout, &geometry);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].severity, Severity::Error);
        assert_eq!(errors[1].severity, Severity::Warning);
        assert!(!is_layout_usable(&errors));
    }

    #[test]
    fn layout_from_json() {
        let json = r#"{ "walls": [ { "x": 1, "y": 2, "width": 3, "height": 4 } ] }"#;
        let layout = MapLayout::from_json(json).unwrap();
        assert_eq!(layout.walls, vec![PixelRect::new(1, 2, 3, 4)]);

        let empty = MapLayout::from_json("{}").unwrap();
        assert!(empty.walls.is_empty());
    }
}
