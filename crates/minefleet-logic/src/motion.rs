//! Bounded random walk for trucks nobody else is driving.
//!
//! Each tick draws Δx and Δy independently and uniformly from
//! `[-max_step, max_step]`, adds them to the current position and clamps
//! the result into the map. There is no memory between steps: a rejected
//! step simply leaves the truck where it was until the next tick.

use rand::Rng;

use crate::geometry::{LogicalBounds, LogicalPoint};

/// One random-walk candidate starting from `from`.
pub fn random_step<R: Rng + ?Sized>(
    rng: &mut R,
    from: LogicalPoint,
    max_step: f64,
    bounds: &LogicalBounds,
) -> LogicalPoint {
    let (dx, dy) = displacement(rng, max_step);
    bounds.clamp(LogicalPoint::new(from.x + dx, from.y + dy))
}

/// A uniform displacement in `[-max_step, max_step]²`.
pub fn displacement<R: Rng + ?Sized>(rng: &mut R, max_step: f64) -> (f64, f64) {
    let max_step = max_step.abs();
    (
        rng.gen_range(-max_step..=max_step),
        rng.gen_range(-max_step..=max_step),
    )
}
