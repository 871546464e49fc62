//! # Game Mathematics
//!
//! Distance helpers used by AI aggro checks and staff targeting.

use crate::Position;

/// Straight-line distance between two grid cells.
///
/// # Examples
///
/// ```
/// use delve::{euclidean_distance, Position};
///
/// let d = euclidean_distance(Position::new(0, 0), Position::new(3, 4));
/// assert_eq!(d, 5.0);
/// ```
pub fn euclidean_distance(from: Position, to: Position) -> f64 {
    let dx = (to.x - from.x) as f64;
    let dy = (to.y - from.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Number of king moves between two cells.
pub fn chebyshev_distance(from: Position, to: Position) -> u32 {
    (to.x - from.x).unsigned_abs().max((to.y - from.y).unsigned_abs())
}

/// Clamps a derived probability into `[0, cap]`.
pub fn capped_chance(value: f64, cap: f64) -> f64 {
    value.clamp(0.0, cap)
}
