//! # Utilities Module
//!
//! Random number generation, grid mathematics and line/flood pathing shared by
//! generation, combat and AI.

pub mod math;
pub mod pathfinding;
pub mod rng;

pub use math::*;
pub use self::pathfinding::*;
pub use rng::*;
