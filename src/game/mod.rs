//! # Game Module
//!
//! Core game state, the entity model and the turn engine.
//!
//! This module contains the fundamental building blocks of a Delve run:
//! - Session state, snapshots and the presentation view
//! - Floors, tiles and the dungeon that orders them
//! - Entities and their attachable components
//! - Intent resolution, combat and creature AI
//! - Scripted exploration for headless play

pub mod actions;
pub mod ai;
pub mod autoexplore;
pub mod components;
pub mod entities;
pub mod messages;
pub mod state;
pub mod world;

pub use actions::*;
pub use ai::*;
pub use autoexplore::*;
pub use components::*;
pub use entities::*;
pub use messages::*;
pub use state::*;
pub use world::*;

use crate::GameRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A cell coordinate on a floor grid. `y` grows downward.
///
/// # Examples
///
/// ```
/// use delve::{Direction, Position};
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.step(Direction::North), Position::new(10, 4));
/// assert_eq!(pos.neighbors().count(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The neighbouring cell in a direction.
    pub fn step(self, direction: Direction) -> Self {
        self + direction.to_delta()
    }

    /// Straight-line distance to another cell.
    ///
    /// ```
    /// use delve::Position;
    ///
    /// assert_eq!(Position::new(0, 0).euclidean_distance(Position::new(3, 4)), 5.0);
    /// ```
    pub fn euclidean_distance(self, other: Position) -> f64 {
        crate::euclidean_distance(self, other)
    }

    /// The eight surrounding cells, diagonals included.
    pub fn neighbors(self) -> impl Iterator<Item = Position> {
        Direction::ALL.into_iter().map(move |direction| self.step(direction))
    }

    /// The four orthogonally adjacent cells.
    pub fn cardinal_neighbors(self) -> impl Iterator<Item = Position> {
        Direction::CARDINAL
            .into_iter()
            .map(move |direction| self.step(direction))
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// One of the eight bump directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl Direction {
    /// Clockwise from north.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::Northeast,
        Direction::East,
        Direction::Southeast,
        Direction::South,
        Direction::Southwest,
        Direction::West,
        Direction::Northwest,
    ];

    pub const CARDINAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The `(dx, dy)` of one step, as a position.
    pub fn to_delta(self) -> Position {
        let (dx, dy) = match self {
            Direction::North => (0, -1),
            Direction::Northeast => (1, -1),
            Direction::East => (1, 0),
            Direction::Southeast => (1, 1),
            Direction::South => (0, 1),
            Direction::Southwest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::Northwest => (-1, -1),
        };
        Position::new(dx, dy)
    }
}

/// Unique identifier for game entities.
pub type EntityId = Uuid;

/// Mints a new entity ID from the game's random stream.
///
/// Ids come from the shared stream rather than the OS so that a seed
/// reproduces them along with everything else.
pub fn new_entity_id(rng: &mut GameRng) -> EntityId {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}
