//! # Generation Module
//!
//! Procedural content generation for floors, creatures and items.
//!
//! Floors are assembled stage by stage by a [`FloorBuilder`]: walls, rooms,
//! tunnels, staircases, creatures and items. Creature and item choices come
//! from weighted template tables owned by the [`Spawner`]. Every random
//! decision is drawn from the session's [`GameRng`], so a seed reproduces a
//! floor exactly.

pub mod dungeon;
pub mod encounters;
pub mod items;
pub mod spawner;

pub use dungeon::*;
pub use encounters::*;
pub use items::*;
pub use spawner::*;

use crate::{config, DelveError, DelveResult, GameRng, Position};
use serde::{Deserialize, Serialize};

/// How the dungeon ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Floors keep coming; the run ends only in death
    #[default]
    Endless,
    /// A fixed number of floors with the relic on the last one
    Story,
}

/// Configuration for procedural generation.
///
/// Controls the floor size, how many rooms are attempted and how large they
/// may be, how many creatures and items each floor receives, and the
/// dungeon mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Floor width in tiles
    pub floor_width: u32,
    /// Floor height in tiles
    pub floor_height: u32,
    /// Number of rooms the scatter tries to place
    pub max_rooms: u32,
    /// Inclusive (min, max) room width
    pub room_width_range: (u32, u32),
    /// Inclusive (min, max) room height
    pub room_height_range: (u32, u32),
    /// Creatures placed on every floor
    pub creatures_per_floor: u32,
    /// Items placed on every floor
    pub items_per_floor: u32,
    /// Endless or story dungeon
    pub mode: GameMode,
    /// Floor count of a story dungeon
    pub story_depth: u32,
    /// Name given to the player character
    pub player_name: String,
}

impl GenerationConfig {
    /// Creates the standard configuration for a seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert!(config.room_width_range.0 <= config.room_width_range.1);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            floor_width: config::DEFAULT_FLOOR_WIDTH,
            floor_height: config::DEFAULT_FLOOR_HEIGHT,
            max_rooms: 20,
            room_width_range: (5, 12),
            room_height_range: (4, 8),
            creatures_per_floor: 8,
            items_per_floor: 6,
            mode: GameMode::Endless,
            story_depth: config::STORY_DEPTH,
            player_name: "Player".to_string(),
        }
    }

    /// Creates a configuration for testing with smaller, sparser floors.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            floor_width: 40,
            floor_height: 24,
            max_rooms: 6,
            room_width_range: (4, 7),
            room_height_range: (3, 5),
            creatures_per_floor: 3,
            items_per_floor: 3,
            mode: GameMode::Endless,
            story_depth: 3,
            player_name: "Tester".to_string(),
        }
    }

    /// Switches to story mode, builder style.
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Checks that rooms of every allowed size fit inside the floor border.
    pub fn validate(&self) -> DelveResult<()> {
        let (min_w, max_w) = self.room_width_range;
        let (min_h, max_h) = self.room_height_range;

        if min_w == 0 || min_h == 0 || min_w > max_w || min_h > max_h {
            return Err(DelveError::InvalidState(format!(
                "invalid room size ranges {:?} x {:?}",
                self.room_width_range, self.room_height_range
            )));
        }
        if self.floor_width < max_w + 3 || self.floor_height < max_h + 3 {
            return Err(DelveError::InvalidState(format!(
                "floor {}x{} too small for rooms up to {}x{}",
                self.floor_width, self.floor_height, max_w, max_h
            )));
        }
        if self.mode == GameMode::Story && self.story_depth == 0 {
            return Err(DelveError::InvalidState(
                "story dungeon needs at least one floor".to_string(),
            ));
        }
        Ok(())
    }

    /// Index of the last floor of a story dungeon.
    pub fn final_depth(&self) -> Option<u32> {
        match self.mode {
            GameMode::Story => Some(self.story_depth.saturating_sub(1)),
            GameMode::Endless => None,
        }
    }

    /// Floor 0 of an endless dungeon has no way up; in story mode its up
    /// staircase is the exit.
    pub fn has_ascending_staircase(&self, depth: u32) -> bool {
        match self.mode {
            GameMode::Endless => depth > 0,
            GameMode::Story => true,
        }
    }

    /// Every floor but the last floor of a story dungeon leads down.
    pub fn has_descending_staircase(&self, depth: u32) -> bool {
        self.final_depth().map_or(true, |last| depth < last)
    }

    /// The relic lies on the last floor of a story dungeon.
    pub fn holds_relic(&self, depth: u32) -> bool {
        self.final_depth() == Some(depth)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// A rectangular room. Carved cells are `[x1, x2) x [y1, y2)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Placement order on its floor
    pub id: u32,
    /// Top-left carved cell
    pub top_left: Position,
    pub width: u32,
    pub height: u32,
}

impl Room {
    /// Creates a new room with the given parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Room, Position};
    ///
    /// let room = Room::new(1, Position::new(5, 5), 10, 8);
    /// assert_eq!(room.x2(), 15);
    /// assert_eq!(room.center(), Position::new(10, 9));
    /// assert!(room.contains(Position::new(14, 12)));
    /// assert!(!room.contains(Position::new(15, 12)));
    /// ```
    pub fn new(id: u32, top_left: Position, width: u32, height: u32) -> Self {
        Self {
            id,
            top_left,
            width,
            height,
        }
    }

    pub fn x1(&self) -> i32 {
        self.top_left.x
    }

    pub fn y1(&self) -> i32 {
        self.top_left.y
    }

    /// One past the rightmost carved column.
    pub fn x2(&self) -> i32 {
        self.top_left.x + self.width as i32
    }

    /// One past the lowest carved row.
    pub fn y2(&self) -> i32 {
        self.top_left.y + self.height as i32
    }

    /// Gets the center position of the room.
    pub fn center(&self) -> Position {
        Position::new(
            self.top_left.x + self.width as i32 / 2,
            self.top_left.y + self.height as i32 / 2,
        )
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    /// Checks if a position is one of this room's carved cells.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x1() && pos.x < self.x2() && pos.y >= self.y1() && pos.y < self.y2()
    }

    /// Overlap test with a one-cell margin.
    ///
    /// Rooms that do not intersect always keep at least one wall cell
    /// between their carved areas.
    pub fn intersects(&self, other: &Room) -> bool {
        self.x1() <= other.x2()
            && self.x2() >= other.x1()
            && self.y1() <= other.y2()
            && self.y2() >= other.y1()
    }

    /// Gets all carved positions, row by row.
    pub fn cells(&self) -> Vec<Position> {
        (self.y1()..self.y2())
            .flat_map(|y| (self.x1()..self.x2()).map(move |x| Position::new(x, y)))
            .collect()
    }

    /// Picks a uniformly random carved cell.
    pub fn random_cell(&self, rng: &mut GameRng) -> Position {
        Position::new(
            rng.random_int(self.x1(), self.x2() - 1),
            rng.random_int(self.y1(), self.y2() - 1),
        )
    }
}

/// Trait for procedural generators.
///
/// A generator turns a configuration and the shared random stream into
/// content, and can check content it (or anyone else) produced.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random stream.
    fn generate(&self, config: &GenerationConfig, rng: &mut GameRng) -> DelveResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> DelveResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}
