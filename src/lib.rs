//! # Delve
//!
//! The simulation core of a turn-based dungeon crawler.
//!
//! ## Architecture Overview
//!
//! Delve is a headless engine: it owns the rules and the world state and leaves
//! rendering, input devices and save-file management to its callers. The core
//! revolves around a few concepts:
//!
//! - **Game State**: the session context that owns the dungeon, the message feed,
//!   the random stream and the run bookkeeping
//! - **Entity System**: entities carry optional components (fighter, leveler,
//!   inventory, equippable, consumable, projectable, AI) looked up by tag
//! - **Action System**: discrete intents resolved one actor at a time, each
//!   reporting whether a turn was consumed
//! - **Generation System**: staged floor generation (rooms, tunnels, staircases,
//!   creatures, items) driven by a single seedable random stream
//!
//! Given the same seed and the same sequence of intents, a run is reproduced
//! exactly, including entity ids.

pub mod game;
pub mod generation;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use utils::*;

// Explicit re-exports for commonly used types
pub use game::{
    // From actions
    ActionContext,
    Intent,
    // From autoexplore
    Autoexplorer,
    // From components
    Ai,
    AiState,
    Attributes,
    Component,
    ComponentKind,
    Consumable,
    Equippable,
    Fighter,
    Inventory,
    Leveler,
    Projectable,
    // From entities
    ActorRole,
    Entity,
    EntityKind,
    ItemKind,
    RenderOrder,
    // From messages
    ColorHint,
    Message,
    MessageCategory,
    MessageLog,
    // From state
    GameState,
    GameView,
    PlayerStats,
    RunMetadata,
    RunStatus,
    // From world
    Dungeon,
    Floor,
    StairDirection,
    Tile,
    Visibility,
};

pub use generation::{
    FloorBuilder, GameMode, GenerationConfig, Generator, Room, RoomTunnelGenerator, Spawner,
};

pub use utils::GameRng;

/// Core error type for the Delve engine.
///
/// Rejected player intents are not errors; they are reported through the
/// message feed. Everything here ends the run.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// A programming invariant was broken
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// A snapshot could not be restored
    #[error("Corrupt save data: {0}")]
    CorruptSave(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Default floor width in tiles
    pub const DEFAULT_FLOOR_WIDTH: u32 = 80;

    /// Default floor height in tiles
    pub const DEFAULT_FLOOR_HEIGHT: u32 = 40;

    /// Consecutive failed room placements before the room scatter gives up
    pub const MAX_ROOM_PLACEMENT_FAILURES: u32 = 250;

    /// Number of floors in story mode; the relic lies on the last one
    pub const STORY_DEPTH: u32 = 10;

    /// Player inventory capacity
    pub const PLAYER_INVENTORY_SLOTS: usize = 16;

    /// Player starting health before attribute bonuses
    pub const PLAYER_BASE_HEALTH: i32 = 100;

    /// Player starting magicka before attribute bonuses
    pub const PLAYER_BASE_MAGICKA: i32 = 100;

    /// Player unarmed damage
    pub const PLAYER_BASE_DAMAGE: i32 = 8;

    /// Distance at which a creature notices the player
    pub const AGGRO_RANGE: f64 = 8.0;

    /// Chance that a wandering creature takes a step on its turn
    pub const WANDER_CHANCE: f64 = 0.25;

    /// Maximum reach of a staff
    pub const PROJECTILE_RANGE: f64 = 8.0;

    /// Radius of tiles revealed around the player
    pub const SIGHT_RADIUS: i32 = 8;
}
