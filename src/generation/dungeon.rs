//! # Dungeon Generation
//!
//! Room-and-tunnel floor generation.
//!
//! A floor is built in fixed stages by a [`FloorBuilder`]:
//! 1. Fill the grid with wall
//! 2. Scatter non-overlapping rooms, giving up after a run of failed placements
//! 3. Join every room to the previous one with an L-shaped tunnel
//! 4. Put the staircases on the first and last room centers
//! 5. Scatter creatures, then items (and the relic on a story dungeon's last floor)
//!
//! [`RoomTunnelGenerator`] runs the whole pipeline for one depth.

use crate::{
    config, reachable_from, DelveError, DelveResult, Floor, GameRng, GenerationConfig, Generator,
    Position, Room, Spawner, StairDirection,
};
use std::collections::HashSet;

/// Builder stages, in the only order they may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildStage {
    New,
    Walls,
    Rooms,
    Tunnels,
    Staircases,
    Creatures,
    Items,
    Relic,
}

/// Step-by-step floor construction.
///
/// Every stage consumes the builder and hands it back, so a floor reads as a
/// chain of stages. Running a stage before its prerequisite, or running an
/// earlier stage again, is an invariant violation.
///
/// # Examples
///
/// ```
/// use delve::{FloorBuilder, GameRng};
///
/// let mut rng = GameRng::new(11);
/// let floor = FloorBuilder::new(0, 40, 20)
///     .place_walls()?
///     .place_rooms(&mut rng, 4, (3, 6), (3, 5))?
///     .place_tunnels(&mut rng)?
///     .build()?;
/// assert!(!floor.rooms.is_empty());
/// # Ok::<(), delve::DelveError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FloorBuilder {
    floor: Floor,
    stage: BuildStage,
}

impl FloorBuilder {
    pub fn new(depth: u32, width: u32, height: u32) -> Self {
        Self {
            floor: Floor::new(depth, width, height),
            stage: BuildStage::New,
        }
    }

    /// The floor under construction.
    pub fn floor(&self) -> &Floor {
        &self.floor
    }

    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    fn enter(&mut self, stage: BuildStage, prerequisite: BuildStage) -> DelveResult<()> {
        if self.stage < prerequisite || self.stage >= stage {
            return Err(DelveError::InvariantViolation(format!(
                "{:?} stage cannot run after {:?}",
                stage, self.stage
            )));
        }
        self.stage = stage;
        Ok(())
    }

    fn require_rooms(&self, stage: &str) -> DelveResult<()> {
        if self.floor.rooms.is_empty() {
            return Err(DelveError::InvariantViolation(format!(
                "{} needs at least one room",
                stage
            )));
        }
        Ok(())
    }

    fn random_room_index(&self, rng: &mut GameRng) -> usize {
        rng.random_int(0, self.floor.rooms.len() as i32 - 1) as usize
    }

    /// Fills the whole grid with non-walkable tiles.
    pub fn place_walls(mut self) -> DelveResult<Self> {
        self.enter(BuildStage::Walls, BuildStage::New)?;
        let (width, height) = (self.floor.width, self.floor.height);
        self.floor.tiles = Floor::new(self.floor.depth, width, height).tiles;
        Ok(self)
    }

    /// Scatters up to `count` rooms.
    ///
    /// Candidates that intersect a placed room (one-cell margin included) are
    /// rejected. Placement stops early after
    /// [`MAX_ROOM_PLACEMENT_FAILURES`](config::MAX_ROOM_PLACEMENT_FAILURES)
    /// rejections in a row.
    pub fn place_rooms(
        mut self,
        rng: &mut GameRng,
        count: u32,
        width_range: (u32, u32),
        height_range: (u32, u32),
    ) -> DelveResult<Self> {
        self.enter(BuildStage::Rooms, BuildStage::Walls)?;

        let (min_w, max_w) = width_range;
        let (min_h, max_h) = height_range;
        if min_w == 0 || min_h == 0 || min_w > max_w || min_h > max_h {
            return Err(DelveError::InvariantViolation(format!(
                "bad room size ranges {:?} x {:?}",
                width_range, height_range
            )));
        }
        if self.floor.width < max_w + 3 || self.floor.height < max_h + 3 {
            return Err(DelveError::InvariantViolation(format!(
                "rooms up to {}x{} do not fit a {}x{} floor",
                max_w, max_h, self.floor.width, self.floor.height
            )));
        }

        let max_x = (self.floor.width - max_w - 1) as i32;
        let max_y = (self.floor.height - max_h - 1) as i32;
        let mut failures = 0;

        while (self.floor.rooms.len() as u32) < count {
            let x1 = rng.random_int(1, max_x);
            let y1 = rng.random_int(1, max_y);
            let width = rng.random_int(min_w as i32, max_w as i32) as u32;
            let height = rng.random_int(min_h as i32, max_h as i32) as u32;
            let room = Room::new(
                self.floor.rooms.len() as u32,
                Position::new(x1, y1),
                width,
                height,
            );

            if self.floor.rooms.iter().any(|placed| room.intersects(placed)) {
                failures += 1;
                if failures >= config::MAX_ROOM_PLACEMENT_FAILURES {
                    log::debug!(
                        "Gave up on rooms after {} failed placements with {} of {} placed",
                        failures,
                        self.floor.rooms.len(),
                        count
                    );
                    break;
                }
                continue;
            }
            failures = 0;

            for cell in room.cells() {
                self.floor.carve(cell);
            }
            self.floor.rooms.push(room);
        }

        log::debug!("Placed {} rooms", self.floor.rooms.len());
        Ok(self)
    }

    /// Joins each room to the previous one with an L-shaped tunnel between
    /// random cells of the two rooms.
    pub fn place_tunnels(mut self, rng: &mut GameRng) -> DelveResult<Self> {
        self.enter(BuildStage::Tunnels, BuildStage::Rooms)?;

        for index in 1..self.floor.rooms.len() {
            let from = self.floor.rooms[index].random_cell(rng);
            let to = self.floor.rooms[index - 1].random_cell(rng);
            for cell in tunnel_cells(from, to) {
                self.floor.carve(cell);
            }
        }
        Ok(self)
    }

    /// Puts the descending staircase on the last room's center and the
    /// ascending one on the first room's center, as requested.
    pub fn place_staircases(
        mut self,
        spawner: &Spawner,
        rng: &mut GameRng,
        descending: bool,
        ascending: bool,
    ) -> DelveResult<Self> {
        self.enter(BuildStage::Staircases, BuildStage::Tunnels)?;
        self.require_rooms("staircase placement")?;

        if descending {
            if let Some(center) = self.floor.last_room().map(Room::center) {
                spawner.spawn_staircase(&mut self.floor, center, StairDirection::Down, rng)?;
            }
        }
        if ascending {
            if let Some(center) = self.floor.first_room().map(Room::center) {
                spawner.spawn_staircase(&mut self.floor, center, StairDirection::Up, rng)?;
            }
        }
        Ok(self)
    }

    /// Places `count` creatures, each in a random room.
    pub fn place_creatures(
        mut self,
        spawner: &Spawner,
        rng: &mut GameRng,
        count: u32,
    ) -> DelveResult<Self> {
        self.enter(BuildStage::Creatures, BuildStage::Staircases)?;
        self.require_rooms("creature placement")?;

        for _ in 0..count {
            let room_index = self.random_room_index(rng);
            spawner.spawn_creature(&mut self.floor, room_index, rng)?;
        }
        Ok(self)
    }

    /// Places `count` items, each in a random room.
    pub fn place_items(
        mut self,
        spawner: &Spawner,
        rng: &mut GameRng,
        count: u32,
    ) -> DelveResult<Self> {
        self.enter(BuildStage::Items, BuildStage::Staircases)?;
        self.require_rooms("item placement")?;

        for _ in 0..count {
            let room_index = self.random_room_index(rng);
            spawner.spawn_item(&mut self.floor, room_index, rng)?;
        }
        Ok(self)
    }

    /// Places the relic in the last room.
    pub fn place_relic(mut self, spawner: &Spawner, rng: &mut GameRng) -> DelveResult<Self> {
        self.enter(BuildStage::Relic, BuildStage::Staircases)?;
        self.require_rooms("relic placement")?;

        let last = self.floor.rooms.len() - 1;
        spawner.spawn_relic(&mut self.floor, last, rng)?;
        Ok(self)
    }

    /// Returns the finished floor.
    pub fn build(self) -> DelveResult<Floor> {
        if self.stage < BuildStage::Rooms {
            return Err(DelveError::InvariantViolation(format!(
                "floor built at stage {:?}",
                self.stage
            )));
        }
        if self.floor.rooms.is_empty() {
            return Err(DelveError::GenerationFailed(
                "floor has no rooms".to_string(),
            ));
        }
        Ok(self.floor)
    }
}

/// Cells of the L-shaped tunnel from `from` to `to`: a vertical leg down
/// `from`'s column to the bend at `(from.x, to.y)`, then a horizontal leg
/// along `to`'s row.
pub fn tunnel_cells(from: Position, to: Position) -> Vec<Position> {
    let (top, bottom) = (from.y.min(to.y), from.y.max(to.y));
    let (left, right) = (from.x.min(to.x), from.x.max(to.x));

    let vertical = (top..=bottom).map(|y| Position::new(from.x, y));
    let horizontal = (left..=right).map(|x| Position::new(x, to.y));
    vertical.chain(horizontal).collect()
}

/// Generates complete floors for one depth of a dungeon.
#[derive(Debug, Clone)]
pub struct RoomTunnelGenerator<'a> {
    pub spawner: &'a Spawner,
    pub depth: u32,
}

impl<'a> RoomTunnelGenerator<'a> {
    pub fn new(spawner: &'a Spawner, depth: u32) -> Self {
        Self { spawner, depth }
    }
}

impl Generator<Floor> for RoomTunnelGenerator<'_> {
    fn generate(&self, config: &GenerationConfig, rng: &mut GameRng) -> DelveResult<Floor> {
        let builder = FloorBuilder::new(self.depth, config.floor_width, config.floor_height)
            .place_walls()?
            .place_rooms(
                rng,
                config.max_rooms,
                config.room_width_range,
                config.room_height_range,
            )?;
        if builder.floor().rooms.is_empty() {
            return Err(DelveError::GenerationFailed(format!(
                "no rooms placed on floor {}",
                self.depth
            )));
        }

        let mut builder = builder
            .place_tunnels(rng)?
            .place_staircases(
                self.spawner,
                rng,
                config.has_descending_staircase(self.depth),
                config.has_ascending_staircase(self.depth),
            )?
            .place_creatures(self.spawner, rng, config.creatures_per_floor)?
            .place_items(self.spawner, rng, config.items_per_floor)?;
        if config.holds_relic(self.depth) {
            builder = builder.place_relic(self.spawner, rng)?;
        }

        let floor = builder.build()?;
        self.validate(&floor, config)?;
        Ok(floor)
    }

    fn validate(&self, floor: &Floor, _config: &GenerationConfig) -> DelveResult<()> {
        let first = floor
            .first_room()
            .ok_or_else(|| DelveError::GenerationFailed("floor has no rooms".to_string()))?;

        for (i, room) in floor.rooms.iter().enumerate() {
            if floor.rooms[i + 1..].iter().any(|other| room.intersects(other)) {
                return Err(DelveError::GenerationFailed(format!(
                    "room {} overlaps another room",
                    room.id
                )));
            }
        }

        let reached: HashSet<Position> =
            reachable_from(first.center(), |pos| floor.is_walkable(pos));
        for room in &floor.rooms {
            if room.cells().iter().any(|cell| !reached.contains(cell)) {
                return Err(DelveError::GenerationFailed(format!(
                    "room {} is not connected to other rooms",
                    room.id
                )));
            }
        }

        if !floor.is_render_sorted() {
            return Err(DelveError::GenerationFailed(
                "entities out of render order".to_string(),
            ));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "RoomTunnelGenerator"
    }
}
