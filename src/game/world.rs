//! # World Module
//!
//! Tiles, floors and the dungeon that orders them.
//!
//! A [`Floor`] is an independent grid with its own rooms and entity list.
//! The [`Dungeon`] keeps the floors generated so far, which one is current,
//! and generates new ones lazily as the player goes deeper.

use crate::{
    straight_line_path, DelveError, DelveResult, Entity, EntityId, GameRng, GenerationConfig,
    Generator, ItemKind, Position, Room, RoomTunnelGenerator, Spawner,
};
use serde::{Deserialize, Serialize};

/// Random cells tried before giving up on finding an empty one.
const EMPTY_CELL_ATTEMPTS: u32 = 30;

/// Direction a staircase leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StairDirection {
    Down,
    Up,
}

/// Whether the player has seen a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Shrouded,
    Visible,
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub walkable: bool,
    pub visibility: Visibility,
}

impl Tile {
    /// An unexplored wall.
    pub fn wall() -> Self {
        Self {
            walkable: false,
            visibility: Visibility::Shrouded,
        }
    }

    /// An unexplored floor cell.
    pub fn floor() -> Self {
        Self {
            walkable: true,
            visibility: Visibility::Shrouded,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }
}

/// One dungeon level.
///
/// The entity list is kept stable-sorted by [`RenderOrder`](crate::RenderOrder):
/// a new entity goes after every entity of an equal or lower tier, so the
/// list can be drawn back to front with corpses underneath everything.
///
/// # Examples
///
/// ```
/// use delve::{Floor, Position, Tile};
///
/// let mut floor = Floor::new(0, 10, 5);
/// assert!(!floor.is_walkable(Position::new(2, 2)));
/// floor.set_tile(Position::new(2, 2), Tile::floor()).unwrap();
/// assert!(floor.is_walkable(Position::new(2, 2)));
/// assert!(!floor.is_valid_position(Position::new(10, 0)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    /// Index of this floor in the dungeon
    pub depth: u32,
    pub width: u32,
    pub height: u32,
    /// Tile grid indexed `[y][x]`
    pub tiles: Vec<Vec<Tile>>,
    /// Rooms in placement order
    pub rooms: Vec<Room>,
    /// Entities sorted by render tier
    pub entities: Vec<Entity>,
    pub descending_staircase: Option<Position>,
    pub ascending_staircase: Option<Position>,
}

impl Floor {
    /// Creates a floor of solid wall.
    pub fn new(depth: u32, width: u32, height: u32) -> Self {
        Self {
            depth,
            width,
            height,
            tiles: vec![vec![Tile::wall(); width as usize]; height as usize],
            rooms: Vec::new(),
            entities: Vec::new(),
            descending_staircase: None,
            ascending_staircase: None,
        }
    }

    /// Checks if a position is inside the grid.
    pub fn is_valid_position(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    pub fn get_tile(&self, pos: Position) -> Option<&Tile> {
        if !self.is_valid_position(pos) {
            return None;
        }
        self.tiles
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
    }

    pub fn get_tile_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        if !self.is_valid_position(pos) {
            return None;
        }
        self.tiles
            .get_mut(pos.y as usize)
            .and_then(|row| row.get_mut(pos.x as usize))
    }

    /// Replaces a tile.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> DelveResult<()> {
        let slot = self.get_tile_mut(pos).ok_or_else(|| {
            DelveError::InvalidState(format!("position ({}, {}) is outside the floor", pos.x, pos.y))
        })?;
        *slot = tile;
        Ok(())
    }

    /// Makes an in-bounds cell walkable. Out-of-bounds cells are ignored.
    pub fn carve(&mut self, pos: Position) {
        if let Some(tile) = self.get_tile_mut(pos) {
            tile.walkable = true;
        }
    }

    pub fn is_walkable(&self, pos: Position) -> bool {
        self.get_tile(pos).is_some_and(|tile| tile.walkable)
    }

    pub fn first_room(&self) -> Option<&Room> {
        self.rooms.first()
    }

    pub fn last_room(&self) -> Option<&Room> {
        self.rooms.last()
    }

    pub fn staircase(&self, direction: StairDirection) -> Option<Position> {
        match direction {
            StairDirection::Down => self.descending_staircase,
            StairDirection::Up => self.ascending_staircase,
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|entity| entity.id == id)
    }

    /// All entities standing on a cell, in list order.
    pub fn entities_at(&self, pos: Position) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |entity| entity.position == pos)
    }

    /// The entity that stops movement into a cell, if any.
    pub fn blocking_entity_at(&self, pos: Position) -> Option<&Entity> {
        self.entities_at(pos).find(|entity| entity.blocking)
    }

    /// Items lying on a cell.
    pub fn items_at(&self, pos: Position) -> impl Iterator<Item = &Entity> {
        self.entities_at(pos).filter(|entity| entity.is_item())
    }

    pub fn items(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|entity| entity.is_item())
    }

    /// Living AI-driven actors.
    pub fn creatures(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(|entity| entity.ai().is_some() && entity.is_alive())
    }

    /// Inserts an entity after every entity of an equal or lower tier.
    ///
    /// An id already on the floor is an [`DelveError::InvariantViolation`].
    pub fn add_entity(&mut self, entity: Entity) -> DelveResult<()> {
        if self.index_of(entity.id).is_some() {
            return Err(DelveError::InvariantViolation(format!(
                "entity {} is already on floor {}",
                entity.id, self.depth
            )));
        }
        self.insert_sorted(entity);
        Ok(())
    }

    fn insert_sorted(&mut self, entity: Entity) {
        let index = self
            .entities
            .partition_point(|existing| existing.render_order <= entity.render_order);
        self.entities.insert(index, entity);
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.index_of(id)?;
        Some(self.entities.remove(index))
    }

    /// Moves an entity to its place after its render tier changed.
    pub fn resort_entity(&mut self, id: EntityId) -> bool {
        match self.remove_entity(id) {
            Some(entity) => {
                self.insert_sorted(entity);
                true
            }
            None => false,
        }
    }

    /// Whether the list is ordered by render tier.
    pub fn is_render_sorted(&self) -> bool {
        self.entities
            .windows(2)
            .all(|pair| pair[0].render_order <= pair[1].render_order)
    }

    /// Whether a cell is reserved for arrivals: the staircases, plus the
    /// first and last room centers where the player lands.
    pub fn is_reserved(&self, pos: Position) -> bool {
        self.descending_staircase == Some(pos)
            || self.ascending_staircase == Some(pos)
            || self.first_room().is_some_and(|room| room.center() == pos)
            || self.last_room().is_some_and(|room| room.center() == pos)
    }

    /// A walkable, unreserved cell with no entity on it.
    pub fn is_empty_cell(&self, pos: Position) -> bool {
        self.is_walkable(pos) && !self.is_reserved(pos) && self.entities_at(pos).next().is_none()
    }

    /// Tries a bounded number of random cells of a room for an empty one.
    pub fn random_empty_cell(&self, room_index: usize, rng: &mut GameRng) -> Option<Position> {
        let room = self.rooms.get(room_index)?;
        (0..EMPTY_CELL_ATTEMPTS)
            .map(|_| room.random_cell(rng))
            .find(|pos| self.is_empty_cell(*pos))
    }

    /// First empty cell of a room in row order.
    pub fn first_empty_cell(&self, room_index: usize) -> Option<Position> {
        self.rooms
            .get(room_index)?
            .cells()
            .into_iter()
            .find(|pos| self.is_empty_cell(*pos))
    }

    /// Where an actor arriving at `target` ends up: the target itself when
    /// free, otherwise the closest free walkable cell around it.
    pub fn arrival_cell(&self, target: Position) -> Position {
        let free = |pos: Position| self.is_walkable(pos) && self.blocking_entity_at(pos).is_none();
        if free(target) {
            return target;
        }
        (1..=self.width.max(self.height) as i32)
            .flat_map(|radius| {
                (-radius..=radius).flat_map(move |dy| {
                    (-radius..=radius)
                        .filter(move |dx| dx.abs() == radius || dy.abs() == radius)
                        .map(move |dx| target.offset(dx, dy))
                })
            })
            .find(|pos| free(*pos))
            .unwrap_or(target)
    }

    /// Whether every cell strictly between two points is walkable.
    pub fn has_clear_line(&self, from: Position, to: Position) -> bool {
        let path = straight_line_path(from, to);
        path.iter()
            .skip(1)
            .take(path.len().saturating_sub(2))
            .all(|pos| self.is_walkable(*pos))
    }

    /// Marks tiles within `radius` of `center` visible when the line to them
    /// is not cut by a wall. Walls bounding the view are revealed too.
    pub fn reveal_around(&mut self, center: Position, radius: i32) {
        let radius_f = radius as f64;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let pos = center.offset(dx, dy);
                if !self.is_valid_position(pos) || center.euclidean_distance(pos) > radius_f {
                    continue;
                }
                if self.has_clear_line(center, pos) {
                    if let Some(tile) = self.get_tile_mut(pos) {
                        tile.visibility = Visibility::Visible;
                    }
                }
            }
        }
    }

    /// Whether any item of the given kind lies on this floor.
    pub fn has_item_kind(&self, kind: ItemKind) -> bool {
        self.items().any(|item| item.item_kind() == Some(kind))
    }
}

/// The ordered floors of a run.
///
/// The manager only moves the current index and generates floors; it trusts
/// the action layer to have checked staircases before calling
/// [`Dungeon::descend`] or [`Dungeon::ascend`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dungeon {
    pub floors: Vec<Floor>,
    pub current_floor_index: usize,
    pub deepest_floor_index: usize,
    pub config: GenerationConfig,
    /// Template tables; rebuilt rather than stored
    #[serde(skip)]
    pub spawner: Spawner,
}

impl Dungeon {
    /// Creates a dungeon with no floors yet. Call [`Dungeon::start`] next.
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            floors: Vec::new(),
            current_floor_index: 0,
            deepest_floor_index: 0,
            config,
            spawner: Spawner::default(),
        }
    }

    /// Creates a dungeon from prebuilt floors, standing on the first one.
    pub fn with_floors(config: GenerationConfig, floors: Vec<Floor>) -> Self {
        let deepest_floor_index = floors.len().saturating_sub(1);
        Self {
            floors,
            current_floor_index: 0,
            deepest_floor_index,
            config,
            spawner: Spawner::default(),
        }
    }

    /// Generates floor 0 and marks it the deepest.
    pub fn start(&mut self, rng: &mut GameRng) -> DelveResult<()> {
        self.floors.clear();
        self.current_floor_index = 0;
        self.deepest_floor_index = 0;
        self.generate_next_floor(rng)?;
        Ok(())
    }

    /// Builds the floor below the deepest one and returns its index.
    pub fn generate_next_floor(&mut self, rng: &mut GameRng) -> DelveResult<usize> {
        let depth = self.floors.len();
        if let Some(final_depth) = self.config.final_depth() {
            if depth as u32 > final_depth {
                return Err(DelveError::InvariantViolation(format!(
                    "no floor below {} in a story dungeon",
                    final_depth
                )));
            }
        }

        let generator = RoomTunnelGenerator::new(&self.spawner, depth as u32);
        let floor = generator.generate(&self.config, rng)?;
        log::info!(
            "Generated floor {} with {} rooms and {} entities",
            depth,
            floor.rooms.len(),
            floor.entities.len()
        );

        self.floors.push(floor);
        self.deepest_floor_index = depth;
        Ok(depth)
    }

    /// Moves one floor down, generating it first when needed.
    ///
    /// Returns whether a new floor was generated.
    pub fn descend(&mut self, rng: &mut GameRng) -> DelveResult<bool> {
        let generated = if self.current_floor_index >= self.deepest_floor_index {
            self.generate_next_floor(rng)?;
            true
        } else {
            false
        };
        self.current_floor_index += 1;
        log::info!("Descended to floor {}", self.current_floor_index);
        Ok(generated)
    }

    /// Moves one floor up.
    pub fn ascend(&mut self) -> DelveResult<()> {
        if self.current_floor_index == 0 {
            return Err(DelveError::InvariantViolation(
                "cannot ascend above the first floor".to_string(),
            ));
        }
        self.current_floor_index -= 1;
        log::info!("Ascended to floor {}", self.current_floor_index);
        Ok(())
    }

    pub fn current_floor(&self) -> DelveResult<&Floor> {
        self.floors
            .get(self.current_floor_index)
            .ok_or_else(|| DelveError::InvalidState("dungeon has no current floor".to_string()))
    }

    pub fn current_floor_mut(&mut self) -> DelveResult<&mut Floor> {
        self.floors
            .get_mut(self.current_floor_index)
            .ok_or_else(|| DelveError::InvalidState("dungeon has no current floor".to_string()))
    }

    pub fn floor(&self, index: usize) -> Option<&Floor> {
        self.floors.get(index)
    }

    pub fn floor_mut(&mut self, index: usize) -> Option<&mut Floor> {
        self.floors.get_mut(index)
    }

    pub fn floor_count(&self) -> usize {
        self.floors.len()
    }

    /// Whether the current floor's up staircase leaves the dungeon.
    pub fn is_at_exit(&self) -> bool {
        self.current_floor_index == 0 && self.config.has_ascending_staircase(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityKind, GameMode, RenderOrder};

    fn open_floor(width: u32, height: u32) -> Floor {
        let mut floor = Floor::new(0, width, height);
        for y in 1..height as i32 - 1 {
            for x in 1..width as i32 - 1 {
                floor.carve(Position::new(x, y));
            }
        }
        floor
    }

    fn item(rng: &mut GameRng, pos: Position) -> Entity {
        Entity::new(rng, "Potion", '!', "red", EntityKind::Item(ItemKind::Potion)).at(pos)
    }

    fn creature(rng: &mut GameRng, pos: Position) -> Entity {
        Entity::new(rng, "Rat", 'r', "brown", EntityKind::Creature).at(pos)
    }

    #[test]
    fn test_floor_starts_as_wall() {
        let floor = Floor::new(0, 8, 6);
        assert_eq!(floor.tiles.len(), 6);
        assert_eq!(floor.tiles[0].len(), 8);
        assert!(floor.tiles.iter().flatten().all(|tile| !tile.walkable));
        assert!(floor.get_tile(Position::new(-1, 0)).is_none());
    }

    #[test]
    fn test_add_entity_keeps_tier_order() {
        let mut rng = GameRng::new(1);
        let mut floor = open_floor(10, 10);

        let potion = item(&mut rng, Position::new(2, 2));
        let rat = creature(&mut rng, Position::new(3, 3));
        let goblin = creature(&mut rng, Position::new(4, 4));
        let (rat_id, goblin_id) = (rat.id, goblin.id);

        floor.add_entity(potion).unwrap();
        floor.add_entity(rat).unwrap();
        floor.add_entity(goblin).unwrap();

        // Actors first, and equal tiers keep insertion order
        assert_eq!(floor.entities[0].id, rat_id);
        assert_eq!(floor.entities[1].id, goblin_id);
        assert_eq!(floor.entities[2].render_order, RenderOrder::Item);
        assert!(floor.is_render_sorted());
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut rng = GameRng::new(9);
        let mut floor = open_floor(10, 10);
        let rat = creature(&mut rng, Position::new(3, 3));
        let twin = rat.clone().at(Position::new(6, 6));
        floor.add_entity(rat).unwrap();

        assert!(matches!(
            floor.add_entity(twin),
            Err(DelveError::InvariantViolation(_))
        ));
        assert_eq!(floor.entities.len(), 1);
        assert_eq!(floor.entities[0].position, Position::new(3, 3));
    }

    #[test]
    fn test_resort_moves_corpse_to_back() {
        let mut rng = GameRng::new(2);
        let mut floor = open_floor(10, 10);
        let rat = creature(&mut rng, Position::new(3, 3));
        let rat_id = rat.id;
        floor.add_entity(rat).unwrap();
        floor.add_entity(item(&mut rng, Position::new(5, 5))).unwrap();

        floor.entity_mut(rat_id).unwrap().become_corpse();
        assert!(floor.resort_entity(rat_id));

        assert_eq!(floor.entities.last().map(|e| e.id), Some(rat_id));
        assert!(floor.blocking_entity_at(Position::new(3, 3)).is_none());
        assert!(floor.is_render_sorted());
    }

    #[test]
    fn test_empty_cell_excludes_staircases_and_entities() {
        let mut rng = GameRng::new(3);
        let mut floor = open_floor(10, 10);
        floor.descending_staircase = Some(Position::new(2, 2));
        floor.add_entity(item(&mut rng, Position::new(3, 3))).unwrap();

        assert!(!floor.is_empty_cell(Position::new(2, 2)));
        assert!(!floor.is_empty_cell(Position::new(3, 3)));
        assert!(!floor.is_empty_cell(Position::new(0, 0)));
        assert!(floor.is_empty_cell(Position::new(4, 4)));
    }

    #[test]
    fn test_random_empty_cell_gives_up() {
        let mut rng = GameRng::new(4);
        let mut floor = open_floor(10, 10);
        floor.rooms.push(Room::new(0, Position::new(2, 2), 1, 1));
        // The only cell is the room center, which is reserved
        assert!(floor.random_empty_cell(0, &mut rng).is_none());
        assert!(floor.first_empty_cell(0).is_none());
        assert!(floor.random_empty_cell(7, &mut rng).is_none());
    }

    #[test]
    fn test_arrival_cell_sidesteps_blockers() {
        let mut rng = GameRng::new(5);
        let mut floor = open_floor(10, 10);
        let target = Position::new(5, 5);
        assert_eq!(floor.arrival_cell(target), target);

        floor.add_entity(creature(&mut rng, target)).unwrap();
        let arrival = floor.arrival_cell(target);
        assert_ne!(arrival, target);
        assert_eq!(crate::chebyshev_distance(arrival, target), 1);
    }

    #[test]
    fn test_reveal_stops_at_walls() {
        let mut floor = open_floor(12, 5);
        // Wall column at x == 6
        for y in 0..5 {
            floor.set_tile(Position::new(6, y), Tile::wall()).unwrap();
        }
        floor.reveal_around(Position::new(3, 2), 8);

        assert!(floor.get_tile(Position::new(5, 2)).unwrap().is_visible());
        assert!(floor.get_tile(Position::new(6, 2)).unwrap().is_visible());
        assert!(!floor.get_tile(Position::new(8, 2)).unwrap().is_visible());
    }

    #[test]
    fn test_dungeon_start_and_descend() {
        let mut rng = GameRng::new(6);
        let mut dungeon = Dungeon::new(GenerationConfig::for_testing(6));
        dungeon.start(&mut rng).unwrap();
        assert_eq!(dungeon.floor_count(), 1);
        assert_eq!(dungeon.deepest_floor_index, 0);

        assert!(dungeon.descend(&mut rng).unwrap());
        assert_eq!(dungeon.current_floor_index, 1);
        assert_eq!(dungeon.deepest_floor_index, 1);

        dungeon.ascend().unwrap();
        assert_eq!(dungeon.current_floor_index, 0);
        assert!(!dungeon.descend(&mut rng).unwrap());
        assert_eq!(dungeon.floor_count(), 2);
    }

    #[test]
    fn test_dungeon_ascend_above_top_is_invariant_violation() {
        let mut dungeon = Dungeon::new(GenerationConfig::for_testing(7));
        assert!(matches!(
            dungeon.ascend(),
            Err(DelveError::InvariantViolation(_))
        ));
        assert!(dungeon.current_floor().is_err());
    }

    #[test]
    fn test_story_dungeon_stops_at_final_floor() {
        let mut rng = GameRng::new(8);
        let config = GenerationConfig::for_testing(8).with_mode(GameMode::Story);
        let mut dungeon = Dungeon::new(config);
        dungeon.start(&mut rng).unwrap();
        assert!(dungeon.is_at_exit());

        while dungeon.floor_count() < dungeon.config.story_depth as usize {
            dungeon.generate_next_floor(&mut rng).unwrap();
        }
        assert!(dungeon.generate_next_floor(&mut rng).is_err());
    }
}
