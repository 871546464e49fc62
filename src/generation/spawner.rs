//! # Spawner
//!
//! Creates entities from the template tables and places them on floors.

use crate::{
    config, pick_creature, Attributes, Component, CreatureTemplate, DelveError, DelveResult,
    Entity, EntityId, EntityKind, Fighter, Floor, GameRng, Inventory, ItemKind, ItemTables,
    Leveler, Position, StairDirection, CREATURES,
};

/// Name of the story-mode quest item.
pub const RELIC_NAME: &str = "Relic of Vai";

/// Entity factory backed by creature and item tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Spawner {
    pub creatures: Vec<CreatureTemplate>,
    pub items: ItemTables,
}

impl Spawner {
    /// Builds a fresh player character.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{GameRng, Spawner};
    ///
    /// let mut rng = GameRng::new(3);
    /// let player = Spawner::default().player_instance("Ada", &mut rng);
    /// assert!(player.is_player());
    /// assert_eq!(player.inventory().map(|i| i.max_slots), Some(16));
    /// ```
    pub fn player_instance(&self, name: &str, rng: &mut GameRng) -> Entity {
        let player = Entity::new(rng, name, '@', "white", EntityKind::Player);
        let leveler = Leveler::new(1, 0);
        let mut attributes = Attributes::uniform(1);
        attributes += leveler.roll_starting_attributes(rng);

        player
            .with_component(Component::Fighter(Fighter::new(
                config::PLAYER_BASE_HEALTH,
                config::PLAYER_BASE_MAGICKA,
                config::PLAYER_BASE_DAMAGE,
                attributes,
            )))
            .with_component(Component::Leveler(leveler))
            .with_component(Component::Inventory(Inventory::new(
                config::PLAYER_INVENTORY_SLOTS,
            )))
    }

    /// A creature picked by weight among the templates allowed at `depth`.
    pub fn random_creature(&self, depth: u32, rng: &mut GameRng) -> DelveResult<Entity> {
        let template = pick_creature(&self.creatures, depth, rng)?;
        Ok(template.instantiate(rng))
    }

    /// An item rolled from the item tables.
    pub fn random_item(&self, rng: &mut GameRng) -> DelveResult<Entity> {
        self.items.roll(rng)
    }

    /// The story-mode quest item.
    pub fn relic(&self, rng: &mut GameRng) -> Entity {
        Entity::new(rng, RELIC_NAME, '&', "gold", EntityKind::Item(ItemKind::Relic))
    }

    /// Places a staircase marker and records its cell on the floor.
    pub fn spawn_staircase(
        &self,
        floor: &mut Floor,
        position: Position,
        direction: StairDirection,
        rng: &mut GameRng,
    ) -> DelveResult<EntityId> {
        let (name, glyph) = match direction {
            StairDirection::Down => ("Descending staircase", '>'),
            StairDirection::Up => ("Ascending staircase", '<'),
        };
        let staircase =
            Entity::new(rng, name, glyph, "white", EntityKind::Staircase(direction)).at(position);
        let id = staircase.id;

        match direction {
            StairDirection::Down => floor.descending_staircase = Some(position),
            StairDirection::Up => floor.ascending_staircase = Some(position),
        }
        floor.add_entity(staircase)?;
        Ok(id)
    }

    /// Places a random creature on an empty cell of a room.
    ///
    /// Returns `None` when no empty cell turned up.
    pub fn spawn_creature(
        &self,
        floor: &mut Floor,
        room_index: usize,
        rng: &mut GameRng,
    ) -> DelveResult<Option<EntityId>> {
        let Some(position) = floor.random_empty_cell(room_index, rng) else {
            log::debug!("No empty cell for a creature in room {}", room_index);
            return Ok(None);
        };
        let creature = self.random_creature(floor.depth, rng)?.at(position);
        let id = creature.id;
        floor.add_entity(creature)?;
        Ok(Some(id))
    }

    /// Places a random item on an empty cell of a room.
    ///
    /// Returns `None` when no empty cell turned up.
    pub fn spawn_item(
        &self,
        floor: &mut Floor,
        room_index: usize,
        rng: &mut GameRng,
    ) -> DelveResult<Option<EntityId>> {
        let Some(position) = floor.random_empty_cell(room_index, rng) else {
            log::debug!("No empty cell for an item in room {}", room_index);
            return Ok(None);
        };
        let item = self.random_item(rng)?.at(position);
        let id = item.id;
        floor.add_entity(item)?;
        Ok(Some(id))
    }

    /// Places the relic in a room. Unlike other items it must be placed.
    pub fn spawn_relic(
        &self,
        floor: &mut Floor,
        room_index: usize,
        rng: &mut GameRng,
    ) -> DelveResult<EntityId> {
        let position = floor
            .random_empty_cell(room_index, rng)
            .or_else(|| floor.first_empty_cell(room_index))
            .ok_or_else(|| {
                DelveError::GenerationFailed(format!("no room for the relic in room {}", room_index))
            })?;
        let relic = self.relic(rng).at(position);
        let id = relic.id;
        floor.add_entity(relic)?;
        Ok(id)
    }
}

impl Default for Spawner {
    fn default() -> Self {
        Self {
            creatures: CREATURES.to_vec(),
            items: ItemTables::standard(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RenderOrder, Room};

    fn floor_with_room() -> Floor {
        let mut floor = Floor::new(0, 20, 12);
        let room = Room::new(0, Position::new(2, 2), 6, 5);
        for cell in room.cells() {
            floor.carve(cell);
        }
        floor.rooms.push(room);
        floor
    }

    #[test]
    fn test_player_instance() {
        let mut rng = GameRng::new(1);
        let player = Spawner::default().player_instance("Hero", &mut rng);

        let fighter = player.fighter().unwrap();
        assert_eq!(fighter.base_health, config::PLAYER_BASE_HEALTH);
        assert_eq!(fighter.base_damage, config::PLAYER_BASE_DAMAGE);
        assert!(fighter.max_health() > config::PLAYER_BASE_HEALTH);
        assert_eq!(player.leveler().unwrap().level, 1);
        assert!(player.inventory().unwrap().is_empty());
    }

    #[test]
    fn test_spawn_staircase_records_location() {
        let mut rng = GameRng::new(2);
        let mut floor = floor_with_room();
        let spawner = Spawner::default();
        let center = floor.rooms[0].center();

        spawner
            .spawn_staircase(&mut floor, center, StairDirection::Down, &mut rng)
            .unwrap();

        assert_eq!(floor.descending_staircase, Some(center));
        assert_eq!(floor.ascending_staircase, None);
        let marker = floor.entities_at(center).next().unwrap();
        assert_eq!(marker.render_order, RenderOrder::Staircase);
        assert!(!marker.blocking);
    }

    #[test]
    fn test_spawned_entities_land_on_empty_cells() {
        let mut rng = GameRng::new(3);
        let mut floor = floor_with_room();
        let spawner = Spawner::default();

        let mut placed = Vec::new();
        for _ in 0..5 {
            if let Some(id) = spawner.spawn_creature(&mut floor, 0, &mut rng).unwrap() {
                placed.push(id);
            }
            if let Some(id) = spawner.spawn_item(&mut floor, 0, &mut rng).unwrap() {
                placed.push(id);
            }
        }

        assert!(!placed.is_empty());
        for id in placed {
            let entity = floor.entity(id).unwrap();
            assert!(floor.rooms[0].contains(entity.position));
            assert_eq!(floor.entities_at(entity.position).count(), 1);
        }
        assert!(floor.is_render_sorted());
    }

    #[test]
    fn test_spawn_relic() {
        let mut rng = GameRng::new(4);
        let mut floor = floor_with_room();
        let id = Spawner::default().spawn_relic(&mut floor, 0, &mut rng).unwrap();

        let relic = floor.entity(id).unwrap();
        assert_eq!(relic.name, RELIC_NAME);
        assert!(floor.has_item_kind(ItemKind::Relic));
    }

    #[test]
    fn test_spawn_relic_without_room_fails() {
        let mut rng = GameRng::new(5);
        let mut floor = Floor::new(0, 10, 10);
        assert!(matches!(
            Spawner::default().spawn_relic(&mut floor, 0, &mut rng),
            Err(DelveError::GenerationFailed(_))
        ));
    }
}
