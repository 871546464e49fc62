//! # Autoexplore Module
//!
//! Scripted play for the headless runner and for long simulated tests.
//!
//! The explorer grabs whatever lies underfoot, wears what it finds, drinks a
//! health potion when hurt, fights anything standing next to it and otherwise
//! walks toward its current goal: the descending staircase, the relic on the
//! last story floor, or the way back up once the relic is in the pack.

use crate::{
    chebyshev_distance, route, DelveResult, Entity, EntityId, Floor, GameMode, GameState, Intent,
    ItemKind, Position, Resource, StairDirection,
};

/// Health fraction below which the explorer reaches for a potion.
const DRINK_THRESHOLD: f64 = 0.4;

/// Decision state for scripted play.
#[derive(Debug, Clone, Default)]
pub struct Autoexplorer {
    /// Cell the explorer was last heading for
    pub target: Option<Position>,
}

impl Autoexplorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the player's next intent, or `None` once the run is over.
    pub fn next_intent(&mut self, game: &GameState) -> DelveResult<Option<Intent>> {
        if game.is_over() {
            return Ok(None);
        }

        let player = game.player()?;
        let floor = game.dungeon.current_floor()?;
        let here = player.position;

        if let Some(potion) = potion_to_drink(player) {
            return Ok(Some(Intent::UseItem(potion)));
        }
        if let Some(gear) = gear_to_equip(player) {
            return Ok(Some(Intent::Equip(gear)));
        }
        let pack_full = player.inventory().map_or(true, |inventory| inventory.is_full());
        if !pack_full && floor.items_at(here).next().is_some() {
            return Ok(Some(Intent::PickUp));
        }
        if let Some(enemy) = adjacent_enemy(floor, here) {
            return Ok(Some(step_toward(here, enemy)));
        }

        let homeward = game.dungeon.config.mode == GameMode::Story && player.carries(ItemKind::Relic);
        let (goal, arrive) = if homeward {
            (floor.staircase(StairDirection::Up), Intent::Ascend)
        } else if let Some(relic) = floor
            .items()
            .find(|item| item.item_kind() == Some(ItemKind::Relic))
        {
            (Some(relic.position), Intent::PickUp)
        } else {
            (floor.staircase(StairDirection::Down), Intent::Descend)
        };

        self.target = goal;
        let Some(goal) = goal else {
            return Ok(Some(Intent::Wait));
        };
        if goal == here {
            return Ok(Some(arrive));
        }

        Ok(Some(self.walk(floor, here, goal)))
    }

    /// First step of a route to `goal`, preferring one that avoids other
    /// actors and falling back to barging through them.
    fn walk(&self, floor: &Floor, from: Position, goal: Position) -> Intent {
        let clear = |pos: Position| floor.is_walkable(pos) && floor.blocking_entity_at(pos).is_none();
        let path = route(from, goal, clear).or_else(|| route(from, goal, |pos| floor.is_walkable(pos)));

        match path.as_ref().and_then(|path| path.get(1)) {
            Some(next) => step_toward(from, *next),
            None => Intent::Wait,
        }
    }
}

fn step_toward(from: Position, to: Position) -> Intent {
    Intent::Move {
        dx: (to.x - from.x).signum(),
        dy: (to.y - from.y).signum(),
    }
}

fn potion_to_drink(player: &Entity) -> Option<EntityId> {
    let fighter = player.fighter()?;
    let hurt = f64::from(fighter.health) < f64::from(fighter.max_health()) * DRINK_THRESHOLD;
    if !hurt {
        return None;
    }
    player
        .inventory()?
        .iter()
        .find(|item| {
            item.consumable()
                .is_some_and(|consumable| consumable.resource == Resource::Health)
        })
        .map(|item| item.id)
}

/// An unequipped piece of gear whose slot is still empty.
fn gear_to_equip(player: &Entity) -> Option<EntityId> {
    let inventory = player.inventory()?;
    inventory
        .iter()
        .filter_map(|item| item.equippable().map(|equippable| (item.id, equippable)))
        .find(|(_, candidate)| {
            !candidate.equipped
                && !inventory.iter().filter_map(Entity::equippable).any(|held| {
                    held.equipped && held.slot == candidate.slot
                })
        })
        .map(|(id, _)| id)
}

fn adjacent_enemy(floor: &Floor, here: Position) -> Option<Position> {
    floor
        .creatures()
        .filter(|creature| !creature.is_ally())
        .map(|creature| creature.position)
        .find(|pos| chebyshev_distance(here, *pos) == 1)
}
