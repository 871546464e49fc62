//! # Action System
//!
//! Intents and their resolution.
//!
//! Every intent resolves through exactly one function that answers whether
//! the actor's turn was consumed. A refused intent appends a rejection
//! message (for the player only) and returns `Ok(false)` before anything is
//! mutated. `Err` is reserved for broken invariants, such as an actor id
//! that is not on the current floor.

use crate::{
    config, DelveError, DelveResult, Dungeon, Entity, EntityId, Floor, GameRng, ItemKind,
    Leveler, MessageLog, Position, ProjectileEffect, Resource, Room, RunMetadata, RunStatus,
    StairDirection, StatusKind,
};
use serde::{Deserialize, Serialize};

/// Everything a resolution may touch, passed in explicitly by the session.
pub struct ActionContext<'a> {
    pub dungeon: &'a mut Dungeon,
    pub rng: &'a mut GameRng,
    pub log: &'a mut MessageLog,
    pub run: &'a mut RunMetadata,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        dungeon: &'a mut Dungeon,
        rng: &'a mut GameRng,
        log: &'a mut MessageLog,
        run: &'a mut RunMetadata,
    ) -> Self {
        Self {
            dungeon,
            rng,
            log,
            run,
        }
    }
}

/// A discrete command for one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Step (or bump) one cell in a direction
    Move { dx: i32, dy: i32 },
    Wait,
    Descend,
    Ascend,
    PickUp,
    Drop(EntityId),
    UseItem(EntityId),
    Equip(EntityId),
}

impl Intent {
    /// Resolves the intent for `actor`. Returns whether a turn was consumed.
    pub fn resolve(self, ctx: &mut ActionContext<'_>, actor: EntityId) -> DelveResult<bool> {
        match self {
            Intent::Move { dx, dy } => resolve_move(ctx, actor, dx, dy),
            Intent::Wait => Ok(true),
            Intent::Descend => resolve_descend(ctx, actor),
            Intent::Ascend => resolve_ascend(ctx, actor),
            Intent::PickUp => resolve_pick_up(ctx, actor),
            Intent::Drop(item) => resolve_drop(ctx, actor, item),
            Intent::UseItem(item) => resolve_use_item(ctx, actor, item),
            Intent::Equip(item) => resolve_equip(ctx, actor, item),
        }
    }
}

fn missing_entity(id: EntityId) -> DelveError {
    DelveError::InvariantViolation(format!("entity {} is not on the current floor", id))
}

fn find(floor: &Floor, id: EntityId) -> DelveResult<&Entity> {
    floor.entity(id).ok_or_else(|| missing_entity(id))
}

fn find_mut(floor: &mut Floor, id: EntityId) -> DelveResult<&mut Entity> {
    floor.entity_mut(id).ok_or_else(|| missing_entity(id))
}

/// Reports a refused intent. Only the player hears about it.
fn reject(ctx: &mut ActionContext<'_>, is_player: bool, text: &str) -> DelveResult<bool> {
    if is_player {
        ctx.log.reject(text);
    }
    Ok(false)
}

/// Names an actor from the player's point of view.
struct Combatant {
    name: String,
    is_player: bool,
}

impl Combatant {
    fn of(entity: &Entity) -> Self {
        Self {
            name: entity.name.clone(),
            is_player: entity.is_player(),
        }
    }

    fn subject(&self) -> String {
        if self.is_player {
            "You".to_string()
        } else {
            format!("The {}", self.name)
        }
    }

    fn object(&self) -> String {
        if self.is_player {
            "you".to_string()
        } else {
            format!("the {}", self.name)
        }
    }

    /// Picks the verb form matching the subject.
    fn verb<'v>(&self, second_person: &'v str, third_person: &'v str) -> &'v str {
        if self.is_player {
            second_person
        } else {
            third_person
        }
    }
}

enum MovePlan {
    Reject(&'static str),
    Attack(EntityId),
    Swap { ally: EntityId, from: Position, to: Position },
    Step(Position),
}

/// Moves an actor one cell, attacking a blocking occupant instead.
///
/// The player swaps places with a charmed creature rather than hitting it.
pub fn resolve_move(
    ctx: &mut ActionContext<'_>,
    actor_id: EntityId,
    dx: i32,
    dy: i32,
) -> DelveResult<bool> {
    let (plan, is_player) = {
        let floor = ctx.dungeon.current_floor()?;
        let actor = find(floor, actor_id)?;
        let is_player = actor.is_player();
        let target = actor.position.offset(dx, dy);

        let plan = if dx.abs() > 1 || dy.abs() > 1 || (dx == 0 && dy == 0) {
            MovePlan::Reject("You can only move one step at a time")
        } else if !floor.is_valid_position(target) {
            MovePlan::Reject("Out of bounds")
        } else if !floor.is_walkable(target) {
            MovePlan::Reject("That way is blocked")
        } else {
            match floor.blocking_entity_at(target) {
                Some(occupant) if is_player && occupant.is_ally() => MovePlan::Swap {
                    ally: occupant.id,
                    from: actor.position,
                    to: target,
                },
                Some(occupant) => MovePlan::Attack(occupant.id),
                None => MovePlan::Step(target),
            }
        };
        (plan, is_player)
    };

    match plan {
        MovePlan::Reject(text) => reject(ctx, is_player, text),
        MovePlan::Attack(target) => resolve_attack(ctx, actor_id, target),
        MovePlan::Swap { ally, from, to } => {
            let floor = ctx.dungeon.current_floor_mut()?;
            find_mut(floor, ally)?.position = from;
            find_mut(floor, actor_id)?.position = to;
            Ok(true)
        }
        MovePlan::Step(target) => {
            let floor = ctx.dungeon.current_floor_mut()?;
            find_mut(floor, actor_id)?.position = target;
            Ok(true)
        }
    }
}

/// Melee attack of `attacker_id` against `target_id`.
///
/// The hit roll comes first and a miss still costs the turn. A hit may turn
/// into a double hit, and every strike rolls its own critical. Each equipped
/// armor piece of the target then rolls its coverage to soak damage, though a
/// strike always deals at least 1.
pub fn resolve_attack(
    ctx: &mut ActionContext<'_>,
    attacker_id: EntityId,
    target_id: EntityId,
) -> DelveResult<bool> {
    let floor = ctx.dungeon.current_floor()?;
    let attacker = find(floor, attacker_id)?;
    let target = find(floor, target_id)?;
    let attacker_is_player = attacker.is_player();

    let (Some(fighter), true) = (attacker.fighter(), target.is_alive()) else {
        return reject(ctx, attacker_is_player, "There is nothing to fight there");
    };
    let hit_chance = fighter.hit_chance();
    let double_hit_chance = fighter.double_hit_chance();
    let critical_chance = fighter.critical_chance();
    let damage = attacker.attack_damage();
    let critical_damage = attacker.critical_attack_damage();
    let armor = target.armor_pieces();
    let striker = Combatant::of(attacker);
    let victim = Combatant::of(target);

    if !ctx.rng.chance(hit_chance) {
        ctx.log.combat(format!(
            "{} {} {}.",
            striker.subject(),
            striker.verb("miss", "misses"),
            victim.object()
        ));
        return Ok(true);
    }

    let strikes = if ctx.rng.chance(double_hit_chance) {
        ctx.log.combat(format!(
            "{} {} twice!",
            striker.subject(),
            striker.verb("strike", "strikes")
        ));
        2
    } else {
        1
    };

    for _ in 0..strikes {
        let critical = ctx.rng.chance(critical_chance);
        let raw = if critical { critical_damage } else { damage };
        let dealt = soak(raw, &armor, ctx.rng);

        let floor = ctx.dungeon.current_floor_mut()?;
        let killed = find_mut(floor, target_id)?
            .fighter_mut()
            .is_some_and(|fighter| fighter.take_damage(dealt));

        let verb = if critical {
            striker.verb("critically hit", "critically hits")
        } else {
            striker.verb("hit", "hits")
        };
        ctx.log.combat(format!(
            "{} {} {} for {} damage.",
            striker.subject(),
            verb,
            victim.object(),
            dealt
        ));

        if killed {
            handle_death(ctx, attacker_id, target_id)?;
            break;
        }
    }

    Ok(true)
}

/// Subtracts the reduction of every armor piece whose coverage roll succeeds.
fn soak(raw: i32, armor: &[(i32, f64)], rng: &mut GameRng) -> i32 {
    let mut dealt = raw;
    for &(reduction, coverage) in armor {
        if rng.chance(coverage) {
            dealt -= reduction;
        }
    }
    dealt.max(1)
}

/// Turns a freshly killed actor into a corpse and pays out its experience.
fn handle_death(
    ctx: &mut ActionContext<'_>,
    killer_id: EntityId,
    victim_id: EntityId,
) -> DelveResult<()> {
    let floor = ctx.dungeon.current_floor_mut()?;
    let victim = find_mut(floor, victim_id)?;
    victim.become_corpse();
    let victim_is_player = victim.is_player();
    let victim_name = victim.name.clone();
    let experience = victim.leveler().map_or(0, Leveler::experience_drop);
    floor.resort_entity(victim_id);

    if victim_is_player {
        ctx.log.combat("You have been slain!");
        ctx.run.status = RunStatus::Defeat;
        log::info!("Player slain on floor {}", ctx.dungeon.current_floor_index);
    } else {
        ctx.log.combat(format!("The {} is slain!", victim_name));
    }

    let floor = ctx.dungeon.current_floor_mut()?;
    if let Some(killer) = floor.entity_mut(killer_id) {
        let killer_is_player = killer.is_player();
        if let Some(leveler) = killer.leveler_mut() {
            let gained = leveler.gain_experience(experience);
            if gained > 0 && killer_is_player {
                let level = leveler.level;
                ctx.log.info(format!(
                    "You feel stronger! You reached level {}.",
                    level
                ));
            }
        }
        if killer_is_player {
            ctx.run.kill_count += 1;
        }
    }
    Ok(())
}

/// Picks up the first item lying on the actor's cell.
pub fn resolve_pick_up(ctx: &mut ActionContext<'_>, actor_id: EntityId) -> DelveResult<bool> {
    let floor = ctx.dungeon.current_floor()?;
    let actor = find(floor, actor_id)?;
    let is_player = actor.is_player();

    let Some(inventory) = actor.inventory() else {
        return reject(ctx, is_player, "You cannot carry anything");
    };
    let Some(item_id) = floor.items_at(actor.position).next().map(|item| item.id) else {
        return reject(ctx, is_player, "There is nothing here to pick up");
    };
    if inventory.is_full() {
        return reject(ctx, is_player, "There is not enough space in your inventory");
    }

    let floor = ctx.dungeon.current_floor_mut()?;
    let item = floor.remove_entity(item_id).ok_or_else(|| missing_entity(item_id))?;
    let name = item.name.clone();
    let is_relic = item.item_kind() == Some(ItemKind::Relic);

    let inventory = find_mut(floor, actor_id)?
        .inventory_mut()
        .ok_or_else(|| DelveError::InvariantViolation("inventory vanished".to_string()))?;
    if let Err(item) = inventory.add(item) {
        floor.add_entity(item)?;
        return Err(DelveError::InvariantViolation(
            "inventory filled up during pickup".to_string(),
        ));
    }

    if is_player {
        ctx.log.info(format!("You pick up the {}.", name));
        if is_relic {
            ctx.log.info("Now find your way back to the surface!");
        }
    }
    Ok(true)
}

/// Drops a carried item at the actor's feet, unequipping it first.
pub fn resolve_drop(
    ctx: &mut ActionContext<'_>,
    actor_id: EntityId,
    item_id: EntityId,
) -> DelveResult<bool> {
    let floor = ctx.dungeon.current_floor()?;
    let actor = find(floor, actor_id)?;
    let is_player = actor.is_player();
    if !actor.inventory().is_some_and(|inventory| inventory.contains(item_id)) {
        return reject(ctx, is_player, "You are not carrying that");
    }

    let floor = ctx.dungeon.current_floor_mut()?;
    let actor = find_mut(floor, actor_id)?;
    let position = actor.position;
    let mut item = actor
        .inventory_mut()
        .and_then(|inventory| inventory.remove(item_id))
        .ok_or_else(|| missing_entity(item_id))?;

    if let Some(equippable) = item.equippable_mut() {
        if equippable.equipped {
            equippable.equipped = false;
            if is_player {
                ctx.log.info(format!("You unequip the {}.", item.name));
            }
        }
    }
    if is_player {
        ctx.log.info(format!("You drop the {}.", item.name));
    }
    item.position = position;
    floor.add_entity(item)?;
    Ok(true)
}

/// Toggles an equippable item. Equipping frees its slot first.
pub fn resolve_equip(
    ctx: &mut ActionContext<'_>,
    actor_id: EntityId,
    item_id: EntityId,
) -> DelveResult<bool> {
    let floor = ctx.dungeon.current_floor()?;
    let actor = find(floor, actor_id)?;
    let is_player = actor.is_player();

    let Some(item) = actor.inventory().and_then(|inventory| inventory.get(item_id)) else {
        return reject(ctx, is_player, "You are not carrying that");
    };
    let Some(equippable) = item.equippable() else {
        return reject(ctx, is_player, "That cannot be equipped");
    };
    let slot = equippable.slot;
    let equipping = !equippable.equipped;

    let floor = ctx.dungeon.current_floor_mut()?;
    let inventory = find_mut(floor, actor_id)?
        .inventory_mut()
        .ok_or_else(|| DelveError::InvariantViolation("inventory vanished".to_string()))?;

    let mut notes = Vec::new();
    for held in inventory.iter_mut() {
        let name = held.name.clone();
        let id = held.id;
        let Some(equippable) = held.equippable_mut() else {
            continue;
        };
        if id == item_id {
            equippable.equipped = equipping;
            let verb = if equipping { "equip" } else { "unequip" };
            notes.push(format!("You {} the {}.", verb, name));
        } else if equipping && equippable.slot == slot && equippable.equipped {
            equippable.equipped = false;
            notes.insert(0, format!("You unequip the {}.", name));
        }
    }

    if is_player {
        for note in notes {
            ctx.log.info(note);
        }
    }
    Ok(true)
}

/// Uses a carried item: a staff casts its effect, a potion is drunk and
/// anything equippable is toggled.
pub fn resolve_use_item(
    ctx: &mut ActionContext<'_>,
    actor_id: EntityId,
    item_id: EntityId,
) -> DelveResult<bool> {
    let floor = ctx.dungeon.current_floor()?;
    let actor = find(floor, actor_id)?;
    let is_player = actor.is_player();

    let Some(item) = actor.inventory().and_then(|inventory| inventory.get(item_id)) else {
        return reject(ctx, is_player, "You are not carrying that");
    };
    if item.projectable().is_some() {
        cast_staff(ctx, actor_id, item_id)
    } else if item.consumable().is_some() {
        drink_potion(ctx, actor_id, item_id)
    } else if item.equippable().is_some() {
        resolve_equip(ctx, actor_id, item_id)
    } else {
        reject(ctx, is_player, "Nothing happens")
    }
}

/// The closest living, non-allied creature a staff can reach from `caster`.
pub fn nearest_target(floor: &Floor, caster: &Entity) -> Option<EntityId> {
    floor
        .creatures()
        .filter(|creature| creature.id != caster.id && !creature.is_ally())
        .map(|creature| (creature, caster.position.euclidean_distance(creature.position)))
        .filter(|(creature, distance)| {
            *distance <= config::PROJECTILE_RANGE
                && floor.has_clear_line(caster.position, creature.position)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(creature, _)| creature.id)
}

fn cast_staff(
    ctx: &mut ActionContext<'_>,
    actor_id: EntityId,
    item_id: EntityId,
) -> DelveResult<bool> {
    let floor = ctx.dungeon.current_floor()?;
    let actor = find(floor, actor_id)?;
    let is_player = actor.is_player();
    let Some(staff) = actor.inventory().and_then(|inventory| inventory.get(item_id)) else {
        return reject(ctx, is_player, "You are not carrying that");
    };
    let Some(projectable) = staff.projectable().cloned() else {
        return reject(ctx, is_player, "Nothing happens");
    };
    let staff_name = staff.name.clone();

    if !projectable.has_charges() {
        return reject(ctx, is_player, "The staff has no charges left");
    }
    let Some(fighter) = actor.fighter() else {
        return reject(ctx, is_player, "Nothing happens");
    };
    if fighter.magicka < projectable.magicka_cost {
        return reject(ctx, is_player, "You do not have enough magicka");
    }
    let target_id = if projectable.effect.targets_self() {
        actor_id
    } else {
        match nearest_target(floor, actor) {
            Some(id) => id,
            None => return reject(ctx, is_player, "There is no target in range"),
        }
    };
    let caster = Combatant::of(actor);
    let target = Combatant::of(find(floor, target_id)?);

    let floor = ctx.dungeon.current_floor_mut()?;
    let actor = find_mut(floor, actor_id)?;
    if let Some(staff) = actor
        .inventory_mut()
        .and_then(|inventory| inventory.get_mut(item_id))
        .and_then(Entity::projectable_mut)
    {
        staff.spend_charge();
    }
    if let Some(fighter) = actor.fighter_mut() {
        fighter.spend_magicka(projectable.magicka_cost);
    }
    log::debug!("{} casts {:?} at {}", caster.name, projectable.effect, target.name);

    let target_entity = find_mut(floor, target_id)?;
    match projectable.effect {
        ProjectileEffect::Lightning { damage } => {
            let killed = target_entity
                .fighter_mut()
                .is_some_and(|fighter| fighter.take_damage(damage));
            ctx.log.combat(format!(
                "A bolt of lightning from the {} strikes {} for {} damage.",
                staff_name,
                target.object(),
                damage
            ));
            if killed {
                handle_death(ctx, actor_id, target_id)?;
            }
        }
        ProjectileEffect::Healing { amount } => {
            let healed = target_entity
                .fighter_mut()
                .map_or(0, |fighter| fighter.heal(amount));
            ctx.log.info(format!(
                "{} {} {} health.",
                caster.subject(),
                caster.verb("recover", "recovers"),
                healed
            ));
        }
        ProjectileEffect::Confusion { turns } => {
            apply_status(target_entity, StatusKind::Confused, turns);
            ctx.log.info(format!("{} looks confused.", target.subject()));
        }
        ProjectileEffect::Freeze { turns } => {
            apply_status(target_entity, StatusKind::Frozen, turns);
            ctx.log.info(format!("{} is frozen solid.", target.subject()));
        }
        ProjectileEffect::Charm { turns } => {
            apply_status(target_entity, StatusKind::Charmed, turns);
            ctx.log.info(format!("{} is charmed and fights at your side.", target.subject()));
        }
    }
    Ok(true)
}

fn apply_status(target: &mut Entity, kind: StatusKind, turns: u32) {
    if let Some(ai) = target.ai_mut() {
        ai.apply_status(kind, turns);
    }
}

fn drink_potion(
    ctx: &mut ActionContext<'_>,
    actor_id: EntityId,
    item_id: EntityId,
) -> DelveResult<bool> {
    let floor = ctx.dungeon.current_floor()?;
    let actor = find(floor, actor_id)?;
    let is_player = actor.is_player();
    if actor.fighter().is_none() {
        return reject(ctx, is_player, "Nothing happens");
    }
    let drinker = Combatant::of(actor);

    let floor = ctx.dungeon.current_floor_mut()?;
    let actor = find_mut(floor, actor_id)?;
    let potion = actor
        .inventory_mut()
        .and_then(|inventory| inventory.remove(item_id))
        .ok_or_else(|| missing_entity(item_id))?;
    let Some(consumable) = potion.consumable().cloned() else {
        return Err(DelveError::InvariantViolation(format!(
            "{} is not consumable",
            potion.name
        )));
    };

    let (restored, pool) = match (consumable.resource, actor.fighter_mut()) {
        (Resource::Health, Some(fighter)) => (fighter.heal(consumable.amount), "health"),
        (Resource::Magicka, Some(fighter)) => (fighter.restore_magicka(consumable.amount), "magicka"),
        (_, None) => (0, "nothing"),
    };
    ctx.log.info(format!(
        "{} {} the {} and {} {} {}.",
        drinker.subject(),
        drinker.verb("drink", "drinks"),
        potion.name,
        drinker.verb("recover", "recovers"),
        restored,
        pool
    ));
    Ok(true)
}

/// Moves a traveller onto the current floor, landing next to `target` when
/// something already stands there.
fn arrive(
    ctx: &mut ActionContext<'_>,
    mut traveller: Entity,
    landing: fn(&Floor) -> Option<&Room>,
) -> DelveResult<()> {
    let floor = ctx.dungeon.current_floor_mut()?;
    let target = landing(floor)
        .map(Room::center)
        .ok_or_else(|| DelveError::InvalidState(format!("floor {} has no rooms", floor.depth)))?;
    traveller.position = floor.arrival_cell(target);
    floor.add_entity(traveller)
}

/// Checks that the actor stands on a staircase of the given direction.
fn on_staircase(floor: &Floor, actor: &Entity, direction: StairDirection) -> bool {
    floor.staircase(direction) == Some(actor.position)
}

/// Takes the descending staircase the actor stands on.
///
/// The floor below is generated first when the actor is on the deepest one.
/// The actor arrives at the first room's center. Changing floors does not
/// cost a turn.
pub fn resolve_descend(ctx: &mut ActionContext<'_>, actor_id: EntityId) -> DelveResult<bool> {
    let floor = ctx.dungeon.current_floor()?;
    let actor = find(floor, actor_id)?;
    let is_player = actor.is_player();
    if !on_staircase(floor, actor, StairDirection::Down) {
        return reject(ctx, is_player, "Can't descend here");
    }

    let from = ctx.dungeon.current_floor_index;
    ctx.dungeon.descend(ctx.rng)?;
    let traveller = ctx
        .dungeon
        .floor_mut(from)
        .and_then(|floor| floor.remove_entity(actor_id))
        .ok_or_else(|| missing_entity(actor_id))?;
    arrive(ctx, traveller, Floor::first_room)?;

    let reached = ctx.dungeon.current_floor_index;
    if is_player {
        ctx.run.deepest_floor_reached = ctx.run.deepest_floor_reached.max(reached);
        ctx.log.info(format!("You descend to floor {}...", reached + 1));
    }
    Ok(false)
}

/// Takes the ascending staircase the actor stands on.
///
/// On the exit of a story dungeon this ends the run in victory, provided the
/// relic is carried. Otherwise the actor arrives at the last room's center of
/// the floor above.
pub fn resolve_ascend(ctx: &mut ActionContext<'_>, actor_id: EntityId) -> DelveResult<bool> {
    let floor = ctx.dungeon.current_floor()?;
    let actor = find(floor, actor_id)?;
    let is_player = actor.is_player();
    if !on_staircase(floor, actor, StairDirection::Up) {
        return reject(ctx, is_player, "Can't ascend here");
    }

    if ctx.dungeon.is_at_exit() {
        if !is_player || !actor.carries(ItemKind::Relic) {
            return reject(
                ctx,
                is_player,
                "The way out is sealed. The relic still lies below.",
            );
        }
        ctx.run.status = RunStatus::Victory;
        ctx.log.info("You escape the dungeon with the relic. Victory!");
        log::info!("Run won after {} turns", ctx.run.turn_count);
        return Ok(false);
    }

    let from = ctx.dungeon.current_floor_index;
    ctx.dungeon.ascend()?;
    let traveller = ctx
        .dungeon
        .floor_mut(from)
        .and_then(|floor| floor.remove_entity(actor_id))
        .ok_or_else(|| missing_entity(actor_id))?;
    arrive(ctx, traveller, Floor::last_room)?;

    if is_player {
        ctx.log.info(format!(
            "You ascend to floor {}...",
            ctx.dungeon.current_floor_index + 1
        ));
    }
    Ok(false)
}
