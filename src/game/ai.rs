//! # Creature AI
//!
//! Two-state decision making for AI-driven actors.
//!
//! A creature is `Hostile` while the player is within aggro range along a
//! straight line that no wall cuts, and `Wandering` otherwise. The state is
//! recomputed from scratch on every activation rather than remembered. There
//! is no real pathfinding: a creature whose line to the player is blocked
//! simply does not notice the player.

use crate::{
    config, resolve_move, straight_line_path, ActionContext, Ai, AiState, DelveResult, Direction,
    EntityId, Floor, Position, StatusKind,
};

/// Decides the state of a creature at `actor_pos` and returns it with the
/// straight-line path to the player (both endpoints included).
pub fn update_state(
    floor: &Floor,
    actor_pos: Position,
    player_pos: Position,
) -> (AiState, Vec<Position>) {
    let path = straight_line_path(actor_pos, player_pos);
    let in_range = actor_pos.euclidean_distance(player_pos) <= config::AGGRO_RANGE;
    let unobstructed = path.iter().all(|pos| floor.is_walkable(*pos));

    let state = if in_range && unobstructed {
        AiState::Hostile
    } else {
        AiState::Wandering
    };
    (state, path)
}

/// Runs one activation of an AI actor.
///
/// Actors that are gone, dead or without an AI component are skipped.
/// Status effects take precedence over the state machine: a frozen actor
/// loses its turn, a confused one stumbles about and a charmed one wanders
/// without ever bumping the player.
pub fn take_turn(
    ctx: &mut ActionContext<'_>,
    actor_id: EntityId,
    player_id: EntityId,
) -> DelveResult<()> {
    let floor = ctx.dungeon.current_floor()?;
    let Some(actor) = floor.entity(actor_id) else {
        return Ok(());
    };
    let Some(ai) = actor.ai() else {
        return Ok(());
    };
    if !actor.is_alive() {
        return Ok(());
    }
    let status = ai.status_kind();
    let actor_pos = actor.position;
    let player_pos = floor
        .entity(player_id)
        .filter(|player| player.is_alive())
        .map(|player| player.position);

    match status {
        Some(StatusKind::Frozen) => {
            log::trace!("{} is frozen", actor_id);
        }
        Some(StatusKind::Confused) => {
            log::trace!("{} stumbles", actor_id);
            stumble(ctx, actor_id, None)?;
        }
        Some(StatusKind::Charmed) => {
            if ctx.rng.chance(config::WANDER_CHANCE) {
                stumble(ctx, actor_id, player_pos)?;
            }
        }
        None => {
            let Some(player_pos) = player_pos else {
                return wander(ctx, actor_id);
            };
            let (state, path) = update_state(floor, actor_pos, player_pos);
            log::trace!("{} at {:?} is {:?}", actor_id, actor_pos, state);

            if let Some(ai) = ctx
                .dungeon
                .current_floor_mut()?
                .entity_mut(actor_id)
                .and_then(|actor| actor.ai_mut())
            {
                ai.state = state;
            }

            match state {
                AiState::Wandering => wander(ctx, actor_id)?,
                AiState::Hostile => {
                    if let Some(step) = path.get(1) {
                        resolve_move(ctx, actor_id, step.x - actor_pos.x, step.y - actor_pos.y)?;
                    }
                }
            }
            return Ok(());
        }
    }

    tick_status(ctx, actor_id)
}

/// With the wander chance, bumps in a random direction.
fn wander(ctx: &mut ActionContext<'_>, actor_id: EntityId) -> DelveResult<()> {
    if ctx.rng.chance(config::WANDER_CHANCE) {
        stumble(ctx, actor_id, None)?;
    }
    Ok(())
}

/// Bumps in a random direction, unless that direction leads into `avoid`.
fn stumble(
    ctx: &mut ActionContext<'_>,
    actor_id: EntityId,
    avoid: Option<Position>,
) -> DelveResult<()> {
    let Some(delta) = ctx.rng.choose(&Direction::ALL).map(|direction| direction.to_delta()) else {
        return Ok(());
    };

    if let Some(avoid) = avoid {
        let position = ctx
            .dungeon
            .current_floor()?
            .entity(actor_id)
            .map(|actor| actor.position);
        if position.map(|pos| pos + delta) == Some(avoid) {
            return Ok(());
        }
    }

    resolve_move(ctx, actor_id, delta.x, delta.y)?;
    Ok(())
}

/// Counts down a status effect and announces its end.
fn tick_status(ctx: &mut ActionContext<'_>, actor_id: EntityId) -> DelveResult<()> {
    let floor = ctx.dungeon.current_floor_mut()?;
    let Some(actor) = floor.entity_mut(actor_id) else {
        return Ok(());
    };
    let name = actor.name.clone();
    let expired = actor.ai_mut().and_then(Ai::tick_status);

    match expired {
        Some(StatusKind::Confused) => ctx.log.info(format!("The {} is no longer confused.", name)),
        Some(StatusKind::Frozen) => ctx.log.info(format!("The {} thaws out.", name)),
        Some(StatusKind::Charmed) => ctx.log.info(format!("The {} is no longer charmed.", name)),
        None => {}
    }
    Ok(())
}
