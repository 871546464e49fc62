//! Integration tests for moving between floors.

use delve::{
    DelveResult, GameMode, GameState, GenerationConfig, Intent, ItemKind, Position, RunStatus,
    StairDirection,
};

fn stand_on(game: &mut GameState, pos: Position) -> DelveResult<()> {
    game.player_mut()?.position = pos;
    Ok(())
}

fn take_stairs(game: &mut GameState, direction: StairDirection) -> DelveResult<()> {
    let stairs = game
        .dungeon
        .current_floor()?
        .staircase(direction)
        .expect("floor should have that staircase");
    stand_on(game, stairs)?;
    let intent = match direction {
        StairDirection::Down => Intent::Descend,
        StairDirection::Up => Intent::Ascend,
    };
    game.perform(intent)?;
    Ok(())
}

#[test]
fn test_descend_generates_only_past_the_deepest_floor() -> DelveResult<()> {
    let mut game = GameState::new(GenerationConfig::for_testing(98765))?;
    assert_eq!(game.dungeon.floor_count(), 1);

    take_stairs(&mut game, StairDirection::Down)?;
    assert_eq!(game.dungeon.current_floor_index, 1);
    assert_eq!(game.dungeon.floor_count(), 2);
    assert_eq!(game.run.deepest_floor_reached, 1);
    let floor_one = game.dungeon.floor(1).expect("floor 1").tiles.clone();

    take_stairs(&mut game, StairDirection::Up)?;
    assert_eq!(game.dungeon.current_floor_index, 0);
    assert_eq!(game.dungeon.floor_count(), 2);

    take_stairs(&mut game, StairDirection::Down)?;
    assert_eq!(game.dungeon.floor_count(), 2);
    assert_eq!(game.dungeon.current_floor()?.tiles, floor_one);

    take_stairs(&mut game, StairDirection::Down)?;
    assert_eq!(game.dungeon.current_floor_index, 2);
    assert_eq!(game.dungeon.floor_count(), 3);
    assert_eq!(game.run.deepest_floor_reached, 2);
    Ok(())
}

#[test]
fn test_player_arrives_by_the_matching_staircase() -> DelveResult<()> {
    let mut game = GameState::new(GenerationConfig::for_testing(4242))?;

    take_stairs(&mut game, StairDirection::Down)?;
    let floor = game.dungeon.current_floor()?;
    let landing = floor.first_room().map(|room| room.center()).expect("rooms");
    assert_eq!(floor.staircase(StairDirection::Up), Some(landing));
    assert!(floor.entity(game.player_id).is_some());
    assert!(game.dungeon.floor(0).and_then(|f| f.entity(game.player_id)).is_none());

    take_stairs(&mut game, StairDirection::Up)?;
    let floor = game.dungeon.current_floor()?;
    let landing = floor.last_room().map(|room| room.center()).expect("rooms");
    assert_eq!(floor.staircase(StairDirection::Down), Some(landing));
    Ok(())
}

#[test]
fn test_floor_changes_cost_no_turn() -> DelveResult<()> {
    let mut game = GameState::new(GenerationConfig::for_testing(31))?;
    take_stairs(&mut game, StairDirection::Down)?;
    take_stairs(&mut game, StairDirection::Up)?;
    assert_eq!(game.run.turn_count, 0);
    Ok(())
}

#[test]
fn test_cannot_descend_off_the_staircase() -> DelveResult<()> {
    let mut game = GameState::new(GenerationConfig::for_testing(5))?;
    let stairs = game
        .dungeon
        .current_floor()?
        .staircase(StairDirection::Down)
        .expect("down staircase");
    let corner = game
        .dungeon
        .current_floor()?
        .first_room()
        .map(|room| room.top_left)
        .expect("room");
    assert_ne!(stairs, corner);
    stand_on(&mut game, corner)?;

    assert!(!game.perform(Intent::Descend)?);
    assert_eq!(game.dungeon.current_floor_index, 0);
    assert!(game.messages.contains("Can't descend here"));
    Ok(())
}

#[test]
fn test_endless_first_floor_has_no_way_up() -> DelveResult<()> {
    let game = GameState::new(GenerationConfig::for_testing(77))?;
    assert!(game.dungeon.current_floor()?.staircase(StairDirection::Up).is_none());
    Ok(())
}

#[test]
fn test_story_exit_is_sealed_without_the_relic() -> DelveResult<()> {
    let config = GenerationConfig::for_testing(54321).with_mode(GameMode::Story);
    let mut game = GameState::new(config)?;

    take_stairs(&mut game, StairDirection::Up)?;
    assert_eq!(game.run.status, RunStatus::InProgress);
    assert!(game.messages.contains("The way out is sealed"));
    Ok(())
}

#[test]
fn test_story_run_is_won_by_carrying_the_relic_out() -> DelveResult<()> {
    let config = GenerationConfig::for_testing(2024).with_mode(GameMode::Story);
    let depth = config.story_depth as usize;
    let mut game = GameState::new(config)?;

    for _ in 1..depth {
        take_stairs(&mut game, StairDirection::Down)?;
    }
    let floor = game.dungeon.current_floor()?;
    assert_eq!(game.dungeon.current_floor_index, depth - 1);
    assert!(floor.staircase(StairDirection::Down).is_none());
    let relic = floor
        .items()
        .find(|item| item.item_kind() == Some(ItemKind::Relic))
        .map(|item| item.position)
        .expect("relic on the last floor");

    stand_on(&mut game, relic)?;
    for _ in 0..4 {
        if game.player()?.carries(ItemKind::Relic) {
            break;
        }
        game.perform(Intent::PickUp)?;
    }
    assert!(game.player()?.carries(ItemKind::Relic));

    // The player may have been slain by a neighbour while picking things up.
    if game.is_over() {
        return Ok(());
    }
    for _ in 1..depth {
        take_stairs(&mut game, StairDirection::Up)?;
    }
    take_stairs(&mut game, StairDirection::Up)?;

    assert_eq!(game.run.status, RunStatus::Victory);
    assert!(!game.perform(Intent::Wait)?);
    Ok(())
}
