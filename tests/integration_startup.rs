//! Integration test to ensure a run can start and be played without errors.

use delve::{
    Autoexplorer, DelveResult, EntityId, GameMode, GameState, GenerationConfig, Position,
    RunStatus,
};
use std::collections::HashSet;

#[test]
fn test_basic_startup() -> DelveResult<()> {
    let game = GameState::new(GenerationConfig::for_testing(12345))?;

    let floor = game.dungeon.current_floor()?;
    let player = game.player()?;
    assert!(floor.is_walkable(player.position));
    assert!(floor.get_tile(player.position).is_some_and(|tile| tile.is_visible()));
    assert_eq!(game.run.turn_count, 0);
    assert_eq!(game.run.status, RunStatus::InProgress);
    assert!(game.messages.contains("Welcome, Tester!"));

    Ok(())
}

#[test]
fn test_view_matches_floor() -> DelveResult<()> {
    let config = GenerationConfig::for_testing(7);
    let game = GameState::new(config.clone())?;
    let view = game.view()?;

    assert_eq!(view.width, config.floor_width);
    assert_eq!(view.height, config.floor_height);
    assert_eq!(view.tiles.len(), config.floor_height as usize);
    assert_eq!(view.floor_index, 0);
    assert_eq!(view.player.name, "Tester");
    assert_eq!(view.player.inventory_size, 0);
    assert!(view.entities.iter().any(|entity| entity.is_player()));

    Ok(())
}

#[test]
fn test_scripted_play_keeps_the_world_consistent() -> DelveResult<()> {
    for mode in [GameMode::Endless, GameMode::Story] {
        let mut game = GameState::new(GenerationConfig::for_testing(99).with_mode(mode))?;
        let mut explorer = Autoexplorer::new();

        for _ in 0..400 {
            let Some(intent) = explorer.next_intent(&game)? else {
                break;
            };
            game.perform(intent)?;

            let floor = game.dungeon.current_floor()?;
            assert!(floor.is_render_sorted());
            let occupied: Vec<Position> = floor
                .entities
                .iter()
                .filter(|entity| entity.blocking)
                .map(|entity| entity.position)
                .collect();
            for (index, pos) in occupied.iter().enumerate() {
                assert!(floor.is_walkable(*pos));
                assert!(!occupied[index + 1..].contains(pos), "two blockers share {:?}", pos);
            }
        }

        assert!(game.validate().is_ok());
        assert!(game.run.deepest_floor_reached < game.dungeon.floor_count());

        let mut seen: HashSet<EntityId> = HashSet::new();
        for floor in &game.dungeon.floors {
            for entity in &floor.entities {
                assert!(seen.insert(entity.id), "{} appears twice", entity.id);
                for item in entity.inventory().into_iter().flat_map(|inventory| inventory.iter()) {
                    assert!(seen.insert(item.id), "{} appears twice", item.id);
                }
            }
        }
    }
    Ok(())
}
