//! Property-based tests for floor generation and inventory limits.
//!
//! Every seed must yield a floor whose rooms stay apart and inside the border,
//! whose walkable cells form one connected region, and whose entity list is
//! kept in render order.

use delve::{
    config, reachable_from, GameMode, GameRng, GameState, GenerationConfig, Generator, Intent,
    Position, Room, RoomTunnelGenerator, Spawner, StairDirection, POTIONS,
};
use proptest::prelude::*;

fn test_floor_config(seed: u64, mode: GameMode) -> GenerationConfig {
    GenerationConfig::for_testing(seed).with_mode(mode)
}

fn mode_strategy() -> impl Strategy<Value = GameMode> {
    prop_oneof![Just(GameMode::Endless), Just(GameMode::Story)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_rooms_never_overlap_and_respect_the_border(
        seed in any::<u64>(),
        depth in 0u32..6,
        mode in mode_strategy(),
    ) {
        let config = test_floor_config(seed, mode);
        let spawner = Spawner::default();
        let mut rng = GameRng::new(seed);
        let floor = RoomTunnelGenerator::new(&spawner, depth).generate(&config, &mut rng).unwrap();

        prop_assert!(!floor.rooms.is_empty());
        prop_assert!(floor.rooms.len() <= config.max_rooms as usize);
        for (index, room) in floor.rooms.iter().enumerate() {
            prop_assert!(room.x1() >= 1 && room.y1() >= 1);
            prop_assert!(room.x2() <= config.floor_width as i32 - 1);
            prop_assert!(room.y2() <= config.floor_height as i32 - 1);
            for other in &floor.rooms[index + 1..] {
                prop_assert!(!room.intersects(other), "{:?} overlaps {:?}", room, other);
            }
        }
    }

    #[test]
    fn prop_every_walkable_cell_is_connected(seed in any::<u64>(), depth in 0u32..6) {
        let config = test_floor_config(seed, GameMode::Endless);
        let spawner = Spawner::default();
        let mut rng = GameRng::new(seed);
        let floor = RoomTunnelGenerator::new(&spawner, depth).generate(&config, &mut rng).unwrap();

        let start = floor.first_room().map(Room::center).unwrap();
        let reached = reachable_from(start, |pos| floor.is_walkable(pos));
        let walkable = (0..config.floor_height as i32)
            .flat_map(|y| (0..config.floor_width as i32).map(move |x| Position::new(x, y)))
            .filter(|pos| floor.is_walkable(*pos))
            .count();
        prop_assert_eq!(reached.len(), walkable);
        prop_assert!(floor.is_render_sorted());
    }

    #[test]
    fn prop_staircases_follow_the_mode(
        seed in any::<u64>(),
        depth in 0u32..4,
        mode in mode_strategy(),
    ) {
        let config = test_floor_config(seed, mode);
        let spawner = Spawner::default();
        let mut rng = GameRng::new(seed);
        let floor = RoomTunnelGenerator::new(&spawner, depth).generate(&config, &mut rng).unwrap();

        prop_assert_eq!(
            floor.staircase(StairDirection::Up).is_some(),
            config.has_ascending_staircase(depth)
        );
        prop_assert_eq!(
            floor.staircase(StairDirection::Down).is_some(),
            config.has_descending_staircase(depth)
        );
        for stairs in [floor.staircase(StairDirection::Up), floor.staircase(StairDirection::Down)]
            .into_iter()
            .flatten()
        {
            prop_assert!(floor.is_walkable(stairs));
        }
    }

    #[test]
    fn prop_generation_terminates_on_crowded_floors(seed in any::<u64>(), rooms in 1u32..400) {
        let mut config = GenerationConfig::for_testing(seed);
        config.max_rooms = rooms;
        config.floor_width = 16;
        config.floor_height = 12;
        let spawner = Spawner::default();
        let mut rng = GameRng::new(seed);

        let floor = RoomTunnelGenerator::new(&spawner, 0).generate(&config, &mut rng).unwrap();
        prop_assert!(!floor.rooms.is_empty());
    }

    #[test]
    fn prop_inventory_never_exceeds_its_slots(seed in any::<u64>(), offered in 0usize..40) {
        let mut game = GameState::new(GenerationConfig::for_testing(seed)).unwrap();
        let here = game.player().unwrap().position;
        {
            let floor = game.dungeon.current_floor_mut().unwrap();
            for _ in 0..offered {
                floor.add_entity(POTIONS[0].instantiate(&mut game.rng).at(here)).unwrap();
            }
        }

        for _ in 0..offered + 2 {
            if game.is_over() {
                break;
            }
            game.perform(Intent::PickUp).unwrap();
        }

        let held = game.player().unwrap().inventory().unwrap().size();
        prop_assert!(held <= config::PLAYER_INVENTORY_SLOTS);
        // Items generated under the start cell may be picked up as well.
        if !game.is_over() {
            prop_assert!(held >= offered.min(config::PLAYER_INVENTORY_SLOTS));
        }
    }
}
