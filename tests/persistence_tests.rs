//! Integration tests for saving and resuming runs.

use delve::{Autoexplorer, DelveError, DelveResult, GameMode, GameState, GenerationConfig};
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn play(game: &mut GameState, intents: usize) -> DelveResult<()> {
    let mut explorer = Autoexplorer::new();
    for _ in 0..intents {
        match explorer.next_intent(game)? {
            Some(intent) => {
                game.perform(intent)?;
            }
            None => break,
        }
    }
    Ok(())
}

#[test]
fn test_save_and_load_round_trip_through_a_file() -> DelveResult<()> {
    let dir = tempdir()?;
    let path = dir.path().join("run.json");

    let mut game = GameState::new(GenerationConfig::for_testing(314).with_mode(GameMode::Story))?;
    play(&mut game, 60)?;
    game.save_to_file(&path)?;

    let loaded = GameState::load_from_file(&path)?;
    assert_eq!(loaded.save_to_json()?, game.save_to_json()?);
    assert_eq!(loaded.run.turn_count, game.run.turn_count);
    assert_eq!(loaded.dungeon.floor_count(), game.dungeon.floor_count());
    assert_eq!(loaded.rng.state(), game.rng.state());
    Ok(())
}

#[test]
fn test_resumed_run_continues_identically() -> DelveResult<()> {
    let mut original = GameState::new(GenerationConfig::for_testing(2718))?;
    play(&mut original, 40)?;

    let mut resumed = GameState::load_from_json(&original.save_to_json()?)?;
    play(&mut original, 120)?;
    play(&mut resumed, 120)?;

    assert_eq!(resumed.save_to_json()?, original.save_to_json()?);
    Ok(())
}

/// Far past any position a real run reaches.
const FAR_POSITION: u64 = 1 << 62;

#[test]
fn test_far_rng_position_loads_promptly() -> DelveResult<()> {
    let game = GameState::new(GenerationConfig::for_testing(1618))?;
    let mut snapshot: serde_json::Value = serde_json::from_str(&game.save_to_json()?)?;
    snapshot["rng"]["word_pos"] = serde_json::Value::from(FAR_POSITION);

    let started = Instant::now();
    let mut loaded = GameState::load_from_json(&snapshot.to_string())?;
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(loaded.rng.state().word_pos, FAR_POSITION);

    play(&mut loaded, 20)?;
    assert!(loaded.validate().is_ok());
    Ok(())
}

#[test]
fn test_missing_save_file_is_an_io_error() {
    let dir = tempdir().expect("temp dir");
    let result = GameState::load_from_file(dir.path().join("nothing-here.json"));
    assert!(matches!(result, Err(DelveError::Io(_))));
}

#[test]
fn test_garbage_save_is_rejected() -> DelveResult<()> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{\"dungeon\": 12}")?;

    let result = GameState::load_from_file(&path);
    assert!(matches!(result, Err(DelveError::Serde(_))));
    Ok(())
}
