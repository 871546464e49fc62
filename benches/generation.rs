//! Benchmarks for floor generation and session start-up.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use delve::{
    Autoexplorer, GameMode, GameRng, GameState, GenerationConfig, Generator, RoomTunnelGenerator,
    Spawner,
};

fn bench_floor_generation(c: &mut Criterion) {
    let spawner = Spawner::default();
    let config = GenerationConfig::new(1234);

    c.bench_function("generate_standard_floor", |b| {
        let mut rng = GameRng::new(config.seed);
        b.iter(|| {
            let generator = RoomTunnelGenerator::new(&spawner, black_box(3));
            generator.generate(&config, &mut rng)
        })
    });

    let story = GenerationConfig::new(1234).with_mode(GameMode::Story);
    c.bench_function("generate_relic_floor", |b| {
        let mut rng = GameRng::new(story.seed);
        b.iter(|| {
            let generator = RoomTunnelGenerator::new(&spawner, story.story_depth - 1);
            generator.generate(&story, &mut rng)
        })
    });
}

fn bench_session(c: &mut Criterion) {
    c.bench_function("start_run", |b| {
        b.iter(|| GameState::new(GenerationConfig::new(black_box(99))))
    });

    c.bench_function("scripted_hundred_intents", |b| {
        b.iter(|| -> delve::DelveResult<u64> {
            let mut game = GameState::new(GenerationConfig::new(7))?;
            let mut explorer = Autoexplorer::new();
            for _ in 0..100 {
                let Some(intent) = explorer.next_intent(&game)? else {
                    break;
                };
                game.perform(intent)?;
            }
            Ok(game.run.turn_count)
        })
    });
}

criterion_group!(benches, bench_floor_generation, bench_session);
criterion_main!(benches);
