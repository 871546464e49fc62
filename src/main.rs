//! # Delve Headless Runner
//!
//! Starts (or resumes) a run, lets the autoexplorer play it for a number of
//! intents and prints a summary.

use clap::{Parser, ValueEnum};
use delve::{
    Autoexplorer, DelveError, DelveResult, GameMode, GameState, GenerationConfig, RunStatus,
};
use std::path::PathBuf;
#[cfg(feature = "dev-tools")]
use tracing::Level;

/// Dungeon mode accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Endless,
    Story,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Endless => GameMode::Endless,
            ModeArg::Story => GameMode::Story,
        }
    }
}

/// Command line arguments for the Delve runner.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Turn-based dungeon crawler played by a scripted explorer")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Maximum number of intents to play
    #[arg(short, long, default_value_t = 500)]
    turns: u64,

    /// Dungeon mode
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Generation config as JSON; --seed and --mode override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resume a saved run instead of starting a new one
    #[arg(long, conflicts_with_all = ["config", "seed", "mode"])]
    resume: Option<PathBuf>,

    /// Write the run to this file when play stops
    #[arg(long)]
    save: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> DelveResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level)?;
    log::info!("Starting Delve v{}", delve::VERSION);

    let mut game = match &args.resume {
        Some(path) => {
            log::info!("Resuming run from {}", path.display());
            GameState::load_from_file(path)?
        }
        None => GameState::new(build_config(&args)?)?,
    };

    let played = play(&mut game, args.turns)?;
    print_summary(&game, played)?;

    if let Some(path) = &args.save {
        game.save_to_file(path)?;
    }

    Ok(())
}

/// Loads the config file (if any) and applies command line overrides.
fn build_config(args: &Args) -> DelveResult<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            serde_json::from_str::<GenerationConfig>(&json)?
        }
        None => GenerationConfig::new(args.seed.unwrap_or_else(rand::random)),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    config.validate()?;
    Ok(config)
}

/// Feeds autoexplorer intents into the game. Returns how many were played.
fn play(game: &mut GameState, limit: u64) -> DelveResult<u64> {
    let mut explorer = Autoexplorer::new();
    let mut played = 0;

    while played < limit {
        let Some(intent) = explorer.next_intent(game)? else {
            break;
        };
        let consumed = game.perform(intent)?;
        log::debug!("{:?} -> consumed: {}", intent, consumed);
        played += 1;

        if game.is_over() {
            break;
        }
    }

    Ok(played)
}

fn print_summary(game: &GameState, played: u64) -> DelveResult<()> {
    let stats = game.player_stats()?;
    let run = &game.run;
    let outcome = match run.status {
        RunStatus::InProgress => "still delving",
        RunStatus::Victory => "escaped with the relic",
        RunStatus::Defeat => "slain",
    };

    println!("{} ({}) after {} intents", stats.name, outcome, played);
    println!(
        "  turns: {}  kills: {}  deepest floor: {}",
        run.turn_count, run.kill_count, run.deepest_floor_reached
    );
    println!(
        "  level {}  health {}/{}  magicka {}/{}  items {}/{}",
        stats.level,
        stats.health,
        stats.max_health,
        stats.magicka,
        stats.max_magicka,
        stats.inventory_size,
        stats.inventory_slots
    );

    let messages = game.messages.messages();
    let recent = &messages[messages.len().saturating_sub(5)..];
    for message in recent {
        println!("  > {}", message.text);
    }
    Ok(())
}

/// Initializes logging based on the specified level.
fn initialize_logging(log_level: &str) -> DelveResult<()> {
    #[cfg(feature = "dev-tools")]
    {
        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .try_init()
            .map_err(|e| DelveError::InvalidState(format!("logging setup failed: {}", e)))?;
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .try_init()
            .map_err(|e| DelveError::InvalidState(format!("logging setup failed: {}", e)))?;
    }

    Ok(())
}
