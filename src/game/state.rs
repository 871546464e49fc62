//! # Game State Module
//!
//! The session context and the interfaces the core offers its collaborators.
//!
//! [`GameState`] owns everything a run consists of: the dungeon, the message
//! feed, the random stream and the run bookkeeping. It accepts one player
//! intent at a time through [`GameState::perform`], lets the creatures of the
//! current floor answer, and exposes a read-only [`GameView`] for
//! presentation. The whole state serializes to JSON for persistence.

use crate::{
    config, take_turn, ActionContext, Attribute, Attributes, Component, ComponentKind,
    DelveError, DelveResult, Dungeon, Entity, EntityId, Floor, GameRng, GenerationConfig,
    Intent, Message, MessageLog, Position, Room, Tile,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome of a run so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    #[default]
    InProgress,
    /// Left the story dungeon with the relic
    Victory,
    /// The player was slain
    Defeat,
}

/// Bookkeeping for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub player_name: String,
    /// Turns consumed by the player; creature turns are not counted
    pub turn_count: u64,
    /// Creatures slain by the player
    pub kill_count: u32,
    /// Deepest floor index the player has stood on
    pub deepest_floor_reached: usize,
    pub status: RunStatus,
}

impl RunMetadata {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            turn_count: 0,
            kill_count: 0,
            deepest_floor_reached: 0,
            status: RunStatus::InProgress,
        }
    }

    pub fn is_over(&self) -> bool {
        self.status != RunStatus::InProgress
    }
}

/// Snapshot of the player's numbers for a status panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStats {
    pub name: String,
    pub position: Position,
    pub level: u32,
    pub experience: u32,
    pub experience_to_next_level: u32,
    pub attribute_points: u32,
    pub health: i32,
    pub max_health: i32,
    pub magicka: i32,
    pub max_magicka: i32,
    pub damage: i32,
    pub attributes: Attributes,
    pub inventory_size: usize,
    pub inventory_slots: usize,
}

/// Read-only view of a session for presentation.
///
/// Entities come in render order, so drawing them back to front puts corpses
/// underneath everything else.
#[derive(Debug, Clone)]
pub struct GameView<'a> {
    /// Tile grid of the current floor, indexed `[y][x]`
    pub tiles: &'a [Vec<Tile>],
    pub entities: &'a [Entity],
    pub messages: &'a [Message],
    pub player: PlayerStats,
    pub floor_index: usize,
    pub width: u32,
    pub height: u32,
    pub turn_count: u64,
    pub status: RunStatus,
}

/// A complete session.
///
/// # Examples
///
/// ```
/// use delve::{GameState, GenerationConfig, Intent};
///
/// let mut game = GameState::new(GenerationConfig::for_testing(12345))?;
/// assert_eq!(game.run.turn_count, 0);
///
/// assert!(game.perform(Intent::Wait)?);
/// assert_eq!(game.run.turn_count, 1);
/// # Ok::<(), delve::DelveError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub dungeon: Dungeon,
    pub messages: MessageLog,
    pub rng: GameRng,
    pub run: RunMetadata,
    /// The player entity; it always lives on the current floor
    pub player_id: EntityId,
}

fn missing_player() -> DelveError {
    DelveError::InvalidState("player is not on the current floor".to_string())
}

impl GameState {
    /// Starts a new run: generates floor 0 and puts a fresh player on the
    /// first room's center.
    pub fn new(config: GenerationConfig) -> DelveResult<Self> {
        config.validate()?;
        let mut rng = GameRng::new(config.seed);
        let mut dungeon = Dungeon::new(config.clone());
        dungeon.start(&mut rng)?;

        let mut player = dungeon.spawner.player_instance(&config.player_name, &mut rng);
        let player_id = player.id;
        let floor = dungeon.current_floor_mut()?;
        let start = floor
            .first_room()
            .map(Room::center)
            .ok_or_else(|| DelveError::GenerationFailed("first floor has no rooms".to_string()))?;
        player.position = floor.arrival_cell(start);
        floor.add_entity(player)?;

        let mut messages = MessageLog::new();
        messages.info(format!(
            "Welcome, {}! The dungeon awaits.",
            config.player_name
        ));
        log::info!(
            "Started a {:?} run for {} with seed {}",
            config.mode,
            config.player_name,
            config.seed
        );

        let mut state = Self {
            dungeon,
            messages,
            rng,
            run: RunMetadata::new(config.player_name),
            player_id,
        };
        state.reveal()?;
        Ok(state)
    }

    /// Starts a session on a prebuilt floor. The player keeps the position it
    /// was given, and `rng` must be the stream that minted the floor's
    /// entities so later ids keep clear of them.
    pub fn with_floor(
        config: GenerationConfig,
        mut floor: Floor,
        player: Entity,
        rng: GameRng,
    ) -> DelveResult<Self> {
        let player_id = player.id;
        let run = RunMetadata::new(player.name.clone());
        let position = player.position;

        floor.add_entity(player)?;
        floor.reveal_around(position, config::SIGHT_RADIUS);
        Ok(Self {
            dungeon: Dungeon::with_floors(config, vec![floor]),
            messages: MessageLog::new(),
            rng,
            run,
            player_id,
        })
    }

    pub fn player(&self) -> DelveResult<&Entity> {
        self.dungeon
            .current_floor()?
            .entity(self.player_id)
            .ok_or_else(missing_player)
    }

    pub fn player_mut(&mut self) -> DelveResult<&mut Entity> {
        let player_id = self.player_id;
        self.dungeon
            .current_floor_mut()?
            .entity_mut(player_id)
            .ok_or_else(missing_player)
    }

    pub fn is_over(&self) -> bool {
        self.run.is_over()
    }

    /// The context handed to every resolution.
    pub fn action_context(&mut self) -> ActionContext<'_> {
        ActionContext::new(
            &mut self.dungeon,
            &mut self.rng,
            &mut self.messages,
            &mut self.run,
        )
    }

    /// Resolves one player intent, then lets the creatures act if it
    /// consumed a turn. Returns whether it did.
    ///
    /// New messages can be read with [`MessageLog::since`] using the feed
    /// length from before the call.
    pub fn perform(&mut self, intent: Intent) -> DelveResult<bool> {
        if self.is_over() {
            self.messages.reject("The run is over");
            return Ok(false);
        }

        let player_id = self.player_id;
        let consumed = intent.resolve(&mut self.action_context(), player_id)?;
        if consumed {
            self.run.turn_count += 1;
            self.run_creature_round()?;
        }
        self.reveal()?;
        Ok(consumed)
    }

    /// Every living AI actor on the current floor acts once, in entity-list
    /// order as it stood when the round began.
    fn run_creature_round(&mut self) -> DelveResult<()> {
        let actors: Vec<EntityId> = self
            .dungeon
            .current_floor()?
            .creatures()
            .map(|creature| creature.id)
            .collect();
        let player_id = self.player_id;
        let mut ctx = self.action_context();

        for actor in actors {
            if ctx.run.is_over() {
                break;
            }
            take_turn(&mut ctx, actor, player_id)?;
        }
        Ok(())
    }

    /// Marks the tiles around the player visible.
    fn reveal(&mut self) -> DelveResult<()> {
        let position = self.player()?.position;
        self.dungeon
            .current_floor_mut()?
            .reveal_around(position, config::SIGHT_RADIUS);
        Ok(())
    }

    /// Spends one of the player's attribute points.
    ///
    /// Does not consume a turn. Returns `Ok(false)` with a rejection message
    /// when no points are left.
    pub fn allocate_attribute(&mut self, attribute: Attribute) -> DelveResult<bool> {
        let player_id = self.player_id;
        let player = self
            .dungeon
            .current_floor_mut()?
            .entity_mut(player_id)
            .ok_or_else(missing_player)?;

        let Some(Component::Leveler(mut leveler)) = player.remove_component(ComponentKind::Leveler)
        else {
            self.messages.reject("You cannot grow any stronger");
            return Ok(false);
        };
        let allocated = match player.fighter_mut() {
            Some(fighter) => leveler.allocate(attribute, fighter),
            None => false,
        };
        player.add_component(Component::Leveler(leveler));

        if allocated {
            let name = format!("{:?}", attribute).to_lowercase();
            self.messages.info(format!("Your {} increases.", name));
        } else {
            self.messages.reject("You have no attribute points to spend");
        }
        Ok(allocated)
    }

    pub fn player_stats(&self) -> DelveResult<PlayerStats> {
        let player = self.player()?;
        let fighter = player
            .fighter()
            .ok_or_else(|| DelveError::InvalidState("player has no fighter".to_string()))?;
        let leveler = player.leveler();
        let inventory = player.inventory();

        Ok(PlayerStats {
            name: player.name.clone(),
            position: player.position,
            level: leveler.map_or(1, |l| l.level),
            experience: leveler.map_or(0, |l| l.experience),
            experience_to_next_level: leveler.map_or(0, |l| l.experience_to_next_level()),
            attribute_points: leveler.map_or(0, |l| l.attribute_points),
            health: fighter.health,
            max_health: fighter.max_health(),
            magicka: fighter.magicka,
            max_magicka: fighter.max_magicka(),
            damage: player.attack_damage(),
            attributes: fighter.attributes,
            inventory_size: inventory.map_or(0, |i| i.size()),
            inventory_slots: inventory.map_or(0, |i| i.max_slots),
        })
    }

    /// Borrows the state for drawing.
    pub fn view(&self) -> DelveResult<GameView<'_>> {
        let floor = self.dungeon.current_floor()?;
        Ok(GameView {
            tiles: &floor.tiles,
            entities: &floor.entities,
            messages: self.messages.messages(),
            player: self.player_stats()?,
            floor_index: self.dungeon.current_floor_index,
            width: floor.width,
            height: floor.height,
            turn_count: self.run.turn_count,
            status: self.run.status,
        })
    }

    /// Checks what a restored snapshot must hold: a current floor, and on it
    /// the player with a fighter and an inventory within its slots.
    pub fn validate(&self) -> DelveResult<()> {
        let corrupt = |reason: &str| DelveError::CorruptSave(reason.to_string());

        if self.dungeon.current_floor_index >= self.dungeon.floor_count()
            || self.dungeon.deepest_floor_index >= self.dungeon.floor_count()
        {
            return Err(corrupt("floor index out of range"));
        }
        let player = self
            .player()
            .map_err(|_| corrupt("player is missing from the current floor"))?;
        if !player.is_player() {
            return Err(corrupt("player entity lost its role"));
        }
        if player.fighter().is_none() {
            return Err(corrupt("player has no fighter component"));
        }
        let Some(inventory) = player.inventory() else {
            return Err(corrupt("player has no inventory component"));
        };
        if inventory.size() > inventory.max_slots {
            return Err(corrupt("player carries more items than slots"));
        }
        Ok(())
    }

    /// Saves the game state to JSON.
    pub fn save_to_json(&self) -> DelveResult<String> {
        serde_json::to_string_pretty(self).map_err(DelveError::from)
    }

    /// Loads game state from JSON, rejecting snapshots that fail
    /// [`GameState::validate`].
    pub fn load_from_json(json: &str) -> DelveResult<Self> {
        let state: Self = serde_json::from_str(json)?;
        state.validate()?;
        Ok(state)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> DelveResult<()> {
        std::fs::write(path.as_ref(), self.save_to_json()?)?;
        log::info!("Saved run to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> DelveResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::load_from_json(&json)
    }
}
