//! Match Session
//!
//! The single coordinator in front of the world. Every join, leave, command,
//! tick and snapshot goes through a `&mut MatchSession`, and the server keeps
//! the session behind one async mutex, so no caller can observe a
//! half-applied update.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::grid::{Cell, Direction};
use crate::game::config::MatchConfig;
use crate::game::events::GameEvent;
use crate::game::input::Command;
use crate::game::state::{DirectionOutcome, Role, Seat, World};
use crate::game::tick::tick;
use crate::game::walls::{spawn_wall, WallSpawnOutcome};
use crate::network::protocol::{ServerMessage, Snapshot};

/// Session handle shared by connection handlers and the ticker.
pub type SharedSession = Arc<Mutex<MatchSession>>;

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Sender has no seat in the match.
    #[error("Player not found: {0}")]
    UnknownPlayer(String),

    /// Controller action from someone else.
    #[error("{0} is not the controller")]
    NotController(String),

    /// Input after the match was decided.
    #[error("Match is over")]
    MatchOver,
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Joined under `name`
    Joined { name: String, seat: Seat },
    /// Direction request handled
    Direction(DirectionOutcome),
    /// Food moved to this cell
    FoodMoved(Cell),
    /// Wall spawn handled
    Wall(WallSpawnOutcome),
}

/// The one match this process runs.
#[derive(Debug)]
pub struct MatchSession {
    world: World,
}

impl MatchSession {
    /// Create a session with a fresh world.
    pub fn new(config: MatchConfig, rng_seed: u64) -> Self {
        info!("Match created (seed {})", rng_seed);
        Self {
            world: World::new(config, rng_seed),
        }
    }

    /// Wrap in the shared handle.
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Read-only view of the world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for setup outside the command path.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Current tick interval; the ticker re-reads this after every tick.
    pub fn tick_interval(&self) -> Duration {
        self.world.tick_interval
    }

    /// Give `requested` a unique name and seat it if there is room.
    pub fn join(&mut self, requested: &str, now: Instant) -> (String, Seat) {
        let name = self.world.assign_unique_name(requested);
        let seat = self.world.seat_player(&name, now);

        match &seat {
            Seat::Waiting => info!("{} joined, waiting for an opponent", name),
            Seat::Paired { snake, controller } => {
                info!("{} joined; {} is the snake, {} the controller", name, snake, controller)
            }
            Seat::Full => info!("{} connected as a spectator", name),
        }
        self.log_events();

        (name, seat)
    }

    /// Remove a disconnected player. The next tick settles any vacated role.
    pub fn leave(&mut self, name: &str) -> bool {
        let removed = self.world.remove_player(name).is_some();
        if removed {
            self.world.push_event(GameEvent::PlayerLeft {
                name: name.to_string(),
            });
            self.log_events();
        }
        removed
    }

    /// Apply a player command.
    pub fn apply(&mut self, command: Command, now: Instant) -> Result<CommandOutcome, SessionError> {
        if self.world.is_over() && !matches!(command, Command::Join { .. }) {
            debug!("Dropped command from {}: match is over", command.player());
            return Err(SessionError::MatchOver);
        }

        let outcome = match command {
            Command::Join { name } => {
                let (name, seat) = self.join(&name, now);
                return Ok(CommandOutcome::Joined { name, seat });
            }
            Command::SetDirection { name, key } => {
                self.require_player(&name)?;
                let outcome = match Direction::from_key(&key) {
                    Some(direction) => self.world.set_direction(&name, direction),
                    None => DirectionOutcome::Ignored,
                };
                if outcome == DirectionOutcome::Ignored {
                    debug!("Ignored direction {:?} from {}", key, name);
                }
                CommandOutcome::Direction(outcome)
            }
            Command::ControllerAction { name, action } => {
                let role = self.require_player(&name)?;
                if role != Some(Role::Controller) {
                    return Err(SessionError::NotController(name));
                }
                match action.food_direction() {
                    Some(direction) => CommandOutcome::FoodMoved(self.world.move_food(direction)),
                    None => CommandOutcome::Wall(spawn_wall(&mut self.world, &name, now)),
                }
            }
        };

        self.log_events();
        Ok(outcome)
    }

    /// Run one broadcast cycle and produce the message for every client.
    ///
    /// A decided match keeps answering with its result, a match without both
    /// roles answers `waiting`, anything else ticks and sends a snapshot.
    pub fn advance(&mut self, now: Instant) -> ServerMessage {
        if let Some(outcome) = &self.world.outcome {
            return ServerMessage::result(outcome.winner.clone());
        }
        if !self.world.match_started {
            return ServerMessage::waiting();
        }

        let result = tick(&mut self.world, now);
        self.log_events();

        if result.match_ended {
            let winner = self.world.outcome.as_ref().and_then(|o| o.winner.clone());
            return ServerMessage::result(winner);
        }
        if !self.world.match_started {
            return ServerMessage::waiting();
        }
        ServerMessage::Snapshot(Box::new(Snapshot::capture(&self.world, now)))
    }

    fn require_player(&self, name: &str) -> Result<Option<Role>, SessionError> {
        self.world
            .player(name)
            .map(|p| p.role)
            .ok_or_else(|| SessionError::UnknownPlayer(name.to_string()))
    }

    /// Drain and log pending world events.
    fn log_events(&mut self) {
        for event in self.world.take_events() {
            match event {
                GameEvent::PlayerJoined { name, role, colour } => {
                    debug!("{} seated as {:?} (colour {})", name, role, colour);
                }
                GameEvent::PlayerLeft { name } => info!("{} disconnected", name),
                GameEvent::FoodEaten { name, new_score, food } => {
                    info!("{} ate the food (score {}), food moved to {:?}", name, new_score, food);
                }
                GameEvent::SnakeEliminated { name, cause } => {
                    info!("{} eliminated ({:?})", name, cause);
                }
                GameEvent::WallSpawned { name, cells } => {
                    info!("{} spawned a wall of {} cells", name, cells);
                }
                GameEvent::WallRejected { name } => debug!("Wall spawn rejected for {}", name),
                GameEvent::MatchEnded { winner, reason } => {
                    info!("Match over: {} (winner: {:?})", reason, winner);
                }
                GameEvent::MatchAbandoned => info!("Both players left, waiting for a new pair"),
            }
        }
    }
}
