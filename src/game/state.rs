//! Game State Definitions
//!
//! The world model for a single match: players, food, walls and the
//! terminal outcome. Players live in a `Vec` so insertion order is kept;
//! the leaderboard re-sort is a stable sort over that order.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::core::grid::{Cell, Direction};
use crate::core::rng::DeterministicRng;
use crate::game::config::MatchConfig;
use crate::game::events::GameEvent;
use crate::game::walls::Wall;

// =============================================================================
// ROLE
// =============================================================================

/// The two sides of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Moves on the board and eats food
    Snake,
    /// Moves the food and spawns walls
    Controller,
}

impl Role {
    /// The other role.
    pub fn complement(self) -> Self {
        match self {
            Role::Snake => Role::Controller,
            Role::Controller => Role::Snake,
        }
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// State of a single player in the match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    /// Unique display name
    pub name: String,

    /// Role, `None` until a second player joins
    pub role: Option<Role>,

    /// Colour index in `1..=palette_size`
    pub colour: u8,

    /// Food eaten
    pub score: u32,

    /// Requested movement direction (`None` for non-snakes)
    pub direction: Option<Direction>,

    /// Direction used by the most recent move
    pub heading: Option<Direction>,

    /// Body cells, head first (empty for non-snakes)
    pub segments: VecDeque<Cell>,
}

impl Player {
    /// A player with no body and no direction.
    pub fn without_body(name: &str, role: Option<Role>, colour: u8) -> Self {
        Self {
            name: name.to_string(),
            role,
            colour,
            score: 0,
            direction: None,
            heading: None,
            segments: VecDeque::new(),
        }
    }

    /// A one-cell snake at `head` facing `direction`.
    pub fn snake(name: &str, colour: u8, head: Cell, direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            heading: Some(direction),
            segments: VecDeque::from([head]),
            ..Self::without_body(name, Some(Role::Snake), colour)
        }
    }

    /// True for a snake that still has a body on the board.
    #[inline]
    pub fn is_live_snake(&self) -> bool {
        self.role == Some(Role::Snake) && !self.segments.is_empty()
    }

    /// Head cell, if any.
    pub fn head(&self) -> Option<Cell> {
        self.segments.front().copied()
    }

    /// Tail cell, if any.
    pub fn tail(&self) -> Option<Cell> {
        self.segments.back().copied()
    }

    /// Point the snake in a new direction and record it as the heading.
    pub fn face(&mut self, direction: Direction) {
        self.direction = Some(direction);
        self.heading = Some(direction);
    }
}

/// Result of a direction request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectionOutcome {
    /// Stored direction changed (or was re-confirmed)
    Updated,
    /// Reversal or non-snake player; direction unchanged
    Ignored,
}

/// Where a joining player ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Seat {
    /// First player, waiting for an opponent
    Waiting,
    /// Second player; both roles are now assigned
    Paired { snake: String, controller: String },
    /// Match already has two players or is over
    Full,
}

/// How the match finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Winning player's name
    pub winner: Option<String>,
    /// Human-readable reason
    pub reason: String,
}

// =============================================================================
// WORLD
// =============================================================================

/// Complete state of a match.
#[derive(Debug)]
pub struct World {
    /// Rules for this match
    pub config: MatchConfig,

    /// Source of every random choice
    pub rng: DeterministicRng,

    /// The single food cell
    pub food: Cell,

    /// Active players in leaderboard order
    pub players: Vec<Player>,

    /// Walls spawned by the controller (expired ones are pruned each tick)
    pub walls: Vec<Wall>,

    /// Per-player wall spawn timestamps
    pub wall_spawns: BTreeMap<String, Vec<Instant>>,

    /// Current tick interval
    pub tick_interval: Duration,

    /// Whole seconds left, `None` before the first active tick
    pub remaining_time: Option<u64>,

    /// Both roles have been assigned
    pub match_started: bool,

    /// When movement begins (pairing instant + start delay)
    pub match_start: Option<Instant>,

    /// Set once the match is decided
    pub outcome: Option<MatchOutcome>,

    /// Events generated since the last drain
    pub pending_events: Vec<GameEvent>,
}

impl World {
    /// Create a new world with food already placed.
    pub fn new(config: MatchConfig, rng_seed: u64) -> Self {
        let mut rng = DeterministicRng::new(rng_seed);
        let food = rng.random_cell(config.rows, config.cols, 1 + config.food_margin);
        let tick_interval = config.base_tick;

        Self {
            config,
            rng,
            food,
            players: Vec::new(),
            walls: Vec::new(),
            wall_spawns: BTreeMap::new(),
            tick_interval,
            remaining_time: None,
            match_started: false,
            match_start: None,
            outcome: None,
            pending_events: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Get a player by name.
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Get a player mutably by name.
    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name == name)
    }

    /// First player holding `role`.
    pub fn player_with_role(&self, role: Role) -> Option<&Player> {
        self.players.iter().find(|p| p.role == Some(role))
    }

    /// Whether the match has been decided.
    #[inline]
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Every cell covered by any player's body.
    pub fn occupied_cells(&self) -> HashSet<Cell> {
        self.players
            .iter()
            .flat_map(|p| p.segments.iter().copied())
            .collect()
    }

    // -------------------------------------------------------------------------
    // Membership
    // -------------------------------------------------------------------------

    /// Smallest suffix (none, then "1", "2", ...) that makes `requested` unique.
    pub fn assign_unique_name(&self, requested: &str) -> String {
        let mut candidate = requested.to_string();
        let mut counter = 1u32;
        while self.player(&candidate).is_some() {
            candidate = format!("{}{}", requested, counter);
            counter += 1;
        }
        candidate
    }

    /// Lowest colour not used by any player, random if the palette is exhausted.
    fn available_colour(&mut self) -> u8 {
        let palette = self.config.palette_size.max(1);
        (1..=palette)
            .find(|c| self.players.iter().all(|p| p.colour != *c))
            .unwrap_or_else(|| 1 + self.rng.next_int(palette as u32) as u8)
    }

    /// Add a player. Snakes spawn inside the spawn margin with a random
    /// direction. The second player marks the match as started.
    pub fn add_player(&mut self, name: &str, role: Option<Role>, now: Instant) {
        let colour = self.available_colour();

        let player = match role {
            Some(Role::Snake) => {
                let head = self.rng.random_cell(
                    self.config.rows,
                    self.config.cols,
                    self.config.spawn_margin,
                );
                let direction = *self
                    .rng
                    .choose(&Direction::ALL)
                    .unwrap_or(&Direction::Right);
                Player::snake(name, colour, head, direction)
            }
            _ => Player::without_body(name, role, colour),
        };

        self.players.push(player);
        self.push_event(GameEvent::PlayerJoined {
            name: name.to_string(),
            role,
            colour,
        });

        if self.players.len() == 2 {
            self.match_started = true;
            self.match_start = Some(now + self.config.start_delay);
            self.remaining_time = None;
        }
    }

    /// Seat a freshly named player: the first one waits, the second one
    /// triggers a fair coin flip for roles, anyone else is turned away.
    /// Once roles are assigned nobody else is seated until the world goes
    /// back to waiting.
    pub fn seat_player(&mut self, name: &str, now: Instant) -> Seat {
        if self.match_started && self.players.is_empty() && !self.is_over() {
            self.abandon();
        }
        if self.is_over() || self.match_started {
            return Seat::Full;
        }

        match self.players.len() {
            0 => {
                self.add_player(name, None, now);
                Seat::Waiting
            }
            1 => {
                let first_role = if self.rng.coin_flip() {
                    Role::Snake
                } else {
                    Role::Controller
                };
                self.pair_with(name, first_role, now)
            }
            _ => Seat::Full,
        }
    }

    /// Pair the waiting player with `name`, giving the waiting player
    /// `first_role` and the newcomer its complement. Both are re-created.
    pub fn pair_with(&mut self, name: &str, first_role: Role, now: Instant) -> Seat {
        if self.players.len() != 1 || self.match_started {
            return Seat::Full;
        }

        let existing = self.players.remove(0);
        self.add_player(&existing.name, Some(first_role), now);
        self.add_player(name, Some(first_role.complement()), now);

        let (snake, controller) = match first_role {
            Role::Snake => (existing.name, name.to_string()),
            Role::Controller => (name.to_string(), existing.name),
        };
        Seat::Paired { snake, controller }
    }

    /// Return a started match that lost both players to waiting. Walls,
    /// wall history and the speed-up are cleared for the next pair.
    pub fn abandon(&mut self) {
        self.match_started = false;
        self.match_start = None;
        self.remaining_time = None;
        self.walls.clear();
        self.wall_spawns.clear();
        self.tick_interval = self.config.base_tick;
        self.push_event(GameEvent::MatchAbandoned);
    }

    /// Remove a player and their wall history. Vacated roles are resolved
    /// by the next tick.
    pub fn remove_player(&mut self, name: &str) -> Option<Player> {
        let index = self.players.iter().position(|p| p.name == name)?;
        self.wall_spawns.remove(name);
        Some(self.players.remove(index))
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Change a snake's direction unless it reverses the current direction
    /// or the direction of the last move.
    pub fn set_direction(&mut self, name: &str, direction: Direction) -> DirectionOutcome {
        let Some(player) = self.player_mut(name) else {
            return DirectionOutcome::Ignored;
        };
        if player.role != Some(Role::Snake) {
            return DirectionOutcome::Ignored;
        }

        let reverses = |d: Option<Direction>| d.is_some_and(|d| d.is_opposite(direction));
        if reverses(player.direction) || reverses(player.heading) {
            return DirectionOutcome::Ignored;
        }

        player.direction = Some(direction);
        DirectionOutcome::Updated
    }

    /// Nudge the food one cell, clamped to the playable interior.
    pub fn move_food(&mut self, direction: Direction) -> Cell {
        self.food = self
            .food
            .step(direction)
            .clamp_interior(self.config.rows, self.config.cols);
        self.food
    }

    /// Draw food cells until one is not in `occupied`.
    pub fn relocate_food(&mut self, occupied: &HashSet<Cell>) -> Cell {
        let margin = 1 + self.config.food_margin;
        loop {
            let cell = self.rng.random_cell(self.config.rows, self.config.cols, margin);
            if !occupied.contains(&cell) {
                self.food = cell;
                return cell;
            }
        }
    }

    /// Re-sort players by descending score, keeping ties in current order.
    pub fn sort_leaderboard(&mut self) {
        self.players.sort_by(|a, b| b.score.cmp(&a.score));
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Queue a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

// =============================================================================
// TESTS
// =============================================================================
