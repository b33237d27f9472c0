//! Game Logic Module
//!
//! All match simulation code. No I/O, no clock reads: callers pass `now`.
//!
//! ## Module Structure
//!
//! - `config`: Match rules and constants
//! - `state`: World, players, seating and food
//! - `walls`: Controller wall spawning, cooldown and expiry
//! - `tick`: Authoritative simulation step and win evaluation
//! - `input`: Commands and controller actions
//! - `events`: Game events for logging

pub mod config;
pub mod events;
pub mod input;
pub mod state;
pub mod tick;
pub mod walls;

// Re-export key types
pub use config::MatchConfig;
pub use events::{EliminationCause, GameEvent};
pub use input::{Command, ControllerAction};
pub use state::{DirectionOutcome, MatchOutcome, Player, Role, Seat, World};
pub use tick::{tick, TickResult};
pub use walls::{Wall, WallSpawnOutcome};
