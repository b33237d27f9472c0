//! Game Events
//!
//! Events generated during simulation and command handling. The world
//! queues them; the session drains and logs them after each mutation.

use crate::core::grid::Cell;
use crate::game::state::Role;

/// Why a snake was removed from the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EliminationCause {
    /// Head entered an active wall cell
    Wall,
    /// Head left the playable interior
    Boundary,
    /// Head entered another snake's body
    Snake,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// A player was added to the world
    PlayerJoined {
        name: String,
        role: Option<Role>,
        colour: u8,
    },

    /// A player left the world (disconnect)
    PlayerLeft { name: String },

    /// Snake ate the food
    FoodEaten {
        name: String,
        new_score: u32,
        food: Cell,
    },

    /// Snake was eliminated
    SnakeEliminated {
        name: String,
        cause: EliminationCause,
    },

    /// Controller spawned a wall
    WallSpawned { name: String, cells: usize },

    /// Controller hit the wall budget
    WallRejected { name: String },

    /// Match ended
    MatchEnded {
        winner: Option<String>,
        reason: String,
    },

    /// Every player left a started match before it finished
    MatchAbandoned,
}
