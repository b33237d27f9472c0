//! Player Commands
//!
//! Inbound intents after the wire layer has parsed them. Commands are only
//! applied to the world while the session lock is held.

use serde::{Deserialize, Serialize};

use crate::core::grid::Direction;

// =============================================================================
// CONTROLLER ACTIONS
// =============================================================================

/// Something the controller can do to the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerAction {
    /// Move the food one row up
    FoodUp,
    /// Move the food one row down
    FoodDown,
    /// Move the food one column left
    FoodLeft,
    /// Move the food one column right
    FoodRight,
    /// Drop a wall in front of the snake
    SpawnWall,
}

impl ControllerAction {
    /// Direction the food moves in, `None` for non-food actions.
    pub fn food_direction(self) -> Option<Direction> {
        match self {
            ControllerAction::FoodUp => Some(Direction::Up),
            ControllerAction::FoodDown => Some(Direction::Down),
            ControllerAction::FoodLeft => Some(Direction::Left),
            ControllerAction::FoodRight => Some(Direction::Right),
            ControllerAction::SpawnWall => None,
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// A player intent addressed to the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Ask for a seat under a requested display name
    Join { name: String },

    /// Steer the snake with a `w`/`a`/`s`/`d` key
    SetDirection { name: String, key: String },

    /// Controller-only board manipulation
    ControllerAction {
        name: String,
        action: ControllerAction,
    },
}

impl Command {
    /// Name of the player issuing the command.
    pub fn player(&self) -> &str {
        match self {
            Command::Join { name }
            | Command::SetDirection { name, .. }
            | Command::ControllerAction { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_names() {
        let parsed: ControllerAction = serde_json::from_str("\"spawn_wall\"").unwrap();
        assert_eq!(parsed, ControllerAction::SpawnWall);
        let parsed: ControllerAction = serde_json::from_str("\"food_left\"").unwrap();
        assert_eq!(parsed, ControllerAction::FoodLeft);
        assert!(serde_json::from_str::<ControllerAction>("\"teleport\"").is_err());

        assert_eq!(
            serde_json::to_string(&ControllerAction::FoodUp).unwrap(),
            "\"food_up\""
        );
    }

    #[test]
    fn test_food_direction() {
        assert_eq!(ControllerAction::FoodUp.food_direction(), Some(Direction::Up));
        assert_eq!(ControllerAction::FoodDown.food_direction(), Some(Direction::Down));
        assert_eq!(ControllerAction::FoodLeft.food_direction(), Some(Direction::Left));
        assert_eq!(ControllerAction::FoodRight.food_direction(), Some(Direction::Right));
        assert_eq!(ControllerAction::SpawnWall.food_direction(), None);
    }

    #[test]
    fn test_command_player() {
        let command = Command::SetDirection {
            name: "alice".to_string(),
            key: "w".to_string(),
        };
        assert_eq!(command.player(), "alice");
    }
}
