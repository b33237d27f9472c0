//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every frame is a text frame. The join handshake is the one exception to
//! JSON: the client opens with a name and the server answers with the
//! assigned name as a bare string.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize, Serializer};

use crate::core::grid::{Cell, Direction};
use crate::game::input::{Command, ControllerAction};
use crate::game::state::{Player, Role, World};
use crate::game::walls::{wall_spawns_left, WallView};

/// Name used when a client joins with an empty one.
pub const DEFAULT_NAME: &str = "player";

/// Malformed inbound message. Never fatal to the connection.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Frame is not the JSON we expect.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Object has neither `direction` nor `action`.
    #[error("Message has no direction or action")]
    UnknownMessage,

    /// Direction key other than `w`, `a`, `s`, `d`.
    #[error("Unknown direction key: {0:?}")]
    UnknownDirection(String),

    /// Action name we don't support.
    #[error("Unknown action: {0:?}")]
    UnknownAction(String),
}

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Structured messages sent by a client after the join handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `{"direction": "w"}`; the key is already known to be valid.
    Direction { key: String },

    /// `{"action": "spawn_wall"}`
    Action(ControllerAction),
}

#[derive(Deserialize)]
struct RawClientMessage {
    direction: Option<String>,
    action: Option<String>,
}

#[derive(Deserialize)]
struct JoinRequest {
    username: String,
}

impl ClientMessage {
    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, ProtocolError> {
        let raw: RawClientMessage = serde_json::from_str(s)?;

        match (raw.direction, raw.action) {
            (Some(key), _) => {
                if Direction::from_key(&key).is_some() {
                    Ok(ClientMessage::Direction { key })
                } else {
                    Err(ProtocolError::UnknownDirection(key))
                }
            }
            (None, Some(action)) => {
                serde_json::from_value(serde_json::Value::String(action.clone()))
                    .map(ClientMessage::Action)
                    .map_err(|_| ProtocolError::UnknownAction(action))
            }
            (None, None) => Err(ProtocolError::UnknownMessage),
        }
    }

    /// Attach the sender's name.
    pub fn into_command(self, name: &str) -> Command {
        match self {
            ClientMessage::Direction { key } => Command::SetDirection {
                name: name.to_string(),
                key,
            },
            ClientMessage::Action(action) => Command::ControllerAction {
                name: name.to_string(),
                action,
            },
        }
    }
}

/// Requested name from the first frame: either `{"username": "..."}` or the
/// bare name itself. Whitespace is trimmed; an empty name becomes [`DEFAULT_NAME`].
pub fn parse_join_name(frame: &str) -> String {
    let requested = match serde_json::from_str::<JoinRequest>(frame) {
        Ok(join) => join.username,
        Err(_) => frame.to_string(),
    };

    let trimmed = requested.trim();
    if trimmed.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Lobby and end-of-match notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusMessage {
    /// Roles are not assigned yet.
    Waiting,

    /// Match decided; repeated on every broadcast until disconnect.
    Result { winner: Option<String> },
}

/// Messages sent from server to client on every broadcast.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// `waiting` or `result`
    Status(StatusMessage),

    /// Full board state
    Snapshot(Box<Snapshot>),
}

impl ServerMessage {
    /// The lobby message.
    pub fn waiting() -> Self {
        ServerMessage::Status(StatusMessage::Waiting)
    }

    /// The end-of-match message.
    pub fn result(winner: Option<String>) -> Self {
        ServerMessage::Status(StatusMessage::Result { winner })
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// One player as seen by clients.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    /// Map key on the wire
    #[serde(skip)]
    pub name: String,
    /// `"snake"`, `"controller"` or `null`
    pub role: Option<Role>,
    /// Colour index
    pub colour: u8,
    /// Food eaten
    pub score: u32,
    /// Body cells, head first
    pub segments: Vec<Cell>,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            role: player.role,
            colour: player.colour,
            score: player.score,
            segments: player.segments.iter().copied().collect(),
        }
    }
}

/// Projection of the world broadcast while a match is running.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// `[rows, cols]`
    pub dimensions: [i32; 2],
    /// `[row, col]`
    pub food_pos: Cell,
    /// Name to player, in leaderboard order
    #[serde(serialize_with = "serialize_players")]
    pub players: Vec<PlayerView>,
    /// Whether the match is decided
    pub game_over: bool,
    /// Reason the match ended, empty while it runs
    pub game_over_message: String,
    /// Active walls
    pub walls: Vec<WallView>,
    /// Wall spawns each player has left in the current window
    pub wall_spawns_left: BTreeMap<String, usize>,
    /// Whole seconds left
    pub remaining_time: Option<u64>,
    /// Score the snake needs
    pub score_to_win: u32,
}

fn serialize_players<S: Serializer>(players: &[PlayerView], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(players.iter().map(|p| (&p.name, p)))
}

impl Snapshot {
    /// Project `world` as of `now`.
    pub fn capture(world: &World, now: Instant) -> Self {
        Self {
            dimensions: [world.config.rows, world.config.cols],
            food_pos: world.food,
            players: world.players.iter().map(PlayerView::from).collect(),
            game_over: world.is_over(),
            game_over_message: world
                .outcome
                .as_ref()
                .map(|o| o.reason.clone())
                .unwrap_or_default(),
            walls: world
                .walls
                .iter()
                .filter(|w| w.is_active(now))
                .map(|w| WallView::new(w, now))
                .collect(),
            wall_spawns_left: world
                .players
                .iter()
                .map(|p| (p.name.clone(), wall_spawns_left(world, &p.name, now)))
                .collect(),
            remaining_time: world.remaining_time,
            score_to_win: world.config.score_to_win,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::MatchConfig;
    use crate::game::walls::Wall;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_parse_direction() {
        let msg = ClientMessage::from_json(r#"{"direction": "a"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Direction { key: "a".to_string() });

        assert_eq!(
            msg.into_command("bob"),
            Command::SetDirection {
                name: "bob".to_string(),
                key: "a".to_string()
            }
        );
    }

    #[test]
    fn test_parse_action() {
        let msg = ClientMessage::from_json(r#"{"action": "spawn_wall"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Action(ControllerAction::SpawnWall));

        let msg = ClientMessage::from_json(r#"{"action": "food_down"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Action(ControllerAction::FoodDown));
    }

    #[test]
    fn test_malformed_messages() {
        assert!(matches!(
            ClientMessage::from_json("not json"),
            Err(ProtocolError::InvalidJson(_))
        ));
        assert!(matches!(
            ClientMessage::from_json(r#"{"direction": 3}"#),
            Err(ProtocolError::InvalidJson(_))
        ));
        assert!(matches!(
            ClientMessage::from_json(r#"{"jump": true}"#),
            Err(ProtocolError::UnknownMessage)
        ));
        assert!(matches!(
            ClientMessage::from_json(r#"{"direction": "x"}"#),
            Err(ProtocolError::UnknownDirection(k)) if k == "x"
        ));
        assert!(matches!(
            ClientMessage::from_json(r#"{"action": "nuke"}"#),
            Err(ProtocolError::UnknownAction(a)) if a == "nuke"
        ));
    }

    #[test]
    fn test_join_name_formats() {
        assert_eq!(parse_join_name("alice"), "alice");
        assert_eq!(parse_join_name(r#"{"username": "bob"}"#), "bob");
        assert_eq!(parse_join_name("  carol \n"), "carol");
        assert_eq!(parse_join_name(""), DEFAULT_NAME);
        assert_eq!(parse_join_name(r#"{"username": "  "}"#), DEFAULT_NAME);
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(ServerMessage::waiting().to_json().unwrap(), r#"{"type":"waiting"}"#);
        assert_eq!(
            ServerMessage::result(Some("bob".to_string())).to_json().unwrap(),
            r#"{"type":"result","winner":"bob"}"#
        );
    }

    #[test]
    fn test_snapshot_shape() {
        let now = Instant::now();
        let mut world = World::new(MatchConfig::default(), 42);
        world.seat_player("a", now);
        world.pair_with("b", Role::Snake, now);
        world.food = Cell::new(7, 8);
        world.player_mut("a").unwrap().segments = [Cell::new(10, 11), Cell::new(10, 12)].into();
        world.walls.push(Wall {
            cells: vec![Cell::new(3, 3)],
            expires_at: now + Duration::from_secs(2),
        });
        world.walls.push(Wall {
            cells: vec![Cell::new(4, 4)],
            expires_at: now,
        });
        world.wall_spawns.insert("b".to_string(), vec![now]);

        let snapshot = Snapshot::capture(&world, now);
        let value = serde_json::to_value(ServerMessage::Snapshot(Box::new(snapshot))).unwrap();

        assert_eq!(value["dimensions"], json!([30, 50]));
        assert_eq!(value["food_pos"], json!([7, 8]));
        assert_eq!(value["game_over"], json!(false));
        assert_eq!(value["game_over_message"], json!(""));
        assert_eq!(value["remaining_time"], json!(null));
        assert_eq!(value["score_to_win"], json!(5));
        assert_eq!(value["walls"], json!([{ "cells": [[3, 3]], "expires_in": 2.0 }]));
        assert_eq!(value["wall_spawns_left"], json!({ "a": 4, "b": 3 }));
        assert_eq!(
            value["players"]["a"],
            json!({ "role": "snake", "colour": 1, "score": 0, "segments": [[10, 11], [10, 12]] })
        );
        assert_eq!(
            value["players"]["b"],
            json!({ "role": "controller", "colour": 2, "score": 0, "segments": [] })
        );
        assert!(value.get("type").is_none());
    }

    #[test]
    fn test_players_keep_leaderboard_order() {
        let now = Instant::now();
        let mut world = World::new(MatchConfig::default(), 42);
        world.seat_player("zed", now);
        world.pair_with("amy", Role::Controller, now);
        world.player_mut("amy").unwrap().score = 2;
        world.sort_leaderboard();

        let json = ServerMessage::Snapshot(Box::new(Snapshot::capture(&world, now)))
            .to_json()
            .unwrap();
        let amy = json.find("\"amy\"").unwrap();
        let zed = json.find("\"zed\"").unwrap();
        assert!(amy < zed);
    }
}
