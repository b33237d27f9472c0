//! Network Layer
//!
//! WebSocket server, wire protocol and the session that serializes every
//! access to the world. Clock reads happen here, never in `game/`.

pub mod protocol;
pub mod server;
pub mod session;

pub use protocol::{ClientMessage, ProtocolError, ServerMessage, Snapshot, StatusMessage};
pub use server::{GameServer, GameServerError, ServerConfig};
pub use session::{CommandOutcome, MatchSession, SessionError, SharedSession};
