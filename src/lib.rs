//! # Snake Arena Server
//!
//! Authoritative server for a two-player arena: one player steers a snake
//! toward a target score, the other moves the food and drops walls to stop it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SNAKE ARENA SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Grid primitives                           │
//! │  ├── grid.rs     - Cells and cardinal directions             │
//! │  └── rng.rs      - Seedable Xorshift128+ PRNG                │
//! │                                                              │
//! │  game/           - Match logic (no I/O, no clock reads)      │
//! │  ├── config.rs   - Match rules and constants                 │
//! │  ├── state.rs    - World, players, seating, food             │
//! │  ├── walls.rs    - Wall spawning, cooldown, expiry           │
//! │  ├── tick.rs     - Authoritative simulation step             │
//! │  ├── input.rs    - Player commands                           │
//! │  └── events.rs   - Events for logging                        │
//! │                                                              │
//! │  network/        - Networking                                │
//! │  ├── protocol.rs - Wire messages and snapshots               │
//! │  ├── session.rs  - Lock-guarded match coordinator            │
//! │  └── server.rs   - WebSocket server and ticker               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Every random choice in a match is drawn from one seeded
//! [`DeterministicRng`], and every time-dependent game function takes `now`
//! as an argument. Given the same seed, commands and instants, a match plays
//! out identically.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::grid::{Cell, Direction};
pub use crate::core::rng::DeterministicRng;
pub use crate::game::config::MatchConfig;
pub use crate::game::state::{Role, World};
pub use crate::network::server::{GameServer, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
