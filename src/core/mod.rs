//! Core primitives.
//!
//! Grid geometry and the seedable RNG that every random choice in a match
//! is drawn from.

pub mod grid;
pub mod rng;

// Re-export core types
pub use grid::{Cell, Direction};
pub use rng::DeterministicRng;
