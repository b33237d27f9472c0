//! Match Rules
//!
//! Every tunable constant of a match. Clients depend on these values
//! (board size, tick pacing, win score), so the defaults are the protocol.

use std::time::Duration;

/// Configuration for match simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Board rows (wire `dimensions[0]`)
    pub rows: i32,
    /// Board columns (wire `dimensions[1]`)
    pub cols: i32,
    /// Grace period after both roles are assigned before anything moves
    pub start_delay: Duration,
    /// Score the snake needs to win
    pub score_to_win: u32,
    /// Time the snake has to reach `score_to_win`
    pub time_limit: Duration,
    /// Tick interval at match start
    pub base_tick: Duration,
    /// Interval reduction per food eaten
    pub speed_step: Duration,
    /// Interval floor
    pub min_tick: Duration,
    /// Walls a controller may spawn per cooldown window
    pub wall_limit: usize,
    /// Rolling window for `wall_limit`
    pub wall_cooldown: Duration,
    /// How long a wall stays on the board
    pub wall_lifetime: Duration,
    /// Shortest wall, in cells
    pub wall_min_length: i32,
    /// Longest wall, in cells
    pub wall_max_length: i32,
    /// How far ahead of the snake's head a wall is centered
    pub wall_distance: i32,
    /// Clearance from the border for a snake's spawn cell
    pub spawn_margin: i32,
    /// Clearance inside the playable interior for food placement
    pub food_margin: i32,
    /// Number of distinct player colours
    pub palette_size: u8,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rows: 30,
            cols: 50,
            start_delay: Duration::from_secs(9),
            score_to_win: 5,
            time_limit: Duration::from_secs(60),
            base_tick: Duration::from_millis(300),
            speed_step: Duration::from_millis(15),
            min_tick: Duration::from_millis(80),
            wall_limit: 4,
            wall_cooldown: Duration::from_secs(60),
            wall_lifetime: Duration::from_secs(8),
            wall_min_length: 5,
            wall_max_length: 7,
            wall_distance: 5,
            spawn_margin: 5,
            food_margin: 3,
            palette_size: 7,
        }
    }
}

impl MatchConfig {
    /// Tick interval after `foods_eaten` speed-ups: `max(min_tick, base_tick - step * n)`.
    pub fn tick_interval_after(&self, foods_eaten: u32) -> Duration {
        self.base_tick
            .saturating_sub(self.speed_step.saturating_mul(foods_eaten))
            .max(self.min_tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_constants() {
        let config = MatchConfig::default();
        assert_eq!((config.rows, config.cols), (30, 50));
        assert_eq!(config.score_to_win, 5);
        assert_eq!(config.wall_limit, 4);
        assert_eq!(config.palette_size, 7);
    }

    #[test]
    fn test_tick_interval_progression() {
        let config = MatchConfig::default();
        assert_eq!(config.tick_interval_after(0), Duration::from_millis(300));
        assert_eq!(config.tick_interval_after(1), Duration::from_millis(285));
        assert_eq!(config.tick_interval_after(14), Duration::from_millis(90));
        assert_eq!(config.tick_interval_after(15), Duration::from_millis(80));
        assert_eq!(config.tick_interval_after(100), Duration::from_millis(80));
    }

    proptest! {
        #[test]
        fn prop_tick_interval_matches_formula(n in 0u32..10_000) {
            let config = MatchConfig::default();
            let expected_ms = (300i64 - 15 * n as i64).max(80) as u64;
            prop_assert_eq!(config.tick_interval_after(n), Duration::from_millis(expected_ms));
        }
    }
}
