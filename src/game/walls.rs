//! Wall Spawning
//!
//! Controller-placed obstacles. A wall is a short line perpendicular to the
//! snake's direction, centered a few cells ahead of its head. Spawns are
//! rate limited by a rolling window per controller.

use std::time::Instant;

use serde::Serialize;

use crate::core::grid::{Cell, Direction};
use crate::game::events::GameEvent;
use crate::game::state::{Role, World};

/// State of a wall on the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wall {
    /// Cells that survived bounds/occupancy filtering (may be empty)
    pub cells: Vec<Cell>,
    /// When the wall disappears
    pub expires_at: Instant,
}

impl Wall {
    /// Whether the wall still blocks at `now`.
    #[inline]
    pub fn is_active(&self, now: Instant) -> bool {
        self.expires_at > now
    }

    /// Whether `cell` is one of this wall's cells.
    pub fn covers(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }
}

/// Wire view of a wall.
#[derive(Debug, Clone, Serialize)]
pub struct WallView {
    /// Wall cells as `[row, col]`
    pub cells: Vec<Cell>,
    /// Seconds until the wall disappears
    pub expires_in: f64,
}

impl WallView {
    /// Project a wall relative to `now`.
    pub fn new(wall: &Wall, now: Instant) -> Self {
        Self {
            cells: wall.cells.clone(),
            expires_in: wall.expires_at.saturating_duration_since(now).as_secs_f64(),
        }
    }
}

/// Result of a spawn request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WallSpawnOutcome {
    /// Wall placed with this many cells
    Spawned { cells: usize },
    /// Budget for the window is used up
    Rejected,
    /// No snake on the board to aim at
    NoTarget,
}

/// Cells of a `length`-cell line perpendicular to `direction`, centered on `center`.
///
/// Odd lengths are symmetric; even lengths put the extra cell on the negative side.
pub fn wall_line(center: Cell, direction: Direction, length: i32) -> Vec<Cell> {
    let low = -(length / 2);
    let high = length - 1 + low;
    (low..=high)
        .map(|i| {
            if direction.is_vertical() {
                Cell::new(center.row, center.col + i)
            } else {
                Cell::new(center.row + i, center.col)
            }
        })
        .collect()
}

/// Drop spawn timestamps older than the cooldown window.
fn prune_history(world: &mut World, name: &str, now: Instant) -> usize {
    let cooldown = world.config.wall_cooldown;
    let history = world.wall_spawns.entry(name.to_string()).or_default();
    history.retain(|t| now.saturating_duration_since(*t) < cooldown);
    history.len()
}

/// Spawn a wall in front of the snake on behalf of `controller`.
///
/// Rejected spawns leave the world untouched. A wall whose cells were all
/// filtered out is still stored and still consumes a spawn slot.
pub fn spawn_wall(world: &mut World, controller: &str, now: Instant) -> WallSpawnOutcome {
    if prune_history(world, controller, now) >= world.config.wall_limit {
        world.push_event(GameEvent::WallRejected {
            name: controller.to_string(),
        });
        return WallSpawnOutcome::Rejected;
    }

    let Some((head, direction)) = world
        .player_with_role(Role::Snake)
        .and_then(|s| Some((s.head()?, s.direction?)))
    else {
        return WallSpawnOutcome::NoTarget;
    };

    let center = head.offset(direction, world.config.wall_distance);
    let length = world
        .rng
        .next_int_range(world.config.wall_min_length, world.config.wall_max_length);

    let occupied = world.occupied_cells();
    let (rows, cols) = (world.config.rows, world.config.cols);
    let cells: Vec<Cell> = wall_line(center, direction, length)
        .into_iter()
        .filter(|c| c.is_interior(rows, cols) && !occupied.contains(c))
        .collect();
    let count = cells.len();

    world.walls.push(Wall {
        cells,
        expires_at: now + world.config.wall_lifetime,
    });
    world
        .wall_spawns
        .entry(controller.to_string())
        .or_default()
        .push(now);
    world.push_event(GameEvent::WallSpawned {
        name: controller.to_string(),
        cells: count,
    });

    WallSpawnOutcome::Spawned { cells: count }
}

/// Remove walls whose expiry has passed.
pub fn expire_walls(world: &mut World, now: Instant) {
    world.walls.retain(|w| w.is_active(now));
}

/// True if any active wall covers `cell`.
pub fn is_wall_cell(world: &World, cell: Cell, now: Instant) -> bool {
    world
        .walls
        .iter()
        .any(|w| w.is_active(now) && w.covers(cell))
}

/// Spawns `name` may still make in the current window.
pub fn wall_spawns_left(world: &World, name: &str, now: Instant) -> usize {
    let cooldown = world.config.wall_cooldown;
    let recent = world
        .wall_spawns
        .get(name)
        .map(|h| {
            h.iter()
                .filter(|t| now.saturating_duration_since(**t) < cooldown)
                .count()
        })
        .unwrap_or(0);
    world.config.wall_limit.saturating_sub(recent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::MatchConfig;
    use crate::game::state::Player;
    use std::time::Duration;

    fn world_with_snake(head: Cell, direction: Direction) -> World {
        let mut world = World::new(MatchConfig::default(), 42);
        world.players.push(Player::snake("snake", 1, head, direction));
        world
            .players
            .push(Player::without_body("ctrl", Some(Role::Controller), 2));
        world
    }

    #[test]
    fn test_wall_line_lengths() {
        let center = Cell::new(10, 10);
        for length in 5..=7 {
            let line = wall_line(center, Direction::Up, length);
            assert_eq!(line.len(), length as usize);
            assert!(line.contains(&center));
            assert!(line.iter().all(|c| c.row == 10));
        }
        assert_eq!(
            wall_line(center, Direction::Up, 5),
            (8..=12).map(|c| Cell::new(10, c)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_wall_is_perpendicular() {
        let now = Instant::now();

        let mut world = world_with_snake(Cell::new(15, 20), Direction::Right);
        spawn_wall(&mut world, "ctrl", now);
        let wall = &world.walls[0];
        assert!(wall.cells.iter().all(|c| c.col == 25));
        assert!(wall.cells.contains(&Cell::new(15, 25)));

        let mut world = world_with_snake(Cell::new(15, 20), Direction::Up);
        spawn_wall(&mut world, "ctrl", now);
        let wall = &world.walls[0];
        assert!(wall.cells.iter().all(|c| c.row == 10));
        assert!(wall.cells.contains(&Cell::new(10, 20)));
        assert!((5..=7).contains(&wall.cells.len()));
        assert_eq!(wall.expires_at, now + Duration::from_secs(8));
    }

    #[test]
    fn test_wall_cells_filtered_by_bounds_and_bodies() {
        let now = Instant::now();
        // Center lands at (25, 1); only rows inside [1, 28] and col 1 survive
        let mut world = world_with_snake(Cell::new(25, 6), Direction::Left);
        world.players[0].segments.push_back(Cell::new(26, 1));

        spawn_wall(&mut world, "ctrl", now);
        let wall = &world.walls[0];
        assert!(!wall.cells.is_empty());
        assert!(wall.cells.iter().all(|c| c.is_interior(30, 50)));
        assert!(!wall.cells.contains(&Cell::new(26, 1)));
    }

    #[test]
    fn test_empty_wall_consumes_slot() {
        let now = Instant::now();
        // Center lands off-board at row -4
        let mut world = world_with_snake(Cell::new(1, 20), Direction::Up);

        let outcome = spawn_wall(&mut world, "ctrl", now);
        assert_eq!(outcome, WallSpawnOutcome::Spawned { cells: 0 });
        assert_eq!(world.walls.len(), 1);
        assert_eq!(wall_spawns_left(&world, "ctrl", now), 3);
    }

    #[test]
    fn test_wall_limit_and_window() {
        let start = Instant::now();
        let mut world = world_with_snake(Cell::new(15, 20), Direction::Right);

        for i in 0..4 {
            let t = start + Duration::from_secs(i);
            assert!(matches!(
                spawn_wall(&mut world, "ctrl", t),
                WallSpawnOutcome::Spawned { .. }
            ));
        }
        assert_eq!(
            spawn_wall(&mut world, "ctrl", start + Duration::from_secs(30)),
            WallSpawnOutcome::Rejected
        );
        assert_eq!(world.wall_spawns["ctrl"].len(), 4);
        assert_eq!(wall_spawns_left(&world, "ctrl", start + Duration::from_secs(30)), 0);

        // Oldest spawn slides out of the window at exactly 60s
        let later = start + Duration::from_secs(60);
        assert_eq!(wall_spawns_left(&world, "ctrl", later), 1);
        assert!(matches!(
            spawn_wall(&mut world, "ctrl", later),
            WallSpawnOutcome::Spawned { .. }
        ));
        assert_eq!(
            spawn_wall(&mut world, "ctrl", later),
            WallSpawnOutcome::Rejected
        );
    }

    #[test]
    fn test_no_snake_no_wall() {
        let now = Instant::now();
        let mut world = World::new(MatchConfig::default(), 1);
        world
            .players
            .push(Player::without_body("ctrl", Some(Role::Controller), 1));

        assert_eq!(spawn_wall(&mut world, "ctrl", now), WallSpawnOutcome::NoTarget);
        assert!(world.walls.is_empty());
        assert_eq!(wall_spawns_left(&world, "ctrl", now), 4);
    }

    #[test]
    fn test_expiry() {
        let now = Instant::now();
        let mut world = world_with_snake(Cell::new(15, 20), Direction::Right);
        spawn_wall(&mut world, "ctrl", now);
        let cell = world.walls[0].cells[0];

        let just_before = now + Duration::from_millis(7_999);
        assert!(is_wall_cell(&world, cell, just_before));
        let at_expiry = now + Duration::from_secs(8);
        assert!(!is_wall_cell(&world, cell, at_expiry));

        expire_walls(&mut world, just_before);
        assert_eq!(world.walls.len(), 1);
        expire_walls(&mut world, at_expiry);
        assert!(world.walls.is_empty());
    }

    #[test]
    fn test_wall_view() {
        let now = Instant::now();
        let wall = Wall {
            cells: vec![Cell::new(1, 2)],
            expires_at: now + Duration::from_secs(4),
        };
        let view = WallView::new(&wall, now);
        assert_eq!(view.expires_in, 4.0);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["cells"], serde_json::json!([[1, 2]]));
    }
}
