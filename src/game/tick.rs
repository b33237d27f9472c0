//! Authoritative Simulation Tick
//!
//! One call to [`tick`] is one authoritative step: walls expire, every snake
//! advances one cell, collisions and food are resolved, and the match is
//! checked for a winner. The caller supplies `now`; nothing here reads a clock.

use std::collections::HashSet;
use std::time::Instant;

use crate::core::grid::Cell;
use crate::game::events::{EliminationCause, GameEvent};
use crate::game::state::{MatchOutcome, Role, World};
use crate::game::walls::{expire_walls, is_wall_cell};

/// Snake reached the target score in time.
pub const SNAKE_WON: &str = "Snake WON!";
/// Time limit expired.
pub const OUT_OF_TIME: &str = "You are out of time!";
/// Snake was eliminated or left.
pub const CONTROLLER_WINS: &str = "Controller wins!";
/// Controller left a running match.
pub const CONTROLLER_LEFT: &str = "Controller left!";

/// Result of a tick.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickResult {
    /// Whether snakes moved this tick
    pub stepped: bool,
    /// Snake that ate the food this tick
    pub eater: Option<String>,
    /// Snakes removed this tick
    pub eliminated: Vec<String>,
    /// Whether the match is over after this tick
    pub match_ended: bool,
}

/// Run one simulation tick.
///
/// Does nothing once the match is over or before both roles are assigned.
/// A vacated role is resolved before the movement preconditions
/// (start delay elapsed, a live snake on the board) are checked.
pub fn tick(world: &mut World, now: Instant) -> TickResult {
    let mut result = TickResult::default();

    if world.is_over() {
        result.match_ended = true;
        return result;
    }
    if !world.match_started {
        return result;
    }

    // 1. Vacated roles
    if resolve_vacated_roles(world, &mut result) {
        return result;
    }

    // 2. Movement preconditions
    let Some(match_start) = world.match_start else {
        return result;
    };
    if now < match_start || !world.players.iter().any(|p| p.is_live_snake()) {
        return result;
    }
    result.stepped = true;

    // 3. Walls expire before any hazard check
    expire_walls(world, now);

    // 4. Move every snake
    let eliminated = move_snakes(world, now, &mut result);

    // 5. Food, speed-up and leaderboard
    if let Some(eater) = result.eater.clone() {
        feed(world, &eater);
    }
    world.sort_leaderboard();

    // 6. Remove eliminated snakes
    for (name, cause) in eliminated {
        world.remove_player(&name);
        world.push_event(GameEvent::SnakeEliminated {
            name: name.clone(),
            cause,
        });
        result.eliminated.push(name);
    }

    // 7. Clock
    let elapsed = now.saturating_duration_since(match_start);
    world.remaining_time = Some(world.config.time_limit.saturating_sub(elapsed).as_secs());

    // 8. End conditions
    check_end_conditions(world, &mut result);

    result
}

/// Advance each live snake one cell. Returns the snakes to eliminate.
fn move_snakes(
    world: &mut World,
    now: Instant,
    result: &mut TickResult,
) -> Vec<(String, EliminationCause)> {
    let (rows, cols) = (world.config.rows, world.config.cols);
    let mut eliminated = Vec::new();

    for i in 0..world.players.len() {
        let player = &world.players[i];
        if !player.is_live_snake() {
            continue;
        }
        let (Some(head), Some(old_tail), Some(direction)) =
            (player.head(), player.tail(), player.direction)
        else {
            continue;
        };
        let new_head = head.step(direction);

        // Other snakes plus our own body, minus the tail that moves away this tick
        let mut hazards: HashSet<Cell> = world
            .players
            .iter()
            .enumerate()
            .filter(|(j, p)| *j != i && p.is_live_snake())
            .flat_map(|(_, p)| p.segments.iter().copied())
            .collect();
        hazards.extend(player.segments.iter().take(player.segments.len() - 1).copied());
        hazards.remove(&old_tail);

        let cause = if is_wall_cell(world, new_head, now) {
            Some(EliminationCause::Wall)
        } else if !new_head.is_interior(rows, cols) {
            Some(EliminationCause::Boundary)
        } else if hazards.contains(&new_head) {
            Some(EliminationCause::Snake)
        } else {
            None
        };
        let eats = cause.is_none() && new_head == world.food && result.eater.is_none();

        let player = &mut world.players[i];
        player.segments.push_front(new_head);
        player.heading = Some(direction);

        if let Some(cause) = cause {
            eliminated.push((player.name.clone(), cause));
            continue;
        }

        if eats {
            result.eater = Some(player.name.clone());
        } else {
            player.segments.pop_back();
        }
    }

    eliminated
}

/// Credit the eater, move the food off every body and speed the game up.
fn feed(world: &mut World, eater: &str) {
    let occupied = world.occupied_cells();
    let food = world.relocate_food(&occupied);

    let Some(player) = world.player_mut(eater) else {
        return;
    };
    player.score += 1;
    let new_score = player.score;

    world.tick_interval = world
        .tick_interval
        .saturating_sub(world.config.speed_step)
        .max(world.config.min_tick);

    world.push_event(GameEvent::FoodEaten {
        name: eater.to_string(),
        new_score,
        food,
    });
}

/// Settle a started match whose snake or controller is gone.
fn resolve_vacated_roles(world: &mut World, result: &mut TickResult) -> bool {
    let snake = world.player_with_role(Role::Snake).map(|p| p.name.clone());
    let controller = world
        .player_with_role(Role::Controller)
        .map(|p| p.name.clone());

    match (snake, controller) {
        (Some(_), Some(_)) => false,
        (None, Some(controller)) => {
            end_match(world, Some(controller), CONTROLLER_WINS, result);
            true
        }
        (Some(snake), None) => {
            end_match(world, Some(snake), CONTROLLER_LEFT, result);
            true
        }
        (None, None) => {
            // Nobody left to win; go back to waiting for a pair
            world.abandon();
            true
        }
    }
}

/// Check if match should end. First matching rule wins.
fn check_end_conditions(world: &mut World, result: &mut TickResult) {
    let remaining = world.remaining_time.unwrap_or(0);
    let controller = world
        .player_with_role(Role::Controller)
        .map(|p| p.name.clone());

    // a. Snake reached the score while time remains
    let scorer = world
        .players
        .iter()
        .find(|p| p.role == Some(Role::Snake) && p.score >= world.config.score_to_win)
        .map(|p| p.name.clone());
    if let Some(snake) = scorer.filter(|_| remaining > 0) {
        end_match(world, Some(snake), SNAKE_WON, result);
        return;
    }

    // b. Out of time
    if remaining == 0 {
        end_match(world, controller, OUT_OF_TIME, result);
        return;
    }

    // c. No snake left
    if world.player_with_role(Role::Snake).is_none() {
        end_match(world, controller, CONTROLLER_WINS, result);
    }
}

/// End the match.
fn end_match(world: &mut World, winner: Option<String>, reason: &str, result: &mut TickResult) {
    world.outcome = Some(MatchOutcome {
        winner: winner.clone(),
        reason: reason.to_string(),
    });
    world.push_event(GameEvent::MatchEnded {
        winner,
        reason: reason.to_string(),
    });
    result.match_ended = true;
}
