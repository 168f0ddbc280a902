use tracing::{debug, info};

use super::*;
use crate::pathfinding::next_step;
use crate::types::Cell;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collision {
    /// A pursuer stepped onto the player's cell.
    Occupancy { pursuer: usize },
    /// A pursuer and the player crossed through each other.
    Swap { pursuer: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PursuitOutcome {
    /// The level has no pursuers.
    Idle,
    Advanced,
    Collided(Collision),
}

/// Checks planned pursuer steps against the player. All occupancy checks run
/// before any swap check.
pub fn detect_collision(
    player_now: Position,
    player_before: Position,
    pursuers_before: &[Position],
    pursuers_after: &[Position],
) -> Option<Collision> {
    if let Some(pursuer) = pursuers_after.iter().position(|pos| *pos == player_now) {
        return Some(Collision::Occupancy { pursuer });
    }
    pursuers_before
        .iter()
        .zip(pursuers_after)
        .position(|(before, after)| *before == player_now && *after == player_before)
        .map(|pursuer| Collision::Swap { pursuer })
}

impl GameEngine {
    /// Moves a mobile exit one cell away from the player when a strictly
    /// farther empty neighbor exists. Returns whether the exit moved.
    pub fn drift_exit(&mut self) -> bool {
        let exit = self.state.exit_position;
        if self.state.maze.get(exit) != Some(Cell::MobileExit) {
            return false;
        }

        let player = self.state.player_position;
        let mut best = exit;
        let mut best_distance = exit.manhattan(player);
        for candidate in self.state.maze.neighbors(exit) {
            if self.state.maze.get(candidate) != Some(Cell::Empty) {
                continue;
            }
            let distance = candidate.manhattan(player);
            if distance > best_distance {
                best = candidate;
                best_distance = distance;
            }
        }

        if best == exit {
            return false;
        }
        self.state.maze.set(exit, Cell::Empty);
        self.state.maze.set(best, Cell::MobileExit);
        self.state.exit_position = best;
        debug!(from = %exit, to = %best, "exit drifted");
        self.broadcast_state();
        true
    }

    /// Steps every pursuer one cell along its shortest path to the player.
    /// All steps are planned from the same pre-move positions; a collision
    /// resets the level instead of committing them.
    pub fn advance_pursuers(&mut self) -> PursuitOutcome {
        if self.state.pursuer_positions.is_empty() {
            return PursuitOutcome::Idle;
        }

        let player = self.state.player_position;
        let planned: Vec<Position> = self
            .state
            .pursuer_positions
            .iter()
            .map(|pursuer| next_step(&self.state.maze, *pursuer, player))
            .collect();

        if let Some(collision) = detect_collision(
            player,
            self.previous_player_position,
            &self.state.pursuer_positions,
            &planned,
        ) {
            info!(?collision, level = self.state.level_index, "pursuer caught the player");
            self.reset_level();
            return PursuitOutcome::Collided(collision);
        }

        self.state.pursuer_positions = planned;
        self.previous_player_position = player;
        self.broadcast_state();
        PursuitOutcome::Advanced
    }
}
