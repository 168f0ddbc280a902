use super::*;
use crate::types::{Direction, Role};

/// Piece steered by a role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mover {
    Player,
    Pursuer(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveResolution {
    pub mover: Mover,
    pub is_valid: bool,
    pub target: Position,
}

impl GameEngine {
    /// Computes the target cell for `role` moving in `dir` and commits the move
    /// when it is legal. Roles that steer nothing resolve to `None`.
    pub(super) fn resolve_move(&mut self, role: Role, dir: Direction) -> Option<MoveResolution> {
        let mover = match role {
            Role::Runner => Mover::Player,
            Role::Chaser if !self.state.pursuer_positions.is_empty() => Mover::Pursuer(0),
            _ => return None,
        };
        let from = self.position_of(mover)?;
        let target = from.offset(dir);
        let is_valid = self.state.maze.is_passable(target);
        if is_valid {
            self.place(mover, target);
        }
        Some(MoveResolution {
            mover,
            is_valid,
            target,
        })
    }

    fn position_of(&self, mover: Mover) -> Option<Position> {
        match mover {
            Mover::Player => Some(self.state.player_position),
            Mover::Pursuer(idx) => self.state.pursuer_positions.get(idx).copied(),
        }
    }

    fn place(&mut self, mover: Mover, pos: Position) {
        match mover {
            Mover::Player => self.state.player_position = pos,
            Mover::Pursuer(idx) => {
                if let Some(slot) = self.state.pursuer_positions.get_mut(idx) {
                    *slot = pos;
                }
            }
        }
    }
}
