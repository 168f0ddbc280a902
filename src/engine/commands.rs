use tracing::{debug, info};

use super::*;
use crate::constants::WALL_RESET_MAX_LEVEL;
use crate::roster::ClaimOutcome;
use crate::types::{Cell, Direction, Role};

/// Result of judging a resolved move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MoveVerdict {
    WallReset,
    ContactReset,
    ExitReached,
    Settled,
}

type MoveStage = fn(&GameEngine, &MoveResolution) -> Option<MoveVerdict>;

/// Move checks in evaluation order; the first verdict wins.
///
/// The resolver has already committed a legal move when these run, so the
/// exit stage reads the player's committed cell, not `resolution.target`.
/// Both that and the wall cutoff level are relied on by clients and pinned
/// by tests.
const MOVE_STAGES: [MoveStage; 3] = [wall_stage, contact_stage, exit_stage];

fn wall_stage(engine: &GameEngine, resolution: &MoveResolution) -> Option<MoveVerdict> {
    let hit_wall = !resolution.is_valid
        && engine.state.maze.get(resolution.target) == Some(Cell::Wall);
    (engine.state.level_index <= WALL_RESET_MAX_LEVEL && hit_wall).then_some(MoveVerdict::WallReset)
}

fn contact_stage(engine: &GameEngine, resolution: &MoveResolution) -> Option<MoveVerdict> {
    let contact = match resolution.mover {
        Mover::Player => engine
            .state
            .pursuer_positions
            .iter()
            .any(|pos| *pos == resolution.target),
        Mover::Pursuer(_) => engine.state.player_position == resolution.target,
    };
    contact.then_some(MoveVerdict::ContactReset)
}

fn exit_stage(engine: &GameEngine, _resolution: &MoveResolution) -> Option<MoveVerdict> {
    engine
        .state
        .maze
        .get(engine.state.player_position)
        .is_some_and(Cell::is_exit)
        .then_some(MoveVerdict::ExitReached)
}

impl GameEngine {
    /// Queues the full state and the grid for a newly connected client.
    pub fn connect(&mut self, client_id: &str) {
        let view = self.view();
        self.send_to(client_id, ServerEvent::GameState(view));
        let maze = self.state.maze.clone();
        self.send_to(client_id, ServerEvent::InitMaze { maze });
    }

    pub fn disconnect(&mut self, client_id: &str) {
        if let Some(role) = self.state.players.release(client_id) {
            info!(client = client_id, %role, "role released on disconnect");
        }
    }

    pub fn join_as(&mut self, client_id: &str, requested: &str) {
        let Some(role) = Role::parse(requested) else {
            debug!(client = client_id, requested, "ignoring unknown role");
            return;
        };
        match self.state.players.claim(client_id, role) {
            ClaimOutcome::Assigned => {
                info!(client = client_id, %role, "role assigned");
                self.send_to(client_id, ServerEvent::RoleAssigned { role });
            }
            ClaimOutcome::Taken => {
                info!(client = client_id, %role, "role already taken");
                self.send_to(client_id, ServerEvent::RoleTaken { role });
            }
        }
    }

    /// Releases whatever role the client holds; the named role is informational.
    pub fn leave_role(&mut self, client_id: &str, named: Option<&str>) {
        if let Some(role) = self.state.players.release(client_id) {
            info!(client = client_id, %role, named, "role left");
        }
    }

    pub fn handle_move(&mut self, client_id: &str, dir: Direction) {
        let Some(role) = self.state.players.role_of(client_id) else {
            debug!(client = client_id, "ignoring move from client without role");
            return;
        };
        let Some(resolution) = self.resolve_move(role, dir) else {
            debug!(client = client_id, %role, "ignoring move from role that steers nothing");
            return;
        };

        let verdict = MOVE_STAGES
            .iter()
            .find_map(|stage| stage(self, &resolution))
            .unwrap_or(MoveVerdict::Settled);

        match verdict {
            MoveVerdict::WallReset => {
                info!(level = self.state.level_index, target = %resolution.target, "wall hit");
                self.reset_level();
            }
            MoveVerdict::ContactReset => {
                info!(level = self.state.level_index, target = %resolution.target, "player and pursuer met");
                self.reset_level();
            }
            MoveVerdict::ExitReached => self.complete_level(),
            MoveVerdict::Settled => self.broadcast_state(),
        }
    }

    /// Jumps to `level_index` when the client holds the admin role and the
    /// index names a level. Anything else is ignored.
    pub fn admin_set_maze(&mut self, client_id: &str, level_index: i64) {
        if self.state.players.role_of(client_id) != Some(Role::Admin) {
            debug!(client = client_id, "ignoring level jump from non-admin");
            return;
        }
        let Some(level_index) = usize::try_from(level_index)
            .ok()
            .filter(|idx| *idx < self.levels.len())
        else {
            debug!(client = client_id, level_index, "ignoring out-of-range level jump");
            return;
        };
        if self.rehydrate(level_index) {
            info!(client = client_id, level = level_index, "admin moved to level");
            self.broadcast_new_maze();
        }
    }

    pub fn restart_first_maze(&mut self) {
        if self.rehydrate(0) {
            info!("restarted from the first level");
            self.broadcast_new_maze();
        }
    }

    fn complete_level(&mut self) {
        let next = self.state.level_index + 1;
        if next < self.levels.len() && self.rehydrate(next) {
            info!(level = next, "exit reached, advancing");
            self.broadcast_new_maze();
            return;
        }

        info!("all levels cleared");
        self.push(Audience::All, ServerEvent::GameClear);
        // Clients learn about the fresh first level on their next connect or move.
        self.rehydrate(0);
    }
}
