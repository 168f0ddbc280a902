use tracing::info;

use crate::grid::Grid;
use crate::levels::MazeRepository;
use crate::roster::Roster;
use crate::types::{Audience, ClientId, GameStateView, Outbound, Position, ServerEvent};

mod commands;
mod movement;
mod simulation;

pub use self::movement::{MoveResolution, Mover};
pub use self::simulation::{detect_collision, Collision, PursuitOutcome};

/// The live game state. Exactly one exists per server.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSnapshot {
    pub maze: Grid,
    pub player_position: Position,
    pub exit_position: Position,
    pub pursuer_positions: Vec<Position>,
    pub level_index: usize,
    pub players: Roster,
}

/// Single writer of the snapshot. Transport code calls one operation at a
/// time and then drains the outbox to deliver what it produced.
#[derive(Clone, Debug)]
pub struct GameEngine {
    levels: MazeRepository,
    state: GameSnapshot,
    /// Player position when pursuers last stepped; used for swap detection.
    previous_player_position: Position,
    outbox: Vec<Outbound>,
}

impl GameEngine {
    pub fn new(levels: MazeRepository) -> Self {
        let layout = levels.first().instantiate();
        let state = GameSnapshot {
            maze: layout.maze,
            player_position: layout.start,
            exit_position: layout.exit,
            pursuer_positions: layout.pursuers,
            level_index: 0,
            players: Roster::new(),
        };
        Self {
            levels,
            previous_player_position: state.player_position,
            state,
            outbox: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameSnapshot {
        &self.state
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn view(&self) -> GameStateView {
        GameStateView {
            maze: self.state.maze.clone(),
            player_position: self.state.player_position,
            pursuer_positions: self.state.pursuer_positions.clone(),
            level_index: self.state.level_index,
        }
    }

    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    /// Replaces the maze-derived fields with a fresh copy of `level_index`.
    /// Roles are left untouched. Returns `false` for an unknown level.
    fn rehydrate(&mut self, level_index: usize) -> bool {
        let Some(template) = self.levels.get(level_index) else {
            return false;
        };
        let layout = template.instantiate();
        self.state.maze = layout.maze;
        self.state.player_position = layout.start;
        self.state.exit_position = layout.exit;
        self.state.pursuer_positions = layout.pursuers;
        self.state.level_index = level_index;
        self.previous_player_position = layout.start;
        true
    }

    /// Restarts the current level and tells everyone.
    fn reset_level(&mut self) {
        let level_index = self.state.level_index;
        if self.rehydrate(level_index) {
            info!(level = level_index, "level reset");
            self.broadcast_new_maze();
        }
    }

    fn broadcast_state(&mut self) {
        let view = self.view();
        self.push(Audience::All, ServerEvent::GameState(view));
    }

    fn broadcast_new_maze(&mut self) {
        let maze = self.state.maze.clone();
        self.push(Audience::All, ServerEvent::InitMaze { maze });
        self.broadcast_state();
    }

    fn send_to(&mut self, client_id: &str, event: ServerEvent) {
        let client_id: ClientId = client_id.to_string();
        self.push(Audience::Client(client_id), event);
    }

    fn push(&mut self, audience: Audience, event: ServerEvent) {
        self.outbox.push(Outbound { audience, event });
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::engine_from;
    use super::*;
    use crate::types::Cell;

    const LEVEL: &[&str] = &[
        "#######", //
        "#S...P#", //
        "#.###.#", //
        "#....M#", //
        "#######",
    ];

    #[test]
    fn new_engine_starts_on_first_level() {
        let engine = engine_from(&[LEVEL, LEVEL]);
        let state = engine.state();
        assert_eq!(state.level_index, 0);
        assert_eq!(state.player_position, Position::new(1, 1));
        assert_eq!(state.exit_position, Position::new(5, 3));
        assert_eq!(state.pursuer_positions, vec![Position::new(5, 1)]);
        assert_eq!(engine.level_count(), 2);
        assert!(engine.outbox.is_empty());
    }

    #[test]
    fn rehydrating_twice_yields_identical_snapshots() {
        let mut engine = engine_from(&[LEVEL]);
        engine.state.maze.set(Position::new(2, 1), Cell::Wall);
        engine.state.player_position = Position::new(3, 3);

        assert!(engine.rehydrate(0));
        let first = engine.state.clone();
        assert!(engine.rehydrate(0));
        assert_eq!(engine.state, first);
        assert_eq!(first.maze.get(Position::new(2, 1)), Some(Cell::Empty));
    }

    #[test]
    fn rehydrate_keeps_roles_and_rejects_unknown_levels() {
        let mut engine = engine_from(&[LEVEL]);
        engine.join_as("c1", "X");
        assert!(!engine.rehydrate(3));
        assert!(engine.rehydrate(0));
        assert_eq!(
            engine.state.players.role_of("c1"),
            Some(crate::types::Role::Runner)
        );
    }

    #[test]
    fn view_serializes_wire_field_names() {
        let engine = engine_from(&[LEVEL]);
        let value = serde_json::to_value(ServerEvent::GameState(engine.view()))
            .expect("state should serialize");
        assert_eq!(value["type"], "game-state");
        assert_eq!(value["levelIndex"], 0);
        assert_eq!(value["playerPosition"], serde_json::json!({"x": 1, "y": 1}));
        assert_eq!(value["pursuerPositions"][0], serde_json::json!({"x": 5, "y": 1}));
        assert_eq!(value["maze"][3][5], 3);
    }
}
