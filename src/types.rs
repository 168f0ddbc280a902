use std::fmt;

use serde::{Serialize, Serializer};

use crate::constants::{CELL_EMPTY, CELL_MOBILE_EXIT, CELL_STATIC_EXIT, CELL_WALL};
use crate::grid::Grid;

pub type ClientId = String;

/// Value of a live maze cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Wall,
    StaticExit,
    MobileExit,
}

impl Cell {
    pub fn code(self) -> u8 {
        match self {
            Self::Empty => CELL_EMPTY,
            Self::Wall => CELL_WALL,
            Self::StaticExit => CELL_STATIC_EXIT,
            Self::MobileExit => CELL_MOBILE_EXIT,
        }
    }

    pub fn is_passable(self) -> bool {
        !matches!(self, Self::Wall)
    }

    pub fn is_exit(self) -> bool {
        matches!(self, Self::StaticExit | Self::MobileExit)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn offset(self, dir: Direction) -> Position {
        match dir {
            Direction::Up => Position::new(self.x, self.y - 1),
            Direction::Down => Position::new(self.x, self.y + 1),
            Direction::Left => Position::new(self.x - 1, self.y),
            Direction::Right => Position::new(self.x + 1, self.y),
            Direction::None => self,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

pub const SPECTATOR_SLOTS: u8 = 4;

/// Exclusive player slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Steers the player through the maze.
    Runner,
    /// Steers the first pursuer.
    Chaser,
    Admin,
    Spectator(u8),
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "X" => Some(Self::Runner),
            "Y" => Some(Self::Chaser),
            "admin" => Some(Self::Admin),
            other => {
                let slot = other.strip_prefix("spectator")?.parse::<u8>().ok()?;
                (1..=SPECTATOR_SLOTS)
                    .contains(&slot)
                    .then_some(Self::Spectator(slot))
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runner => f.write_str("X"),
            Self::Chaser => f.write_str("Y"),
            Self::Admin => f.write_str("admin"),
            Self::Spectator(slot) => write!(f, "spectator{slot}"),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameStateView {
    pub maze: Grid,
    #[serde(rename = "playerPosition")]
    pub player_position: Position,
    #[serde(rename = "pursuerPositions")]
    pub pursuer_positions: Vec<Position>,
    #[serde(rename = "levelIndex")]
    pub level_index: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    GameState(GameStateView),
    InitMaze { maze: Grid },
    RoleAssigned { role: Role },
    RoleTaken { role: Role },
    GameClear,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Audience {
    All,
    Client(ClientId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Outbound {
    pub audience: Audience,
    pub event: ServerEvent,
}
