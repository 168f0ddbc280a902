use serde::Serialize;

use crate::types::{Cell, Direction, Position};

/// Neighbor enumeration order. Tie-breaks in exit drift and BFS expansion depend on it.
pub const NEIGHBOR_ORDER: [Direction; 4] = [
    Direction::Left,
    Direction::Right,
    Direction::Up,
    Direction::Down,
];

/// Rectangular maze grid. Dimensions are fixed for the lifetime of a value;
/// a level reset replaces the whole grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// Returns `None` when the rows are empty or ragged.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Option<Self> {
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Some(Self { rows })
    }

    pub fn width(&self) -> i32 {
        self.rows.first().map(|row| row.len()).unwrap_or(0) as i32
    }

    pub fn height(&self) -> i32 {
        self.rows.len() as i32
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width() && pos.y < self.height()
    }

    pub fn get(&self, pos: Position) -> Option<Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.rows
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
            .copied()
    }

    /// Writes `cell` at `pos`. Out-of-bounds writes are dropped and return `false`.
    pub fn set(&mut self, pos: Position, cell: Cell) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        match self
            .rows
            .get_mut(pos.y as usize)
            .and_then(|row| row.get_mut(pos.x as usize))
        {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    pub fn is_passable(&self, pos: Position) -> bool {
        self.get(pos).map(Cell::is_passable).unwrap_or(false)
    }

    /// In-bounds orthogonal neighbors in left, right, up, down order.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        NEIGHBOR_ORDER
            .into_iter()
            .map(move |dir| pos.offset(dir))
            .filter(move |next| self.in_bounds(*next))
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> Grid {
        Grid::from_rows(vec![
            vec![Cell::Wall, Cell::Empty, Cell::StaticExit],
            vec![Cell::Empty, Cell::MobileExit, Cell::Wall],
        ])
        .expect("rectangular rows")
    }

    #[test]
    fn ragged_or_empty_rows_are_rejected() {
        assert!(Grid::from_rows(Vec::new()).is_none());
        assert!(Grid::from_rows(vec![Vec::new()]).is_none());
        assert!(Grid::from_rows(vec![vec![Cell::Empty], vec![Cell::Empty, Cell::Wall]]).is_none());
    }

    #[test]
    fn passability_treats_exits_as_open_and_bounds_as_closed() {
        let grid = small_grid();
        assert!(!grid.is_passable(Position::new(0, 0)));
        assert!(grid.is_passable(Position::new(1, 0)));
        assert!(grid.is_passable(Position::new(2, 0)));
        assert!(grid.is_passable(Position::new(1, 1)));
        assert!(!grid.is_passable(Position::new(-1, 0)));
        assert!(!grid.is_passable(Position::new(0, 2)));
    }

    #[test]
    fn neighbors_follow_left_right_up_down_order() {
        let grid = Grid::from_rows(vec![vec![Cell::Empty; 3]; 3]).expect("square grid");
        let around: Vec<Position> = grid.neighbors(Position::new(1, 1)).collect();
        assert_eq!(
            around,
            vec![
                Position::new(0, 1),
                Position::new(2, 1),
                Position::new(1, 0),
                Position::new(1, 2),
            ]
        );
        let corner: Vec<Position> = grid.neighbors(Position::new(0, 0)).collect();
        assert_eq!(corner, vec![Position::new(1, 0), Position::new(0, 1)]);
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut grid = small_grid();
        assert!(!grid.set(Position::new(3, 0), Cell::Empty));
        assert!(grid.set(Position::new(0, 0), Cell::Empty));
        assert_eq!(grid.get(Position::new(0, 0)), Some(Cell::Empty));
    }

    #[test]
    fn serializes_as_nested_integer_rows() {
        let value = serde_json::to_value(small_grid()).expect("grid should serialize");
        assert_eq!(value, serde_json::json!([[1, 0, 2], [0, 3, 1]]));
    }
}
