use std::collections::VecDeque;

use crate::grid::Grid;
use crate::types::Position;

/// Breadth-first shortest path from `start` to `target` over passable cells.
///
/// The returned path begins with `start` and ends with `target`. It is empty
/// when the target cannot be reached. Neighbors are expanded left, right, up,
/// down, so among equally short paths the result is always the same one.
pub fn shortest_path(grid: &Grid, start: Position, target: Position) -> Vec<Position> {
    if !grid.in_bounds(start) || !grid.in_bounds(target) {
        return Vec::new();
    }

    let width = grid.width() as usize;
    let cell_count = width * grid.height() as usize;
    let index_of = |pos: Position| pos.y as usize * width + pos.x as usize;

    let mut visited = vec![false; cell_count];
    let mut parent: Vec<Option<Position>> = vec![None; cell_count];
    let mut queue = VecDeque::new();
    visited[index_of(start)] = true;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if current == target {
            let mut path = vec![current];
            let mut cursor = current;
            while let Some(prev) = parent[index_of(cursor)] {
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            return path;
        }

        for next in grid.neighbors(current) {
            let idx = index_of(next);
            if visited[idx] || !grid.is_passable(next) {
                continue;
            }
            visited[idx] = true;
            parent[idx] = Some(current);
            queue.push_back(next);
        }
    }

    Vec::new()
}

/// First step from `start` toward `target`, or `start` itself when no step exists.
pub fn next_step(grid: &Grid, start: Position, target: Position) -> Position {
    shortest_path(grid, start, target)
        .get(1)
        .copied()
        .unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::LevelTemplate;

    fn grid_of(rows: &[&str]) -> Grid {
        LevelTemplate::from_ascii("t", rows)
            .expect("valid layout")
            .instantiate()
            .maze
    }

    #[test]
    fn finds_shortest_route_around_walls() {
        let grid = grid_of(&[
            "S....", //
            "###.#", //
            "E....",
        ]);
        let path = shortest_path(&grid, Position::new(0, 0), Position::new(0, 2));
        assert_eq!(path.first(), Some(&Position::new(0, 0)));
        assert_eq!(path.last(), Some(&Position::new(0, 2)));
        assert_eq!(path.len(), 9);
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1);
            assert!(grid.is_passable(pair[1]));
        }
    }

    #[test]
    fn passes_through_exit_cells() {
        let grid = grid_of(&["S.E.."]);
        let path = shortest_path(&grid, Position::new(0, 0), Position::new(4, 0));
        assert_eq!(path.len(), 5);
        assert!(path.contains(&Position::new(2, 0)));
    }

    #[test]
    fn unreachable_target_yields_empty_path_and_no_step() {
        let grid = grid_of(&[
            "S.#..", //
            "..#.E",
        ]);
        let from = Position::new(0, 0);
        let to = Position::new(4, 1);
        assert!(shortest_path(&grid, from, to).is_empty());
        assert_eq!(next_step(&grid, from, to), from);
    }

    #[test]
    fn start_equal_to_target_is_a_trivial_path() {
        let grid = grid_of(&["S.E"]);
        let here = Position::new(1, 0);
        assert_eq!(shortest_path(&grid, here, here), vec![here]);
        assert_eq!(next_step(&grid, here, here), here);
    }

    #[test]
    fn equal_length_routes_prefer_horizontal_expansion_first() {
        let grid = grid_of(&[
            "S..", //
            "...", //
            "..E",
        ]);
        let step = next_step(&grid, Position::new(1, 1), Position::new(2, 2));
        assert_eq!(step, Position::new(2, 1));
    }
}
