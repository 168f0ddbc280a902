use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::constants::{
    CELL_EMPTY, CELL_MOBILE_EXIT, CELL_PURSUER_START, CELL_START, CELL_STATIC_EXIT, CELL_WALL,
};
use crate::grid::Grid;
use crate::types::{Cell, Position};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level {name} is not a JSON array of integer rows: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("level {name} has unknown cell {code} at ({x}, {y})")]
    UnknownCell {
        name: String,
        code: i64,
        x: usize,
        y: usize,
    },
    #[error("level {name} is empty or not rectangular")]
    NotRectangular { name: String },
    #[error("level {name} has {count} start cells, expected exactly one")]
    StartCount { name: String, count: usize },
    #[error("level {name} has no exit cell")]
    MissingExit { name: String },
    #[error("no levels were provided")]
    Empty,
}

/// Cell of a level template. Start markers only exist in templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Wall,
    StaticExit,
    MobileExit,
    Start,
    PursuerStart,
}

impl Tile {
    pub fn from_code(code: i64) -> Option<Self> {
        let code = u8::try_from(code).ok()?;
        match code {
            CELL_EMPTY => Some(Self::Empty),
            CELL_WALL => Some(Self::Wall),
            CELL_STATIC_EXIT => Some(Self::StaticExit),
            CELL_MOBILE_EXIT => Some(Self::MobileExit),
            CELL_START => Some(Self::Start),
            CELL_PURSUER_START => Some(Self::PursuerStart),
            _ => None,
        }
    }

    /// `.` empty, `#` wall, `E` static exit, `M` mobile exit, `S` start, `P` pursuer start.
    pub fn from_ascii(ch: char) -> Option<Self> {
        match ch {
            '.' => Some(Self::Empty),
            '#' => Some(Self::Wall),
            'E' => Some(Self::StaticExit),
            'M' => Some(Self::MobileExit),
            'S' => Some(Self::Start),
            'P' => Some(Self::PursuerStart),
            _ => None,
        }
    }

    pub fn to_cell(self) -> Cell {
        match self {
            Self::Wall => Cell::Wall,
            Self::StaticExit => Cell::StaticExit,
            Self::MobileExit => Cell::MobileExit,
            Self::Empty | Self::Start | Self::PursuerStart => Cell::Empty,
        }
    }
}

/// Fresh copy of a level, ready to be installed into the live snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelLayout {
    pub maze: Grid,
    pub start: Position,
    pub exit: Position,
    pub pursuers: Vec<Position>,
}

/// Immutable level definition.
#[derive(Clone, Debug)]
pub struct LevelTemplate {
    name: String,
    base: Grid,
    start: Position,
    exit: Position,
    pursuers: Vec<Position>,
}

impl LevelTemplate {
    pub fn new(name: impl Into<String>, tiles: Vec<Vec<Tile>>) -> Result<Self, LevelError> {
        let name = name.into();
        let cells = tiles
            .iter()
            .map(|row| row.iter().map(|tile| tile.to_cell()).collect())
            .collect();
        let Some(base) = Grid::from_rows(cells) else {
            return Err(LevelError::NotRectangular { name });
        };

        let Some(start) = find_start(&tiles) else {
            let count = find_tiles(&tiles, Tile::Start).len();
            return Err(LevelError::StartCount { name, count });
        };
        let Some(exit) = find_exit(&base) else {
            return Err(LevelError::MissingExit { name });
        };
        let pursuers = find_pursuer_starts(&tiles);

        Ok(Self {
            name,
            base,
            start,
            exit,
            pursuers,
        })
    }

    pub fn from_codes(name: impl Into<String>, rows: Vec<Vec<i64>>) -> Result<Self, LevelError> {
        let name = name.into();
        let mut tiles = Vec::with_capacity(rows.len());
        for (y, row) in rows.into_iter().enumerate() {
            let mut out = Vec::with_capacity(row.len());
            for (x, code) in row.into_iter().enumerate() {
                let Some(tile) = Tile::from_code(code) else {
                    return Err(LevelError::UnknownCell { name, code, x, y });
                };
                out.push(tile);
            }
            tiles.push(out);
        }
        Self::new(name, tiles)
    }

    pub fn from_ascii(name: impl Into<String>, rows: &[&str]) -> Result<Self, LevelError> {
        let name = name.into();
        let mut tiles = Vec::with_capacity(rows.len());
        for (y, row) in rows.iter().enumerate() {
            let mut out = Vec::with_capacity(row.len());
            for (x, ch) in row.chars().enumerate() {
                let Some(tile) = Tile::from_ascii(ch) else {
                    return Err(LevelError::UnknownCell {
                        name,
                        code: ch as i64,
                        x,
                        y,
                    });
                };
                out.push(tile);
            }
            tiles.push(out);
        }
        Self::new(name, tiles)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deep copy of the template. The returned grid shares nothing with the template.
    pub fn instantiate(&self) -> LevelLayout {
        LevelLayout {
            maze: self.base.clone(),
            start: self.start,
            exit: self.exit,
            pursuers: self.pursuers.clone(),
        }
    }
}

/// The player start cell, or `None` unless the layout has exactly one.
pub fn find_start(tiles: &[Vec<Tile>]) -> Option<Position> {
    match find_tiles(tiles, Tile::Start).as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// First exit cell (static or mobile) in row-major order.
pub fn find_exit(grid: &Grid) -> Option<Position> {
    grid.rows().iter().enumerate().find_map(|(y, row)| {
        row.iter()
            .position(|cell| cell.is_exit())
            .map(|x| Position::new(x as i32, y as i32))
    })
}

/// Every pursuer start in row-major order. The order is the pursuer identity.
pub fn find_pursuer_starts(tiles: &[Vec<Tile>]) -> Vec<Position> {
    find_tiles(tiles, Tile::PursuerStart)
}

fn find_tiles(tiles: &[Vec<Tile>], kind: Tile) -> Vec<Position> {
    let mut out = Vec::new();
    for (y, row) in tiles.iter().enumerate() {
        for (x, tile) in row.iter().enumerate() {
            if *tile == kind {
                out.push(Position::new(x as i32, y as i32));
            }
        }
    }
    out
}

/// Ordered, fixed set of level templates loaded once at startup.
#[derive(Clone, Debug)]
pub struct MazeRepository {
    levels: Vec<LevelTemplate>,
}

impl MazeRepository {
    pub fn from_templates(levels: Vec<LevelTemplate>) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::Empty);
        }
        Ok(Self { levels })
    }

    /// Loads `maze1.json` through `maze{count}.json` from `dir`.
    pub fn load_dir(dir: &Path, count: usize) -> Result<Self, LevelError> {
        let mut levels = Vec::with_capacity(count);
        for number in 1..=count {
            let path = dir.join(format!("maze{number}.json"));
            let text = fs::read_to_string(&path).map_err(|source| LevelError::Io {
                path: path.clone(),
                source,
            })?;
            let name = format!("maze{number}");
            let rows: Vec<Vec<i64>> =
                serde_json::from_str(&text).map_err(|source| LevelError::Json {
                    name: name.clone(),
                    source,
                })?;
            let template = LevelTemplate::from_codes(name, rows)?;
            debug!(
                level = template.name(),
                pursuers = template.pursuers.len(),
                "loaded level"
            );
            levels.push(template);
        }
        Self::from_templates(levels)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LevelTemplate> {
        self.levels.get(index)
    }

    pub fn first(&self) -> &LevelTemplate {
        &self.levels[0]
    }
}
