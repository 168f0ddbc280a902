pub const BASE_TICK_MS: u64 = 10;
pub const DRIFT_EVERY_TICKS: u64 = 30;
pub const PURSUIT_EVERY_TICKS: u64 = 70;

pub const DRIFT_INTERVAL_MS: u64 = BASE_TICK_MS * DRIFT_EVERY_TICKS;
pub const PURSUIT_INTERVAL_MS: u64 = BASE_TICK_MS * PURSUIT_EVERY_TICKS;

pub const DEFAULT_LEVEL_COUNT: usize = 10;
pub const DEFAULT_PORT: u16 = 3001;

/// Highest level index on which walking into a wall resets the level.
pub const WALL_RESET_MAX_LEVEL: usize = 6;

pub const CELL_EMPTY: u8 = 0;
pub const CELL_WALL: u8 = 1;
pub const CELL_STATIC_EXIT: u8 = 2;
pub const CELL_MOBILE_EXIT: u8 = 3;
pub const CELL_START: u8 = 4;
pub const CELL_PURSUER_START: u8 = 5;

pub const CLIENT_QUEUE_CAPACITY: usize = 256;
