pub mod config;
pub mod constants;
pub mod engine;
pub mod grid;
pub mod levels;
pub mod pathfinding;
pub mod roster;
pub mod server_protocol;
pub mod types;
