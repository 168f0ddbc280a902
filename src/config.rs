use std::path::PathBuf;
use std::time::Duration;

use clap::builder::TypedValueParser;
use clap::Parser;

use crate::constants::{DEFAULT_LEVEL_COUNT, DEFAULT_PORT, DRIFT_INTERVAL_MS, PURSUIT_INTERVAL_MS};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Authoritative maze chase game server")]
pub struct ServerConfig {
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Directory holding maze1.json .. mazeN.json
    #[arg(long, env = "MAZE_DIR", default_value = "mazes")]
    pub maze_dir: PathBuf,
    #[arg(long, env = "LEVEL_COUNT", default_value_t = DEFAULT_LEVEL_COUNT,
          value_parser = clap::value_parser!(u16).range(1..).map(usize::from))]
    pub level_count: usize,
    /// Exit drift period in milliseconds
    #[arg(long, env = "DRIFT_MS", default_value_t = DRIFT_INTERVAL_MS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub drift_ms: u64,
    /// Pursuit period in milliseconds
    #[arg(long, env = "PURSUIT_MS", default_value_t = PURSUIT_INTERVAL_MS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub pursuit_ms: u64,
    /// Static client build to serve at `/`
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn drift_interval(&self) -> Duration {
        Duration::from_millis(self.drift_ms)
    }

    pub fn pursuit_interval(&self) -> Duration {
        Duration::from_millis(self.pursuit_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_the_thirty_to_seventy_cadence() {
        let config = ServerConfig::try_parse_from(["server"]).expect("defaults parse");
        assert_eq!(config.level_count, DEFAULT_LEVEL_COUNT);
        assert_eq!(config.drift_interval(), Duration::from_millis(300));
        assert_eq!(config.pursuit_interval(), Duration::from_millis(700));
        assert_eq!(config.maze_dir, PathBuf::from("mazes"));
    }

    #[test]
    fn zero_periods_and_level_counts_are_rejected() {
        assert!(ServerConfig::try_parse_from(["server", "--drift-ms", "0"]).is_err());
        assert!(ServerConfig::try_parse_from(["server", "--pursuit-ms", "0"]).is_err());
        assert!(ServerConfig::try_parse_from(["server", "--level-count", "0"]).is_err());
        let config = ServerConfig::try_parse_from(["server", "--level-count", "3"])
            .expect("positive level count parses");
        assert_eq!(config.level_count, 3);
    }
}
