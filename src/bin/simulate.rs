use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use maze_chase_server::constants::{DEFAULT_LEVEL_COUNT, DRIFT_EVERY_TICKS, PURSUIT_EVERY_TICKS};
use maze_chase_server::engine::GameEngine;
use maze_chase_server::levels::MazeRepository;
use maze_chase_server::types::{Direction, ServerEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

const RUNNER_ID: &str = "sim_runner";
const MOVE_DIRECTIONS: [Direction; 4] = [
    Direction::Left,
    Direction::Right,
    Direction::Up,
    Direction::Down,
];

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless maze chase run with a random runner")]
struct Cli {
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Base ticks to simulate
    #[arg(long, default_value_t = 60_000)]
    ticks: u64,
    /// Base ticks between runner moves
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    move_every: u64,
    #[arg(long, default_value = "mazes")]
    maze_dir: PathBuf,
    #[arg(long, default_value_t = DEFAULT_LEVEL_COUNT)]
    level_count: usize,
}

#[derive(Clone, Copy, Debug)]
struct Scenario {
    seed: u64,
    ticks: u64,
    move_every: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationSummary {
    seed: u64,
    ticks: u64,
    moves: u64,
    resets: u64,
    levels_cleared: u64,
    game_clears: u64,
    final_level_index: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let levels = MazeRepository::load_dir(&cli.maze_dir, cli.level_count)
        .with_context(|| format!("failed to load levels from {}", cli.maze_dir.display()))?;

    let scenario = Scenario {
        seed: cli.seed,
        ticks: cli.ticks,
        move_every: cli.move_every,
    };
    info!(seed = scenario.seed, ticks = scenario.ticks, "simulation started");
    let summary = run(GameEngine::new(levels), scenario);

    println!(
        "{}",
        serde_json::to_string(&summary).context("failed to serialize summary")?
    );
    Ok(())
}

fn run(mut engine: GameEngine, scenario: Scenario) -> SimulationSummary {
    let mut rng = StdRng::seed_from_u64(scenario.seed);
    let mut summary = SimulationSummary {
        seed: scenario.seed,
        ticks: scenario.ticks,
        ..SimulationSummary::default()
    };

    engine.connect(RUNNER_ID);
    engine.join_as(RUNNER_ID, "X");
    engine.drain_outbox();

    for tick in 1..=scenario.ticks {
        if tick % scenario.move_every == 0 {
            let direction = MOVE_DIRECTIONS[rng.random_range(0..MOVE_DIRECTIONS.len())];
            summary.moves += 1;
            step(&mut engine, &mut summary, |engine| {
                engine.handle_move(RUNNER_ID, direction)
            });
        }
        if tick % DRIFT_EVERY_TICKS == 0 {
            step(&mut engine, &mut summary, |engine| {
                engine.drift_exit();
            });
        }
        if tick % PURSUIT_EVERY_TICKS == 0 {
            step(&mut engine, &mut summary, |engine| {
                engine.advance_pursuers();
            });
        }
    }

    summary.final_level_index = engine.state().level_index;
    summary
}

/// Runs one engine operation and classifies what it broadcast.
fn step(
    engine: &mut GameEngine,
    summary: &mut SimulationSummary,
    operation: impl FnOnce(&mut GameEngine),
) {
    let level_before = engine.state().level_index;
    operation(engine);
    let events = engine.drain_outbox();

    if events
        .iter()
        .any(|out| matches!(out.event, ServerEvent::GameClear))
    {
        summary.levels_cleared += 1;
        summary.game_clears += 1;
        return;
    }
    if events
        .iter()
        .any(|out| matches!(out.event, ServerEvent::InitMaze { .. }))
    {
        if engine.state().level_index == level_before + 1 {
            summary.levels_cleared += 1;
        } else {
            summary.resets += 1;
        }
    }
}
