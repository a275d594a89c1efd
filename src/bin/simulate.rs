use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;
use maze_chase_server::constants::START_LIVES;
use maze_chase_server::engine::GameState;
use maze_chase_server::session::{GameSession, ReportSink};
use maze_chase_server::stats_store::StatsStore;
use maze_chase_server::types::{Command, Direction, Phase};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const KEEP_HEADING_PROBABILITY: f64 = 0.75;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = 5)]
    runs: u32,
    #[arg(long, default_value_t = 1)]
    seed: u64,
    #[arg(long, default_value_t = 5_000)]
    max_ticks: u64,
    #[arg(long)]
    stats_out: Option<PathBuf>,
    #[arg(long, default_value = "simulator")]
    user: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    run: u32,
    seed: u64,
    phase: Phase,
    score: u32,
    level: u32,
    lives: u32,
    ticks: u64,
    #[serde(rename = "itemsConsumed")]
    items_consumed: u32,
    #[serde(rename = "powerItemsConsumed")]
    power_items_consumed: u32,
    #[serde(rename = "adversariesEliminated")]
    adversaries_eliminated: u32,
    anomalies: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut has_anomaly = false;

    for run in 0..cli.runs {
        let seed = cli.seed.wrapping_add(run as u64);
        let sink: Option<Box<dyn ReportSink>> = cli
            .stats_out
            .as_ref()
            .map(|path| Box::new(StatsStore::new(path.clone())) as Box<dyn ReportSink>);
        let result = run_autopilot(run, seed, cli.max_ticks, Some(cli.user.clone()), sink);

        for anomaly in &result.anomalies {
            warn!(run, seed, anomaly = %anomaly, "anomaly detected");
        }
        has_anomaly |= !result.anomalies.is_empty();

        match serde_json::to_string(&result) {
            Ok(line) => println!("{line}"),
            Err(error) => warn!(run, %error, "failed to serialize run result"),
        }
    }

    info!(runs = cli.runs, has_anomaly, "simulation finished");
    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_autopilot(
    run: u32,
    seed: u64,
    max_ticks: u64,
    user_id: Option<String>,
    sink: Option<Box<dyn ReportSink>>,
) -> RunResultLine {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut session = GameSession::new(user_id, sink);
    let mut anomalies = Vec::new();
    let mut anomaly_seen = HashSet::new();

    let opening = choose_direction(session.state(), &mut rng);
    session.command(Command::Move(opening));

    let mut ticks = 0u64;
    while ticks < max_ticks {
        match session.phase() {
            Phase::Lost => break,
            Phase::LevelCleared => {
                session.command(Command::Continue);
            }
            _ => {}
        }

        let dir = choose_direction(session.state(), &mut rng);
        session.command(Command::Move(dir));
        let before = session.state().clone();
        session.tick();
        ticks += 1;

        for message in collect_tick_anomalies(&before, session.state()) {
            if anomaly_seen.insert(message.clone()) {
                anomalies.push(message);
            }
        }
    }
    session.stop();

    let state = session.state();
    let stats = session.stats();
    RunResultLine {
        run,
        seed,
        phase: state.phase,
        score: state.score,
        level: state.level,
        lives: state.lives,
        ticks,
        items_consumed: stats.items_consumed,
        power_items_consumed: stats.power_items_consumed,
        adversaries_eliminated: stats.adversaries_eliminated,
        anomalies,
    }
}

/// Keeps the current heading most of the time, otherwise picks any open direction.
fn choose_direction(state: &GameState, rng: &mut StdRng) -> Direction {
    let open: Vec<Direction> = Direction::CARDINALS
        .into_iter()
        .filter(|dir| {
            let (dx, dy) = dir.delta();
            let x = state.grid.wrap_column(state.agent.pos.x + dx);
            state.grid.is_traversable(x, state.agent.pos.y + dy)
        })
        .collect();

    if open.contains(&state.agent.dir) && rng.random_bool(KEEP_HEADING_PROBABILITY) {
        return state.agent.dir;
    }
    if open.is_empty() {
        return Direction::Up;
    }
    open[rng.random_range(0..open.len())]
}

fn collect_tick_anomalies(before: &GameState, after: &GameState) -> Vec<String> {
    let mut anomalies = Vec::new();

    if after.score < before.score {
        anomalies.push(format!(
            "score decreased: {} -> {}",
            before.score, after.score
        ));
    } else if (after.score - before.score) % 10 != 0 {
        anomalies.push(format!(
            "unsupported score delta: {}",
            after.score - before.score
        ));
    }

    if after.lives > START_LIVES || after.lives > before.lives {
        anomalies.push(format!("lives out of range: {}", after.lives));
    }

    let agent = after.agent.pos;
    if !after.grid.is_traversable(agent.x, agent.y) {
        anomalies.push(format!("agent on blocked cell: ({}, {})", agent.x, agent.y));
    }
    for ghost in &after.ghosts {
        if !after.grid.is_traversable(ghost.pos.x, ghost.pos.y) {
            anomalies.push(format!(
                "ghost {} on blocked cell: ({}, {})",
                ghost.id, ghost.pos.x, ghost.pos.y
            ));
        }
    }

    if after.level == before.level
        && after.grid.remaining_collectibles() > before.grid.remaining_collectibles()
    {
        anomalies.push("collectibles reappeared within a level".to_string());
    }
    anomalies
}
