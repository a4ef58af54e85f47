use std::{fs, path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use minesweeper_common::protocol::AgentKind;
use minesweeper_server::evaluation::{Difficulty, evaluate_agent};
use tracing::{error, info};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AgentArg {
    Basic,
    Random,
}

impl From<AgentArg> for AgentKind {
    fn from(value: AgentArg) -> Self {
        match value {
            AgentArg::Basic => AgentKind::BasicDeduction,
            AgentArg::Random => AgentKind::Random,
        }
    }
}

/// Play many games with a solver agent and report how it fares.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Agent to evaluate
    #[arg(short, long, value_enum, default_value_t = AgentArg::Basic)]
    agent: AgentArg,

    /// Games played per difficulty
    #[arg(short, long, default_value_t = 50)]
    episodes: usize,

    /// easy, medium, hard, or all
    #[arg(short, long, default_value = "all")]
    difficulty: String,

    /// Base seed for reproducible boards
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory receiving a JSON summary and replays per difficulty
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let difficulties = if args.difficulty.eq_ignore_ascii_case("all") {
        Difficulty::ALL.to_vec()
    } else {
        vec![args.difficulty.parse::<Difficulty>()?]
    };

    if let Some(dir) = &args.output {
        fs::create_dir_all(dir)?;
    }

    for difficulty in difficulties {
        info!("== Difficulty: {} ==", difficulty);
        let report = evaluate_agent(
            args.agent.into(),
            args.episodes,
            &difficulty.params(),
            args.seed,
        )?;

        println!(
            "{:<6} {:>7}: win rate {:>6.2}%, avg passes {:.1}",
            difficulty,
            report.agent,
            report.win_rate * 100.0,
            report.avg_passes
        );

        if let Some(dir) = &args.output {
            let summary = dir.join(format!("summary_{difficulty}.json"));
            fs::write(&summary, serde_json::to_string_pretty(&report)?)?;
            let replays = dir.join(format!("replays_{difficulty}.json"));
            fs::write(&replays, serde_json::to_string_pretty(&report.replays)?)?;
            info!("Wrote {} and {}", summary.display(), replays.display());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.verbose.tracing_level_filter())
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Evaluation failed: {}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use tracing::level_filters::LevelFilter;

    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("minesweeper-eval").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn verbosity_flags_move_around_warn() {
        assert_eq!(parse(&[]).verbose.tracing_level_filter(), LevelFilter::WARN);
        assert_eq!(parse(&["-v"]).verbose.tracing_level_filter(), LevelFilter::INFO);
        assert_eq!(parse(&["-vv"]).verbose.tracing_level_filter(), LevelFilter::DEBUG);
        assert_eq!(parse(&["-q"]).verbose.tracing_level_filter(), LevelFilter::ERROR);
    }

    #[test]
    fn defaults_cover_every_difficulty() {
        let args = parse(&["--agent", "random", "--seed", "7"]);

        assert_eq!(AgentKind::from(args.agent), AgentKind::Random);
        assert_eq!(args.episodes, 50);
        assert_eq!(args.difficulty, "all");
        assert_eq!(args.seed, Some(7));
        assert!(args.output.is_none());
    }
}
