use std::{fmt, str::FromStr};

use minesweeper_common::{
    models::GameParams,
    protocol::{AgentKind, BoardState, Frame},
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    agent::{self, build_agent},
    error::Result,
    logic::{Game, GameStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn params(self) -> GameParams {
        let (width, height, mines) = match self {
            Difficulty::Easy => (8, 8, 10),
            Difficulty::Medium => (16, 16, 40),
            Difficulty::Hard => (30, 16, 99),
        };
        GameParams {
            width,
            height,
            mines,
            seed: None,
            mask: None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|difficulty| difficulty.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown difficulty {s:?}, expected easy, medium or hard"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeResult {
    pub episode: usize,
    pub passes: usize,
    pub won: bool,
    /// Fraction of safe cells the agent managed to reveal.
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub agent: &'static str,
    pub params: GameParams,
    pub episodes: Vec<EpisodeResult>,
    pub wins: usize,
    pub win_rate: f64,
    pub avg_passes: f64,
    /// Written to a separate file, not part of the summary.
    #[serde(skip)]
    pub replays: Vec<Replay>,
}

/// Every pass of one episode, for offline inspection.
#[derive(Debug, Clone, Serialize)]
pub struct Replay {
    pub episode: usize,
    pub won: bool,
    pub frames: Vec<Frame>,
    #[serde(rename = "final")]
    pub final_state: BoardState,
}

/// Plays `episodes` fresh games with the given agent. With a base seed the
/// boards (and the random agent) are reproducible: episode `n` uses
/// `seed + n`.
#[instrument(level = "trace", skip(params), fields(agent = kind.name()))]
pub fn evaluate_agent(
    kind: AgentKind,
    episodes: usize,
    params: &GameParams,
    seed: Option<u64>,
) -> Result<EvaluationReport> {
    let mut results = Vec::with_capacity(episodes);
    let mut replays = Vec::with_capacity(episodes);

    for episode in 1..=episodes {
        let episode_seed = seed.map(|seed| seed.wrapping_add(episode as u64));
        let mut game = Game::generate(&GameParams {
            seed: episode_seed,
            ..params.clone()
        })?;
        let mut agent = build_agent(kind, episode_seed);

        let run = agent::play(&mut game, agent.as_mut());
        let won = game.status() == GameStatus::Won;
        let score = game.revealed_count() as f64 / game.board().safe_cells() as f64;
        debug!(
            "Episode {}: {} in {} passes (score: {:.2})",
            episode,
            if won { "WIN" } else { "loss" },
            run.frames.len(),
            score
        );

        results.push(EpisodeResult {
            episode,
            passes: run.frames.len(),
            won,
            score,
        });
        replays.push(Replay {
            episode,
            won,
            frames: run.frames,
            final_state: run.final_state,
        });
    }

    let wins = results.iter().filter(|result| result.won).count();
    let total_passes: usize = results.iter().map(|result| result.passes).sum();
    let (win_rate, avg_passes) = if episodes == 0 {
        (0.0, 0.0)
    } else {
        (
            wins as f64 / episodes as f64,
            total_passes as f64 / episodes as f64,
        )
    };

    info!(
        "{} - Win rate: {:.2}%, Avg passes: {:.1}",
        kind.name(),
        win_rate * 100.0,
        avg_passes
    );

    Ok(EvaluationReport {
        agent: kind.name(),
        params: params.clone(),
        episodes: results,
        wins,
        win_rate,
        avg_passes,
        replays,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_presets_match_classic_boards() {
        assert_eq!(Difficulty::Easy.params().mines, 10);
        assert_eq!(Difficulty::Medium.params().width, 16);
        let hard = Difficulty::Hard.params();
        assert_eq!((hard.width, hard.height, hard.mines), (30, 16, 99));
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Medium".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn mine_free_boards_are_always_won() {
        let params = GameParams {
            width: 6,
            height: 6,
            mines: 0,
            seed: None,
            mask: None,
        };

        let report = evaluate_agent(AgentKind::BasicDeduction, 5, &params, Some(1)).unwrap();

        assert_eq!(report.wins, 5);
        assert_eq!(report.win_rate, 1.0);
        assert!(report.episodes.iter().all(|episode| episode.score == 1.0));
    }

    #[test]
    fn seeded_evaluation_is_reproducible() {
        let params = Difficulty::Easy.params();

        let a = evaluate_agent(AgentKind::Random, 4, &params, Some(99)).unwrap();
        let b = evaluate_agent(AgentKind::Random, 4, &params, Some(99)).unwrap();

        let summary = |report: &EvaluationReport| {
            report
                .episodes
                .iter()
                .map(|episode| (episode.passes, episode.won))
                .collect::<Vec<_>>()
        };
        assert_eq!(summary(&a), summary(&b));
        assert_eq!(a.episodes.len(), 4);
    }

    #[test]
    fn zero_episodes_yield_empty_report() {
        let report =
            evaluate_agent(AgentKind::BasicDeduction, 0, &Difficulty::Easy.params(), None)
                .unwrap();

        assert!(report.episodes.is_empty());
        assert_eq!(report.win_rate, 0.0);
    }

    #[test]
    fn replays_end_with_the_final_board() {
        let params = Difficulty::Easy.params();

        let report = evaluate_agent(AgentKind::BasicDeduction, 3, &params, Some(5)).unwrap();

        assert_eq!(report.replays.len(), 3);
        for (replay, episode) in report.replays.iter().zip(&report.episodes) {
            assert_eq!(replay.episode, episode.episode);
            assert_eq!(replay.won, episode.won);
            assert_eq!(replay.frames.len(), episode.passes);
            if let Some(last) = replay.frames.last() {
                assert_eq!(last.state, replay.final_state);
            }
        }
        let summary = serde_json::to_value(&report).unwrap();
        assert!(summary.get("replays").is_none());
    }
}
