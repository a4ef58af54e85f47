use minesweeper_common::{
    models::Pos,
    protocol::{Action, AgentKind, AgentMove, BoardState, Frame},
};
use tracing::{debug, info, instrument, warn};

use crate::{error::GameError, logic::Game};

mod deduction;
mod random;
mod view;

pub use deduction::BasicDeduction;
pub use random::RandomAgent;
pub use view::BoardView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub action: Action,
    pub pos: Pos,
}

impl Move {
    pub const fn reveal(pos: Pos) -> Self {
        Self {
            action: Action::Reveal,
            pos,
        }
    }
}

impl From<Move> for AgentMove {
    fn from(value: Move) -> Self {
        Self {
            action: value.action,
            row: value.pos.row,
            col: value.pos.col,
        }
    }
}

/// A solving strategy. Agents only see what a client would see.
pub trait Agent {
    fn name(&self) -> &'static str;

    /// Moves to apply for one pass, all derived from the same view.
    /// An empty result means the agent has nothing left to play.
    fn compute_moves(&mut self, view: &BoardView) -> Vec<Move>;
}

pub fn build_agent(kind: AgentKind, seed: Option<u64>) -> Box<dyn Agent + Send> {
    match kind {
        AgentKind::BasicDeduction => Box::new(BasicDeduction),
        AgentKind::Random => Box::new(RandomAgent::new(seed)),
    }
}

#[derive(Debug, Clone)]
pub struct AgentRun {
    pub frames: Vec<Frame>,
    pub final_state: BoardState,
}

fn apply(game: &mut Game, step: Move) -> bool {
    let result = match step.action {
        Action::Reveal => game.reveal(step.pos).map(|_| ()),
        // Toggling would undo a flag placed earlier.
        Action::Flag if game.board().cell(step.pos).is_ok_and(|cell| cell.is_flagged()) => {
            return false;
        }
        Action::Flag => game.toggle_flag(step.pos).map(|_| ()),
    };

    match result {
        Ok(()) => true,
        // Earlier moves of the same pass may already have opened the cell.
        Err(GameError::InvalidAction(reason)) => {
            debug!("Skipping agent move at {}: {}", step.pos, reason);
            false
        }
        Err(e) => {
            warn!("Agent produced an unusable move at {}: {}", step.pos, e);
            false
        }
    }
}

/// Lets `agent` play `game` until it ends or no move changes the board,
/// recording one frame per pass.
#[instrument(level = "trace", skip_all, fields(agent = agent.name()))]
pub fn play(game: &mut Game, agent: &mut dyn Agent) -> AgentRun {
    let mut frames = Vec::new();
    let mut state = game.snapshot();

    while !game.is_finished() {
        let view = BoardView::from_state(&state, game.board().mask());
        let moves = agent.compute_moves(&view);
        if moves.is_empty() {
            info!(
                "Agent {} is stuck after {} passes",
                agent.name(),
                frames.len()
            );
            break;
        }

        let applied: Vec<AgentMove> = moves
            .into_iter()
            .filter(|&step| apply(game, step))
            .map(AgentMove::from)
            .collect();

        if applied.is_empty() {
            warn!("Agent {} made no progress, stopping", agent.name());
            break;
        }

        state = game.snapshot();
        debug!(
            "Pass {} applied {} moves, {} cells revealed",
            frames.len() + 1,
            applied.len(),
            game.revealed_count()
        );
        frames.push(Frame {
            action: applied,
            state: state.clone(),
        });
    }

    info!(
        "Agent {} finished after {} passes: {:?}",
        agent.name(),
        frames.len(),
        game.status()
    );
    AgentRun {
        frames,
        final_state: state,
    }
}

#[cfg(test)]
mod tests {
    use minesweeper_common::models::{Cell, GameParams};

    use super::*;
    use crate::{data::Board, logic::GameStatus};

    fn game(height: usize, width: usize, mines: &[(usize, usize)]) -> Game {
        let mines: Vec<Pos> = mines.iter().map(|&(r, c)| Pos::new(r, c)).collect();
        Game::new(Board::with_mines(height, width, &mines).unwrap())
    }

    #[test]
    fn mine_free_board_is_won_in_one_pass() {
        let mut game = game(6, 9, &[]);

        let run = play(&mut game, &mut BasicDeduction);

        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(run.frames.len(), 1);
        assert!(run.final_state.won);
    }

    #[test]
    fn deduction_solves_a_forced_board() {
        // Opening at the center floods every safe cell.
        let mut game = game(5, 5, &[(0, 0)]);

        let run = play(&mut game, &mut BasicDeduction);

        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(run.frames.last().unwrap().state, run.final_state);
        assert_eq!(run.final_state.board[0][0], Cell::Flagged);
    }

    #[test]
    fn flags_are_recorded_before_follow_up_reveals() {
        // The opening floods all but the first three cells of row 0. Only
        // (0, 2) is forced by a number, and flagging it proves (0, 1) safe.
        let mut game = game(5, 5, &[(0, 0), (0, 2)]);

        let run = play(&mut game, &mut BasicDeduction);

        assert_eq!(game.status(), GameStatus::Won);
        let actions: Vec<Vec<AgentMove>> =
            run.frames.iter().map(|frame| frame.action.clone()).collect();
        assert_eq!(
            actions,
            vec![
                vec![AgentMove::from(Move::reveal(Pos::new(2, 2)))],
                vec![AgentMove {
                    action: Action::Flag,
                    row: 0,
                    col: 2
                }],
                vec![AgentMove::from(Move::reveal(Pos::new(0, 1)))],
            ]
        );
    }

    #[test]
    fn stuck_agent_stops_without_guessing() {
        // A 2 with three hidden neighbors forces nothing.
        let mut game = game(2, 2, &[(0, 0), (0, 1)]);
        game.reveal(Pos::new(1, 0)).unwrap();

        let run = play(&mut game, &mut BasicDeduction);

        assert!(run.frames.is_empty());
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(run.final_state, game.snapshot());
    }

    #[test]
    fn finished_game_produces_no_frames() {
        let mut game = game(2, 2, &[(0, 0)]);
        game.reveal(Pos::new(0, 0)).unwrap();

        let run = play(&mut game, &mut BasicDeduction);

        assert!(run.frames.is_empty());
        assert!(run.final_state.game_over);
    }

    #[test]
    fn random_agent_always_terminates() {
        for seed in 0..10 {
            let mut game = Game::generate(&GameParams {
                width: 8,
                height: 8,
                mines: 10,
                seed: Some(seed),
                mask: None,
            })
            .unwrap();
            let mut agent = RandomAgent::new(Some(seed));

            let run = play(&mut game, &mut agent);

            assert!(game.is_finished());
            assert!(run.frames.len() <= 64);
            assert_eq!(run.frames.last().unwrap().state, run.final_state);
        }
    }

    #[test]
    fn seeded_board_replays_identically() {
        let params = GameParams {
            width: 9,
            height: 9,
            mines: 10,
            seed: Some(42),
            mask: None,
        };
        let mut first = Game::generate(&params).unwrap();
        let mut second = Game::generate(&params).unwrap();

        let a = play(&mut first, &mut BasicDeduction);
        let b = play(&mut second, &mut BasicDeduction);

        assert!(!a.frames.is_empty());
        assert_eq!(a.frames, b.frames);
        assert_eq!(a.frames.last().unwrap().state, a.final_state);
    }

    #[test]
    fn deduction_never_loses_after_opening() {
        for seed in 0..25 {
            let mut game = Game::generate(&GameParams {
                width: 10,
                height: 10,
                mines: 12,
                seed: Some(seed),
                mask: None,
            })
            .unwrap();

            let run = play(&mut game, &mut BasicDeduction);

            // Only the unconstrained opening move can hit a mine.
            if game.status() == GameStatus::Lost {
                assert_eq!(run.frames.len(), 1);
            }
        }
    }

    #[test]
    fn deduction_stays_sound_under_custom_mask() {
        // Orthogonal neighbors only; reasoning with the eight-cell ring here
        // would declare mined cells safe.
        for seed in 0..25 {
            let mut game = Game::generate(&GameParams {
                width: 8,
                height: 8,
                mines: 6,
                seed: Some(seed),
                mask: Some(vec![(-1, 0), (1, 0), (0, -1), (0, 1)]),
            })
            .unwrap();

            let run = play(&mut game, &mut BasicDeduction);

            if game.status() == GameStatus::Lost {
                assert_eq!(run.frames.len(), 1);
            }
        }
    }
}
