use std::collections::{HashSet, VecDeque};

use minesweeper_common::models::{GameParams, Pos};
use tracing::{debug, info, instrument, warn};

use crate::{
    data::{Board, RevealedState},
    error::{GameError, Result},
};

mod render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Safe cells were opened; the count includes flood-filled cells.
    Revealed(usize),
    HitMine,
    Won,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagOutcome {
    Flagged,
    Unflagged,
}

/// Authoritative state of a single game.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    status: GameStatus,
    revealed: usize,
}

impl Game {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            status: GameStatus::InProgress,
            revealed: 0,
        }
    }

    #[instrument(level = "trace")]
    pub fn generate(params: &GameParams) -> Result<Self> {
        let board = Board::generate(params)?;
        info!(
            "Creating new game: {}x{} with {} mines",
            board.height(),
            board.width(),
            board.mines()
        );
        Ok(Self::new(board))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed
    }

    #[instrument(level = "trace", skip(self), fields(row = pos.row, col = pos.col))]
    pub fn reveal(&mut self, pos: Pos) -> Result<RevealOutcome> {
        let state = self.board.cell(pos)?.revealed;
        self.check_in_progress()?;

        match state {
            RevealedState::Flagged => {
                debug!("Ignoring reveal on flagged cell {}", pos);
                Err(GameError::InvalidAction("cell is flagged"))
            }
            RevealedState::Revealed => {
                debug!("Ignoring reveal on revealed cell {}", pos);
                Err(GameError::InvalidAction("cell is already revealed"))
            }
            RevealedState::Hidden => Ok(self.reveal_hidden(pos)),
        }
    }

    #[instrument(level = "trace", skip(self), fields(row = pos.row, col = pos.col))]
    pub fn toggle_flag(&mut self, pos: Pos) -> Result<FlagOutcome> {
        let cell = self.board.cell_mut(pos)?;
        if self.status.is_finished() {
            debug!("Ignoring flag action on finished game at {}", pos);
            return Err(GameError::InvalidAction("game is over"));
        }

        match cell.revealed {
            RevealedState::Hidden => {
                cell.revealed = RevealedState::Flagged;
                debug!("Cell {} flagged", pos);
                Ok(FlagOutcome::Flagged)
            }
            RevealedState::Flagged => {
                cell.revealed = RevealedState::Hidden;
                debug!("Cell {} unflagged", pos);
                Ok(FlagOutcome::Unflagged)
            }
            RevealedState::Revealed => {
                debug!("Ignoring flag action on revealed cell {}", pos);
                Err(GameError::InvalidAction("cell is already revealed"))
            }
        }
    }

    /// Chord reveal: opens every unflagged hidden neighbor of a revealed
    /// number once the number of flagged neighbors matches it.
    #[instrument(level = "trace", skip(self), fields(row = pos.row, col = pos.col))]
    pub fn mass_reveal(&mut self, pos: Pos) -> Result<RevealOutcome> {
        let cell = self.board.cell(pos)?;
        self.check_in_progress()?;

        if !cell.is_revealed() || cell.adjacent == 0 {
            return Err(GameError::InvalidAction(
                "mass reveal needs a revealed numbered cell",
            ));
        }

        let adjacent = cell.adjacent;
        let mut flagged = 0;
        let mut targets = Vec::new();
        for neighbor in self.board.iter_neighbors(pos) {
            let neighbor_cell = self.board.cell(neighbor)?;
            match neighbor_cell.revealed {
                RevealedState::Flagged => flagged += 1,
                RevealedState::Hidden => targets.push(neighbor),
                RevealedState::Revealed => {}
            }
        }

        if flagged != adjacent {
            debug!(
                "Mass reveal at {} needs {} flags, found {}",
                pos, adjacent, flagged
            );
            return Err(GameError::InvalidAction(
                "flag count does not match the cell's number",
            ));
        }

        if targets.is_empty() {
            return Err(GameError::InvalidAction("no hidden neighbors to reveal"));
        }

        let mut opened = 0;
        for target in targets {
            if self.status.is_finished() {
                break;
            }
            // An earlier flood fill in this loop may already have opened it.
            if !self.board.cell(target)?.is_hidden() {
                continue;
            }
            match self.reveal_hidden(target) {
                RevealOutcome::Revealed(count) => opened += count,
                outcome => return Ok(outcome),
            }
        }

        debug!("Mass reveal at {} opened {} cells", pos, opened);
        Ok(RevealOutcome::Revealed(opened))
    }

    fn reveal_hidden(&mut self, pos: Pos) -> RevealOutcome {
        let Ok(cell) = self.board.cell_mut(pos) else {
            return RevealOutcome::Revealed(0);
        };

        if cell.mine {
            cell.revealed = RevealedState::Revealed;
            self.status = GameStatus::Lost;
            warn!("Mine hit at {} - game over!", pos);
            return RevealOutcome::HitMine;
        }

        let opened = self.flood_fill(pos);
        if self.revealed == self.board.safe_cells() {
            self.status = GameStatus::Won;
            info!("Game won! All {} safe cells revealed.", self.revealed);
            RevealOutcome::Won
        } else {
            debug!("Revealed {} cells, game continues", opened);
            RevealOutcome::Revealed(opened)
        }
    }

    /// Opens `start` and, through zero-count cells, everything connected to
    /// it. Flagged cells are neither opened nor expanded through.
    fn flood_fill(&mut self, start: Pos) -> usize {
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut opened = 0;

        while let Some(pos) = queue.pop_front() {
            let Ok(cell) = self.board.cell_mut(pos) else {
                continue;
            };
            if cell.revealed != RevealedState::Hidden || cell.mine {
                continue;
            }

            cell.revealed = RevealedState::Revealed;
            opened += 1;

            if cell.adjacent == 0 {
                for neighbor in self.board.iter_neighbors(pos) {
                    if visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        self.revealed += opened;
        opened
    }

    fn check_in_progress(&self) -> Result<()> {
        if self.status.is_finished() {
            Err(GameError::InvalidAction("game is over"))
        } else {
            Ok(())
        }
    }
}
