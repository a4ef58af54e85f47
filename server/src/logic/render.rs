use minesweeper_common::{models, protocol::BoardState};

use super::{Game, GameStatus};
use crate::data::{Cell, RevealedState};

fn render_cell(cell: &Cell, status: GameStatus) -> models::Cell {
    match (cell.revealed, status) {
        (RevealedState::Revealed, _) if cell.mine => models::Cell::Mine,
        (RevealedState::Revealed, _) => models::Cell::Revealed {
            adjacent: cell.adjacent,
        },
        (RevealedState::Flagged, _) => models::Cell::Flagged,
        // Mines are only disclosed once the game is over.
        (RevealedState::Hidden, GameStatus::Lost) if cell.mine => models::Cell::Mine,
        (RevealedState::Hidden, GameStatus::Won) if cell.mine => models::Cell::Flagged,
        (RevealedState::Hidden, _) => models::Cell::Hidden,
    }
}

impl Game {
    /// Externally visible state of the game.
    pub fn snapshot(&self) -> BoardState {
        BoardState {
            board: self
                .board
                .rows()
                .map(|row| {
                    row.iter()
                        .map(|cell| render_cell(cell, self.status))
                        .collect()
                })
                .collect(),
            game_over: self.status.is_finished(),
            won: self.status == GameStatus::Won,
        }
    }
}

#[cfg(test)]
mod tests {
    use minesweeper_common::models::{Cell as Marker, Pos};
    use serde_json::json;

    use crate::{data::Board, logic::Game};

    fn game(height: usize, width: usize, mines: &[(usize, usize)]) -> Game {
        let mines: Vec<Pos> = mines.iter().map(|&(r, c)| Pos::new(r, c)).collect();
        Game::new(Board::with_mines(height, width, &mines).unwrap())
    }

    #[test]
    fn fresh_game_is_fully_masked() {
        let game = game(2, 3, &[(0, 0), (1, 2)]);

        assert_eq!(
            serde_json::to_value(game.snapshot()).unwrap(),
            json!({
                "board": [[null, null, null], [null, null, null]],
                "game_over": false,
                "won": false
            })
        );
    }

    #[test]
    fn in_progress_game_never_leaks_mines() {
        let mut game = game(3, 3, &[(0, 0), (2, 2)]);
        game.reveal(Pos::new(0, 2)).unwrap();
        game.toggle_flag(Pos::new(2, 2)).unwrap();

        let state = game.snapshot();

        assert!(!state.game_over);
        assert_eq!(state.board[0][0], Marker::Hidden);
        assert_eq!(state.board[2][2], Marker::Flagged);
        assert!(state.board.iter().flatten().all(|cell| *cell != Marker::Mine));
    }

    #[test]
    fn loss_discloses_mines_but_keeps_flags() {
        let mut game = game(2, 2, &[(0, 0), (1, 1)]);
        game.toggle_flag(Pos::new(1, 1)).unwrap();
        game.reveal(Pos::new(0, 0)).unwrap();

        let state = game.snapshot();

        assert!(state.game_over);
        assert!(!state.won);
        assert_eq!(state.board[0][0], Marker::Mine);
        assert_eq!(state.board[1][1], Marker::Flagged);
        assert_eq!(state.board[0][1], Marker::Hidden);
    }

    #[test]
    fn win_renders_remaining_mines_as_flags() {
        let mut game = game(3, 3, &[(0, 0)]);
        game.reveal(Pos::new(2, 2)).unwrap();

        assert_eq!(
            serde_json::to_value(game.snapshot()).unwrap(),
            json!({
                "board": [["F", 1, 0], [1, 1, 0], [0, 0, 0]],
                "game_over": true,
                "won": true
            })
        );
    }
}
