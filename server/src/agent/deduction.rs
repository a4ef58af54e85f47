use std::collections::BTreeSet;

use minesweeper_common::{
    models::{Cell, Pos},
    protocol::Action,
};

use super::{Agent, BoardView, Move};

/// Single-cell deduction: a revealed number whose flags already account for
/// all its mines makes the other hidden neighbors safe; one whose hidden
/// neighbors exactly make up the missing mines makes them all mines.
/// Never guesses once anything is revealed.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicDeduction;

impl BasicDeduction {
    fn opening_move(view: &BoardView) -> Option<Move> {
        let center = Pos::new(view.height() / 2, view.width() / 2);
        let start = if view.cell(center) == Some(Cell::Hidden) {
            center
        } else {
            view.hidden().next()?
        };
        Some(Move::reveal(start))
    }
}

impl Agent for BasicDeduction {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn compute_moves(&mut self, view: &BoardView) -> Vec<Move> {
        if !view.has_revealed() {
            return Self::opening_move(view).into_iter().collect();
        }

        let mut safe = BTreeSet::new();
        let mut mines = BTreeSet::new();

        for pos in view.positions() {
            let Some(Cell::Revealed { adjacent }) = view.cell(pos) else {
                continue;
            };
            if adjacent == 0 {
                continue;
            }

            let mut flagged = 0;
            let mut unknown = Vec::new();
            for neighbor in view.neighbors(pos) {
                match view.cell(neighbor) {
                    Some(Cell::Flagged) => flagged += 1,
                    Some(Cell::Hidden) => unknown.push(neighbor),
                    _ => {}
                }
            }

            if unknown.is_empty() {
                continue;
            }

            if flagged == adjacent {
                safe.extend(unknown);
            } else if adjacent.checked_sub(flagged) == Some(unknown.len() as u8) {
                mines.extend(unknown);
            }
        }

        if !safe.is_empty() {
            safe.into_iter().map(Move::reveal).collect()
        } else {
            mines
                .into_iter()
                .map(|pos| Move {
                    action: Action::Flag,
                    pos,
                })
                .collect()
        }
    }
}
