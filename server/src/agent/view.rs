use minesweeper_common::{
    models::{Cell, Offset, Pos},
    protocol::BoardState,
};

use crate::data::neighbors_of;

/// The part of a game an agent may look at: the same markers a client
/// receives, so hidden mines are never visible, plus the board's
/// neighborhood mask.
#[derive(Debug, Clone)]
pub struct BoardView {
    width: usize,
    height: usize,
    mask: Vec<Offset>,
    cells: Vec<Cell>,
}

impl BoardView {
    pub fn from_state(state: &BoardState, mask: &[Offset]) -> Self {
        let height = state.board.len();
        let width = state.board.first().map_or(0, Vec::len);
        Self {
            width,
            height,
            mask: mask.to_vec(),
            cells: state.board.iter().flatten().copied().collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell(&self, pos: Pos) -> Option<Cell> {
        (pos.row < self.height && pos.col < self.width)
            .then(|| self.cells[pos.row * self.width + pos.col])
    }

    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        neighbors_of(pos, self.width, self.height, &self.mask)
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |col| Pos { row, col }))
    }

    pub fn hidden(&self) -> impl Iterator<Item = Pos> + '_ {
        self.positions()
            .filter(|&pos| self.cell(pos) == Some(Cell::Hidden))
    }

    pub fn has_revealed(&self) -> bool {
        self.cells
            .iter()
            .any(|cell| matches!(cell, Cell::Revealed { .. }))
    }
}
