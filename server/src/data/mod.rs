use std::{cmp::min, collections::HashSet};

use minesweeper_common::models::{GameParams, MOORE_NEIGHBORHOOD, Offset, Pos};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, warn};

use crate::error::{GameError, Result};

/// Largest accepted board edge, in cells.
pub const MAX_DIMENSION: usize = 100;

/// Largest row or column displacement a neighborhood mask may use.
pub const MAX_MASK_REACH: isize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealedState {
    Hidden,
    Flagged,
    Revealed,
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub mine: bool,
    /// Number of mines among the neighbors. Not meaningful for mine cells.
    pub adjacent: u8,
    pub revealed: RevealedState,
}

impl Cell {
    pub fn is_hidden(&self) -> bool {
        self.revealed == RevealedState::Hidden
    }

    pub fn is_flagged(&self) -> bool {
        self.revealed == RevealedState::Flagged
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed == RevealedState::Revealed
    }
}

/// Fixed-size grid of cells. Mine positions never change after construction.
#[derive(Debug, Clone)]
pub struct Board {
    width: usize,
    height: usize,
    mines: usize,
    mask: Vec<Offset>,
    cells: Vec<Cell>,
}

fn validate_params(params: &GameParams) -> Result<usize> {
    if params.width == 0 || params.height == 0 {
        return Err(GameError::InvalidParams(format!(
            "board must have at least one row and column, got {}x{}",
            params.height, params.width
        )));
    }

    if params.width > MAX_DIMENSION || params.height > MAX_DIMENSION {
        return Err(GameError::InvalidParams(format!(
            "board is limited to {MAX_DIMENSION}x{MAX_DIMENSION}, got {}x{}",
            params.height, params.width
        )));
    }

    let max_mines = params.width * params.height - 1;
    if params.mines > max_mines {
        warn!(
            "Requested {} mines on a {}x{} board, clamping to {}",
            params.mines, params.height, params.width, max_mines
        );
    }

    Ok(min(params.mines, max_mines))
}

fn validate_mask(mask: &[Offset]) -> Result<()> {
    if mask.is_empty() {
        return Err(GameError::InvalidParams(
            "neighborhood mask must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for &(dr, dc) in mask {
        if (dr, dc) == (0, 0) {
            return Err(GameError::InvalidParams(
                "neighborhood mask must not contain the cell itself".to_string(),
            ));
        }
        if dr.abs() > MAX_MASK_REACH || dc.abs() > MAX_MASK_REACH {
            return Err(GameError::InvalidParams(format!(
                "mask offset ({dr}, {dc}) reaches further than {MAX_MASK_REACH} cells"
            )));
        }
        if !seen.insert((dr, dc)) {
            return Err(GameError::InvalidParams(format!(
                "mask offset ({dr}, {dc}) is listed twice"
            )));
        }
    }

    Ok(())
}

/// Selection sampling: every cell is a mine with probability
/// `mines_left / cells_left`, giving a uniform layout.
fn generate_mines<R: Rng>(rng: &mut R, length: usize, mines: usize) -> Vec<bool> {
    let mut layout = Vec::with_capacity(length);

    let mut mines_left = mines;
    for cells_left in (1..=length).rev() {
        let value = rng.random_ratio(mines_left as u32, cells_left as u32);
        layout.push(value);
        if value {
            mines_left -= 1;
        }
    }

    layout
}

/// In-bounds cells reached from `pos` through the offsets of `mask`.
pub(crate) fn neighbors_of(
    pos: Pos,
    width: usize,
    height: usize,
    mask: &[Offset],
) -> impl Iterator<Item = Pos> + '_ {
    mask.iter().filter_map(move |&(dr, dc)| {
        let row = pos.row.checked_add_signed(dr)?;
        let col = pos.col.checked_add_signed(dc)?;
        (row < height && col < width).then_some(Pos { row, col })
    })
}

fn count_adjacent_mines(
    layout: &[bool],
    index: usize,
    width: usize,
    height: usize,
    mask: &[Offset],
) -> u8 {
    let pos = Pos::new(index / width, index % width);
    neighbors_of(pos, width, height, mask)
        .filter(|neighbor| layout[neighbor.row * width + neighbor.col])
        .count() as u8
}

impl Board {
    /// Places `params.mines` mines uniformly at random. There is no safe
    /// zone: any cell, including the first one revealed, may hold a mine.
    pub fn generate(params: &GameParams) -> Result<Self> {
        let mines = validate_params(params)?;
        let mask = params
            .mask
            .clone()
            .unwrap_or_else(|| MOORE_NEIGHBORHOOD.to_vec());
        validate_mask(&mask)?;
        let length = params.width * params.height;

        let layout = match params.seed {
            Some(seed) => generate_mines(&mut StdRng::seed_from_u64(seed), length, mines),
            None => generate_mines(&mut rand::rng(), length, mines),
        };

        debug!(
            "Generated {}x{} board with {} mines (seeded: {})",
            params.height,
            params.width,
            mines,
            params.seed.is_some()
        );
        Ok(Self::from_layout(params.width, params.height, layout, mask))
    }

    /// Builds a board with mines at exactly the given positions.
    pub fn with_mines(height: usize, width: usize, mines: &[Pos]) -> Result<Self> {
        Self::with_mines_and_mask(height, width, mines, &MOORE_NEIGHBORHOOD)
    }

    pub fn with_mines_and_mask(
        height: usize,
        width: usize,
        mines: &[Pos],
        mask: &[Offset],
    ) -> Result<Self> {
        let params = GameParams {
            width,
            height,
            mines: mines.len(),
            ..GameParams::default()
        };
        validate_params(&params)?;
        validate_mask(mask)?;

        let mut layout = vec![false; width * height];
        for &pos in mines {
            if pos.row >= height || pos.col >= width {
                return Err(GameError::OutOfBounds(pos));
            }
            layout[pos.row * width + pos.col] = true;
        }

        if layout.iter().all(|&mine| mine) {
            return Err(GameError::InvalidParams(
                "board needs at least one safe cell".to_string(),
            ));
        }

        Ok(Self::from_layout(width, height, layout, mask.to_vec()))
    }

    fn from_layout(width: usize, height: usize, layout: Vec<bool>, mask: Vec<Offset>) -> Self {
        let cells = layout
            .iter()
            .enumerate()
            .map(|(i, &mine)| Cell {
                mine,
                adjacent: if mine {
                    0
                } else {
                    count_adjacent_mines(&layout, i, width, height, &mask)
                },
                revealed: RevealedState::Hidden,
            })
            .collect();

        Self {
            width,
            height,
            mines: layout.iter().filter(|&&mine| mine).count(),
            mask,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mines(&self) -> usize {
        self.mines
    }

    pub fn mask(&self) -> &[Offset] {
        &self.mask
    }

    pub fn safe_cells(&self) -> usize {
        self.cells.len() - self.mines
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.height && pos.col < self.width
    }

    pub fn validate_pos(&self, pos: Pos) -> Result<Pos> {
        if self.contains(pos) {
            Ok(pos)
        } else {
            Err(GameError::OutOfBounds(pos))
        }
    }

    pub fn cell(&self, pos: Pos) -> Result<&Cell> {
        let pos = self.validate_pos(pos)?;
        Ok(&self.cells[pos.row * self.width + pos.col])
    }

    pub(crate) fn cell_mut(&mut self, pos: Pos) -> Result<&mut Cell> {
        let pos = self.validate_pos(pos)?;
        Ok(&mut self.cells[pos.row * self.width + pos.col])
    }

    /// The in-bounds cells reached through the board's neighborhood mask.
    pub fn neighbors(&self, pos: Pos) -> Result<Vec<Pos>> {
        let pos = self.validate_pos(pos)?;
        Ok(self.iter_neighbors(pos).collect())
    }

    pub(crate) fn iter_neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        neighbors_of(pos, self.width, self.height, &self.mask)
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |col| Pos { row, col }))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width)
    }

    pub fn count_mines(&self) -> usize {
        self.cells.iter().filter(|cell| cell.mine).count()
    }
}
