use rand::{SeedableRng, rngs::StdRng, seq::IteratorRandom};

use super::{Agent, BoardView, Move};

/// Baseline agent: reveals one uniformly chosen hidden cell per pass.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self { rng }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &'static str {
        "random"
    }

    fn compute_moves(&mut self, view: &BoardView) -> Vec<Move> {
        view.hidden()
            .choose(&mut self.rng)
            .map(Move::reveal)
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use minesweeper_common::{
        models::{Cell, MOORE_NEIGHBORHOOD, Pos},
        protocol::BoardState,
    };

    use super::*;

    fn view(board: Vec<Vec<Cell>>) -> BoardView {
        BoardView::from_state(
            &BoardState {
                board,
                game_over: false,
                won: false,
            },
            &MOORE_NEIGHBORHOOD,
        )
    }

    #[test]
    fn picks_only_hidden_cells() {
        let view = view(vec![
            vec![Cell::Revealed { adjacent: 0 }, Cell::Flagged],
            vec![Cell::Revealed { adjacent: 1 }, Cell::Hidden],
        ]);
        let mut agent = RandomAgent::new(Some(9));

        for _ in 0..10 {
            assert_eq!(agent.compute_moves(&view), vec![Move::reveal(Pos::new(1, 1))]);
        }
    }

    #[test]
    fn no_hidden_cells_means_no_move() {
        let view = view(vec![vec![Cell::Flagged, Cell::Revealed { adjacent: 1 }]]);

        assert!(RandomAgent::new(Some(1)).compute_moves(&view).is_empty());
    }
}
