//! Falling blocks and the random generator that supplies them.

use crate::board::Pos;
use crate::config::{BLOCK_SIZE, GameConfig};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// Content of one block cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece {
    Color(u8),
    /// Clears every jewel of the colour it lands on.
    Wild,
}

/// A vertical stack of [`BLOCK_SIZE`] pieces; `row` is the top cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub pieces: [Piece; BLOCK_SIZE],
    pub row: usize,
    pub col: usize,
    pub is_moving: bool,
}

impl Block {
    pub fn new(pieces: [Piece; BLOCK_SIZE], row: usize, col: usize) -> Self {
        Self {
            pieces,
            row,
            col,
            is_moving: false,
        }
    }

    pub fn is_wild(&self) -> bool {
        self.pieces.iter().all(|p| *p == Piece::Wild)
    }

    /// The bottom cell. Movement and landing tests key off this cell.
    pub fn anchor(&self) -> Pos {
        Pos::new(self.row + BLOCK_SIZE - 1, self.col)
    }

    /// Grid position and content of each cell, top to bottom.
    pub fn cells(&self) -> impl Iterator<Item = (Pos, Piece)> + '_ {
        self.pieces
            .iter()
            .enumerate()
            .map(|(i, p)| (Pos::new(self.row + i, self.col), *p))
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        self.cells().map(|(pos, _)| pos)
    }

    /// Bottom piece moves to the top; the others shift down one cell.
    pub fn rotate(&mut self) {
        self.pieces.rotate_right(1);
    }
}

/// Random block source: one wild block in `wild_rarity` on average, otherwise
/// three independent uniform colours.
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    rng: StdRng,
    num_colors: u8,
    wild_rarity: u32,
}

impl PieceGenerator {
    /// Seeded from the OS unless `seed` is given.
    pub fn new(config: &GameConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            num_colors: config.num_colors,
            wild_rarity: config.wild_rarity,
        }
    }

    /// New block, positioned off-board at the origin and not moving.
    pub fn next_block(&mut self) -> Block {
        let pieces = if self.rng.random_ratio(1, self.wild_rarity) {
            [Piece::Wild; BLOCK_SIZE]
        } else {
            std::array::from_fn(|_| Piece::Color(self.random_color()))
        };
        Block::new(pieces, 0, 0)
    }

    pub fn random_color(&mut self) -> u8 {
        self.rng.random_range(1..=self.num_colors)
    }

    pub fn choose_cell(&mut self, cells: &[Pos]) -> Option<Pos> {
        cells.choose(&mut self.rng).copied()
    }
}
