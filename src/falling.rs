//! The player-controlled block and the preview of the next one.

use crate::board::{Board, Pos};
use crate::config::BLOCK_SIZE;
use crate::error::EngineError;
use crate::piece::{Block, PieceGenerator};

/// Result of one forced descent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved,
    Landed,
}

#[derive(Debug, Clone)]
pub struct FallingBlocks {
    preview: Block,
    falling: Block,
}

impl FallingBlocks {
    /// Nothing is falling yet; the first gameplay tick promotes the preview.
    pub fn new(generator: &mut PieceGenerator) -> Self {
        let preview = generator.next_block();
        Self {
            falling: preview.clone(),
            preview,
        }
    }

    #[inline]
    pub fn preview(&self) -> &Block {
        &self.preview
    }

    #[inline]
    pub fn falling(&self) -> &Block {
        &self.falling
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.falling.is_moving
    }

    pub fn move_left(&mut self, board: &Board) -> bool {
        if !self.falling.is_moving {
            return false;
        }
        let anchor = self.falling.anchor();
        if anchor.col > 0 && !board.is_occupied(anchor.row, anchor.col - 1) {
            self.falling.col -= 1;
            return true;
        }
        false
    }

    pub fn move_right(&mut self, board: &Board) -> bool {
        if !self.falling.is_moving {
            return false;
        }
        let anchor = self.falling.anchor();
        if anchor.col + 1 < board.cols() && !board.is_occupied(anchor.row, anchor.col + 1) {
            self.falling.col += 1;
            return true;
        }
        false
    }

    /// Colour permutation only; the block keeps its cells.
    pub fn rotate(&mut self) -> bool {
        if !self.falling.is_moving {
            return false;
        }
        self.falling.rotate();
        true
    }

    /// One row down, or land if the floor or a jewel is directly under the anchor.
    pub fn step(&mut self, board: &Board) -> Step {
        if !self.falling.is_moving {
            return Step::Landed;
        }
        let anchor = self.falling.anchor();
        if anchor.row + 1 == board.rows() || board.is_occupied(anchor.row + 1, anchor.col) {
            self.falling.is_moving = false;
            Step::Landed
        } else {
            self.falling.row += 1;
            Step::Moved
        }
    }

    /// Descend until landed. Returns the rows travelled, which is what a drop
    /// is rewarded for.
    pub fn drop(&mut self, board: &Board) -> Option<u32> {
        if !self.falling.is_moving {
            return None;
        }
        let mut rows = 0;
        while self.step(board) == Step::Moved {
            rows += 1;
        }
        Some(rows)
    }

    pub fn spawn_anchor(board: &Board) -> Pos {
        Pos::new(BLOCK_SIZE - 1, board.cols() / 2)
    }

    pub fn spawn_blocked(board: &Board) -> bool {
        let anchor = Self::spawn_anchor(board);
        board.is_occupied(anchor.row, anchor.col)
    }

    /// Bring the preview onto the board and draw a new preview. The caller must
    /// check [`Self::spawn_blocked`] first and run the fill effect instead.
    pub fn promote_preview(
        &mut self,
        generator: &mut PieceGenerator,
        board: &Board,
    ) -> Result<&Block, EngineError> {
        if Self::spawn_blocked(board) {
            return Err(EngineError::SpawnBlocked(Self::spawn_anchor(board)));
        }
        let mut block = std::mem::replace(&mut self.preview, generator.next_block());
        block.row = 0;
        block.col = board.cols() / 2;
        block.is_moving = true;
        self.falling = block;
        Ok(&self.falling)
    }

    /// Take the block out of play without landing it.
    pub fn halt(&mut self) {
        self.falling = self.preview.clone();
    }

    #[cfg(test)]
    pub fn set_falling(&mut self, mut block: Block) {
        block.is_moving = true;
        self.falling = block;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::piece::Piece;

    fn blocks_with(block: Block) -> FallingBlocks {
        let mut generator = PieceGenerator::new(&GameConfig::default(), Some(11));
        let mut blocks = FallingBlocks::new(&mut generator);
        blocks.set_falling(block);
        blocks
    }

    fn colored(row: usize, col: usize) -> Block {
        Block::new([Piece::Color(1), Piece::Color(2), Piece::Color(3)], row, col)
    }

    #[test]
    fn test_nothing_moves_before_promotion() {
        let mut generator = PieceGenerator::new(&GameConfig::default(), Some(5));
        let mut blocks = FallingBlocks::new(&mut generator);
        let board = Board::new(14, 6);
        assert!(!blocks.is_moving());
        assert!(!blocks.move_left(&board));
        assert!(!blocks.rotate());
        assert_eq!(blocks.drop(&board), None);
    }

    #[test]
    fn test_promote_positions_at_spawn() {
        let mut generator = PieceGenerator::new(&GameConfig::default(), Some(5));
        let mut blocks = FallingBlocks::new(&mut generator);
        let expected = blocks.preview().pieces;
        let board = Board::new(14, 6);
        let falling = blocks.promote_preview(&mut generator, &board).unwrap();
        assert_eq!(falling.pieces, expected);
        assert_eq!((falling.row, falling.col), (0, 3));
        assert!(falling.is_moving);
    }

    #[test]
    fn test_promote_into_occupied_spawn_fails() {
        let mut generator = PieceGenerator::new(&GameConfig::default(), Some(5));
        let mut blocks = FallingBlocks::new(&mut generator);
        let mut board = Board::new(14, 6);
        board.set(Pos::new(2, 3), crate::board::Cell::Jewel(1));
        assert!(FallingBlocks::spawn_blocked(&board));
        assert_eq!(
            blocks.promote_preview(&mut generator, &board).err(),
            Some(EngineError::SpawnBlocked(Pos::new(2, 3)))
        );
    }

    #[test]
    fn test_move_stops_at_walls() {
        let board = Board::new(14, 6);
        let mut blocks = blocks_with(colored(0, 0));
        assert!(!blocks.move_left(&board));
        for _ in 0..5 {
            assert!(blocks.move_right(&board));
        }
        assert!(!blocks.move_right(&board));
        assert_eq!(blocks.falling().col, 5);
    }

    #[test]
    fn test_move_blocked_beside_anchor() {
        let board = Board::from_rows(&[
            &[0, 0, 0],
            &[0, 0, 0],
            &[5, 0, 0],
            &[5, 0, 0],
        ]);
        let mut blocks = blocks_with(colored(0, 1));
        assert!(!blocks.move_left(&board));
        assert!(blocks.move_right(&board));
    }

    #[test]
    fn test_step_lands_on_floor() {
        let board = Board::new(5, 2);
        let mut blocks = blocks_with(colored(0, 0));
        assert_eq!(blocks.step(&board), Step::Moved);
        assert_eq!(blocks.step(&board), Step::Moved);
        assert_eq!(blocks.step(&board), Step::Landed);
        assert_eq!(blocks.falling().anchor(), Pos::new(4, 0));
        assert!(!blocks.is_moving());
    }

    #[test]
    fn test_step_lands_on_jewel() {
        let board = Board::from_rows(&[&[0], &[0], &[0], &[0], &[0], &[2]]);
        let mut blocks = blocks_with(colored(0, 0));
        while blocks.step(&board) == Step::Moved {}
        assert_eq!(blocks.falling().row, 2);
    }

    #[test]
    fn test_drop_counts_rows() {
        let board = Board::new(14, 6);
        let mut blocks = blocks_with(colored(0, 2));
        assert_eq!(blocks.drop(&board), Some(11));
        assert_eq!(blocks.falling().anchor().row, 13);
        assert_eq!(blocks.drop(&board), None);
    }
}
