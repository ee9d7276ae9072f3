//! The grid of landed jewels: placement, collision queries, gravity compaction.

use crate::config::BLOCK_SIZE;
use crate::piece::{Block, Piece};
use std::fmt;

/// Grid coordinate. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Single grid cell: either empty or a jewel of colour `1..=num_colors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Jewel(u8),
}

impl Cell {
    pub fn color(self) -> Option<u8> {
        match self {
            Self::Empty => None,
            Self::Jewel(c) => Some(c),
        }
    }
}

/// One jewel moved by [`Board::compact`], in the order the moves were made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub col: usize,
    pub from: usize,
    pub to: usize,
}

impl Fall {
    pub fn from_pos(&self) -> Pos {
        Pos::new(self.from, self.col)
    }

    pub fn to_pos(&self) -> Pos {
        Pos::new(self.to, self.col)
    }
}

/// Playfield grid, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Board {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn index(&self, pos: Pos) -> usize {
        assert!(
            pos.row < self.rows && pos.col < self.cols,
            "cell ({}, {}) is outside the {}x{} board",
            pos.row,
            pos.col,
            self.rows,
            self.cols
        );
        pos.row * self.cols + pos.col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col).copied()
    }

    /// # Panics
    ///
    /// Panics when `(row, col)` is off the board; callers bound-check first.
    #[inline]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.cells[self.index(Pos::new(row, col))] != Cell::Empty
    }

    pub fn set(&mut self, pos: Pos, cell: Cell) {
        let i = self.index(pos);
        self.cells[i] = cell;
    }

    /// Write the block's colours into its column. Wild pieces are never written.
    pub fn place(&mut self, block: &Block) {
        for (pos, piece) in block.cells() {
            debug_assert!(
                !self.is_occupied(pos.row, pos.col),
                "placing onto occupied cell {pos:?}"
            );
            if let Piece::Color(c) = piece {
                self.set(pos, Cell::Jewel(c));
            }
        }
    }

    pub fn clear<'a>(&mut self, cells: impl IntoIterator<Item = &'a Pos>) {
        for &pos in cells {
            self.set(pos, Cell::Empty);
        }
    }

    /// Collapse every column downward, keeping the top-to-bottom order of its jewels.
    /// Moves are listed bottom-up per column so they can be replayed one by one.
    pub fn compact(&mut self) -> Vec<Fall> {
        let mut falls = Vec::new();
        for col in 0..self.cols {
            let mut target = self.rows;
            for row in (0..self.rows).rev() {
                let cell = self.cells[row * self.cols + col];
                if cell == Cell::Empty {
                    continue;
                }
                target -= 1;
                if target != row {
                    self.cells[target * self.cols + col] = cell;
                    self.cells[row * self.cols + col] = Cell::Empty;
                    falls.push(Fall {
                        col,
                        from: row,
                        to: target,
                    });
                }
            }
        }
        falls
    }

    pub fn reset(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Pos::new(row, col)))
    }

    pub fn empty_cells(&self) -> Vec<Pos> {
        self.positions()
            .filter(|p| !self.is_occupied(p.row, p.col))
            .collect()
    }

    pub fn cells_of_color(&self, color: u8) -> Vec<Pos> {
        self.positions()
            .filter(|p| self.get(p.row, p.col) == Some(Cell::Jewel(color)))
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| *c != Cell::Empty)
    }

    /// Row below the block's bottom cell, if the block is not on the floor.
    pub fn below(&self, block: &Block) -> Option<Pos> {
        let row = block.row + BLOCK_SIZE;
        (row < self.rows).then(|| Pos::new(row, block.col))
    }

    /// Build a board from rows of colour numbers (`0` is empty).
    #[cfg(test)]
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut board = Self::new(rows.len(), cols);
        for (r, line) in rows.iter().enumerate() {
            for (c, &v) in line.iter().enumerate() {
                if v != 0 {
                    board.set(Pos::new(r, c), Cell::Jewel(v));
                }
            }
        }
        board
    }

    #[cfg(test)]
    pub fn column(&self, col: usize) -> Vec<u8> {
        (0..self.rows)
            .map(|r| self.get(r, col).and_then(Cell::color).unwrap_or(0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_writes_column() {
        let mut board = Board::new(14, 6);
        let block = Block::new([Piece::Color(1), Piece::Color(2), Piece::Color(3)], 5, 2);
        board.place(&block);
        assert_eq!(board.get(5, 2), Some(Cell::Jewel(1)));
        assert_eq!(board.get(6, 2), Some(Cell::Jewel(2)));
        assert_eq!(board.get(7, 2), Some(Cell::Jewel(3)));
        assert!(!board.is_occupied(8, 2));
    }

    #[test]
    fn test_place_skips_wild() {
        let mut board = Board::new(14, 6);
        board.place(&Block::new([Piece::Wild; 3], 11, 0));
        assert!(board.empty_cells().len() == 14 * 6);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_is_occupied_out_of_range() {
        Board::new(14, 6).is_occupied(14, 0);
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let board = Board::new(4, 2);
        assert_eq!(board.get(4, 0), None);
        assert_eq!(board.get(0, 2), None);
    }

    #[test]
    fn test_compact_preserves_order() {
        let mut board = Board::from_rows(&[&[1], &[0], &[2], &[0], &[0], &[3], &[0]]);
        let falls = board.compact();
        assert_eq!(board.column(0), vec![0, 0, 0, 0, 1, 2, 3]);
        assert_eq!(
            falls,
            vec![
                Fall { col: 0, from: 5, to: 6 },
                Fall { col: 0, from: 2, to: 5 },
                Fall { col: 0, from: 0, to: 4 },
            ]
        );
    }

    #[test]
    fn test_compact_after_clear_leaves_no_gap() {
        let mut board = Board::from_rows(&[&[4, 0], &[5, 0], &[6, 1], &[1, 1], &[2, 1]]);
        board.clear(&[Pos::new(1, 0), Pos::new(3, 0)]);
        board.compact();
        assert_eq!(board.column(0), vec![0, 0, 4, 6, 2]);
        assert_eq!(board.column(1), vec![0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_compact_settled_board_is_noop() {
        let mut board = Board::from_rows(&[&[0, 0], &[0, 3], &[2, 3]]);
        let before = board.clone();
        assert!(board.compact().is_empty());
        assert_eq!(board, before);
    }

    #[test]
    fn test_below_block() {
        let board = Board::new(14, 6);
        assert_eq!(
            board.below(&Block::new([Piece::Wild; 3], 5, 3)),
            Some(Pos::new(8, 3))
        );
        assert_eq!(board.below(&Block::new([Piece::Wild; 3], 11, 3)), None);
    }
}
