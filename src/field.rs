//! Board and jewel entities behind one interface, so an observer never sees
//! one updated without the other.

use crate::board::{Board, Cell, Fall, Pos};
use crate::error::EngineError;
use crate::jewel::{Animation, AnimationKind, Jewel, JewelList};
use crate::piece::{Block, Piece};

#[derive(Debug, Clone)]
pub struct Playfield {
    board: Board,
    jewels: JewelList,
}

impl Playfield {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            board: Board::new(rows, cols),
            jewels: JewelList::new(),
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn jewels(&self) -> &JewelList {
        &self.jewels
    }

    /// Hand a landed block over to the field. Wild pieces become entities only;
    /// they never occupy the grid.
    pub fn merge(&mut self, block: &Block) {
        self.board.place(block);
        for (pos, piece) in block.cells() {
            self.jewels.push(Jewel::new(piece, pos));
        }
    }

    /// Drop a single jewel in (fill effect).
    pub fn insert(&mut self, pos: Pos, color: u8) {
        self.board.set(pos, Cell::Jewel(color));
        self.jewels.push(Jewel::new(Piece::Color(color), pos));
    }

    /// Start `kind` on the jewel at each cell, checking the entity agrees with the grid.
    pub fn mark<'a>(
        &mut self,
        cells: impl IntoIterator<Item = &'a Pos>,
        kind: AnimationKind,
    ) -> Result<(), EngineError> {
        for &pos in cells {
            let found = self.board.get(pos.row, pos.col).and_then(Cell::color);
            let jewel = self
                .jewels
                .find_mut(pos)
                .ok_or(EngineError::MissingJewel(pos))?;
            match jewel.color() {
                Some(expected) if found != Some(expected) => {
                    return Err(EngineError::Desync {
                        pos,
                        expected,
                        found,
                    });
                }
                _ => {}
            }
            jewel.animation = Some(Animation { kind, frame: 0 });
        }
        Ok(())
    }

    /// Remove the jewels at `cells` from grid and entities. Every cell is checked
    /// before anything is removed.
    pub fn remove<'a>(
        &mut self,
        cells: impl IntoIterator<Item = &'a Pos> + Clone,
    ) -> Result<(), EngineError> {
        let missing = cells
            .clone()
            .into_iter()
            .find(|&&pos| self.jewels.find(pos).is_none());
        if let Some(&pos) = missing {
            return Err(EngineError::MissingJewel(pos));
        }
        for &pos in cells.clone() {
            self.jewels.remove(pos);
        }
        self.board.clear(cells);
        Ok(())
    }

    /// Gravity for grid and entities together.
    pub fn compact(&mut self) -> Result<Vec<Fall>, EngineError> {
        let falls = self.board.compact();
        for fall in &falls {
            let jewel = self
                .jewels
                .find_mut(fall.from_pos())
                .ok_or(EngineError::MissingJewel(fall.from_pos()))?;
            jewel.pos = fall.to_pos();
        }
        Ok(falls)
    }

    pub fn animate(&mut self) {
        self.jewels.animate();
    }

    pub fn all_positions(&self) -> Vec<Pos> {
        self.jewels.iter().map(|j| j.pos).collect()
    }

    pub fn reset(&mut self) {
        self.board.reset();
        self.jewels.clear();
    }

    /// Every occupied cell has exactly one entity of the same colour, and no entity
    /// lacks a cell.
    pub fn verify(&self) -> Result<(), EngineError> {
        for pos in self.board.positions() {
            let Some(found) = self.board.get(pos.row, pos.col).and_then(Cell::color) else {
                continue;
            };
            let mut matching = self.jewels.iter().filter(|j| j.pos == pos);
            let jewel = matching.next().ok_or(EngineError::MissingJewel(pos))?;
            let expected = jewel.color().unwrap_or(0);
            if expected != found || matching.next().is_some() {
                return Err(EngineError::Desync {
                    pos,
                    expected,
                    found: Some(found),
                });
            }
        }
        let occupied = self
            .board
            .positions()
            .filter(|p| self.board.is_occupied(p.row, p.col))
            .count();
        if self.jewels.len() != occupied {
            return Err(EngineError::Orphans(self.jewels.len().abs_diff(occupied)));
        }
        Ok(())
    }

    /// Mutable access to the grid alone, for building desync cases in tests.
    #[cfg(test)]
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Field whose entities mirror the given grid.
    #[cfg(test)]
    pub fn from_board(board: Board) -> Self {
        let mut jewels = JewelList::new();
        for pos in board.positions() {
            if let Some(c) = board.get(pos.row, pos.col).and_then(Cell::color) {
                jewels.push(Jewel::new(Piece::Color(c), pos));
            }
        }
        Self { board, jewels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_ordinary_block() {
        let mut field = Playfield::new(14, 6);
        field.merge(&Block::new(
            [Piece::Color(1), Piece::Color(2), Piece::Color(3)],
            11,
            3,
        ));
        assert_eq!(field.jewels().len(), 3);
        assert!(field.board().is_occupied(13, 3));
        assert_eq!(field.verify(), Ok(()));
    }

    #[test]
    fn test_merge_wild_keeps_grid_empty() {
        let mut field = Playfield::new(14, 6);
        field.merge(&Block::new([Piece::Wild; 3], 11, 3));
        assert_eq!(field.jewels().len(), 3);
        assert!(field.board().empty_cells().len() == 84);
    }

    #[test]
    fn test_compact_moves_entities() {
        let board = Board::from_rows(&[&[1, 0], &[2, 0], &[0, 0], &[3, 4]]);
        let mut field = Playfield::from_board(board);
        field.remove(&[Pos::new(3, 0)]).unwrap();
        field.compact().unwrap();
        assert_eq!(field.board().column(0), vec![0, 0, 1, 2]);
        assert_eq!(
            field.jewels().find(Pos::new(3, 0)).and_then(Jewel::color),
            Some(2)
        );
        assert_eq!(field.verify(), Ok(()));
    }

    #[test]
    fn test_remove_missing_entity_is_error() {
        let mut field = Playfield::new(4, 2);
        assert_eq!(
            field.remove(&[Pos::new(0, 0)]),
            Err(EngineError::MissingJewel(Pos::new(0, 0)))
        );
    }

    #[test]
    fn test_remove_checks_every_cell_first() {
        let mut field = Playfield::from_board(Board::from_rows(&[&[0, 0], &[1, 2]]));
        let cells = [Pos::new(1, 0), Pos::new(0, 1)];
        assert_eq!(
            field.remove(&cells),
            Err(EngineError::MissingJewel(Pos::new(0, 1)))
        );
        assert_eq!(field.jewels().len(), 2);
        assert_eq!(field.board().column(0), vec![0, 1]);

        field.remove(&cells[..1]).unwrap();
        assert_eq!(field.board().column(0), vec![0, 0]);
        assert!(field.jewels().find(Pos::new(1, 0)).is_none());
        assert_eq!(field.verify(), Ok(()));
    }

    #[test]
    fn test_verify_detects_desync() {
        let mut field = Playfield::from_board(Board::from_rows(&[&[0, 0], &[1, 2]]));
        field.board_mut().set(Pos::new(1, 1), Cell::Jewel(5));
        assert!(matches!(field.verify(), Err(EngineError::Desync { .. })));
    }

    #[test]
    fn test_mark_detects_colour_mismatch() {
        let mut field = Playfield::from_board(Board::from_rows(&[&[0, 0], &[1, 2]]));
        field.board_mut().set(Pos::new(1, 0), Cell::Jewel(3));
        assert_eq!(
            field.mark(&[Pos::new(1, 0)], AnimationKind::Flash),
            Err(EngineError::Desync {
                pos: Pos::new(1, 0),
                expected: 1,
                found: Some(3),
            })
        );
    }
}
