//! Run detection along rows, columns and both diagonals, and the wild-piece clear.

use crate::board::{Board, Cell, Pos};
use crate::config::{GameConfig, MIN_RUN};
use crate::piece::Block;
use std::collections::BTreeSet;

/// Maximal same-colour stretch of at least [`MIN_RUN`] cells along one scan line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub color: u8,
    pub cells: Vec<Pos>,
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    /// Every cell to clear, each once.
    pub cells: BTreeSet<Pos>,
    pub runs: Vec<Run>,
    /// Sum of per-run points before the cascade multiplier.
    pub points: u32,
}

impl Matches {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// `points * 2^(multiplier - 1)`, saturating.
pub fn scale(points: u32, multiplier: u32) -> u32 {
    let factor = 1u32
        .checked_shl(multiplier.saturating_sub(1))
        .unwrap_or(u32::MAX);
    points.saturating_mul(factor)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matcher {
    run_base: u32,
    run_bonus: u32,
}

impl Matcher {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            run_base: config.run_base,
            run_bonus: config.run_bonus,
        }
    }

    pub fn run_points(&self, len: usize) -> u32 {
        let extra = u32::try_from(len.saturating_sub(MIN_RUN)).unwrap_or(u32::MAX);
        self.run_base
            .saturating_add(extra.saturating_mul(self.run_bonus))
    }

    pub fn find_matches(&self, board: &Board) -> Matches {
        let mut matches = Matches::default();
        for line in scan_lines(board.rows(), board.cols()) {
            for run in runs_in_line(board, &line) {
                matches.points = matches
                    .points
                    .saturating_add(self.run_points(run.cells.len()));
                matches.cells.extend(run.cells.iter().copied());
                matches.runs.push(run);
            }
        }
        matches
    }

    /// Cells cleared by a landed wild block: its own cells, plus every jewel of the
    /// colour directly beneath it. A wild block on the floor takes nothing else.
    pub fn find_wild_matches(&self, board: &Board, block: &Block) -> BTreeSet<Pos> {
        let mut cells: BTreeSet<Pos> = block.positions().collect();
        let target = board
            .below(block)
            .and_then(|p| board.get(p.row, p.col))
            .and_then(Cell::color);
        if let Some(color) = target {
            cells.extend(board.cells_of_color(color));
        }
        cells
    }
}

/// All rows, columns, and both diagonal families, keeping only lines long enough
/// to hold a run.
fn scan_lines(rows: usize, cols: usize) -> Vec<Vec<Pos>> {
    let mut lines: Vec<Vec<Pos>> = Vec::new();
    lines.extend((0..rows).map(|r| (0..cols).map(|c| Pos::new(r, c)).collect()));
    lines.extend((0..cols).map(|c| (0..rows).map(|r| Pos::new(r, c)).collect()));

    if rows == 0 || cols == 0 {
        return lines;
    }
    // Rising diagonals share row + col, walked bottom-left to top-right.
    for sum in 0..rows + cols - 1 {
        let line: Vec<Pos> = (0..cols)
            .filter_map(|c| sum.checked_sub(c).filter(|r| *r < rows).map(|r| Pos::new(r, c)))
            .collect();
        lines.push(line);
    }
    // Falling diagonals share row - col, walked top-left to bottom-right.
    for offset in 0..rows + cols - 1 {
        let line: Vec<Pos> = (0..cols)
            .filter_map(|c| {
                (c + offset)
                    .checked_sub(cols - 1)
                    .filter(|r| *r < rows)
                    .map(|r| Pos::new(r, c))
            })
            .collect();
        lines.push(line);
    }
    lines.retain(|l| l.len() >= MIN_RUN);
    lines
}

fn runs_in_line(board: &Board, line: &[Pos]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut start = 0;
    while start < line.len() {
        let color = board
            .get(line[start].row, line[start].col)
            .and_then(Cell::color);
        let mut end = start + 1;
        while end < line.len()
            && board.get(line[end].row, line[end].col).and_then(Cell::color) == color
        {
            end += 1;
        }
        match color {
            Some(color) if end - start >= MIN_RUN => runs.push(Run {
                color,
                cells: line[start..end].to_vec(),
            }),
            _ => {}
        }
        start = end;
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Piece;

    fn matcher() -> Matcher {
        Matcher::new(&GameConfig::default())
    }

    fn padded(rows: &[&[u8]]) -> Board {
        // Top rows empty so only the given bottom rows matter.
        let empty: &[u8] = &[0; 6];
        let mut all = vec![empty; 14 - rows.len()];
        all.extend_from_slice(rows);
        Board::from_rows(&all)
    }

    #[test]
    fn test_row_of_three() {
        let board = padded(&[&[2, 2, 2, 0, 0, 0]]);
        let m = matcher().find_matches(&board);
        assert_eq!(
            m.cells,
            BTreeSet::from([Pos::new(13, 0), Pos::new(13, 1), Pos::new(13, 2)])
        );
        assert_eq!(m.points, 300);
    }

    #[test]
    fn test_row_of_four_bonus() {
        let board = padded(&[&[2, 2, 2, 2, 0, 0]]);
        let m = matcher().find_matches(&board);
        assert_eq!(m.cells.len(), 4);
        assert_eq!(m.points, 450);
    }

    #[test]
    fn test_column_run() {
        let board = padded(&[
            &[0, 0, 0, 0, 0, 4],
            &[0, 0, 0, 0, 0, 4],
            &[0, 0, 0, 0, 0, 4],
            &[0, 0, 0, 0, 0, 1],
        ]);
        let m = matcher().find_matches(&board);
        assert_eq!(m.runs.len(), 1);
        assert_eq!(m.runs[0].color, 4);
        assert!(m.cells.contains(&Pos::new(10, 5)));
        assert!(!m.cells.contains(&Pos::new(13, 5)));
    }

    #[test]
    fn test_rising_diagonal() {
        let board = padded(&[
            &[0, 0, 3, 0, 0, 0],
            &[0, 3, 1, 0, 0, 0],
            &[3, 1, 2, 0, 0, 0],
        ]);
        let m = matcher().find_matches(&board);
        assert_eq!(
            m.cells,
            BTreeSet::from([Pos::new(11, 2), Pos::new(12, 1), Pos::new(13, 0)])
        );
        assert_eq!(m.points, 300);
    }

    #[test]
    fn test_falling_diagonal() {
        let board = padded(&[
            &[0, 0, 0, 5, 0, 0],
            &[0, 0, 0, 1, 5, 0],
            &[0, 0, 0, 2, 1, 5],
        ]);
        let m = matcher().find_matches(&board);
        assert_eq!(
            m.cells,
            BTreeSet::from([Pos::new(11, 3), Pos::new(12, 4), Pos::new(13, 5)])
        );
    }

    #[test]
    fn test_diagonal_touching_corners() {
        let board = Board::from_rows(&[&[6, 0, 0], &[0, 6, 0], &[0, 0, 6]]);
        let m = matcher().find_matches(&board);
        assert_eq!(m.cells.len(), 3);
        let board = Board::from_rows(&[&[0, 0, 6], &[0, 6, 0], &[6, 0, 0]]);
        assert_eq!(matcher().find_matches(&board).cells.len(), 3);
    }

    #[test]
    fn test_crossing_runs_share_cell_but_both_score() {
        let board = padded(&[
            &[0, 0, 1, 0, 0, 0],
            &[0, 0, 1, 0, 0, 0],
            &[1, 1, 1, 0, 0, 0],
        ]);
        let m = matcher().find_matches(&board);
        assert_eq!(m.cells.len(), 5);
        assert_eq!(m.runs.len(), 2);
        assert_eq!(m.points, 600);
    }

    #[test]
    fn test_two_colors_do_not_join() {
        let board = padded(&[&[1, 1, 2, 2, 1, 1]]);
        assert!(matcher().find_matches(&board).is_empty());
    }

    #[test]
    fn test_quiescent_board_is_idempotent() {
        let board = padded(&[&[1, 2, 3, 4, 5, 6], &[2, 3, 4, 5, 6, 1]]);
        let before = board.clone();
        for _ in 0..3 {
            let m = matcher().find_matches(&board);
            assert!(m.is_empty());
            assert_eq!(m.points, 0);
        }
        assert_eq!(board, before);
    }

    #[test]
    fn test_cascade_multiplier() {
        assert_eq!(scale(300, 1), 300);
        assert_eq!(scale(300, 2), 600);
        assert_eq!(scale(450, 3), 1800);
        assert_eq!(scale(300, 40), u32::MAX);
    }

    #[test]
    fn test_scan_lines_cover_every_diagonal() {
        let lines = scan_lines(14, 6);
        // 14 rows + 6 columns + 2 * (19 diagonals - 4 shorter than three)
        assert_eq!(lines.len(), 14 + 6 + 2 * 15);
    }

    #[test]
    fn test_wild_on_floor_takes_only_itself() {
        let board = padded(&[&[0, 0, 0, 0, 0, 2]]);
        let block = Block::new([Piece::Wild; 3], 11, 0);
        let cells = matcher().find_wild_matches(&board, &block);
        let own: BTreeSet<Pos> = block.positions().collect();
        assert_eq!(cells, own);
    }

    #[test]
    fn test_wild_on_jewel_takes_whole_color() {
        let board = padded(&[
            &[0, 0, 0, 0, 0, 0],
            &[4, 0, 0, 0, 4, 0],
            &[2, 0, 4, 1, 3, 4],
        ]);
        let block = Block::new([Piece::Wild; 3], 9, 0);
        let cells = matcher().find_wild_matches(&board, &block);
        assert_eq!(cells.len(), 3 + 4);
        assert!(cells.contains(&Pos::new(13, 5)));
        assert!(!cells.contains(&Pos::new(13, 0)));
    }
}
