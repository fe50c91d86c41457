//! Match detection: ordered window scans over the settled arena.
//!
//! Scans run 5-in-a-row, 2x2 block, 4-in-a-row, 3-in-a-row. Each scan walks every window of
//! its shape (horizontal windows before vertical ones) and clears a qualifying window on the
//! spot, so later windows and later scans never see tiles that were already claimed.

use crate::grid::{GRID_SIZE, Occupancy, Tile, TileKind};

pub const RUN3_POINTS: u32 = 50;
pub const RUN4_POINTS: u32 = 100;
pub const RUN5_POINTS: u32 = 150;
pub const BLOCK_POINTS: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Run5,
    Block2x2,
    Run4,
    Run3,
}

impl Shape {
    /// Scan priority.
    pub const SCAN_ORDER: [Self; 4] = [Self::Run5, Self::Block2x2, Self::Run4, Self::Run3];

    pub const fn points(self) -> u32 {
        match self {
            Self::Run3 => RUN3_POINTS,
            Self::Run4 => RUN4_POINTS,
            Self::Run5 => RUN5_POINTS,
            Self::Block2x2 => BLOCK_POINTS,
        }
    }

    /// Every window of this shape as arena slots, in scan order.
    fn windows(self) -> Vec<Vec<(usize, usize)>> {
        match self {
            Self::Block2x2 => {
                let mut out = Vec::with_capacity((GRID_SIZE - 1) * (GRID_SIZE - 1));
                for x in 0..GRID_SIZE - 1 {
                    for y in 0..GRID_SIZE - 1 {
                        out.push(vec![(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)]);
                    }
                }
                out
            }
            Self::Run3 => runs(3),
            Self::Run4 => runs(4),
            Self::Run5 => runs(5),
        }
    }
}

/// Straight windows of length `len`: all horizontal, then all vertical.
fn runs(len: usize) -> Vec<Vec<(usize, usize)>> {
    let starts = GRID_SIZE + 1 - len;
    let mut out = Vec::with_capacity(2 * starts * GRID_SIZE);
    for x in 0..starts {
        for y in 0..GRID_SIZE {
            out.push((0..len).map(|i| (x + i, y)).collect());
        }
    }
    for x in 0..GRID_SIZE {
        for y in 0..starts {
            out.push((0..len).map(|i| (x, y + i)).collect());
        }
    }
    out
}

/// A window that qualified and was cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub shape: Shape,
    pub tiles: Vec<Tile>,
}

impl Match {
    pub const fn points(&self) -> u32 {
        self.shape.points()
    }
}

/// A window qualifies when it holds at most one distinct non-wildcard kind.
pub fn qualifies<I>(kinds: I) -> bool
where
    I: IntoIterator<Item = TileKind>,
{
    let mut seen: Option<TileKind> = None;
    for kind in kinds.into_iter().filter(|k| !k.is_wildcard()) {
        match seen {
            None => seen = Some(kind),
            Some(first) if first != kind => return false,
            Some(_) => {}
        }
    }
    true
}

/// Run all four scans, clearing matched cells in place. Matches come back in discovery order.
pub fn resolve_matches(occupancy: &mut Occupancy) -> Vec<Match> {
    let mut found = Vec::new();
    for shape in Shape::SCAN_ORDER {
        for window in shape.windows() {
            let tiles: Option<Vec<Tile>> =
                window.iter().map(|&(x, y)| occupancy.at(x, y)).collect();
            let Some(tiles) = tiles else { continue };
            if !qualifies(tiles.iter().map(|t| t.kind)) {
                continue;
            }
            for &(x, y) in &window {
                occupancy.take_at(x, y);
            }
            found.push(Match { shape, tiles });
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Coord, TileId};
    use crate::grid::TileKind::{Blue, Green, Purple, Red, Wildcard, Yellow};

    struct Board {
        grid: Occupancy,
        next: u32,
    }

    impl Board {
        fn new() -> Self {
            Self {
                grid: Occupancy::new(),
                next: 0,
            }
        }

        fn put(&mut self, x: i8, y: i8, kind: TileKind) -> &mut Self {
            let pos = Coord::new(x, y);
            self.grid
                .set(pos, Some(Tile { id: TileId(self.next), kind, pos }))
                .unwrap();
            self.next += 1;
            self
        }

        fn row(&mut self, y: i8, kinds: &[TileKind]) -> &mut Self {
            for (i, &kind) in kinds.iter().enumerate() {
                self.put(-2 + i as i8, y, kind);
            }
            self
        }
    }

    fn shapes(found: &[Match]) -> Vec<Shape> {
        found.iter().map(|m| m.shape).collect()
    }

    #[test]
    fn test_qualifies_wildcard_rules() {
        assert!(qualifies([Wildcard, Red, Red]));
        assert!(qualifies([Wildcard, Wildcard, Wildcard]));
        assert!(qualifies([Blue, Wildcard, Blue, Wildcard]));
        assert!(!qualifies([Red, Blue, Wildcard]));
        assert!(!qualifies([Red, Red, Green]));
    }

    #[test]
    fn test_run3_horizontal_clears_cells() {
        let mut b = Board::new();
        b.put(0, 0, Red).put(1, 0, Red).put(2, 0, Red).put(-2, 0, Blue);
        let found = resolve_matches(&mut b.grid);
        assert_eq!(shapes(&found), vec![Shape::Run3]);
        assert_eq!(found[0].points(), RUN3_POINTS);
        for x in 0..=2 {
            assert_eq!(b.grid.get(Coord::new(x, 0)).unwrap(), None);
        }
        assert!(b.grid.get(Coord::new(-2, 0)).unwrap().is_some());
    }

    #[test]
    fn test_row_of_five_is_only_a_run5() {
        let mut b = Board::new();
        b.row(-1, &[Yellow; 5]);
        let found = resolve_matches(&mut b.grid);
        assert_eq!(shapes(&found), vec![Shape::Run5]);
        assert_eq!(found[0].tiles.len(), 5);
        assert!(b.grid.is_empty());
    }

    #[test]
    fn test_run4_beats_run3_on_same_line() {
        let mut b = Board::new();
        b.put(-2, 2, Green).put(-2, 1, Green).put(-2, 0, Green).put(-2, -1, Green);
        let found = resolve_matches(&mut b.grid);
        assert_eq!(shapes(&found), vec![Shape::Run4]);
        assert!(b.grid.is_empty());
    }

    #[test]
    fn test_block_scanned_before_runs() {
        // 2x2 of purple with a third purple extending the bottom row.
        let mut b = Board::new();
        b.put(0, 0, Purple).put(1, 0, Purple).put(0, 1, Purple).put(1, 1, Purple);
        b.put(2, 0, Purple);
        let found = resolve_matches(&mut b.grid);
        assert_eq!(shapes(&found), vec![Shape::Block2x2]);
        assert!(b.grid.get(Coord::new(2, 0)).unwrap().is_some());
    }

    #[test]
    fn test_block_with_wildcard() {
        let mut b = Board::new();
        b.put(-2, -2, Wildcard).put(-1, -2, Blue).put(-2, -1, Blue).put(-1, -1, Blue);
        let found = resolve_matches(&mut b.grid);
        assert_eq!(shapes(&found), vec![Shape::Block2x2]);
        assert_eq!(found[0].points(), BLOCK_POINTS);
    }

    #[test]
    fn test_independent_windows_in_one_scan() {
        let mut b = Board::new();
        b.row(2, &[Red, Red, Red, Blue, Green]);
        b.row(-2, &[Green, Blue, Yellow, Yellow, Yellow]);
        let found = resolve_matches(&mut b.grid);
        assert_eq!(shapes(&found), vec![Shape::Run3, Shape::Run3]);
        assert_eq!(b.grid.all_tiles().count(), 4);
    }

    #[test]
    fn test_mixed_concrete_kinds_do_not_match() {
        let mut b = Board::new();
        b.row(0, &[Red, Blue, Wildcard, Green, Red]);
        let found = resolve_matches(&mut b.grid);
        assert!(found.is_empty());
        assert_eq!(b.grid.all_tiles().count(), 5);
    }

    #[test]
    fn test_gap_breaks_window() {
        let mut b = Board::new();
        b.put(-2, 0, Red).put(-1, 0, Red).put(1, 0, Red);
        assert!(resolve_matches(&mut b.grid).is_empty());
    }

    #[test]
    fn test_horizontal_claims_shared_cell_before_vertical() {
        // An L: row y=0 x=-2..0 and column x=-2 y=0..2 share (-2, 0).
        let mut b = Board::new();
        b.put(-2, 0, Red).put(-1, 0, Red).put(0, 0, Red);
        b.put(-2, 1, Red).put(-2, 2, Red);
        let found = resolve_matches(&mut b.grid);
        assert_eq!(shapes(&found), vec![Shape::Run3]);
        assert_eq!(b.grid.all_tiles().count(), 2);
    }
}
