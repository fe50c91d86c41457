//! Swipe resolver: direction snapping and simultaneous compaction toward an edge.

use crate::grid::{Coord, GridError, MAX_COORD, MIN_COORD, Occupancy, Tile};

/// Cardinal swipe direction. `Up` moves tiles toward `y = +2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Snap a raw 2D vector to a direction.
    ///
    /// Vectors shorter than `min_magnitude` are ignored. Otherwise the dominant axis wins
    /// (its normalised component exceeds `sqrt(0.5)`); an exact diagonal has no dominant
    /// axis and resolves to `None`.
    pub fn from_vector(x: f32, y: f32, min_magnitude: f32) -> Option<Self> {
        let magnitude = x.hypot(y);
        if !magnitude.is_finite() || magnitude <= 0.0 || magnitude < min_magnitude {
            return None;
        }
        match x.abs().partial_cmp(&y.abs())? {
            std::cmp::Ordering::Greater if x > 0.0 => Some(Self::Right),
            std::cmp::Ordering::Greater => Some(Self::Left),
            std::cmp::Ordering::Less if y > 0.0 => Some(Self::Up),
            std::cmp::Ordering::Less => Some(Self::Down),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Left => "←",
            Self::Right => "→",
        }
    }

    /// True if `other` sits strictly between `from` and the edge this direction sweeps to.
    fn is_ahead(self, from: Coord, other: Coord) -> bool {
        match self {
            Self::Up => other.x == from.x && other.y > from.y,
            Self::Down => other.x == from.x && other.y < from.y,
            Self::Left => other.y == from.y && other.x < from.x,
            Self::Right => other.y == from.y && other.x > from.x,
        }
    }
}

/// Where `tile` comes to rest: the swept-to edge, pulled inward by the number of other
/// tiles already ahead of it on its line. The cross-axis coordinate is kept.
pub fn settled_position(tile: &Tile, tiles: &[Tile], direction: Direction) -> Coord {
    let ahead = tiles
        .iter()
        .filter(|other| other.id != tile.id && direction.is_ahead(tile.pos, other.pos))
        .count() as i8;
    let Coord { x, y } = tile.pos;
    match direction {
        Direction::Up => Coord::new(x, MAX_COORD - ahead),
        Direction::Down => Coord::new(x, MIN_COORD + ahead),
        Direction::Left => Coord::new(MIN_COORD + ahead, y),
        Direction::Right => Coord::new(MAX_COORD - ahead, y),
    }
}

/// Relocate every tile at once. Targets are computed against the pre-swipe layout, then the
/// arena is cleared and each tile writes itself back. Returns how many tiles changed cell.
pub fn sweep(
    occupancy: &mut Occupancy,
    tiles: &mut [Tile],
    direction: Direction,
) -> Result<usize, GridError> {
    let before: &[Tile] = tiles;
    let targets: Vec<Coord> = before
        .iter()
        .map(|t| settled_position(t, before, direction))
        .collect();
    occupancy.clear();
    let mut moved = 0;
    for (tile, target) in tiles.iter_mut().zip(targets) {
        if tile.pos != target {
            moved += 1;
        }
        tile.pos = target;
        occupancy.set(target, Some(*tile))?;
    }
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{TileId, TileKind};

    fn tiles_at(positions: &[(i8, i8)]) -> Vec<Tile> {
        positions
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Tile {
                id: TileId(i as u32),
                kind: TileKind::ALL[i % 5],
                pos: Coord::new(x, y),
            })
            .collect()
    }

    fn swept(positions: &[(i8, i8)], direction: Direction) -> (Occupancy, Vec<Tile>) {
        let mut tiles = tiles_at(positions);
        let mut grid = Occupancy::new();
        for t in &tiles {
            grid.set(t.pos, Some(*t)).unwrap();
        }
        sweep(&mut grid, &mut tiles, direction).unwrap();
        (grid, tiles)
    }

    #[test]
    fn test_from_vector_dominant_axis() {
        assert_eq!(Direction::from_vector(1.0, 0.2, 0.0), Some(Direction::Right));
        assert_eq!(Direction::from_vector(-3.0, 1.0, 0.0), Some(Direction::Left));
        assert_eq!(Direction::from_vector(0.1, 0.9, 0.0), Some(Direction::Up));
        assert_eq!(Direction::from_vector(0.0, -5.0, 0.0), Some(Direction::Down));
    }

    #[test]
    fn test_from_vector_diagonal_and_short_are_ignored() {
        assert_eq!(Direction::from_vector(1.0, 1.0, 0.0), None);
        assert_eq!(Direction::from_vector(-2.0, 2.0, 0.0), None);
        assert_eq!(Direction::from_vector(0.0, 0.0, 0.0), None);
        assert_eq!(Direction::from_vector(0.5, 0.0, 1.0), None);
        assert_eq!(Direction::from_vector(f32::NAN, 1.0, 0.0), None);
    }

    #[test]
    fn test_contiguous_line_packs_against_edge_in_order() {
        let (grid, tiles) = swept(&[(-1, 0), (0, 0), (1, 0)], Direction::Right);
        let xs: Vec<i8> = tiles.iter().map(|t| t.pos.x).collect();
        assert_eq!(xs, vec![0, 1, 2]);
        assert!(tiles.iter().all(|t| t.pos.y == 0));
        assert_eq!(grid.all_tiles().count(), 3);
    }

    #[test]
    fn test_gaps_close_without_passing() {
        let (_, tiles) = swept(&[(-2, 1), (2, 1), (0, 1)], Direction::Left);
        let xs: Vec<i8> = tiles.iter().map(|t| t.pos.x).collect();
        assert_eq!(xs, vec![-2, 0, -1]);
    }

    #[test]
    fn test_vertical_sweep_keeps_columns_apart() {
        let (grid, tiles) = swept(&[(0, -2), (0, 0), (1, -1)], Direction::Up);
        assert_eq!(tiles[0].pos, Coord::new(0, 1));
        assert_eq!(tiles[1].pos, Coord::new(0, 2));
        assert_eq!(tiles[2].pos, Coord::new(1, 2));
        assert_eq!(grid.get(Coord::new(0, -2)).unwrap(), None);
    }

    #[test]
    fn test_down_sweep_on_full_column() {
        let (_, tiles) = swept(&[(2, 2), (2, 1), (2, 0), (2, -1), (2, -2)], Direction::Down);
        let ys: Vec<i8> = tiles.iter().map(|t| t.pos.y).collect();
        assert_eq!(ys, vec![2, 1, 0, -1, -2]);
    }

    #[test]
    fn test_arena_matches_tiles_after_sweep() {
        let (grid, tiles) = swept(&[(-2, -2), (1, 2), (2, -1), (0, 0)], Direction::Down);
        for t in &tiles {
            assert_eq!(grid.get(t.pos).unwrap(), Some(*t));
        }
        assert_eq!(grid.all_tiles().count(), tiles.len());
    }
}
