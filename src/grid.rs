//! Occupancy model: a fixed 5x5 arena of optional tiles addressed by centred coordinates.
//!
//! Coordinates run over `[-2, 2]` on both axes with `+y` pointing up; array slots are the
//! coordinate plus an offset of 2. Positions outside that range are a contract violation
//! and are reported as [`GridError::OutOfBounds`], never clamped.

use std::fmt;
use thiserror::Error;

/// Cells per side.
pub const GRID_SIZE: usize = 5;
pub const MIN_COORD: i8 = -2;
pub const MAX_COORD: i8 = 2;
const OFFSET: i8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid position {0} is outside [-2, 2]")]
    OutOfBounds(Coord),
    #[error("tile kind index {0} is outside [0, 6)")]
    UnknownKind(i32),
}

/// Grid coordinate; (0, 0) is the centre cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: i8,
    pub y: i8,
}

impl Coord {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    pub const fn in_bounds(self) -> bool {
        self.x >= MIN_COORD && self.x <= MAX_COORD && self.y >= MIN_COORD && self.y <= MAX_COORD
    }

    /// Array slot `(ix, iy)` for this coordinate.
    pub fn index(self) -> Result<(usize, usize), GridError> {
        if !self.in_bounds() {
            return Err(GridError::OutOfBounds(self));
        }
        Ok(((self.x + OFFSET) as usize, (self.y + OFFSET) as usize))
    }

    /// Inverse of [`Coord::index`]; callers pass slots in `0..GRID_SIZE`.
    pub const fn from_index(ix: usize, iy: usize) -> Self {
        Self::new(ix as i8 - OFFSET, iy as i8 - OFFSET)
    }

    /// Every cell, column-major (x outer, y inner).
    pub fn all() -> impl Iterator<Item = Self> {
        (0..GRID_SIZE).flat_map(|ix| (0..GRID_SIZE).map(move |iy| Self::from_index(ix, iy)))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Tile colour; `Wildcard` matches any concrete kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Wildcard,
}

impl TileKind {
    pub const ALL: [Self; 6] = [
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::Yellow,
        Self::Purple,
        Self::Wildcard,
    ];

    /// Persisted code for an empty cell.
    pub const NONE_CODE: i64 = -1;

    pub const fn code(self) -> i64 {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Yellow => 3,
            Self::Purple => 4,
            Self::Wildcard => 5,
        }
    }

    /// `None` for the empty sentinel and for codes this build does not know.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    pub const fn is_wildcard(self) -> bool {
        matches!(self, Self::Wildcard)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u32);

/// A live tile. Copies of it sit in the occupancy arena and in the engine's live list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
    pub pos: Coord,
}

/// The 5x5 cell arena. `cells[ix][iy]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occupancy {
    cells: [[Option<Tile>; GRID_SIZE]; GRID_SIZE],
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pos: Coord) -> Result<Option<Tile>, GridError> {
        let (ix, iy) = pos.index()?;
        Ok(self.at(ix, iy))
    }

    pub fn set(&mut self, pos: Coord, tile: Option<Tile>) -> Result<(), GridError> {
        let (ix, iy) = pos.index()?;
        debug_assert!(tile.is_none_or(|t| t.pos == pos), "tile stored away from its own position");
        if let Some(slot) = self.cells.get_mut(ix).and_then(|col| col.get_mut(iy)) {
            *slot = tile;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cells = [[None; GRID_SIZE]; GRID_SIZE];
    }

    /// True iff all 25 cells hold a tile.
    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_some)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_none)
    }

    /// Occupied cells, in arena order.
    pub fn all_tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        self.cells.iter().flatten().filter_map(|c| *c)
    }

    #[inline]
    pub(crate) fn at(&self, ix: usize, iy: usize) -> Option<Tile> {
        self.cells.get(ix).and_then(|col| col.get(iy)).copied().flatten()
    }

    #[inline]
    pub(crate) fn take_at(&mut self, ix: usize, iy: usize) -> Option<Tile> {
        self.cells
            .get_mut(ix)
            .and_then(|col| col.get_mut(iy))
            .and_then(Option::take)
    }
}
