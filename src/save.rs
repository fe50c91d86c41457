//! Logical save schema on top of a [`KeyValueStore`].
//!
//! `Grid{x}{y}` holds a tile code per cell (slot indices, `-1` for empty), alongside
//! `CurrentScore`, `HighScore` and `LastGameOver` (1 while a game is in progress).

use crate::grid::{Coord, GRID_SIZE, Occupancy, TileKind};
use crate::score::MAX_SCORE;
use crate::store::KeyValueStore;

pub const CURRENT_SCORE_KEY: &str = "CurrentScore";
pub const HIGH_SCORE_KEY: &str = "HighScore";
pub const LAST_GAME_OVER_KEY: &str = "LastGameOver";

pub fn grid_key(ix: usize, iy: usize) -> String {
    format!("Grid{}{}", ix, iy)
}

pub fn write_grid<S: KeyValueStore + ?Sized>(store: &mut S, occupancy: &Occupancy) {
    for ix in 0..GRID_SIZE {
        for iy in 0..GRID_SIZE {
            let code = occupancy
                .at(ix, iy)
                .map_or(TileKind::NONE_CODE, |t| t.kind.code());
            store.set_int(&grid_key(ix, iy), code);
        }
    }
}

/// Saved cells holding a known tile kind.
pub fn read_grid<S: KeyValueStore + ?Sized>(store: &S) -> Vec<(Coord, TileKind)> {
    let mut cells = Vec::new();
    for ix in 0..GRID_SIZE {
        for iy in 0..GRID_SIZE {
            let code = store
                .get_int(&grid_key(ix, iy))
                .unwrap_or(TileKind::NONE_CODE);
            if let Some(kind) = TileKind::from_code(code) {
                cells.push((Coord::from_index(ix, iy), kind));
            }
        }
    }
    cells
}

fn read_score<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> u32 {
    store
        .get_int(key)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
        .min(MAX_SCORE)
}

pub fn read_current_score<S: KeyValueStore + ?Sized>(store: &S) -> u32 {
    read_score(store, CURRENT_SCORE_KEY)
}

pub fn write_current_score<S: KeyValueStore + ?Sized>(store: &mut S, score: u32) {
    store.set_int(CURRENT_SCORE_KEY, i64::from(score));
}

pub fn read_high_score<S: KeyValueStore + ?Sized>(store: &S) -> u32 {
    read_score(store, HIGH_SCORE_KEY)
}

pub fn write_high_score<S: KeyValueStore + ?Sized>(store: &mut S, score: u32) {
    store.set_int(HIGH_SCORE_KEY, i64::from(score));
}

/// True when the last session ended without a game over and can be resumed.
pub fn has_saved_game<S: KeyValueStore + ?Sized>(store: &S) -> bool {
    store.get_int(LAST_GAME_OVER_KEY).unwrap_or(0) == 1
}

pub fn set_game_in_progress<S: KeyValueStore + ?Sized>(store: &mut S, in_progress: bool) {
    store.set_int(LAST_GAME_OVER_KEY, i64::from(in_progress));
}
