//! Grid engine: swipe gate, spawning, resolution passes, game over, save and restore.
//!
//! One settle cycle is swipe → (caller's spawn delay) → [`GridEngine::settle`], which spawns
//! a tile, resolves matches, saves, checks for a full grid and reopens the swipe gate.
//! Collaborators are injected: a [`RandomSource`], a [`Presentation`] sink and a
//! [`KeyValueStore`].

use crate::grid::{Coord, GridError, MAX_COORD, MIN_COORD, Occupancy, Tile, TileId, TileKind};
use crate::matching::{self, Match};
use crate::save;
use crate::score::{FeedbackTier, NEW_HIGH_SCORE_MESSAGE, ScoreChange, Scoreboard};
use crate::store::KeyValueStore;
use crate::swipe::{self, Direction};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

/// A fresh game starts with a tile count drawn from `[2, 4)`.
const INITIAL_TILES_MIN: i32 = 2;
const INITIAL_TILES_MAX: i32 = 4;

pub trait RandomSource {
    /// Uniform integer in `[min, max)`.
    fn range(&mut self, min: i32, max: i32) -> i32;
}

/// `SmallRng`-backed source; seeded for reproducible sessions, entropy otherwise.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: SmallRng,
}

impl SeededRandom {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64);
        Self { rng }
    }
}

impl RandomSource for SeededRandom {
    fn range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }
}

/// Values that do not fit `i8` saturate, so they still land outside the grid.
fn coord_component(value: i32) -> i8 {
    i8::try_from(value).unwrap_or(if value < 0 { i8::MIN } else { i8::MAX })
}

/// Fire-and-forget notifications for whatever draws the game.
pub trait Presentation {
    fn explode(&mut self, tile: &Tile);
    fn score_changed(&mut self, score: u32);
    fn message(&mut self, text: &str);
    fn game_over(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Explode(Tile),
    Score(u32),
    Message(String),
    GameOver,
}

/// Presentation sink that buffers events for the frame loop to drain.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Presentation for EventQueue {
    fn explode(&mut self, tile: &Tile) {
        self.events.push(GameEvent::Explode(*tile));
    }

    fn score_changed(&mut self, score: u32) {
        self.events.push(GameEvent::Score(score));
    }

    fn message(&mut self, text: &str) {
        self.events.push(GameEvent::Message(text.to_string()));
    }

    fn game_over(&mut self) {
        self.events.push(GameEvent::GameOver);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Restore the saved game if one is in progress, else start fresh.
    Resume,
    Fresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, `start` not called yet.
    Idle,
    Playing,
    Over,
}

/// What one resolution pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub matches: Vec<Match>,
    pub score_added: u32,
    pub feedback: Option<&'static str>,
}

pub struct GridEngine<R, P, S> {
    random: R,
    presentation: P,
    store: S,
    occupancy: Occupancy,
    /// Live tiles; rebuilt from the arena at the end of every pass.
    tiles: Vec<Tile>,
    /// Matched tiles already off the grid, waiting for the caller to release them.
    dying: Vec<Tile>,
    scoreboard: Scoreboard,
    score_added: u32,
    can_swipe: bool,
    settle_pending: bool,
    phase: Phase,
    next_id: u32,
}

impl<R: RandomSource, P: Presentation, S: KeyValueStore> GridEngine<R, P, S> {
    pub fn new(random: R, presentation: P, store: S) -> Self {
        let high_score = save::read_high_score(&store);
        Self {
            random,
            presentation,
            store,
            occupancy: Occupancy::new(),
            tiles: Vec::new(),
            dying: Vec::new(),
            scoreboard: Scoreboard::new(high_score),
            score_added: 0,
            can_swipe: false,
            settle_pending: false,
            phase: Phase::Idle,
            next_id: 0,
        }
    }

    pub fn start(&mut self, mode: StartMode) -> Result<(), GridError> {
        self.occupancy.clear();
        self.tiles.clear();
        self.dying.clear();
        self.score_added = 0;
        self.can_swipe = false;
        self.settle_pending = false;
        self.phase = Phase::Playing;
        self.scoreboard.reset_session();

        if mode == StartMode::Resume && save::has_saved_game(&self.store) {
            let cells = save::read_grid(&self.store);
            info!(tiles = cells.len(), "resuming saved game");
            for (pos, kind) in cells {
                self.spawn_at(pos, kind)?;
            }
            let change = self.scoreboard.set(save::read_current_score(&self.store));
            self.apply_score_change(change);
            self.resolve_pass();
        } else {
            let count = self.random.range(INITIAL_TILES_MIN, INITIAL_TILES_MAX);
            info!(initial_tiles = count, "starting fresh game");
            let change = self.scoreboard.set(0);
            self.apply_score_change(change);
            for _ in 0..count {
                self.spawn_random()?;
                self.resolve_pass();
            }
        }

        save::set_game_in_progress(&mut self.store, true);
        self.save();
        if self.occupancy.is_full() {
            self.end_game();
        } else {
            self.can_swipe = true;
        }
        Ok(())
    }

    /// Reposition every tile toward `direction` and close the swipe gate until
    /// [`settle`](Self::settle). Returns false when the gate is closed or the game is not running.
    pub fn swipe(&mut self, direction: Direction) -> Result<bool, GridError> {
        if self.phase != Phase::Playing || !self.can_swipe {
            debug!(?direction, "swipe ignored");
            return Ok(false);
        }
        let moved = swipe::sweep(&mut self.occupancy, &mut self.tiles, direction)?;
        debug!(?direction, moved, "swiped");
        self.can_swipe = false;
        self.settle_pending = true;
        Ok(true)
    }

    /// Second half of the cycle. `None` when no swipe is waiting.
    pub fn settle(&mut self) -> Result<Option<PassReport>, GridError> {
        if !self.settle_pending {
            return Ok(None);
        }
        self.settle_pending = false;
        self.spawn_random()?;
        let report = self.resolve_pass();
        self.save();
        if self.occupancy.is_full() {
            self.end_game();
        }
        self.can_swipe = true;
        Ok(Some(report))
    }

    pub fn swipe_and_settle(
        &mut self,
        direction: Direction,
    ) -> Result<Option<PassReport>, GridError> {
        if !self.swipe(direction)? {
            return Ok(None);
        }
        self.settle()
    }

    /// End the running game as if the grid had filled.
    pub fn forfeit(&mut self) {
        if self.phase == Phase::Playing {
            info!("game forfeited");
            self.end_game();
        }
    }

    /// Place a tile of random kind at a random cell. An occupied pick is skipped, not retried.
    pub fn spawn_random(&mut self) -> Result<Option<Tile>, GridError> {
        let lo = i32::from(MIN_COORD);
        let hi = i32::from(MAX_COORD) + 1;
        let x = coord_component(self.random.range(lo, hi));
        let y = coord_component(self.random.range(lo, hi));
        let pos = Coord::new(x, y);
        if self.occupancy.get(pos)?.is_some() {
            debug!(%pos, "spawn skipped, cell occupied");
            return Ok(None);
        }
        let index = self.random.range(0, TileKind::ALL.len() as i32);
        let kind = usize::try_from(index)
            .ok()
            .and_then(|i| TileKind::ALL.get(i))
            .copied()
            .ok_or(GridError::UnknownKind(index))?;
        self.place(pos, kind).map(Some)
    }

    /// Restore-mode spawn: put `kind` at `pos` unconditionally, replacing any occupant.
    pub fn spawn_at(&mut self, pos: Coord, kind: TileKind) -> Result<Tile, GridError> {
        if let Some(existing) = self.occupancy.get(pos)? {
            self.tiles.retain(|t| t.id != existing.id);
        }
        self.place(pos, kind)
    }

    fn place(&mut self, pos: Coord, kind: TileKind) -> Result<Tile, GridError> {
        let tile = Tile {
            id: TileId(self.next_id),
            kind,
            pos,
        };
        self.occupancy.set(pos, Some(tile))?;
        self.next_id = self.next_id.wrapping_add(1);
        self.tiles.push(tile);
        debug!(%pos, ?kind, "spawned tile");
        Ok(tile)
    }

    fn resolve_pass(&mut self) -> PassReport {
        let matches = matching::resolve_matches(&mut self.occupancy);
        for m in &matches {
            for tile in &m.tiles {
                self.presentation.explode(tile);
                self.dying.push(*tile);
            }
            debug!(shape = ?m.shape, points = m.points(), "match cleared");
            self.score_added = self.score_added.saturating_add(m.points());
            let change = self.scoreboard.add(m.points());
            self.apply_score_change(change);
        }
        self.tiles = self.occupancy.all_tiles().collect();

        let score_added = std::mem::take(&mut self.score_added);
        let feedback = FeedbackTier::for_points(score_added).and_then(|tier| {
            let pool = tier.messages();
            let index = self.random.range(0, pool.len() as i32);
            usize::try_from(index)
                .ok()
                .and_then(|i| pool.get(i))
                .copied()
        });
        if let Some(text) = feedback {
            self.presentation.message(text);
        }
        PassReport {
            matches,
            score_added,
            feedback,
        }
    }

    fn apply_score_change(&mut self, change: ScoreChange) {
        self.presentation.score_changed(change.score);
        if change.high_score_beaten {
            save::write_high_score(&mut self.store, change.score);
        }
        if change.announce_record {
            info!(score = change.score, "new high score");
            self.presentation.message(NEW_HIGH_SCORE_MESSAGE);
        }
    }

    fn end_game(&mut self) {
        self.phase = Phase::Over;
        self.settle_pending = false;
        save::set_game_in_progress(&mut self.store, false);
        self.flush_store();
        info!(
            score = self.scoreboard.score(),
            high_score = self.scoreboard.high_score(),
            "game over"
        );
        self.presentation.game_over();
    }

    fn save(&mut self) {
        save::write_grid(&mut self.store, &self.occupancy);
        save::write_current_score(&mut self.store, self.scoreboard.score());
        self.flush_store();
    }

    fn flush_store(&mut self) {
        if let Err(e) = self.store.flush() {
            warn!(error = %e, "could not persist save data");
        }
    }

    /// Release a tile whose removal cue has finished. False if it was not dying.
    pub fn finish_removal(&mut self, id: TileId) -> bool {
        let before = self.dying.len();
        self.dying.retain(|t| t.id != id);
        self.dying.len() != before
    }

    /// A game was left mid-session and [`StartMode::Resume`] would restore it.
    pub fn has_saved_game(&self) -> bool {
        save::has_saved_game(&self.store)
    }

    pub fn dying(&self) -> &[Tile] {
        &self.dying
    }

    #[cfg(test)]
    pub const fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub const fn score(&self) -> u32 {
        self.scoreboard.score()
    }

    pub const fn high_score(&self) -> u32 {
        self.scoreboard.high_score()
    }

    pub const fn record_set(&self) -> bool {
        self.scoreboard.record_set()
    }

    pub const fn can_swipe(&self) -> bool {
        self.can_swipe && matches!(self.phase, Phase::Playing)
    }

    #[cfg(test)]
    pub const fn settle_pending(&self) -> bool {
        self.settle_pending
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    #[cfg(test)]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Arena and live list agree one-to-one.
    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let mut ids: Vec<TileId> = self.tiles.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len() == self.tiles.len()
            && self.tiles.len() == self.occupancy.all_tiles().count()
            && self
                .tiles
                .iter()
                .all(|t| self.occupancy.get(t.pos) == Ok(Some(*t)))
    }
}
