//! App: terminal init, screens, main loop, spawn and explosion timing.

use crate::GameConfig;
use crate::engine::{EventQueue, GameEvent, GridEngine, SeededRandom, StartMode};
use crate::grid::TileId;
use crate::input::{Action, drag_direction, key_to_action};
use crate::store::KeyValueStore;
use crate::swipe::Direction;
use crate::theme::Theme;
use crate::ui::{self, BoardView, TUTORIAL_PAGES};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info};

/// How long a feedback message stays in the sidebar.
const TOAST_MS: u64 = 1500;
/// ~60 FPS.
const FRAME: Duration = Duration::from_millis(16);

pub type Engine = GridEngine<SeededRandom, EventQueue, Box<dyn KeyValueStore>>;

/// A fixed list of menu entries cycled with the movement keys.
pub trait MenuOption: Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    fn step(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let at = Self::ALL.iter().position(|o| *o == self).unwrap_or(0) as isize;
        Self::ALL[(at + delta).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeOption {
    Play,
    Tutorial,
    Quit,
}

impl MenuOption for HomeOption {
    const ALL: &'static [Self] = &[Self::Play, Self::Tutorial, Self::Quit];

    fn label(self) -> &'static str {
        match self {
            Self::Play => "Play",
            Self::Tutorial => "Tutorial",
            Self::Quit => "Quit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueOption {
    Continue,
    NewGame,
}

impl MenuOption for ContinueOption {
    const ALL: &'static [Self] = &[Self::Continue, Self::NewGame];

    fn label(self) -> &'static str {
        match self {
            Self::Continue => "Continue",
            Self::NewGame => "New game",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOption {
    Resume,
    Forfeit,
    Home,
}

impl MenuOption for PauseOption {
    const ALL: &'static [Self] = &[Self::Resume, Self::Forfeit, Self::Home];

    fn label(self) -> &'static str {
        match self {
            Self::Resume => "Resume",
            Self::Forfeit => "Forfeit",
            Self::Home => "Home",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home(HomeOption),
    /// Shown when Play is picked while a saved game exists.
    ContinuePrompt(ContinueOption),
    Tutorial(usize),
    Playing,
    Paused(PauseOption),
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    engine: Engine,
    screen: Screen,
    /// When the pending swipe gets its spawn and resolution pass.
    settle_at: Option<Instant>,
    /// Dying tiles and when to release them.
    removals: Vec<(TileId, Instant)>,
    /// When the latest batch of dying tiles starts fading.
    fade_at: Option<Instant>,
    /// TachyonFX fade over the dying tiles (rebuilt whenever a new batch explodes).
    explosion_effect: Option<Effect>,
    explosion_process_time: Option<Instant>,
    toast: Option<(String, Instant)>,
    last_swipe: Option<Direction>,
    drag_start: Option<(u16, u16)>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, store: Box<dyn KeyValueStore>) -> Result<Self> {
        let engine = GridEngine::new(SeededRandom::new(config.seed), EventQueue::new(), store);
        let no_menu = config.no_menu;
        let mut app = Self {
            config,
            theme,
            engine,
            screen: Screen::Home(HomeOption::Play),
            settle_at: None,
            removals: Vec::new(),
            fade_at: None,
            explosion_effect: None,
            explosion_process_time: None,
            toast: None,
            last_swipe: None,
            drag_start: None,
        };
        if no_menu {
            let mode = if app.config.new_game {
                StartMode::Fresh
            } else {
                StartMode::Resume
            };
            app.start_game(mode)?;
        }
        Ok(app)
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self
            .run_loop(&mut terminal)
            .and_then(|()| self.finish_pending(Instant::now()));

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            self.tick(now)?;

            let view = BoardView {
                theme: &self.theme,
                tiles: self.engine.tiles(),
                dying: self.engine.dying(),
                score: self.engine.score(),
                high_score: self.engine.high_score(),
                record_set: self.engine.record_set(),
                toast: self.toast.as_ref().map(|(text, _)| text.as_str()),
                last_swipe: self.last_swipe,
                can_swipe: self.engine.can_swipe(),
                animate: self.config.animate,
                fading: self.fade_started(now),
                fade_ms: self.explosion_delay_ms(),
            };
            let screen = self.screen;
            let explosion_effect = &mut self.explosion_effect;
            let explosion_process_time = &mut self.explosion_process_time;
            terminal.draw(|f| {
                ui::draw(
                    f,
                    screen,
                    &view,
                    f.area(),
                    explosion_effect,
                    explosion_process_time,
                    now,
                );
            })?;

            let timeout = FRAME.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            let flow =
                                self.handle_key(key.code, key_to_action(key), Instant::now())?;
                            if flow == Flow::Quit {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => self.handle_mouse(mouse, Instant::now())?,
                        _ => {}
                    }
                }
            }
        }
    }

    fn explosion_delay_ms(&self) -> u32 {
        u32::try_from(self.config.explosion_delay_ms).unwrap_or(u32::MAX)
    }

    /// A matched tile holds still for one explosion delay, fades for another, then is released.
    fn fade_started(&self, now: Instant) -> bool {
        self.fade_at.is_some_and(|at| now >= at)
    }

    fn start_game(&mut self, mode: StartMode) -> Result<()> {
        self.settle_at = None;
        self.removals.clear();
        self.fade_at = None;
        self.explosion_effect = None;
        self.explosion_process_time = None;
        self.toast = None;
        self.last_swipe = None;
        self.screen = Screen::Playing;
        self.engine.start(mode)?;
        self.process_events(Instant::now());
        Ok(())
    }

    /// Home → Play: offer to continue a saved game unless told to start fresh.
    fn play(&mut self) -> Result<()> {
        if self.engine.has_saved_game() && !self.config.new_game {
            self.screen = Screen::ContinuePrompt(ContinueOption::Continue);
            Ok(())
        } else {
            self.start_game(StartMode::Fresh)
        }
    }

    fn swipe(&mut self, direction: Direction, now: Instant) -> Result<()> {
        if self.config.spawn_delay_ms == 0 {
            if let Some(report) = self.engine.swipe_and_settle(direction)? {
                self.last_swipe = Some(direction);
                debug!(
                    matches = report.matches.len(),
                    points = report.score_added,
                    "settled"
                );
                self.process_events(now);
            }
            return Ok(());
        }
        if self.engine.swipe(direction)? {
            self.last_swipe = Some(direction);
            self.settle_at = Some(now + Duration::from_millis(self.config.spawn_delay_ms));
        }
        Ok(())
    }

    fn settle(&mut self, now: Instant) -> Result<()> {
        self.settle_at = None;
        if let Some(report) = self.engine.settle()? {
            debug!(
                matches = report.matches.len(),
                points = report.score_added,
                "settled"
            );
        }
        self.process_events(now);
        Ok(())
    }

    /// Run a spawn that is still waiting on its delay, so the save reflects the board.
    fn finish_pending(&mut self, now: Instant) -> Result<()> {
        if self.settle_at.is_some() {
            self.settle(now)?;
        }
        Ok(())
    }

    fn process_events(&mut self, now: Instant) {
        let delay = Duration::from_millis(self.config.explosion_delay_ms);
        for event in self.engine.presentation_mut().drain() {
            match event {
                GameEvent::Explode(tile) if self.config.animate => {
                    self.fade_at = Some(now + delay);
                    self.removals.push((tile.id, now + delay + delay));
                    self.explosion_effect = None;
                    self.explosion_process_time = None;
                }
                GameEvent::Explode(tile) => {
                    self.engine.finish_removal(tile.id);
                }
                GameEvent::Score(_) => {}
                GameEvent::Message(text) => self.toast = Some((text, now)),
                GameEvent::GameOver => {
                    info!(score = self.engine.score(), "showing game over");
                    self.screen = Screen::GameOver;
                }
            }
        }
    }

    fn tick(&mut self, now: Instant) -> Result<()> {
        if self.settle_at.is_some_and(|at| now >= at) {
            self.settle(now)?;
        }

        let (due, pending): (Vec<_>, Vec<_>) =
            self.removals.drain(..).partition(|(_, at)| now >= *at);
        self.removals = pending;
        for (id, _) in due {
            self.engine.finish_removal(id);
        }
        if self.engine.dying().is_empty() {
            self.fade_at = None;
            self.explosion_effect = None;
            self.explosion_process_time = None;
        }

        let toast_ttl = Duration::from_millis(TOAST_MS);
        if self
            .toast
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) >= toast_ttl)
        {
            self.toast = None;
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, action: Action, now: Instant) -> Result<Flow> {
        match self.screen {
            Screen::Home(selected) => match action {
                Action::Quit => return Ok(Flow::Quit),
                Action::Confirm => match selected {
                    HomeOption::Play => self.play()?,
                    HomeOption::Tutorial => self.screen = Screen::Tutorial(0),
                    HomeOption::Quit => return Ok(Flow::Quit),
                },
                _ => {
                    if let Some(step) = action.menu_step() {
                        self.screen = Screen::Home(selected.step(step));
                    }
                }
            },
            Screen::ContinuePrompt(selected) => match action {
                Action::Confirm => {
                    let mode = match selected {
                        ContinueOption::Continue => StartMode::Resume,
                        ContinueOption::NewGame => StartMode::Fresh,
                    };
                    self.start_game(mode)?;
                }
                Action::Quit | Action::Pause | Action::Home => {
                    self.screen = Screen::Home(HomeOption::Play);
                }
                _ => {
                    if let Some(step) = action.menu_step() {
                        self.screen = Screen::ContinuePrompt(selected.step(step));
                    }
                }
            },
            Screen::Tutorial(page) => match action {
                Action::Confirm | Action::Swipe(Direction::Right) => {
                    self.screen = if page + 1 < TUTORIAL_PAGES.len() {
                        Screen::Tutorial(page + 1)
                    } else {
                        Screen::Home(HomeOption::Play)
                    };
                }
                Action::Swipe(Direction::Left) => {
                    self.screen = Screen::Tutorial(page.saturating_sub(1));
                }
                Action::Quit | Action::Pause | Action::Home => {
                    self.screen = Screen::Home(HomeOption::Tutorial);
                }
                _ => {}
            },
            Screen::Playing => match action {
                Action::Swipe(direction) => self.swipe(direction, now)?,
                Action::Pause => {
                    self.finish_pending(now)?;
                    // The pending spawn may have filled the board.
                    if self.screen == Screen::Playing {
                        self.screen = Screen::Paused(PauseOption::Resume);
                    }
                }
                Action::Quit => return Ok(Flow::Quit),
                _ => {}
            },
            Screen::Paused(selected) => match action {
                Action::Pause => self.screen = Screen::Playing,
                Action::Quit => return Ok(Flow::Quit),
                Action::Confirm => match selected {
                    PauseOption::Resume => self.screen = Screen::Playing,
                    PauseOption::Forfeit => {
                        self.engine.forfeit();
                        self.process_events(now);
                    }
                    PauseOption::Home => self.screen = Screen::Home(HomeOption::Play),
                },
                _ => {
                    if let Some(step) = action.menu_step() {
                        self.screen = Screen::Paused(selected.step(step));
                    }
                }
            },
            Screen::GameOver => match (action, code) {
                (Action::Quit, _) => return Ok(Flow::Quit),
                (Action::Restart, _) => self.start_game(StartMode::Fresh)?,
                (Action::Home, _) | (_, KeyCode::Char('h')) => {
                    self.screen = Screen::Home(HomeOption::Play);
                }
                _ => {}
            },
        }
        Ok(Flow::Continue)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) -> Result<()> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag_start = Some((mouse.column, mouse.row));
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let Some(start) = self.drag_start.take() else {
                    return Ok(());
                };
                if self.screen != Screen::Playing {
                    return Ok(());
                }
                if let Some(direction) = drag_direction(start, (mouse.column, mouse.row)) {
                    self.swipe(direction, now)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Phase, Presentation};
    use crate::grid::{Coord, Tile, TileKind};
    use crate::store::MemoryStore;
    use crossterm::event::KeyModifiers;

    fn config() -> GameConfig {
        GameConfig {
            seed: Some(3),
            spawn_delay_ms: 0,
            explosion_delay_ms: 0,
            animate: false,
            new_game: false,
            no_menu: false,
        }
    }

    fn app(config: GameConfig) -> App {
        App::new(config, Theme::default(), Box::new(MemoryStore::new())).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> Flow {
        let key = crossterm::event::KeyEvent::new(code, KeyModifiers::NONE);
        app.handle_key(code, key_to_action(key), Instant::now()).unwrap()
    }

    #[test]
    fn test_menu_step_wraps() {
        assert_eq!(HomeOption::Play.step(-1), HomeOption::Quit);
        assert_eq!(HomeOption::Quit.step(1), HomeOption::Play);
        assert_eq!(PauseOption::Resume.step(2), PauseOption::Home);
    }

    #[test]
    fn test_play_without_save_starts_fresh() {
        let mut a = app(config());
        assert_eq!(a.screen, Screen::Home(HomeOption::Play));
        press(&mut a, KeyCode::Enter);
        assert_eq!(a.screen, Screen::Playing);
        assert_eq!(a.engine.phase(), Phase::Playing);
        assert!(a.engine.has_saved_game());
    }

    #[test]
    fn test_saved_game_offers_continue() {
        let mut a = app(config());
        press(&mut a, KeyCode::Enter);
        press(&mut a, KeyCode::Char('p'));
        assert_eq!(a.screen, Screen::Paused(PauseOption::Resume));
        press(&mut a, KeyCode::Down);
        press(&mut a, KeyCode::Down);
        press(&mut a, KeyCode::Enter);
        assert_eq!(a.screen, Screen::Home(HomeOption::Play));
        press(&mut a, KeyCode::Enter);
        assert_eq!(a.screen, Screen::ContinuePrompt(ContinueOption::Continue));
        let tiles = a.engine.tiles().len();
        press(&mut a, KeyCode::Enter);
        assert_eq!(a.screen, Screen::Playing);
        assert_eq!(a.engine.tiles().len(), tiles);
    }

    #[test]
    fn test_forfeit_shows_game_over() {
        let mut a = app(config());
        press(&mut a, KeyCode::Enter);
        press(&mut a, KeyCode::Esc);
        press(&mut a, KeyCode::Down);
        press(&mut a, KeyCode::Enter);
        assert_eq!(a.screen, Screen::GameOver);
        assert!(!a.engine.has_saved_game());
        press(&mut a, KeyCode::Char('r'));
        assert_eq!(a.screen, Screen::Playing);
    }

    #[test]
    fn test_tutorial_returns_home_after_last_page() {
        let mut a = app(config());
        press(&mut a, KeyCode::Down);
        press(&mut a, KeyCode::Enter);
        assert_eq!(a.screen, Screen::Tutorial(0));
        for _ in 0..TUTORIAL_PAGES.len() {
            press(&mut a, KeyCode::Enter);
        }
        assert_eq!(a.screen, Screen::Home(HomeOption::Play));
    }

    #[test]
    fn test_spawn_waits_for_delay() {
        let mut a = app(GameConfig {
            spawn_delay_ms: 200,
            no_menu: true,
            ..config()
        });
        assert_eq!(a.screen, Screen::Playing);
        let start = Instant::now();
        let mut swiped = false;
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            a.swipe(dir, start).unwrap();
            if a.settle_at.is_some() {
                swiped = true;
                break;
            }
        }
        assert!(swiped);
        assert!(!a.engine.can_swipe());
        a.tick(start + Duration::from_millis(100)).unwrap();
        assert!(a.engine.settle_pending());
        a.tick(start + Duration::from_millis(200)).unwrap();
        assert!(!a.engine.settle_pending());
        assert!(a.settle_at.is_none());
    }

    #[test]
    fn test_zero_spawn_delay_settles_within_the_swipe() {
        let mut a = app(GameConfig {
            no_menu: true,
            ..config()
        });
        a.swipe(Direction::Up, Instant::now()).unwrap();
        assert_eq!(a.last_swipe, Some(Direction::Up));
        assert!(a.settle_at.is_none());
        assert!(!a.engine.settle_pending());
        if a.screen == Screen::Playing {
            assert!(a.engine.can_swipe());
        }
    }

    #[test]
    fn test_explosion_fades_after_one_delay_and_releases_after_two() {
        let mut a = app(GameConfig {
            explosion_delay_ms: 100,
            animate: true,
            no_menu: true,
            ..config()
        });
        let tile = Tile {
            id: TileId(99),
            kind: TileKind::Red,
            pos: Coord::new(0, 0),
        };
        let start = Instant::now();
        a.engine.presentation_mut().explode(&tile);
        a.process_events(start);
        assert!(!a.fade_started(start));
        assert!(!a.fade_started(start + Duration::from_millis(99)));
        assert!(a.fade_started(start + Duration::from_millis(100)));
        assert_eq!(a.removals, vec![(TileId(99), start + Duration::from_millis(200))]);
    }

    #[test]
    fn test_quit_from_home() {
        let mut a = app(config());
        assert_eq!(press(&mut a, KeyCode::Char('q')), Flow::Quit);
    }
}
