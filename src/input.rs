//! Key bindings (arrows, WASD, vim) and mouse-drag swipes.

use crate::swipe::Direction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Swipe(Direction),
    /// Enter/space: pick a menu entry, advance a tutorial page.
    Confirm,
    MenuUp,
    MenuDown,
    Pause,
    Restart,
    Home,
    Quit,
    None,
}

impl Action {
    /// Menus are navigated with the same keys that swipe in play.
    pub const fn menu_step(self) -> Option<isize> {
        match self {
            Self::MenuUp | Self::Swipe(Direction::Up) | Self::Swipe(Direction::Left) => Some(-1),
            Self::MenuDown | Self::Swipe(Direction::Down) | Self::Swipe(Direction::Right) => {
                Some(1)
            }
            _ => None,
        }
    }
}

/// Map key event to game action. Supports arrows, WASD and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc | KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('r') => Action::Restart,
        KeyCode::Char('m') => Action::Home,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Confirm,
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('k') => Action::Swipe(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('j') => Action::Swipe(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => Action::Swipe(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => {
            Action::Swipe(Direction::Right)
        }
        KeyCode::Tab => Action::MenuDown,
        KeyCode::BackTab => Action::MenuUp,
        _ => Action::None,
    }
}

/// Drag between two terminal cells as a vector in board space. Rows grow downward on screen
/// and cells are about twice as tall as wide, so `dy` is flipped and `dx` halved.
pub fn drag_vector(start: (u16, u16), end: (u16, u16)) -> (f32, f32) {
    let dx = (f32::from(end.0) - f32::from(start.0)) / 2.0;
    let dy = f32::from(start.1) - f32::from(end.1);
    (dx, dy)
}

/// Minimum drag length, in board-space cells, that counts as a swipe.
pub const MIN_DRAG: f32 = 1.5;

pub fn drag_direction(start: (u16, u16), end: (u16, u16)) -> Option<Direction> {
    let (dx, dy) = drag_vector(start, end);
    Direction::from_vector(dx, dy, MIN_DRAG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new_with_kind(code, modifiers, KeyEventKind::Press)
    }

    #[test]
    fn test_every_layout_swipes() {
        for (code, dir) in [
            (KeyCode::Up, Direction::Up),
            (KeyCode::Char('w'), Direction::Up),
            (KeyCode::Char('k'), Direction::Up),
            (KeyCode::Char('a'), Direction::Left),
            (KeyCode::Char('j'), Direction::Down),
            (KeyCode::Right, Direction::Right),
        ] {
            assert_eq!(key_to_action(press(code, KeyModifiers::NONE)), Action::Swipe(dir));
        }
    }

    #[test]
    fn test_modifiers() {
        assert_eq!(
            key_to_action(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(press(KeyCode::Char('w'), KeyModifiers::ALT)),
            Action::None
        );
        assert_eq!(
            key_to_action(press(KeyCode::Char('W'), KeyModifiers::SHIFT)),
            Action::None
        );
        assert_eq!(
            key_to_action(press(KeyCode::Esc, KeyModifiers::NONE)),
            Action::Pause
        );
    }

    #[test]
    fn test_drag_direction() {
        assert_eq!(drag_direction((10, 10), (20, 11)), Some(Direction::Right));
        assert_eq!(drag_direction((10, 10), (10, 4)), Some(Direction::Up));
        assert_eq!(drag_direction((10, 10), (11, 10)), None);
        assert_eq!(drag_direction((10, 10), (16, 7)), None);
    }

    #[test]
    fn test_menu_step() {
        assert_eq!(Action::Swipe(Direction::Down).menu_step(), Some(1));
        assert_eq!(Action::MenuUp.menu_step(), Some(-1));
        assert_eq!(Action::Confirm.menu_step(), None);
    }
}
