//! Layout and drawing: home menu, tutorial, board, sidebar, pause and game-over overlays.

use crate::app::{MenuOption, Screen};
use crate::grid::{Coord, GRID_SIZE, Tile, TileKind};
use crate::swipe::Direction as Swipe;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells per grid cell. Cells are about twice as tall as wide.
const CELL_WIDTH: u16 = 6;
const CELL_HEIGHT: u16 = 3;
const BOARD_WIDTH: u16 = GRID_SIZE as u16 * CELL_WIDTH + 2;
const BOARD_HEIGHT: u16 = GRID_SIZE as u16 * CELL_HEIGHT + 2;
const SIDEBAR_WIDTH: u16 = 24;

const WILDCARD_GLYPH: &str = "✱";
const EMPTY_GLYPH: &str = "·";

pub const TUTORIAL_PAGES: [(&str, &[&str]); 4] = [
    (
        "Swipe",
        &[
            "Swipe with the arrow keys, WASD,",
            "hjkl or a mouse drag.",
            "",
            "Every tile slides as far as it can",
            "toward that edge.",
        ],
    ),
    (
        "Match",
        &[
            "Line up 3, 4 or 5 tiles of one colour",
            "in a row or column, or fill a 2x2",
            "square, and they explode.",
        ],
    ),
    (
        "Wildcard",
        &[
            "The ✱ tile counts as any colour,",
            "but a window holding two different",
            "colours never matches.",
        ],
    ),
    (
        "Score",
        &[
            "3 in a row  50      4 in a row  100",
            "5 in a row  150     2x2 square  150",
            "",
            "A new tile drops in after every swipe.",
            "The game ends when the board is full.",
        ],
    ),
];

/// Everything the board and sidebar need for one frame.
pub struct BoardView<'a> {
    pub theme: &'a Theme,
    pub tiles: &'a [Tile],
    pub dying: &'a [Tile],
    pub score: u32,
    pub high_score: u32,
    pub record_set: bool,
    pub toast: Option<&'a str>,
    pub last_swipe: Option<Swipe>,
    pub can_swipe: bool,
    pub animate: bool,
    /// Dying tiles have held for one explosion delay and are fading out.
    pub fading: bool,
    /// Fade length for exploding tiles.
    pub fade_ms: u32,
}

/// Draw the current screen. Once dying tiles start fading (and animation is on) the explosion
/// fade is created on demand and advanced by the time since `explosion_process_time`.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    view: &BoardView,
    area: Rect,
    explosion_effect: &mut Option<Effect>,
    explosion_process_time: &mut Option<Instant>,
    now: Instant,
) {
    fill_background(frame.buffer_mut(), area, view.theme);
    match screen {
        Screen::Home(selected) => draw_home(frame, view, area, selected),
        Screen::ContinuePrompt(selected) => {
            draw_home(frame, view, area, crate::app::HomeOption::Play);
            draw_menu_popup(frame, view.theme, area, " Saved game ", selected);
        }
        Screen::Tutorial(page) => draw_tutorial(frame, view.theme, area, page),
        Screen::Playing | Screen::Paused(_) | Screen::GameOver => {
            let (board, sidebar) = game_rects(area);
            let inner = draw_board(frame, view, board);
            if view.animate && view.fading && !view.dying.is_empty() {
                apply_explosion_effect(
                    frame,
                    inner,
                    view,
                    explosion_effect,
                    explosion_process_time,
                    now,
                );
            }
            draw_sidebar(frame, view, sidebar);
            match screen {
                Screen::Paused(selected) => {
                    draw_menu_popup(frame, view.theme, area, " Paused ", selected);
                }
                Screen::GameOver => draw_game_over(frame, view, area),
                _ => {}
            }
        }
    }
}

fn fill_background(buf: &mut Buffer, area: Rect, theme: &Theme) {
    buf.set_style(area.intersection(buf.area), Style::default().bg(theme.bg));
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Board and sidebar side by side, centred in `area`.
fn game_rects(area: Rect) -> (Rect, Rect) {
    let total_w = BOARD_WIDTH + SIDEBAR_WIDTH;
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_HEIGHT),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_WIDTH),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(vert[1]);
    (inner[0], inner[1])
}

/// Screen rect of a grid cell inside the board's inner area. Row 0 on screen is `y = +2`.
fn cell_rect(inner: Rect, pos: Coord) -> Option<Rect> {
    let (ix, iy) = pos.index().ok()?;
    let row = (GRID_SIZE - 1 - iy) as u16;
    Some(Rect {
        x: inner.x + ix as u16 * CELL_WIDTH,
        y: inner.y + row * CELL_HEIGHT,
        width: CELL_WIDTH,
        height: CELL_HEIGHT,
    })
}

/// The coloured face of a tile: one column of margin each side, one row of margin below.
fn tile_face(cell: Rect) -> Rect {
    Rect {
        x: cell.x + 1,
        y: cell.y,
        width: cell.width.saturating_sub(2),
        height: cell.height.saturating_sub(1),
    }
}

fn draw_tile(buf: &mut Buffer, inner: Rect, tile: &Tile, theme: &Theme) {
    let Some(cell) = cell_rect(inner, tile.pos) else {
        return;
    };
    let face = tile_face(cell).intersection(buf.area);
    let colour = theme.tile_color(tile.kind);
    buf.set_style(face, Style::default().bg(colour));
    if tile.kind == TileKind::Wildcard && face.width > 0 && face.height > 0 {
        let glyph_style = Style::default()
            .fg(theme.bg)
            .bg(colour)
            .add_modifier(Modifier::BOLD);
        buf.set_string(
            face.x + face.width / 2,
            face.y + face.height / 2,
            WILDCARD_GLYPH,
            glyph_style,
        );
    }
}

/// Board frame, empty-cell dots, dying tiles underneath and live tiles on top.
/// Returns the inner area the cells occupy.
fn draw_board(frame: &mut Frame, view: &BoardView, area: Rect) -> Rect {
    let theme = view.theme;
    let title = match view.last_swipe {
        Some(dir) if !view.can_swipe => format!(" swipetui {} ", dir.arrow()),
        _ => " swipetui ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    let dot_style = Style::default().fg(theme.inactive_fg).bg(theme.bg);
    for pos in Coord::all() {
        if let Some(cell) = cell_rect(inner, pos) {
            let face = tile_face(cell);
            let (x, y) = (face.x + face.width / 2, face.y + face.height / 2);
            if buf.area.contains(Position::new(x, y)) {
                buf.set_string(x, y, EMPTY_GLYPH, dot_style);
            }
        }
    }
    if view.animate {
        for tile in view.dying {
            draw_tile(buf, inner, tile, theme);
        }
    }
    for tile in view.tiles {
        draw_tile(buf, inner, tile, theme);
    }
    inner
}

/// Buffer positions covered by dying tiles, minus cells a live tile has since moved into.
fn exploding_positions(inner: Rect, view: &BoardView) -> HashSet<(u16, u16)> {
    let live: HashSet<Coord> = view.tiles.iter().map(|t| t.pos).collect();
    let mut out = HashSet::new();
    for tile in view.dying.iter().filter(|t| !live.contains(&t.pos)) {
        if let Some(cell) = cell_rect(inner, tile.pos) {
            let face = tile_face(cell);
            for y in face.top()..face.bottom() {
                for x in face.left()..face.right() {
                    out.insert((x, y));
                }
            }
        }
    }
    out
}

/// Create or advance the explosion fade (dying tile faces fade to the board background).
fn apply_explosion_effect(
    frame: &mut Frame,
    inner: Rect,
    view: &BoardView,
    explosion_effect: &mut Option<Effect>,
    explosion_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = explosion_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *explosion_process_time = Some(now);

    if explosion_effect.is_none() {
        let cells = exploding_positions(inner, view);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            cells.contains(&(pos.x, pos.y))
        }));
        let bg = view.theme.bg;
        let effect = fx::fade_to(bg, bg, (view.fade_ms, Interpolation::Linear))
            .with_filter(filter)
            .with_area(inner);
        *explosion_effect = Some(effect);
    }

    if let Some(effect) = explosion_effect {
        frame.render_effect(effect, inner, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_sidebar(frame: &mut Frame, view: &BoardView, area: Rect) {
    let theme = view.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // score, best
            Constraint::Length(1),
            Constraint::Length(3), // toast
            Constraint::Length(1),
            Constraint::Min(0), // controls
        ])
        .split(area);

    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let best_style = if view.record_set {
        title_style.add_modifier(Modifier::BOLD)
    } else {
        fg_style
    };
    Paragraph::new(Text::from(vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(view.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Best:  ", title_style),
            Span::styled(view.high_score.to_string(), best_style),
        ]),
    ]))
    .render(stats_inner, frame.buffer_mut());

    let toast_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let toast_inner = toast_block.inner(chunks[2]);
    toast_block.render(chunks[2], frame.buffer_mut());
    if let Some(text) = view.toast {
        Paragraph::new(Line::from(Span::styled(
            text,
            title_style.add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(toast_inner, frame.buffer_mut());
    }

    let hint = Style::default().fg(theme.inactive_fg);
    let mut legend: Vec<Span> = vec![Span::styled("Tiles ", hint)];
    for kind in TileKind::ALL {
        let glyph = if kind.is_wildcard() { WILDCARD_GLYPH } else { "■" };
        legend.push(Span::styled(
            format!("{} ", glyph),
            Style::default().fg(theme.tile_color(kind)),
        ));
    }
    Paragraph::new(Text::from(vec![
        Line::from(legend),
        Line::from(""),
        Line::from(Span::styled("←↑↓→ / WASD / hjkl", hint)),
        Line::from(Span::styled("or drag with the mouse", hint)),
        Line::from(Span::styled("P pause   Q quit", hint)),
    ]))
    .render(chunks[4], frame.buffer_mut());
}

fn draw_home(frame: &mut Frame, view: &BoardView, area: Rect, selected: crate::app::HomeOption) {
    let theme = view.theme;
    let popup = centered(area, 36, 14);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg));
    let inner = block.inner(popup);
    block.render(popup, frame.buffer_mut());

    let mut title: Vec<Span> = Vec::new();
    for (letter, kind) in "SWIPE".chars().zip(TileKind::ALL) {
        title.push(Span::styled(
            format!(" {} ", letter),
            Style::default()
                .fg(theme.bg)
                .bg(theme.tile_color(kind))
                .add_modifier(Modifier::BOLD),
        ));
    }
    let lines = vec![
        Line::from(""),
        Line::from(title),
        Line::from(""),
        Line::from(Span::styled(
            format!("Best: {}", view.high_score),
            Style::default().fg(theme.main_fg),
        )),
    ];
    let header = Rect {
        height: 5.min(inner.height),
        ..inner
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(header, frame.buffer_mut());

    let options = Rect {
        y: inner.y + header.height,
        height: inner.height.saturating_sub(header.height),
        ..inner
    };
    draw_options(frame.buffer_mut(), theme, options, selected);
}

/// One option per line pair, selected entry highlighted.
fn draw_options<T: MenuOption>(buf: &mut Buffer, theme: &Theme, area: Rect, selected: T) {
    for (i, opt) in T::ALL.iter().enumerate() {
        let label = format!(" {} ", opt.label());
        let style = if *opt == selected {
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.title)
        };
        let x = area.x + area.width.saturating_sub(label.chars().count() as u16) / 2;
        let y = area.y + 1 + i as u16 * 2;
        if y < area.bottom() {
            buf.set_string(x, y, label, style);
        }
    }
}

fn draw_menu_popup<T: MenuOption>(
    frame: &mut Frame,
    theme: &Theme,
    area: Rect,
    title: &str,
    selected: T,
) {
    let height = T::ALL.len() as u16 * 2 + 3;
    let popup = centered(area, 26, height);
    Clear.render(popup, frame.buffer_mut());
    fill_background(frame.buffer_mut(), popup, theme);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(Span::styled(title, Style::default().fg(theme.title)));
    let inner = block.inner(popup);
    block.render(popup, frame.buffer_mut());
    draw_options(frame.buffer_mut(), theme, inner, selected);
}

fn draw_tutorial(frame: &mut Frame, theme: &Theme, area: Rect, page: usize) {
    let Some((heading, body)) = TUTORIAL_PAGES.get(page) else {
        return;
    };
    let popup = centered(area, 46, 14);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(
            format!(" How to play {}/{} ", page + 1, TUTORIAL_PAGES.len()),
            Style::default().fg(theme.title),
        ));
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            *heading,
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(
        body.iter()
            .map(|l| Line::from(Span::styled(*l, Style::default().fg(theme.main_fg)))),
    );
    let next = if page + 1 < TUTORIAL_PAGES.len() {
        " Enter next   Q back "
    } else {
        " Enter done "
    };
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        next,
        Style::default().fg(theme.inactive_fg),
    )));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block)
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, view: &BoardView, area: Rect) {
    let theme = view.theme;
    let popup = centered(area, 30, 11);
    Clear.render(popup, frame.buffer_mut());
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", view.score),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Best: {} ", view.high_score),
            Style::default().fg(theme.main_fg),
        )),
    ];
    if view.record_set {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " R restart   H home   Q quit ",
        Style::default().fg(theme.main_fg),
    )));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" swipetui ", Style::default().fg(theme.title))),
        )
        .render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileId;

    fn view<'a>(theme: &'a Theme, tiles: &'a [Tile], dying: &'a [Tile]) -> BoardView<'a> {
        BoardView {
            theme,
            tiles,
            dying,
            score: 0,
            high_score: 0,
            record_set: false,
            toast: None,
            last_swipe: None,
            can_swipe: true,
            animate: true,
            fading: false,
            fade_ms: 200,
        }
    }

    fn tile(id: u32, x: i8, y: i8) -> Tile {
        Tile {
            id: TileId(id),
            kind: TileKind::Red,
            pos: Coord::new(x, y),
        }
    }

    #[test]
    fn test_top_row_is_positive_y() {
        let inner = Rect::new(1, 1, 30, 15);
        assert_eq!(cell_rect(inner, Coord::new(-2, 2)).unwrap(), Rect::new(1, 1, 6, 3));
        assert_eq!(cell_rect(inner, Coord::new(2, -2)).unwrap(), Rect::new(25, 13, 6, 3));
        assert_eq!(cell_rect(inner, Coord::new(3, 0)), None);
    }

    #[test]
    fn test_exploding_positions_skip_reoccupied_cells() {
        let theme = Theme::default();
        let live = [tile(1, 0, 0)];
        let dying = [tile(2, 0, 0), tile(3, 1, 0)];
        let v = view(&theme, &live, &dying);
        let cells = exploding_positions(Rect::new(0, 0, 30, 15), &v);
        // One face of 4x2 cells.
        assert_eq!(cells.len(), 8);
        assert!(cells.contains(&(19, 6)));
        assert!(!cells.contains(&(13, 6)));
    }

    #[test]
    fn test_game_rects_fit_board_and_sidebar() {
        let (board, sidebar) = game_rects(Rect::new(0, 0, 100, 40));
        assert_eq!(board.width, BOARD_WIDTH);
        assert_eq!(board.height, BOARD_HEIGHT);
        assert_eq!(sidebar.x, board.right());
    }

    #[test]
    fn test_every_tutorial_page_has_text() {
        for (heading, body) in TUTORIAL_PAGES {
            assert!(!heading.is_empty());
            assert!(!body.is_empty());
        }
    }
}
