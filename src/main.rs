//! swipetui: swipe-and-match tile puzzle on a 5x5 board in the terminal.

mod app;
mod engine;
mod grid;
mod input;
mod matching;
mod save;
mod score;
mod store;
mod swipe;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use store::{FileStore, KeyValueStore, MemoryStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Options derived from CLI that affect game behaviour (seed, timing, animation, start mode).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seed: Option<u64>,
    pub spawn_delay_ms: u64,
    pub explosion_delay_ms: u64,
    pub animate: bool,
    pub new_game: bool,
    pub no_menu: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let store: Box<dyn KeyValueStore> = if args.no_save {
        Box::new(MemoryStore::new())
    } else {
        let path = args.save_file.clone().unwrap_or_else(store::default_save_path);
        let file_store = FileStore::open(&path)
            .with_context(|| format!("could not open save file {}", path.display()))?;
        info!(path = %file_store.path().display(), "using save file");
        Box::new(file_store)
    };
    let config = GameConfig {
        seed: args.seed,
        spawn_delay_ms: args.spawn_delay_ms,
        explosion_delay_ms: args.explosion_delay_ms,
        animate: !args.no_animation,
        new_game: args.new_game,
        no_menu: args.no_menu,
    };
    info!(?config, "starting swipetui");
    let mut app = App::new(config, theme, store)?;
    app.run()?;
    Ok(())
}

/// Logs go to a file only: stdout belongs to the terminal UI.
fn init_logging(path: Option<&std::path::Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("could not open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Swipe-and-match tile puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "swipetui",
    version,
    about = "Swipe-and-match tile puzzle on a 5x5 board in the terminal.",
    long_about = "swipetui is a terminal puzzle game on a 5x5 board.\n\n\
        Every swipe slides all tiles toward one edge, then a new tile drops in. Line up 3, 4 \
        or 5 tiles of one colour, or fill a 2x2 square, to clear them and score. The white \
        wildcard counts as any colour. The game ends when the board is full.\n\n\
        CONTROLS:\n  Arrows / WASD / hjkl  Swipe     Mouse drag  Swipe\n  \
        Enter / Space         Select    P / Esc     Pause     Q  Quit\n\n\
        Progress is saved after every move; pick Play again to continue. Use --theme to load \
        a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Seed for tile spawns (reproducible sessions). Random if not set.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Delay in ms between a swipe and the new tile spawning.
    #[arg(long, default_value = "200", value_name = "MS")]
    pub spawn_delay_ms: u64,

    /// Explosion delay in ms; matched tiles stay on screen for two of these.
    #[arg(long, default_value = "200", value_name = "MS")]
    pub explosion_delay_ms: u64,

    /// Save file (key=value lines). Defaults to $XDG_CONFIG_HOME/swipetui/save.
    #[arg(long, value_name = "FILE")]
    pub save_file: Option<PathBuf>,

    /// Keep everything in memory; nothing is read from or written to disk.
    #[arg(long, conflicts_with = "save_file")]
    pub no_save: bool,

    /// Always start a new game instead of offering to continue the saved one.
    #[arg(long)]
    pub new_game: bool,

    /// Skip the home menu and start playing immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the explosion fade (matched tiles vanish instantly).
    #[arg(long)]
    pub no_animation: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["swipetui"]);
        assert_eq!(args.spawn_delay_ms, 200);
        assert_eq!(args.explosion_delay_ms, 200);
        assert_eq!(args.palette, Palette::Normal);
        assert!(args.seed.is_none());
        assert!(!args.no_save);
    }

    #[test]
    fn test_palette_aliases() {
        let args = Args::parse_from(["swipetui", "--palette", "colourblind", "--seed", "9"]);
        assert_eq!(args.palette, Palette::Colorblind);
        assert_eq!(args.seed, Some(9));
    }

    #[test]
    fn test_no_save_conflicts_with_save_file() {
        assert!(Args::try_parse_from(["swipetui", "--no-save", "--save-file", "x"]).is_err());
    }
}
