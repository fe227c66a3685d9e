//! blocktui: classic falling-block puzzle game in the terminal.

mod app;
mod board;
mod game;
mod input;
mod piece;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use std::process::ExitCode;
use std::time::Duration;

/// Options derived from CLI that the game session needs.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub speed: Speed,
    pub seed: Option<u64>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig {
        speed: args.speed,
        seed: args.seed,
    };
    let mut app = App::new(args, config, theme);
    let outcome = app.run()?;
    Ok(outcome.exit_code())
}

/// Falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blocktui",
    version,
    about = "Classic falling-block puzzle in the terminal. Fill rows edge to edge to clear them.",
    long_about = "blocktui is a small terminal take on the classic falling-block puzzle.\n\n\
        Steer the falling piece, complete rows to score 10 points each, and keep the \
        spawn area clear: the game ends when a new piece lands on the stack.\n\n\
        CONTROLS:\n  Left/Right  Move    Up        Rotate    Down       Soft drop\n  \
        P           Pause   Q / Esc   Quit\n\n\
        Vim keys h/j/k/l work as well."
)]
pub struct Args {
    /// Gravity speed used with --no-menu: doable (0.5 s), fast (0.05 s) or super-fast (0.0165 s).
    #[arg(short, long, default_value = "doable")]
    pub speed: Speed,

    /// Skip the menus and start playing immediately at --speed.
    #[arg(long)]
    pub no_menu: bool,

    /// Seed for the piece sequence (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the classic console colours if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the line-clear flash.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,
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

/// Gravity presets offered by the speed menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Speed {
    #[default]
    Doable,
    Fast,
    SuperFast,
}

impl Speed {
    pub const ALL: [Self; 3] = [Self::Doable, Self::Fast, Self::SuperFast];

    /// Time between gravity steps.
    pub fn tick_interval(self) -> Duration {
        match self {
            Self::Doable => Duration::from_millis(500),
            Self::Fast => Duration::from_millis(50),
            Self::SuperFast => Duration::from_micros(16_500),
        }
    }

    /// Speed for a 1-based menu choice.
    pub fn from_choice(choice: u8) -> Option<Self> {
        match choice {
            1 => Some(Self::Doable),
            2 => Some(Self::Fast),
            3 => Some(Self::SuperFast),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Doable => "Doable",
            Self::Fast => "Fast",
            Self::SuperFast => "Super Fast",
        }
    }
}
