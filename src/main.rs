//! Jeweltui: falling-jewel column puzzle in the terminal.

mod app;
mod board;
mod cascade;
mod config;
mod error;
mod falling;
mod field;
mod game;
mod highscores;
mod input;
mod jewel;
mod matcher;
mod piece;
mod scoring;
mod theme;
mod timer;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use config::GameConfig;
use std::time::Duration;

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.game_config()?;
    config.validate().context("invalid game configuration")?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let mut app = App::new(config, args.seed, theme, args.no_animation);
    app.run()?;
    Ok(())
}

/// Falling-jewel column puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "jeweltui",
    version,
    about = "Falling-jewel column puzzle in the terminal. Line up three or more jewels of one colour to clear them.",
    long_about = "Jeweltui is a terminal puzzle game in the tradition of Columns.\n\n\
        A vertical block of three jewels falls into the well. Cycle its jewels and steer it; \
        when it lands, every horizontal, vertical or diagonal run of three or more \
        same-coloured jewels is cleared and the jewels above fall into the gaps. Chains \
        double the points of each cascade step. A wild block clears every jewel of the \
        colour it lands on.\n\n\
        When a new block has no room, the well fills up and is wiped, costing a life.\n\n\
        CONTROLS (normal):\n  Left/Right  Move    Up          Rotate     Down/Space/Enter  Drop\n  P           Pause   S           Sound      E                 End game   Q / Esc  Quit\n\n\
        CONTROLS (vim):\n  h/l         Move    k           Rotate     j                 Drop\n\n\
        On the high-score screen press R to play again. Use --theme to load a btop-style theme \
        (jewel1..jewel9 keys set the jewel colours)."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Playfield height in rows.
    #[arg(long, value_name = "ROWS")]
    pub rows: Option<usize>,

    /// Playfield width in columns.
    #[arg(long, value_name = "COLS")]
    pub cols: Option<usize>,

    /// Number of jewel colours (2..=9).
    #[arg(long, value_name = "N")]
    pub colors: Option<u8>,

    /// On average one wild block every N blocks.
    #[arg(long, value_name = "N")]
    pub wild_rarity: Option<u32>,

    /// Lives at the start of a game.
    #[arg(long, value_name = "N")]
    pub lives: Option<u32>,

    /// Jewels cleared before the stage advances.
    #[arg(long, value_name = "N")]
    pub pieces_per_stage: Option<u32>,

    /// Stage the game starts at.
    #[arg(long, value_name = "N")]
    pub initial_stage: Option<u32>,

    /// Highest stage before play wraps back to stage 1.
    #[arg(long, value_name = "N")]
    pub max_stage: Option<u32>,

    /// Seconds per gameplay tick for each stage, starting at stage 0 (comma separated).
    #[arg(long, value_name = "SECS", value_delimiter = ',')]
    pub speeds: Option<Vec<f64>>,

    /// Effects tick in ms (animation frames and well fill).
    #[arg(long, value_name = "MS")]
    pub fx_interval_ms: Option<u64>,

    /// Flash cycles shown before cleared jewels are removed.
    #[arg(long, value_name = "N")]
    pub flash_cycles: Option<u32>,

    /// Points for a wild block landing.
    #[arg(long, value_name = "POINTS")]
    pub jewel_score: Option<u32>,

    /// Points for a run of exactly three jewels.
    #[arg(long, value_name = "POINTS")]
    pub run_base: Option<u32>,

    /// Extra points per jewel beyond three in a run.
    #[arg(long, value_name = "POINTS")]
    pub run_bonus: Option<u32>,

    /// Points per row skipped by a drop.
    #[arg(long, value_name = "POINTS")]
    pub drop_points: Option<u32>,

    /// Seed for the block sequence (reproducible games).
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Disable the fade laid over the well wipe.
    #[arg(long)]
    pub no_animation: bool,
}

impl Args {
    /// Defaults with every given option applied on top.
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = GameConfig::default();
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.cols = cols;
        }
        if let Some(colors) = self.colors {
            config.num_colors = colors;
        }
        if let Some(rarity) = self.wild_rarity {
            config.wild_rarity = rarity;
        }
        if let Some(lives) = self.lives {
            config.initial_lives = lives;
        }
        if let Some(pieces) = self.pieces_per_stage {
            config.pieces_per_stage = pieces;
        }
        if let Some(stage) = self.initial_stage {
            config.initial_stage = stage;
        }
        if let Some(stage) = self.max_stage {
            config.max_stage = stage;
        }
        if let Some(speeds) = &self.speeds {
            config.speeds = speeds
                .iter()
                .map(|&s| {
                    Duration::try_from_secs_f64(s).with_context(|| format!("invalid speed {s}"))
                })
                .collect::<Result<_>>()?;
        }
        if let Some(ms) = self.fx_interval_ms {
            config.fx_interval = Duration::from_millis(ms);
        }
        if let Some(cycles) = self.flash_cycles {
            config.flash_cycles = cycles;
        }
        if let Some(points) = self.jewel_score {
            config.jewel_score = points;
        }
        if let Some(points) = self.run_base {
            config.run_base = points;
        }
        if let Some(points) = self.run_bonus {
            config.run_bonus = points;
        }
        if let Some(points) = self.drop_points {
            config.drop_points = points;
        }
        Ok(config)
    }
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
