//! Tunable game constants and their validation.

use std::time::Duration;
use thiserror::Error;

/// Number of jewels in a falling block. Block geometry depends on it, so it is not tunable.
pub const BLOCK_SIZE: usize = 3;

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

/// Seconds per gameplay tick, indexed by stage (index 0 is never used by play).
const REFERENCE_SPEEDS: [f64; 27] = [
    1.500, 1.250, 1.000, 0.750, 0.500, 0.250, 0.2375, 0.2250, 0.2125, 0.2000, 0.1875, 0.1750,
    0.1625, 0.1500, 0.1375, 0.1250, 0.1125, 0.1000, 0.0875, 0.0750, 0.0625, 0.0500, 0.0375,
    0.0250, 0.0125, 0.0000, 0.0000,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("board must be at least {min_rows} rows by 1 column (got {rows}x{cols})")]
    BoardTooSmall {
        rows: usize,
        cols: usize,
        min_rows: usize,
    },
    #[error("board must be at most {max} rows and columns (got {rows}x{cols})")]
    BoardTooLarge {
        rows: usize,
        cols: usize,
        max: usize,
    },
    #[error("number of colours must be between 2 and {max} (got {got})")]
    Colors { got: u8, max: u8 },
    #[error("{0} must be at least 1")]
    Zero(&'static str),
    #[error("initial stage {stage} is outside 1..={max_stage}")]
    InitialStage { stage: u32, max_stage: u32 },
    #[error("speed table has {got} entries; stage {max_stage} needs at least {need}")]
    SpeedTable {
        got: usize,
        need: usize,
        max_stage: u32,
    },
    #[error("speed table is not monotonically decreasing at stage {0}")]
    SpeedOrder(usize),
}

/// Every constant the engine reads. Defaults reproduce the classic 14x6 board.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    /// Ordinary jewel colours, numbered `1..=num_colors`.
    pub num_colors: u8,
    /// On average one wild block every `wild_rarity` blocks.
    pub wild_rarity: u32,
    /// Points for a run of exactly [`MIN_RUN`] jewels.
    pub run_base: u32,
    /// Extra points per jewel beyond [`MIN_RUN`].
    pub run_bonus: u32,
    /// Fixed score for a wild landing.
    pub jewel_score: u32,
    /// Points per row skipped by a drop.
    pub drop_points: u32,
    pub initial_lives: u32,
    pub max_stage: u32,
    pub initial_stage: u32,
    pub pieces_per_stage: u32,
    /// Gameplay tick interval per stage.
    pub speeds: Vec<Duration>,
    /// Effects tick interval (animation frames, fill injection).
    pub fx_interval: Duration,
    pub flash_jewel_frames: u32,
    pub flash_frames: u32,
    pub flash_blank_frames: u32,
    /// How many times the flash animation plays before the jewels are removed.
    pub flash_cycles: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 14,
            cols: 6,
            num_colors: 6,
            wild_rarity: 27,
            run_base: 300,
            run_bonus: 150,
            jewel_score: 300,
            drop_points: 10,
            initial_lives: 3,
            max_stage: 25,
            initial_stage: 1,
            pieces_per_stage: 50,
            speeds: REFERENCE_SPEEDS
                .iter()
                .map(|s| Duration::from_secs_f64(*s))
                .collect(),
            fx_interval: Duration::from_millis(35),
            flash_jewel_frames: 3,
            flash_frames: 4,
            flash_blank_frames: 3,
            flash_cycles: 4,
        }
    }
}

impl GameConfig {
    /// Highest colour count the theme can tell apart.
    pub const MAX_COLORS: u8 = 9;

    /// Largest board side; keeps the drawn board within terminal coordinates.
    pub const MAX_BOARD_SIDE: usize = 256;

    /// Frames in one flash cycle: jewel, flash images, then blank.
    pub fn flash_cycle_len(&self) -> u32 {
        self.flash_jewel_frames + self.flash_frames + self.flash_blank_frames
    }

    /// Time the cleared jewels stay on screen before deletion.
    pub fn flash_delay(&self) -> Duration {
        self.fx_interval * (self.flash_cycles * self.flash_cycle_len())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let min_rows = BLOCK_SIZE + 1;
        if self.rows < min_rows || self.cols == 0 {
            return Err(ConfigError::BoardTooSmall {
                rows: self.rows,
                cols: self.cols,
                min_rows,
            });
        }
        if self.rows > Self::MAX_BOARD_SIDE || self.cols > Self::MAX_BOARD_SIDE {
            return Err(ConfigError::BoardTooLarge {
                rows: self.rows,
                cols: self.cols,
                max: Self::MAX_BOARD_SIDE,
            });
        }
        if !(2..=Self::MAX_COLORS).contains(&self.num_colors) {
            return Err(ConfigError::Colors {
                got: self.num_colors,
                max: Self::MAX_COLORS,
            });
        }
        for (name, value) in [
            ("wild rarity", self.wild_rarity),
            ("initial lives", self.initial_lives),
            ("max stage", self.max_stage),
            ("pieces per stage", self.pieces_per_stage),
            ("flash cycles", self.flash_cycles),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }
        if !(1..=self.max_stage).contains(&self.initial_stage) {
            return Err(ConfigError::InitialStage {
                stage: self.initial_stage,
                max_stage: self.max_stage,
            });
        }
        let need = self.max_stage as usize + 1;
        if self.speeds.len() < need {
            return Err(ConfigError::SpeedTable {
                got: self.speeds.len(),
                need,
                max_stage: self.max_stage,
            });
        }
        if let Some(i) = self.speeds.windows(2).position(|w| w[1] > w[0]) {
            return Err(ConfigError::SpeedOrder(i + 1));
        }
        Ok(())
    }
}
