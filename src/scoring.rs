//! Score, pending points and multiplier, lives, stage and drop speed.

use crate::config::GameConfig;
use crate::matcher::scale;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Progress {
    score: u32,
    /// Points waiting to be added once the flashing jewels are gone.
    pending: u32,
    multiplier: u32,
    showing_pending: bool,
    lives: u32,
    stage: u32,
    /// Jewels still to clear before the next stage.
    rest: i64,
    game_over: bool,
    max_stage: u32,
    pieces_per_stage: u32,
    drop_points: u32,
    speeds: Vec<Duration>,
}

impl Progress {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            score: 0,
            pending: 0,
            multiplier: 1,
            showing_pending: false,
            lives: config.initial_lives,
            stage: config.initial_stage,
            rest: i64::from(config.pieces_per_stage),
            game_over: false,
            max_stage: config.max_stage,
            pieces_per_stage: config.pieces_per_stage,
            drop_points: config.drop_points,
            speeds: config.speeds.clone(),
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn pending(&self) -> u32 {
        self.pending
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Pending points and multiplier are only meaningful while a clear is flashing.
    pub fn showing_pending(&self) -> bool {
        self.showing_pending
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn rest(&self) -> i64 {
        self.rest
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Gameplay tick interval for the current stage.
    pub fn speed(&self) -> Duration {
        self.speeds
            .get(self.stage as usize)
            .or(self.speeds.last())
            .copied()
            .unwrap_or_default()
    }

    /// Stage `points` at cascade pass `multiplier` for display until [`Self::commit`].
    pub fn stage_points(&mut self, points: u32, multiplier: u32) {
        self.pending = scale(points, multiplier);
        self.multiplier = multiplier;
        self.showing_pending = true;
    }

    /// Move pending points into the score. Returns what was added.
    pub fn commit(&mut self) -> u32 {
        let added = self.pending;
        self.score = self.score.saturating_add(added);
        self.pending = 0;
        self.showing_pending = false;
        added
    }

    pub fn award_drop(&mut self, rows: u32) -> u32 {
        let points = self.drop_points.saturating_mul(rows);
        self.score = self.score.saturating_add(points);
        points
    }

    /// Count `cleared` jewels against the stage. Returns the new stage when it advanced.
    pub fn take_pieces(&mut self, cleared: usize) -> Option<u32> {
        self.rest -= i64::try_from(cleared).unwrap_or(i64::MAX);
        if self.rest > 0 {
            return None;
        }
        self.rest += i64::from(self.pieces_per_stage);
        self.stage = 1 + self.stage % self.max_stage;
        Some(self.stage)
    }

    /// Returns true when that was the last life.
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.game_over = true;
        }
        self.game_over
    }

    /// End the game at the next quiet moment regardless of lives.
    pub fn forfeit(&mut self) {
        self.game_over = true;
    }
}
