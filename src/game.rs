//! Game state machine: player commands, the two pulses, and the events the
//! front-end draws from.

use crate::board::{Board, Pos};
use crate::cascade::{Cascade, Phase, Resume};
use crate::config::GameConfig;
use crate::error::EngineError;
use crate::falling::{FallingBlocks, Step};
use crate::field::Playfield;
use crate::piece::{Block, PieceGenerator};
use crate::scoring::Progress;
use crate::timer::Pulse;
use std::time::Duration;

/// Abstract player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    Rotate,
    Drop,
    TogglePause,
    ToggleSound,
    /// Give up: the board fills and the game ends.
    Forfeit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    BlockSpawned,
    BlockPlaced,
    CellsCleared {
        cells: Vec<Pos>,
        points: u32,
    },
    ScoreChanged {
        score: u32,
        pending_points: u32,
        multiplier: u32,
    },
    StageChanged {
        stage: u32,
        speed: Duration,
    },
    LifeLost {
        remaining: u32,
    },
    GameOver {
        stage: u32,
        score: u32,
    },
    FillEffectCell {
        row: usize,
        col: usize,
        color: u8,
    },
    PauseToggled,
    SoundToggled,
}

/// What the front-end should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Continue,
    /// Sent once per game, when it ends.
    ShowHighScores { stage: u32, score: u32 },
}

#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    generator: PieceGenerator,
    field: Playfield,
    blocks: FallingBlocks,
    cascade: Cascade,
    progress: Progress,
    /// Drives the falling block; runs while play is live.
    game_pulse: Pulse,
    /// Drives animation frames and the fill effect; runs while the cascade works.
    fx_pulse: Pulse,
    paused: bool,
    sound: bool,
    transition: Option<Transition>,
    events: Vec<GameEvent>,
}

impl Game {
    /// `seed` makes the block sequence reproducible.
    pub fn new(config: GameConfig, seed: Option<u64>) -> Self {
        let mut generator = PieceGenerator::new(&config, seed);
        let blocks = FallingBlocks::new(&mut generator);
        let progress = Progress::new(&config);
        let mut game_pulse = Pulse::new(progress.speed());
        game_pulse.start();
        Self {
            field: Playfield::new(config.rows, config.cols),
            cascade: Cascade::new(&config),
            fx_pulse: Pulse::new(config.fx_interval),
            generator,
            blocks,
            progress,
            game_pulse,
            paused: false,
            sound: false,
            transition: None,
            events: Vec::new(),
            config,
        }
    }

    /// Fresh board, score and lives. The block sequence carries on.
    pub fn new_game(&mut self) {
        self.field.reset();
        self.blocks = FallingBlocks::new(&mut self.generator);
        self.cascade.reset();
        self.progress = Progress::new(&self.config);
        self.fx_pulse.stop();
        self.game_pulse.set_interval(self.progress.speed());
        self.game_pulse.start();
        self.paused = false;
        self.sound = false;
        self.transition = None;
        self.events.clear();
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        self.field.board()
    }

    pub fn field(&self) -> &Playfield {
        &self.field
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn phase(&self) -> Phase {
        self.cascade.phase()
    }

    pub fn preview(&self) -> &Block {
        self.blocks.preview()
    }

    /// The block under player control, if one is on the board.
    pub fn falling(&self) -> Option<&Block> {
        self.blocks.is_moving().then(|| self.blocks.falling())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn sound_on(&self) -> bool {
        self.sound
    }

    pub fn is_over(&self) -> bool {
        self.cascade.phase() == Phase::GameOver
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn command(&mut self, command: Command) -> Result<(), EngineError> {
        match command {
            Command::TogglePause => {
                if !self.is_over() {
                    self.paused = !self.paused;
                    self.events.push(GameEvent::PauseToggled);
                }
                return Ok(());
            }
            Command::ToggleSound => {
                self.sound = !self.sound;
                self.events.push(GameEvent::SoundToggled);
                return Ok(());
            }
            _ => {}
        }
        if self.paused || self.progress.is_game_over() {
            return Ok(());
        }
        let board = self.field.board();
        match command {
            Command::MoveLeft => {
                self.blocks.move_left(board);
            }
            Command::MoveRight => {
                self.blocks.move_right(board);
            }
            Command::Rotate => {
                self.blocks.rotate();
            }
            Command::Drop => {
                if let Some(rows) = self.blocks.drop(board) {
                    if rows > 0 {
                        self.progress.award_drop(rows);
                        self.events.push(GameEvent::ScoreChanged {
                            score: self.progress.score(),
                            pending_points: self.progress.pending(),
                            multiplier: self.progress.multiplier(),
                        });
                    }
                    self.land()?;
                }
            }
            Command::Forfeit => self.forfeit(),
            Command::TogglePause | Command::ToggleSound => {}
        }
        Ok(())
    }

    /// Advance by `delta` of wall time: due cascade work first, then the
    /// effects pulse, then the gameplay pulse.
    pub fn tick(&mut self, delta: Duration) -> Result<Transition, EngineError> {
        if self.paused {
            return Ok(Transition::Continue);
        }
        let resume = self.cascade.advance(
            delta,
            &mut self.field,
            &mut self.progress,
            &mut self.events,
        )?;
        let settled = resume != Resume::Pending;
        self.resume(resume);

        if self.fx_pulse.update(delta) {
            self.advance_fx()?;
        }
        // A pulse restarted this tick starts counting from the next one.
        if !settled && self.game_pulse.update(delta) {
            self.advance_game()?;
        }
        Ok(self.transition.take().unwrap_or(Transition::Continue))
    }

    fn advance_game(&mut self) -> Result<(), EngineError> {
        if self.blocks.is_moving() {
            if self.blocks.step(self.field.board()) == Step::Landed {
                self.land()?;
            }
        } else if FallingBlocks::spawn_blocked(self.field.board()) {
            self.start_fill();
        } else {
            self.blocks
                .promote_preview(&mut self.generator, self.field.board())?;
            self.events.push(GameEvent::BlockSpawned);
        }
        Ok(())
    }

    fn advance_fx(&mut self) -> Result<(), EngineError> {
        if !self.cascade.is_filling() {
            self.field.animate();
            return Ok(());
        }
        if self.field.board().is_full() {
            let resume = self.cascade.begin_mass_clear(
                &mut self.field,
                &mut self.progress,
                &mut self.events,
            )?;
            self.resume(resume);
            return Ok(());
        }
        let empty = self.field.board().empty_cells();
        if let Some(pos) = self.generator.choose_cell(&empty) {
            let color = self.generator.random_color();
            self.field.insert(pos, color);
            self.events.push(GameEvent::FillEffectCell {
                row: pos.row,
                col: pos.col,
                color,
            });
        }
        Ok(())
    }

    fn land(&mut self) -> Result<(), EngineError> {
        self.game_pulse.stop();
        self.fx_pulse.start();
        let block = self.blocks.falling().clone();
        let resume = self.cascade.land(
            &block,
            &mut self.field,
            &mut self.progress,
            &mut self.events,
        )?;
        self.resume(resume);
        Ok(())
    }

    fn start_fill(&mut self) {
        self.cascade.begin_fill();
        self.game_pulse.stop();
        self.fx_pulse.start();
    }

    fn forfeit(&mut self) {
        self.progress.forfeit();
        if self.cascade.phase() == Phase::Falling {
            self.blocks.halt();
            self.start_fill();
        }
    }

    fn resume(&mut self, resume: Resume) {
        match resume {
            Resume::Pending => {}
            Resume::Play => {
                self.fx_pulse.stop();
                self.game_pulse.set_interval(self.progress.speed());
                self.game_pulse.start();
            }
            Resume::GameOver => {
                self.fx_pulse.stop();
                self.game_pulse.stop();
                let (stage, score) = (self.progress.stage(), self.progress.score());
                self.events.push(GameEvent::GameOver { stage, score });
                self.transition = Some(Transition::ShowHighScores { stage, score });
            }
        }
    }
}
