//! App: terminal init, main loop, wall-clock ticks, key handling and screen changes.

use crate::config::GameConfig;
use crate::game::{Game, GameEvent, Transition};
use crate::highscores::{self, HighScoreTable, ScoreSink};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, ShrinkFade};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Target time between frames (~60 FPS).
const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    HighScores,
}

pub struct App {
    game: Game,
    theme: Theme,
    scores: HighScoreTable,
    scores_path: PathBuf,
    screen: Screen,
    fade: ShrinkFade,
    no_animation: bool,
    last_tick: Instant,
}

impl App {
    pub fn new(config: GameConfig, seed: Option<u64>, theme: Theme, no_animation: bool) -> Self {
        let scores_path = highscores::config_path();
        Self {
            game: Game::new(config, seed),
            theme,
            scores: HighScoreTable::load(&scores_path),
            scores_path,
            screen: Screen::Playing,
            fade: ShrinkFade::default(),
            no_animation,
            last_tick: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = terminal.show_cursor();
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.last_tick = Instant::now();
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                ui::draw(
                    f,
                    self.screen,
                    &self.game,
                    &self.theme,
                    &self.scores,
                    &mut self.fade,
                    now,
                    self.no_animation,
                )
            })?;

            let timeout = FRAME.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if !self.handle_action(key_to_action(key))? {
                        return Ok(());
                    }
                }
            }

            let now = Instant::now();
            let delta = now.saturating_duration_since(self.last_tick);
            self.last_tick = now;
            if self.screen == Screen::Playing {
                let transition = self.game.tick(delta).context("game engine failure")?;
                self.consume_events();
                if let Transition::ShowHighScores { stage, score } = transition {
                    self.game_ended(stage, score)?;
                }
            }
        }
    }

    /// Returns false when the player quits.
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match (self.screen, action) {
            (_, Action::Quit) => return Ok(false),
            (Screen::Playing, Action::Game(command)) => {
                self.game
                    .command(command)
                    .context("game engine failure")?;
            }
            (Screen::HighScores, Action::Restart) => {
                self.game.new_game();
                self.fade.reset();
                self.screen = Screen::Playing;
                self.last_tick = Instant::now();
            }
            _ => {}
        }
        Ok(true)
    }

    fn consume_events(&mut self) {
        for event in self.game.drain_events() {
            if let GameEvent::LifeLost { .. } = event {
                // Each mass clear gets a fresh fade.
                self.fade.reset();
            }
        }
    }

    fn game_ended(&mut self, stage: u32, score: u32) -> Result<()> {
        self.scores.notify_game_ended(stage, score);
        self.scores
            .save(&self.scores_path)
            .context("saving high scores")?;
        self.screen = Screen::HighScores;
        Ok(())
    }
}
