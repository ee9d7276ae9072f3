//! High-score table persisted to disk (XDG config or ~/.config/jeweltui).

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const FILENAME: &str = "highscores";

/// Entries kept in the table.
pub const MAX_HIGH_SCORES: usize = 10;

/// Receives the final stage and score when a game ends.
pub trait ScoreSink {
    /// Returns the rank (0-based) the score earned, if it made the table.
    fn notify_game_ended(&mut self, stage: u32, score: u32) -> Option<usize>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighScore {
    pub name: String,
    pub stage: u32,
    pub score: u32,
}

impl HighScore {
    /// `name stage score`; names never contain spaces.
    fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let name = parts.next()?.to_string();
        let stage = parts.next()?.parse().ok()?;
        let score = parts.next()?.parse().ok()?;
        Some(Self { name, stage, score })
    }
}

#[derive(Debug, Clone, Default)]
pub struct HighScoreTable {
    entries: Vec<HighScore>,
    /// Rank of the most recent entry, for highlighting.
    last_rank: Option<usize>,
    player: String,
}

/// Returns the path to the high scores file (config dir / jeweltui / highscores).
pub fn config_path() -> PathBuf {
    let home_config = || {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => home_config(),
    };
    base.join("jeweltui").join(FILENAME)
}

/// Login name of the player, with spaces removed so the file stays one entry per line.
fn player_name() -> String {
    let name = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "player".to_string());
    let name: String = name.split_whitespace().collect();
    if name.is_empty() {
        "player".to_string()
    } else {
        name
    }
}

impl HighScoreTable {
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            last_rank: None,
            player: player.into(),
        }
    }

    /// Load from `path`; a missing or unreadable file gives an empty table.
    /// Malformed lines are skipped.
    pub fn load(path: &Path) -> Self {
        let mut table = Self::new(player_name());
        let Ok(content) = fs::read_to_string(path) else {
            return table;
        };
        table.entries = content
            .lines()
            .filter_map(HighScore::parse)
            .take(MAX_HIGH_SCORES)
            .collect();
        table
    }

    /// Save to `path`. Creates the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut f =
            fs::File::create(path).with_context(|| format!("writing {}", path.display()))?;
        for entry in &self.entries {
            writeln!(f, "{} {} {}", entry.name, entry.stage, entry.score)?;
        }
        Ok(())
    }

    pub fn entries(&self) -> &[HighScore] {
        &self.entries
    }

    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    pub fn best(&self) -> u32 {
        self.entries.first().map_or(0, |e| e.score)
    }

    /// Insert above the first entry it ties or beats; the eleventh entry drops off.
    pub fn insert(&mut self, entry: HighScore) -> Option<usize> {
        let rank = self
            .entries
            .iter()
            .position(|e| entry.score >= e.score)
            .or_else(|| (self.entries.len() < MAX_HIGH_SCORES).then_some(self.entries.len()));
        if let Some(rank) = rank {
            self.entries.insert(rank, entry);
            self.entries.truncate(MAX_HIGH_SCORES);
        }
        self.last_rank = rank;
        rank
    }
}

impl ScoreSink for HighScoreTable {
    fn notify_game_ended(&mut self, stage: u32, score: u32) -> Option<usize> {
        let name = self.player.clone();
        self.insert(HighScore { name, stage, score })
    }
}
