//! Layout and drawing: playfield, next preview, scoreboard, pause overlay, high scores.

use crate::app::Screen;
use crate::board::Pos;
use crate::cascade::Phase;
use crate::config::GameConfig;
use crate::game::Game;
use crate::highscores::HighScoreTable;
use crate::jewel::{AnimationKind, Jewel};
use crate::piece::Piece;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each jewel is two terminal columns wide so it reads as square.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 24;
/// Next box: border, title and the three preview cells.
const NEXT_HEIGHT: u16 = 2 + 1 + 3;
/// Score box: border and nine scoreboard lines.
const SCORE_HEIGHT: u16 = 2 + 9;

const SOLID: &str = "██";
const WILD: &str = "◆◆";
const EMPTY: &str = " ·";
const FLASH_GLYPHS: [&str; 4] = ["░░", "▒▒", "▓▓", "██"];
const SHRINK_GLYPHS: [&str; 5] = ["██", "▓▓", "▒▒", "░░", "  "];

/// Fade laid over the shrinking jewels of a mass clear.
#[derive(Default)]
pub struct ShrinkFade {
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl ShrinkFade {
    pub fn reset(&mut self) {
        self.effect = None;
        self.last_process = None;
    }
}

/// Playfield size in terminal cells, border included.
fn playfield_size(config: &GameConfig) -> (u16, u16) {
    (
        config.cols as u16 * CELL_WIDTH + 2,
        config.rows as u16 + 2,
    )
}

/// Smallest terminal that fits the board and sidebar.
pub fn min_terminal_size(config: &GameConfig) -> (u16, u16) {
    let (pw, ph) = playfield_size(config);
    (pw + SIDEBAR_WIDTH, ph.max(NEXT_HEIGHT + 1 + SCORE_HEIGHT))
}

/// Draw the current screen. While a mass clear runs (and animation is on), the
/// shrinking jewels also fade through `fade`.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    game: &Game,
    theme: &Theme,
    scores: &HighScoreTable,
    fade: &mut ShrinkFade,
    now: Instant,
    no_animation: bool,
) {
    let area = frame.area();
    let (min_w, min_h) = min_terminal_size(game.config());
    if screen == Screen::Playing && (area.width < min_w || area.height < min_h) {
        let msg = format!("Terminal too small: need {min_w}x{min_h}");
        Paragraph::new(msg)
            .style(Style::default().fg(theme.main_fg))
            .render(area, frame.buffer_mut());
        return;
    }
    match screen {
        Screen::Playing => {
            let board_area = draw_game(frame, game, theme, scores, area);
            if game.is_paused() {
                draw_pause_overlay(frame, theme, area);
            }
            if no_animation {
                fade.reset();
            } else {
                apply_shrink_fade(frame, game, theme, board_area, fade, now);
            }
        }
        Screen::HighScores => draw_high_scores(frame, theme, scores, area),
    }
}

/// Draw game: playfield + sidebar centred in `area`. Returns the grid rect.
fn draw_game(
    frame: &mut Frame,
    game: &Game,
    theme: &Theme,
    scores: &HighScoreTable,
    area: Rect,
) -> Rect {
    let (pw, ph) = playfield_size(game.config());
    let total_w = pw + SIDEBAR_WIDTH;
    let total_h = ph.max(NEXT_HEIGHT + 1 + SCORE_HEIGHT);

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
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);

    let playfield_area = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    let board_rect = draw_playfield(frame, game, theme, playfield_area);
    draw_sidebar(frame, game, theme, scores, inner[1]);
    board_rect
}

fn draw_playfield(frame: &mut Frame, game: &Game, theme: &Theme, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" jeweltui ", Style::default().fg(theme.title)));
    let inner = block.inner(area);
    let buf = frame.buffer_mut();
    block.render(area, buf);

    let empty = Style::default().fg(theme.div_line).bg(theme.bg);
    for pos in game.board().positions() {
        put_cell(buf, inner, pos, EMPTY, empty);
    }
    for jewel in game.field().jewels().iter() {
        let (glyph, style) = jewel_look(jewel, game.config(), theme);
        put_cell(buf, inner, jewel.pos, glyph, style);
    }
    if let Some(falling) = game.falling() {
        for (pos, piece) in falling.cells() {
            put_cell(buf, inner, pos, piece_glyph(piece), piece_style(piece, theme));
        }
    }
    inner
}

/// Screen rect of one grid cell, or None if it falls outside `inner`.
fn cell_rect(inner: Rect, pos: Pos) -> Option<Rect> {
    let x = inner.x + pos.col as u16 * CELL_WIDTH;
    let y = inner.y + pos.row as u16;
    (x + CELL_WIDTH <= inner.right() && y < inner.bottom()).then_some(Rect {
        x,
        y,
        width: CELL_WIDTH,
        height: 1,
    })
}

fn put_cell(buf: &mut Buffer, inner: Rect, pos: Pos, glyph: &str, style: Style) {
    if let Some(rect) = cell_rect(inner, pos) {
        Paragraph::new(glyph).style(style).render(rect, buf);
    }
}

fn piece_glyph(piece: Piece) -> &'static str {
    match piece {
        Piece::Color(_) => SOLID,
        Piece::Wild => WILD,
    }
}

fn piece_color(piece: Piece, theme: &Theme) -> Color {
    match piece {
        Piece::Color(c) => theme.jewel_color(c),
        Piece::Wild => theme.wild,
    }
}

fn piece_style(piece: Piece, theme: &Theme) -> Style {
    let style = Style::default().fg(piece_color(piece, theme)).bg(theme.bg);
    match piece {
        Piece::Color(_) => style,
        Piece::Wild => style.add_modifier(Modifier::BOLD),
    }
}

/// Glyph and style of a landed jewel for its current animation frame.
fn jewel_look(jewel: &Jewel, config: &GameConfig, theme: &Theme) -> (&'static str, Style) {
    let still = (piece_glyph(jewel.piece), piece_style(jewel.piece, theme));
    let Some(animation) = jewel.animation else {
        return still;
    };
    match animation.kind {
        AnimationKind::Flash => {
            // jewel frames, then flash frames, then blank frames, repeated
            let frame = animation.frame % config.flash_cycle_len().max(1);
            let flash_start = config.flash_jewel_frames;
            let blank_start = flash_start + config.flash_frames;
            if frame < flash_start {
                still
            } else if frame < blank_start {
                let glyph = FLASH_GLYPHS[(frame - flash_start) as usize % FLASH_GLYPHS.len()];
                let bg = piece_color(jewel.piece, theme);
                (glyph, Style::default().fg(theme.flash).bg(bg))
            } else {
                ("  ", Style::default().bg(theme.bg))
            }
        }
        AnimationKind::Shrink => {
            let total = (config.flash_cycles * config.flash_cycle_len()).max(1) as usize;
            let step = (animation.frame as usize * SHRINK_GLYPHS.len() / total)
                .min(SHRINK_GLYPHS.len() - 1);
            (SHRINK_GLYPHS[step], still.1)
        }
    }
}

/// Create the fade when a mass clear starts, process it each frame, drop it when done.
fn apply_shrink_fade(
    frame: &mut Frame,
    game: &Game,
    theme: &Theme,
    board_rect: Rect,
    fade: &mut ShrinkFade,
    now: Instant,
) {
    if game.field().jewels().is_empty() {
        fade.reset();
        return;
    }
    let shrinking: HashSet<(u16, u16)> = game
        .field()
        .jewels()
        .animating()
        .filter(|j| j.animation.is_some_and(|a| a.kind == AnimationKind::Shrink))
        .filter_map(|j| cell_rect(board_rect, j.pos))
        .flat_map(|r| (r.x..r.right()).map(move |x| (x, r.y)))
        .collect();
    if shrinking.is_empty() {
        fade.reset();
        return;
    }

    let delta = fade
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    fade.last_process = Some(now);

    if fade.effect.is_none() {
        let fade_ms = game.config().flash_delay().as_millis().min(u32::MAX as u128) as u32;
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            shrinking.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_to(theme.bg, theme.bg, (fade_ms, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board_rect);
        fade.effect = Some(effect);
    }
    if let Some(effect) = fade.effect.as_mut() {
        if !effect.done() {
            frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
        }
    }
}

fn draw_sidebar(
    frame: &mut Frame,
    game: &Game,
    theme: &Theme,
    scores: &HighScoreTable,
    area: Rect,
) {
    let title_style = Style::default().fg(theme.title);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(NEXT_HEIGHT),
            Constraint::Length(1), // gap
            Constraint::Length(SCORE_HEIGHT),
        ])
        .split(area);

    // --- Next (own border) ---
    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    let next_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(3)])
        .split(next_inner);
    Paragraph::new(Line::from(Span::styled("Next", title_style)))
        .render(next_layout[0], frame.buffer_mut());
    draw_next_preview(frame, game, theme, next_layout[1]);

    // --- Scoreboard (own border) ---
    let score_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let score_inner = score_block.inner(chunks[2]);
    score_block.render(chunks[2], frame.buffer_mut());
    Paragraph::new(Text::from(scoreboard_lines(game, theme, scores.best())))
        .render(score_inner, frame.buffer_mut());
}

fn draw_next_preview(frame: &mut Frame, game: &Game, theme: &Theme, area: Rect) {
    let x = area.x + area.width.saturating_sub(CELL_WIDTH) / 2;
    for (i, piece) in game.preview().pieces.iter().enumerate() {
        let rect = Rect {
            x,
            y: area.y + i as u16,
            width: CELL_WIDTH,
            height: 1,
        };
        if rect.y < area.bottom() {
            Paragraph::new(piece_glyph(*piece))
                .style(piece_style(*piece, theme))
                .render(rect, frame.buffer_mut());
        }
    }
}

fn scoreboard_lines(game: &Game, theme: &Theme, best: u32) -> Vec<Line<'static>> {
    let label = Style::default().fg(theme.title);
    let value = Style::default().fg(theme.main_fg);
    let hidden = Style::default().fg(theme.inactive_fg);
    let progress = game.progress();
    let pending = progress.showing_pending();

    let row = |name: &'static str, text: String, shown: bool| {
        let (text, style) = if shown {
            (text, value)
        } else {
            (String::new(), hidden)
        };
        Line::from(vec![
            Span::styled(format!("{name:<8}"), label),
            Span::styled(text, style),
        ])
    };
    let status = if game.is_paused() {
        "PAUSED"
    } else if game.is_over() || progress.is_game_over() {
        "GAME OVER"
    } else if game.phase() == Phase::Filling {
        "WIPE"
    } else {
        ""
    };
    vec![
        row("POINTS", progress.pending().to_string(), pending),
        row("X", progress.multiplier().to_string(), pending),
        row("SCORE", progress.score().to_string(), true),
        row("BEST", best.max(progress.score()).to_string(), true),
        row("LIVES", progress.lives().to_string(), true),
        row("SPEED", format!("{:.4}", progress.speed().as_secs_f64()), true),
        row("STAGE", progress.stage().to_string(), true),
        row("REST", progress.rest().to_string(), true),
        Line::from(vec![
            Span::styled(format!("{:<8}", "SOUND"), label),
            Span::styled(if game.sound_on() { "ON" } else { "OFF" }, value),
            Span::raw("  "),
            Span::styled(
                status,
                Style::default().fg(Color::Black).bg(theme.title),
            ),
        ]),
    ]
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P: resume    Q: quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_high_scores(frame: &mut Frame, theme: &Theme, scores: &HighScoreTable, area: Rect) {
    let popup_w = 44u16;
    let popup_h = 18u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let header = Style::default().fg(theme.title).add_modifier(Modifier::BOLD);
    let normal = Style::default().fg(theme.main_fg);
    let fresh = Style::default().fg(Color::Black).bg(theme.title);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{:>3}  {:<14}{:>6}{:>10}", "#", "NAME", "STAGE", "SCORE"),
            header,
        )),
    ];
    for (i, entry) in scores.entries().iter().enumerate() {
        let style = if scores.last_rank() == Some(i) { fresh } else { normal };
        lines.push(Line::from(Span::styled(
            format!(
                "{:>3}  {:<14}{:>6}{:>10}",
                i + 1,
                entry.name,
                entry.stage,
                entry.score
            ),
            style,
        )));
    }
    if scores.entries().is_empty() {
        lines.push(Line::from(Span::styled("no scores yet", normal)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "R: play again    Q: quit",
        Style::default().fg(theme.inactive_fg),
    )));

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" High scores ", header)),
    );
    p.render(popup, frame.buffer_mut());
}
