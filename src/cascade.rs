//! What happens between a block landing and the next block spawning: match
//! resolution, the flash delay, deletion, gravity and repeated resolution with a
//! growing multiplier, plus the fill effect's mass clear.

use crate::board::Pos;
use crate::config::GameConfig;
use crate::error::EngineError;
use crate::field::Playfield;
use crate::game::GameEvent;
use crate::jewel::AnimationKind;
use crate::matcher::Matcher;
use crate::piece::Block;
use crate::scoring::Progress;
use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A block is (or is about to be) under player control.
    Falling,
    Landed,
    WildResolve,
    MatchResolve,
    /// Matched jewels are flashing; deletion is scheduled.
    FlashDelay,
    DeleteAndDrop,
    /// Random jewels are poured into the board after a blocked spawn.
    Filling,
    GameOver,
}

/// How a cascade step left the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Still resolving; effects keep running.
    Pending,
    /// Board is quiet; gameplay continues.
    Play,
    /// Board is quiet and the game-over flag is set.
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Remove the in-flight set, scoring it.
    Delete,
    /// Remove the in-flight set without scoring (end of a life).
    MassClear,
}

/// Identifies one scheduled task, so a fired task can be checked against the
/// clear it was scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskToken {
    id: u64,
    pub task: Task,
}

#[derive(Debug, Clone)]
struct Scheduled {
    token: TaskToken,
    remaining: Duration,
}

/// Single-shot delayed tasks. At most one task of each kind is pending;
/// scheduling another replaces it.
#[derive(Debug, Clone, Default)]
pub struct DelayQueue {
    next_id: u64,
    pending: Vec<Scheduled>,
}

impl DelayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, task: Task, delay: Duration) -> TaskToken {
        self.cancel(task);
        self.next_id += 1;
        let token = TaskToken {
            id: self.next_id,
            task,
        };
        self.pending.push(Scheduled {
            token,
            remaining: delay,
        });
        token
    }

    pub fn cancel(&mut self, task: Task) {
        self.pending.retain(|s| s.token.task != task);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Let `delta` pass. Tasks that came due are removed and returned, earliest first.
    pub fn advance(&mut self, delta: Duration) -> Vec<TaskToken> {
        let mut due = Vec::new();
        self.pending.retain_mut(|s| {
            if s.remaining <= delta {
                due.push((s.remaining, s.token));
                false
            } else {
                s.remaining -= delta;
                true
            }
        });
        due.sort_by_key(|(remaining, token)| (*remaining, token.id));
        due.into_iter().map(|(_, token)| token).collect()
    }
}

#[derive(Debug, Clone)]
struct InFlight {
    cells: BTreeSet<Pos>,
    token: TaskToken,
}

#[derive(Debug, Clone)]
pub struct Cascade {
    phase: Phase,
    /// Resolution pass of the current cascade; 0 when quiet.
    iteration: u32,
    in_flight: Option<InFlight>,
    tasks: DelayQueue,
    matcher: Matcher,
    flash_delay: Duration,
    jewel_score: u32,
}

impl Cascade {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            phase: Phase::Falling,
            iteration: 0,
            in_flight: None,
            tasks: DelayQueue::new(),
            matcher: Matcher::new(config),
            flash_delay: config.flash_delay(),
            jewel_score: config.jewel_score,
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Cells flashing or shrinking while their deletion is pending.
    #[cfg(test)]
    pub fn in_flight(&self) -> Option<&BTreeSet<Pos>> {
        self.in_flight.as_ref().map(|f| &f.cells)
    }

    pub fn is_filling(&self) -> bool {
        self.phase == Phase::Filling
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Falling;
        self.iteration = 0;
        self.in_flight = None;
        self.tasks.clear();
    }

    /// Hand a landed block to the field and start resolving it.
    pub fn land(
        &mut self,
        block: &Block,
        field: &mut Playfield,
        progress: &mut Progress,
        events: &mut Vec<GameEvent>,
    ) -> Result<Resume, EngineError> {
        self.phase = Phase::Landed;
        field.merge(block);
        events.push(GameEvent::BlockPlaced);
        if block.is_wild() {
            self.resolve_wild(block, field, progress, events)
        } else {
            self.resolve_matches(field, progress, events)
        }
    }

    fn resolve_wild(
        &mut self,
        block: &Block,
        field: &mut Playfield,
        progress: &mut Progress,
        events: &mut Vec<GameEvent>,
    ) -> Result<Resume, EngineError> {
        self.phase = Phase::WildResolve;
        let cells = self.matcher.find_wild_matches(field.board(), block);
        progress.stage_points(self.jewel_score, 1);
        events.push(score_changed(progress));
        self.begin_flash(cells, Task::Delete, field)
    }

    fn resolve_matches(
        &mut self,
        field: &mut Playfield,
        progress: &mut Progress,
        events: &mut Vec<GameEvent>,
    ) -> Result<Resume, EngineError> {
        self.phase = Phase::MatchResolve;
        self.iteration += 1;
        let matches = self.matcher.find_matches(field.board());
        if matches.is_empty() {
            return self.settle(field, progress);
        }
        progress.stage_points(matches.points, self.iteration);
        events.push(score_changed(progress));
        self.begin_flash(matches.cells, Task::Delete, field)
    }

    fn settle(&mut self, field: &Playfield, progress: &Progress) -> Result<Resume, EngineError> {
        self.iteration = 0;
        field.verify()?;
        if progress.is_game_over() {
            self.phase = Phase::GameOver;
            Ok(Resume::GameOver)
        } else {
            self.phase = Phase::Falling;
            Ok(Resume::Play)
        }
    }

    fn begin_flash(
        &mut self,
        cells: BTreeSet<Pos>,
        task: Task,
        field: &mut Playfield,
    ) -> Result<Resume, EngineError> {
        if self.in_flight.is_some() {
            return Err(EngineError::ClearInFlight);
        }
        let kind = match task {
            Task::Delete => AnimationKind::Flash,
            Task::MassClear => AnimationKind::Shrink,
        };
        field.mark(&cells, kind)?;
        let token = self.tasks.schedule(task, self.flash_delay);
        self.in_flight = Some(InFlight { cells, token });
        self.phase = Phase::FlashDelay;
        Ok(Resume::Pending)
    }

    /// Run whatever delayed work came due within `delta`.
    pub fn advance(
        &mut self,
        delta: Duration,
        field: &mut Playfield,
        progress: &mut Progress,
        events: &mut Vec<GameEvent>,
    ) -> Result<Resume, EngineError> {
        let mut resume = Resume::Pending;
        if self.tasks.is_empty() {
            return Ok(resume);
        }
        for token in self.tasks.advance(delta) {
            match &self.in_flight {
                Some(flight) if flight.token == token => {}
                Some(_) => continue,
                None => return Err(EngineError::NothingInFlight),
            }
            resume = self.delete_and_drop(field, progress, events)?;
        }
        Ok(resume)
    }

    fn delete_and_drop(
        &mut self,
        field: &mut Playfield,
        progress: &mut Progress,
        events: &mut Vec<GameEvent>,
    ) -> Result<Resume, EngineError> {
        self.phase = Phase::DeleteAndDrop;
        let InFlight { cells, token } = self.in_flight.take().ok_or(EngineError::NothingInFlight)?;
        let points = match token.task {
            Task::Delete => {
                let added = progress.commit();
                if let Some(stage) = progress.take_pieces(cells.len()) {
                    events.push(GameEvent::StageChanged {
                        stage,
                        speed: progress.speed(),
                    });
                }
                events.push(score_changed(progress));
                added
            }
            Task::MassClear => 0,
        };
        field.remove(&cells)?;
        events.push(GameEvent::CellsCleared {
            cells: cells.into_iter().collect(),
            points,
        });
        field.compact()?;
        self.resolve_matches(field, progress, events)
    }

    /// Spawn is blocked: start pouring random jewels in.
    pub fn begin_fill(&mut self) {
        self.phase = Phase::Filling;
    }

    /// The board is full: everything shrinks away and a life is lost.
    pub fn begin_mass_clear(
        &mut self,
        field: &mut Playfield,
        progress: &mut Progress,
        events: &mut Vec<GameEvent>,
    ) -> Result<Resume, EngineError> {
        progress.lose_life();
        events.push(GameEvent::LifeLost {
            remaining: progress.lives(),
        });
        let cells: BTreeSet<Pos> = field.all_positions().into_iter().collect();
        self.begin_flash(cells, Task::MassClear, field)
    }
}

fn score_changed(progress: &Progress) -> GameEvent {
    GameEvent::ScoreChanged {
        score: progress.score(),
        pending_points: progress.pending(),
        multiplier: progress.multiplier(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::piece::Piece;

    /// 14x6 board with `bottom` as its lowest rows.
    fn field_with(bottom: &[&[u8]]) -> Playfield {
        let empty: &[u8] = &[0; 6];
        let mut rows = vec![empty; 14 - bottom.len()];
        rows.extend_from_slice(bottom);
        Playfield::from_board(Board::from_rows(&rows))
    }

    fn setup() -> (Cascade, Progress, Vec<GameEvent>) {
        let config = GameConfig::default();
        (Cascade::new(&config), Progress::new(&config), Vec::new())
    }

    fn delay() -> Duration {
        GameConfig::default().flash_delay()
    }

    #[test]
    fn test_queue_replaces_same_kind() {
        let mut queue = DelayQueue::new();
        let first = queue.schedule(Task::Delete, Duration::from_millis(100));
        let second = queue.schedule(Task::Delete, Duration::from_millis(50));
        assert_ne!(first, second);
        assert_eq!(queue.pending.len(), 1);
        assert_eq!(queue.advance(Duration::from_millis(60)), vec![second]);
        assert!(queue.is_empty());
        assert!(queue.advance(Duration::from_millis(100)).is_empty());
    }

    #[test]
    fn test_queue_fires_in_due_order() {
        let mut queue = DelayQueue::new();
        let late = queue.schedule(Task::MassClear, Duration::from_millis(80));
        let early = queue.schedule(Task::Delete, Duration::from_millis(20));
        assert!(queue.advance(Duration::from_millis(10)).is_empty());
        assert_eq!(queue.advance(Duration::from_millis(100)), vec![early, late]);
    }

    #[test]
    fn test_landing_without_match_resumes_play() {
        let (mut cascade, mut progress, mut events) = setup();
        let mut field = field_with(&[&[0, 1, 2, 0, 0, 0]]);
        let block = Block::new([Piece::Color(3), Piece::Color(4), Piece::Color(5)], 11, 0);
        let resume = cascade.land(&block, &mut field, &mut progress, &mut events);
        assert_eq!(resume, Ok(Resume::Play));
        assert_eq!(cascade.phase(), Phase::Falling);
        assert_eq!(cascade.iteration(), 0);
        assert_eq!(events, vec![GameEvent::BlockPlaced]);
        assert_eq!(field.verify(), Ok(()));
    }

    #[test]
    fn test_chain_doubles_second_pass() {
        let (mut cascade, mut progress, mut events) = setup();
        let mut field = field_with(&[&[0, 0, 2, 0, 0, 0], &[0, 1, 1, 2, 2, 0]]);
        let block = Block::new([Piece::Color(6), Piece::Color(5), Piece::Color(1)], 11, 0);

        let resume = cascade.land(&block, &mut field, &mut progress, &mut events);
        assert_eq!(resume, Ok(Resume::Pending));
        assert_eq!(cascade.phase(), Phase::FlashDelay);
        assert_eq!(progress.pending(), 300);
        assert_eq!(progress.score(), 0);
        assert_eq!(cascade.in_flight().map(BTreeSet::len), Some(3));

        let early = delay() - Duration::from_millis(1);
        let resume = cascade.advance(early, &mut field, &mut progress, &mut events);
        assert_eq!(resume, Ok(Resume::Pending));
        assert_eq!(progress.score(), 0);

        let resume = cascade.advance(
            Duration::from_millis(1),
            &mut field,
            &mut progress,
            &mut events,
        );
        assert_eq!(resume, Ok(Resume::Pending));
        assert_eq!(progress.score(), 300);
        assert_eq!(cascade.iteration(), 2);
        assert_eq!(progress.pending(), 600);
        assert_eq!(progress.multiplier(), 2);

        let resume = cascade.advance(delay(), &mut field, &mut progress, &mut events);
        assert_eq!(resume, Ok(Resume::Play));
        assert_eq!(progress.score(), 900);
        assert_eq!(progress.rest(), 44);
        assert_eq!(cascade.iteration(), 0);
        assert_eq!(field.board().column(0)[12..], [6, 5]);
        assert_eq!(field.jewels().len(), 2);
        assert_eq!(field.verify(), Ok(()));

        let cleared: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::CellsCleared { points, .. } => Some(*points),
                _ => None,
            })
            .collect();
        assert_eq!(cleared, vec![300, 600]);
    }

    #[test]
    fn test_wild_clears_color_below() {
        let (mut cascade, mut progress, mut events) = setup();
        let mut field = field_with(&[&[4, 0, 0, 0, 0, 0], &[2, 4, 1, 4, 3, 4]]);
        let block = Block::new([Piece::Wild; 3], 9, 0);

        let resume = cascade.land(&block, &mut field, &mut progress, &mut events);
        assert_eq!(resume, Ok(Resume::Pending));
        assert_eq!(cascade.phase(), Phase::FlashDelay);
        assert_eq!(cascade.in_flight().map(BTreeSet::len), Some(7));
        assert_eq!(progress.pending(), 300);
        assert_eq!(progress.multiplier(), 1);

        let resume = cascade.advance(delay(), &mut field, &mut progress, &mut events);
        assert_eq!(resume, Ok(Resume::Play));
        assert_eq!(progress.score(), 300);
        assert_eq!(progress.rest(), 43);
        assert!(field.board().cells_of_color(4).is_empty());
        assert_eq!(field.jewels().len(), 3);
        assert_eq!(field.verify(), Ok(()));
    }

    #[test]
    fn test_wild_on_floor_scores_jewel_score() {
        let (mut cascade, mut progress, mut events) = setup();
        let mut field = field_with(&[]);
        let block = Block::new([Piece::Wild; 3], 11, 0);

        let resume = cascade.land(&block, &mut field, &mut progress, &mut events);
        assert_eq!(resume, Ok(Resume::Pending));
        assert_eq!(progress.pending(), 300);
        assert_eq!(progress.multiplier(), 1);
        assert_eq!(
            cascade.in_flight(),
            Some(&BTreeSet::from([Pos::new(11, 0), Pos::new(12, 0), Pos::new(13, 0)]))
        );

        let resume = cascade.advance(delay(), &mut field, &mut progress, &mut events);
        assert_eq!(resume, Ok(Resume::Play));
        assert_eq!(progress.score(), 300);
        assert_eq!(progress.rest(), 47);
        assert!(field.jewels().is_empty());
        assert_eq!(field.verify(), Ok(()));
    }

    #[test]
    fn test_task_for_other_clear_is_ignored() {
        let (mut cascade, mut progress, mut events) = setup();
        let mut field = field_with(&[&[1, 2, 3, 0, 0, 0]]);
        let cells = BTreeSet::from([Pos::new(13, 0)]);
        cascade.begin_flash(cells, Task::Delete, &mut field).unwrap();
        cascade.tasks.schedule(Task::MassClear, Duration::from_millis(1));

        let resume = cascade.advance(
            Duration::from_millis(1),
            &mut field,
            &mut progress,
            &mut events,
        );
        assert_eq!(resume, Ok(Resume::Pending));
        assert_eq!(cascade.in_flight().map(BTreeSet::len), Some(1));
        assert_eq!(field.jewels().len(), 3);
        assert!(events.is_empty());

        // deletion fires after its set was dropped
        cascade.in_flight = None;
        assert_eq!(
            cascade.advance(delay(), &mut field, &mut progress, &mut events),
            Err(EngineError::NothingInFlight)
        );
    }

    #[test]
    fn test_second_clear_while_in_flight_is_error() {
        let (mut cascade, _, _) = setup();
        let mut field = field_with(&[&[1, 2, 3, 0, 0, 0]]);
        let cells = BTreeSet::from([Pos::new(13, 0)]);
        assert_eq!(
            cascade.begin_flash(cells.clone(), Task::Delete, &mut field),
            Ok(Resume::Pending)
        );
        assert_eq!(
            cascade.begin_flash(cells, Task::Delete, &mut field),
            Err(EngineError::ClearInFlight)
        );
    }

    #[test]
    fn test_mass_clear_costs_life_not_points() {
        let (mut cascade, mut progress, mut events) = setup();
        let mut field = field_with(&[&[1, 2, 3, 4, 5, 6]]);
        cascade.begin_fill();
        assert!(cascade.is_filling());

        let resume = cascade.begin_mass_clear(&mut field, &mut progress, &mut events);
        assert_eq!(resume, Ok(Resume::Pending));
        assert_eq!(events, vec![GameEvent::LifeLost { remaining: 2 }]);
        assert!(field
            .jewels()
            .iter()
            .all(|j| j.animation.map(|a| a.kind) == Some(AnimationKind::Shrink)));

        let resume = cascade.advance(delay(), &mut field, &mut progress, &mut events);
        assert_eq!(resume, Ok(Resume::Play));
        assert!(field.jewels().is_empty());
        assert_eq!(field.board().empty_cells().len(), 84);
        assert_eq!(progress.score(), 0);
        assert_eq!(progress.rest(), 50);
    }

    #[test]
    fn test_last_life_settles_into_game_over() {
        let config = GameConfig {
            initial_lives: 1,
            ..GameConfig::default()
        };
        let mut cascade = Cascade::new(&config);
        let mut progress = Progress::new(&config);
        let mut events = Vec::new();
        let mut field = field_with(&[&[1, 2, 3, 4, 5, 6]]);
        cascade.begin_fill();
        cascade
            .begin_mass_clear(&mut field, &mut progress, &mut events)
            .unwrap();
        let resume = cascade.advance(delay(), &mut field, &mut progress, &mut events);
        assert_eq!(resume, Ok(Resume::GameOver));
        assert_eq!(cascade.phase(), Phase::GameOver);
    }
}
