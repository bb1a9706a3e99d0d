//! Core game state and logic
//!
//! `Game` is driven by the host: intents are latched through [`Game::handle`]
//! and applied by [`Game::update`], both of which take the host's monotonic
//! clock in milliseconds. Sounds and animations are requested through
//! [`GameEvent`]s the host drains after each update.

use crate::board::{Board, Placement};
use crate::mode::{GameMode, ModeState, BLITZ_TIME_MS};
use crate::piece::{Piece, RotationDirection};
use crate::queue::{PieceGenerator, PieceQueue};
use crate::score::{clear_label, Score};
use tracing::{debug, info, warn};

/// Display time of each countdown step
pub const COUNTDOWN_STEP_MS: u64 = 1000;
/// Delay between marking full rows and clearing them
pub const ROW_CLEAR_DELAY_MS: u64 = 700;
/// Display time of the main banner (row clears, "GO!")
pub const MAIN_BANNER_MS: u64 = 2000;
pub const LEVEL_UP_BANNER_MS: u64 = 2500;
pub const COMBO_BANNER_MS: u64 = 2500;

/// Countdown steps shown before a round starts
const COUNTDOWN_FROM: u8 = 3;

/// Round flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Menu,
    Countdown,
    Playing,
    /// A piece just locked or gravity just settled; full rows are evaluated
    CheckRows,
    /// Full rows are marked and wait to be cleared
    Dropping,
    Paused,
    GameOver,
}

/// Player intents the game can process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    RotateCw,
    RotateCcw,
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    /// The next piece could not be placed
    ToppedOut,
    /// 40 Lines goal reached
    LinesReached,
    /// Blitz clock ran out
    TimeUp,
}

/// Fire-and-forget triggers for sound and animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Countdown(u8),
    Go,
    Move,
    Lock,
    Clear(u32),
    Combo,
    LevelUp,
    GameOver,
}

/// Transient text shown over the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub text: String,
    pub shown_at_ms: u64,
    pub duration_ms: u64,
}

impl Banner {
    fn new(text: impl Into<String>, shown_at_ms: u64, duration_ms: u64) -> Self {
        Self {
            text: text.into(),
            shown_at_ms,
            duration_ms,
        }
    }

    pub fn is_visible(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.shown_at_ms) < self.duration_ms
    }

    /// Remaining display share, 1.0 when shown and 0.0 when expired
    pub fn opacity(&self, now_ms: u64) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        let shown = now_ms.saturating_sub(self.shown_at_ms) as f64;
        (1.0 - shown / self.duration_ms as f64).clamp(0.0, 1.0)
    }
}

/// Intents latched since the last playing frame
#[derive(Debug, Clone, Copy, Default)]
struct InputFlags {
    left: bool,
    right: bool,
    down: bool,
    hard_drop: bool,
    rotate: Option<RotationDirection>,
}

/// Clock bookkeeping, all in host milliseconds
#[derive(Debug, Clone, Copy, Default)]
struct Timers {
    round_start: u64,
    last_drop: u64,
    last_countdown_tick: Option<u64>,
    row_clear_start: u64,
    total_row_clear: u64,
    pause_start: u64,
    total_pause: u64,
}

/// The main game struct
pub struct Game {
    board: Board,
    queue: PieceQueue,
    generator: PieceGenerator,
    /// Current falling piece
    player: Option<Piece>,
    score: Score,
    mode_state: ModeState,
    phase: Phase,
    /// Phase to return to when unpausing
    paused_from: Phase,
    game_over_reason: Option<GameOverReason>,
    input: InputFlags,
    timers: Timers,
    countdown: u8,
    /// Set when rows are checked right after a gravity settle
    combo: bool,
    main_banner: Option<Banner>,
    level_up_banner: Option<Banner>,
    combo_banner: Option<Banner>,
    events: Vec<GameEvent>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Create a game sitting in the menu
    pub fn new() -> Self {
        Self::with_generator(PieceGenerator::new())
    }

    /// Create a game with a reproducible piece sequence
    pub fn with_seed(seed: u64) -> Self {
        Self::with_generator(PieceGenerator::with_seed(seed))
    }

    fn with_generator(generator: PieceGenerator) -> Self {
        Self {
            board: Board::new(),
            queue: PieceQueue::new(),
            generator,
            player: None,
            score: Score::new(),
            mode_state: ModeState::new(GameMode::default()),
            phase: Phase::Menu,
            paused_from: Phase::Playing,
            game_over_reason: None,
            input: InputFlags::default(),
            timers: Timers::default(),
            countdown: COUNTDOWN_FROM,
            combo: false,
            main_banner: None,
            level_up_banner: None,
            combo_banner: None,
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> GameMode {
        self.mode_state.mode
    }

    pub fn mode_state(&self) -> &ModeState {
        &self.mode_state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Upcoming pieces, next first
    pub fn queue(&self) -> &PieceQueue {
        &self.queue
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn active_piece(&self) -> Option<&Piece> {
        self.player.as_ref()
    }

    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over_reason
    }

    /// Play time excluding pauses and row-clear delays
    pub fn elapsed_ms(&self) -> u64 {
        self.mode_state.elapsed_ms
    }

    pub fn main_banner(&self, now_ms: u64) -> Option<&Banner> {
        self.main_banner.as_ref().filter(|b| b.is_visible(now_ms))
    }

    pub fn level_up_banner(&self, now_ms: u64) -> Option<&Banner> {
        self.level_up_banner.as_ref().filter(|b| b.is_visible(now_ms))
    }

    pub fn combo_banner(&self, now_ms: u64) -> Option<&Banner> {
        self.combo_banner.as_ref().filter(|b| b.is_visible(now_ms))
    }

    /// Take every event emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Reset the round state and begin the countdown for a mode
    pub fn start(&mut self, mode: GameMode, now_ms: u64) {
        self.board.clear();
        self.discard_queue();
        self.generator.fill(&mut self.queue);
        self.player = None;
        self.score = Score::new();
        self.mode_state = ModeState::new(mode);
        self.game_over_reason = None;
        self.input = InputFlags::default();
        self.timers = Timers {
            round_start: now_ms,
            last_drop: now_ms,
            ..Timers::default()
        };
        self.countdown = COUNTDOWN_FROM;
        self.combo = false;
        self.main_banner = None;
        self.level_up_banner = None;
        self.combo_banner = None;
        self.phase = Phase::Countdown;
        info!(mode = mode.name(), "round prepared");
    }

    /// Leave the round and clear the board, queue and falling piece
    pub fn return_to_menu(&mut self) {
        self.board.clear();
        self.discard_queue();
        self.player = None;
        self.input = InputFlags::default();
        self.main_banner = None;
        self.level_up_banner = None;
        self.combo_banner = None;
        self.phase = Phase::Menu;
        debug!("returned to menu");
    }

    /// Latch a player intent; movement is applied on the next playing frame
    pub fn handle(&mut self, intent: Intent, now_ms: u64) {
        if intent == Intent::Pause {
            self.toggle_pause(now_ms);
            return;
        }
        if self.phase != Phase::Playing {
            return;
        }
        match intent {
            Intent::MoveLeft => self.input.left = true,
            Intent::MoveRight => self.input.right = true,
            Intent::SoftDrop => self.input.down = true,
            Intent::HardDrop => self.input.hard_drop = true,
            Intent::RotateCw => self.input.rotate = Some(RotationDirection::Clockwise),
            Intent::RotateCcw => self.input.rotate = Some(RotationDirection::CounterClockwise),
            Intent::Pause => {}
        }
    }

    fn toggle_pause(&mut self, now_ms: u64) {
        match self.phase {
            Phase::Playing | Phase::CheckRows | Phase::Dropping => {
                self.paused_from = self.phase;
                self.timers.pause_start = now_ms;
                self.phase = Phase::Paused;
                info!("paused");
            }
            Phase::Paused => {
                let paused_for = now_ms.saturating_sub(self.timers.pause_start);
                self.timers.total_pause += paused_for;
                self.timers.last_drop += paused_for;
                if self.paused_from == Phase::Dropping {
                    self.timers.row_clear_start += paused_for;
                }
                self.phase = self.paused_from;
                info!(paused_ms = paused_for, "resumed");
            }
            _ => {}
        }
    }

    /// Advance the simulation to `now_ms`
    pub fn update(&mut self, now_ms: u64) {
        match self.phase {
            Phase::Menu | Phase::Paused | Phase::GameOver => {}
            Phase::Countdown => self.tick_countdown(now_ms),
            Phase::CheckRows => self.check_rows(now_ms),
            Phase::Dropping => self.settle_rows(now_ms),
            Phase::Playing => self.play_frame(now_ms),
        }
    }

    fn tick_countdown(&mut self, now_ms: u64) {
        let due = self
            .timers
            .last_countdown_tick
            .is_none_or(|last| now_ms.saturating_sub(last) >= COUNTDOWN_STEP_MS);
        if !due {
            return;
        }
        self.timers.last_countdown_tick = Some(now_ms);

        if self.countdown == 0 {
            self.main_banner = Some(Banner::new("GO!", now_ms, MAIN_BANNER_MS));
            self.events.push(GameEvent::Go);
            self.begin_round(now_ms);
        } else {
            self.main_banner = Some(Banner::new(
                self.countdown.to_string(),
                now_ms,
                COUNTDOWN_STEP_MS,
            ));
            self.events.push(GameEvent::Countdown(self.countdown));
            self.countdown -= 1;
        }
    }

    fn begin_round(&mut self, now_ms: u64) {
        self.timers.round_start = now_ms;
        self.timers.last_drop = now_ms;
        self.phase = Phase::Playing;
        self.spawn();
        info!(mode = self.mode().name(), "round started");
    }

    /// Empty the preview queue, logging what was thrown away
    fn discard_queue(&mut self) {
        let mut kinds = Vec::with_capacity(self.queue.len());
        self.queue.clear_with(|piece| kinds.push(piece.kind().name()));
        if !kinds.is_empty() {
            debug!(?kinds, "discarded queued pieces");
        }
    }

    /// Move the head of the queue into play and replenish the queue
    fn spawn(&mut self) {
        let Some(piece) = self.queue.dequeue() else {
            return;
        };
        let col = (self.board.width() / 2) as i32 - (piece.width() / 2) as i32;
        let piece = piece.at(0, col);
        debug!(kind = piece.kind().name(), col, "spawning piece");
        self.player = Some(piece);
        self.queue.enqueue(self.generator.next_piece());
    }

    fn check_rows(&mut self, now_ms: u64) {
        let combo = std::mem::take(&mut self.combo);
        let cleared = self.board.check_and_mark_full_rows() as u32;
        if cleared == 0 {
            self.phase = Phase::Playing;
            return;
        }

        let points = self.score.add_clear(cleared, combo);
        self.timers.row_clear_start = now_ms;
        self.phase = Phase::Dropping;
        self.main_banner = Some(Banner::new(clear_label(cleared), now_ms, MAIN_BANNER_MS));
        self.events.push(GameEvent::Clear(cleared));
        if combo {
            self.combo_banner = Some(Banner::new("COMBO!", now_ms, COMBO_BANNER_MS));
            self.events.push(GameEvent::Combo);
        }
        debug!(cleared, combo, points, total = self.score.points, "rows cleared");

        if self.score.update_level() {
            self.level_up_banner = Some(Banner::new("LEVEL UP!", now_ms, LEVEL_UP_BANNER_MS));
            self.events.push(GameEvent::LevelUp);
            info!(
                level = self.score.level,
                drop_delay_ms = self.score.drop_delay_ms(),
                "level up"
            );
        }
    }

    fn settle_rows(&mut self, now_ms: u64) {
        let waited = now_ms.saturating_sub(self.timers.row_clear_start);
        if waited < ROW_CLEAR_DELAY_MS {
            return;
        }
        self.timers.total_row_clear += waited;
        self.timers.last_drop = now_ms;

        match self.board.clear_full_rows() {
            Ok(_) => {
                self.board.drop_all_pieces();
                self.combo = true;
                self.phase = Phase::CheckRows;
            }
            Err(err) => {
                warn!(error = %err, "continuing without clearing rows");
                self.phase = Phase::Playing;
            }
        }
    }

    fn play_frame(&mut self, now_ms: u64) {
        let timers = self.timers;
        self.mode_state.elapsed_ms = now_ms
            .saturating_sub(timers.round_start)
            .saturating_sub(timers.total_row_clear)
            .saturating_sub(timers.total_pause);

        if self.mode_state.time_up() {
            self.mode_state.elapsed_ms = BLITZ_TIME_MS;
            self.game_over(GameOverReason::TimeUp);
            return;
        }
        if self.mode_state.lines_reached(self.score.lines) {
            self.game_over(GameOverReason::LinesReached);
            return;
        }

        if self.player.is_none() {
            self.spawn();
        }
        let Some(mut piece) = self.player.take() else {
            return;
        };

        if now_ms.saturating_sub(self.timers.last_drop) >= self.score.drop_delay_ms() {
            self.timers.last_drop = now_ms;
            self.input.down = true;
        }

        let input = std::mem::take(&mut self.input);
        if input.left && self.board.validate_at(&piece, piece.row, piece.col - 1) {
            piece.col -= 1;
            self.events.push(GameEvent::Move);
        }
        if input.right && self.board.validate_at(&piece, piece.row, piece.col + 1) {
            piece.col += 1;
            self.events.push(GameEvent::Move);
        }
        if let Some(direction) = input.rotate {
            if let Ok(rotated) = self.board.try_rotate(&piece, direction) {
                piece = rotated;
                self.events.push(GameEvent::Move);
            }
        }

        let mut lock = false;
        if input.down {
            if self.board.validate_at(&piece, piece.row + 1, piece.col) {
                piece.row += 1;
            } else {
                lock = true;
            }
        }
        let placement = if input.hard_drop {
            self.timers.last_drop = now_ms;
            Placement::HardDrop
        } else if lock {
            Placement::Lock
        } else {
            Placement::Float
        };

        self.board.clear_unlocked_cells();
        match self.board.add_piece(&piece, placement) {
            Err(_) => {
                self.board.mark_x_cells(&piece);
                self.player = Some(piece);
                self.game_over(GameOverReason::ToppedOut);
            }
            Ok(_) if placement == Placement::Float => {
                self.player = Some(piece);
            }
            Ok(landing) => {
                debug!(row = landing.row, col = landing.col, "piece locked");
                self.phase = Phase::CheckRows;
                self.events.push(GameEvent::Lock);
            }
        }
    }

    fn game_over(&mut self, reason: GameOverReason) {
        self.phase = Phase::GameOver;
        self.game_over_reason = Some(reason);
        self.input = InputFlags::default();
        self.combo = false;
        self.events.push(GameEvent::GameOver);
        info!(
            ?reason,
            score = self.score.points,
            lines = self.score.lines,
            level = self.score.level,
            elapsed_ms = self.mode_state.elapsed_ms,
            "game over"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceKind;
    use ratatui::style::Color;

    const GO_AT: u64 = 3 * COUNTDOWN_STEP_MS;

    fn block(row: i32, col: i32) -> Piece {
        Piece::from_mask(PieceKind::O, 1, 1, vec![true], Color::Gray)
            .unwrap()
            .at(row, col)
    }

    fn lock_block(game: &mut Game, row: i32, col: i32) {
        game.board.add_piece(&block(row, col), Placement::Lock).unwrap();
    }

    /// Run the countdown and return a game that just started playing
    fn playing(mode: GameMode) -> Game {
        let mut game = Game::with_seed(11);
        game.start(mode, 0);
        for step in 0..=3 {
            game.update(step * COUNTDOWN_STEP_MS);
        }
        assert_eq!(game.phase(), Phase::Playing);
        game.drain_events();
        game
    }

    #[test]
    fn test_new_game_waits_in_menu() {
        let mut game = Game::with_seed(1);
        game.update(10_000);
        assert_eq!(game.phase(), Phase::Menu);
        assert!(game.queue().is_empty());
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_countdown_sequence() {
        let mut game = Game::with_seed(1);
        game.start(GameMode::Endless, 0);
        assert_eq!(game.queue().len(), 6);

        game.update(0);
        assert_eq!(game.drain_events(), vec![GameEvent::Countdown(3)]);
        assert_eq!(game.main_banner(0).map(|b| b.text.as_str()), Some("3"));
        game.update(999);
        assert!(game.drain_events().is_empty());
        game.update(1000);
        assert_eq!(game.drain_events(), vec![GameEvent::Countdown(2)]);
        game.update(2000);
        assert_eq!(game.drain_events(), vec![GameEvent::Countdown(1)]);
        assert_eq!(game.phase(), Phase::Countdown);
        game.update(GO_AT);
        assert_eq!(game.drain_events(), vec![GameEvent::Go]);
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.main_banner(GO_AT).map(|b| b.text.as_str()), Some("GO!"));
    }

    #[test]
    fn test_first_piece_spawns_centered() {
        let game = playing(GameMode::Endless);
        let piece = game.active_piece().unwrap();
        assert_eq!(piece.row, 0);
        assert_eq!(piece.col, 5 - piece.width() as i32 / 2);
        assert_eq!(game.queue().len(), 6);
    }

    #[test]
    fn test_intents_ignored_outside_play() {
        let mut game = Game::with_seed(1);
        game.handle(Intent::HardDrop, 0);
        game.handle(Intent::Pause, 0);
        assert_eq!(game.phase(), Phase::Menu);
        game.start(GameMode::Endless, 0);
        game.handle(Intent::Pause, 0);
        assert_eq!(game.phase(), Phase::Countdown);
    }

    #[test]
    fn test_move_left_and_right() {
        let mut game = playing(GameMode::Endless);
        let col = game.active_piece().unwrap().col;
        game.handle(Intent::MoveLeft, GO_AT + 1);
        game.update(GO_AT + 1);
        assert_eq!(game.active_piece().unwrap().col, col - 1);
        assert_eq!(game.drain_events(), vec![GameEvent::Move]);

        game.handle(Intent::MoveRight, GO_AT + 2);
        game.handle(Intent::MoveRight, GO_AT + 2);
        game.update(GO_AT + 2);
        // Repeated intents within one frame latch once
        assert_eq!(game.active_piece().unwrap().col, col);
    }

    #[test]
    fn test_blocked_move_is_silent() {
        let mut game = playing(GameMode::Endless);
        game.player = Some(Piece::new(PieceKind::O).at(0, 0));
        game.handle(Intent::MoveLeft, GO_AT + 1);
        game.update(GO_AT + 1);
        assert_eq!(game.active_piece().unwrap().col, 0);
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_gravity_moves_piece_down() {
        let mut game = playing(GameMode::Endless);
        game.update(GO_AT + 999);
        assert_eq!(game.active_piece().unwrap().row, 0);
        game.update(GO_AT + 1000);
        assert_eq!(game.active_piece().unwrap().row, 1);
    }

    #[test]
    fn test_live_piece_is_stamped_with_shadow() {
        let mut game = playing(GameMode::Endless);
        game.player = Some(Piece::new(PieceKind::O).at(0, 4));
        game.update(GO_AT + 1);
        let board = game.board();
        assert!(board.view(0, 4).unwrap().color.is_some());
        assert!(!board.view(0, 4).unwrap().locked);
        assert!(board.view(19, 4).unwrap().shadow);
    }

    #[test]
    fn test_hard_drop_locks_piece() {
        let mut game = playing(GameMode::Endless);
        game.player = Some(Piece::new(PieceKind::I).at(0, 3));
        game.handle(Intent::HardDrop, GO_AT + 1);
        game.update(GO_AT + 1);

        assert_eq!(game.phase(), Phase::CheckRows);
        assert!(game.active_piece().is_none());
        assert_eq!(game.drain_events(), vec![GameEvent::Lock]);
        assert_eq!(game.board().row_locked_count(19), 4);

        game.update(GO_AT + 2);
        assert_eq!(game.phase(), Phase::Playing);
        game.update(GO_AT + 3);
        assert!(game.active_piece().is_some());
    }

    #[test]
    fn test_failed_soft_drop_locks() {
        let mut game = playing(GameMode::Endless);
        game.player = Some(Piece::new(PieceKind::O).at(18, 0));
        game.handle(Intent::SoftDrop, GO_AT + 1);
        game.update(GO_AT + 1);
        assert_eq!(game.phase(), Phase::CheckRows);
        assert!(game.board().view(18, 0).unwrap().locked);
    }

    #[test]
    fn test_rotation_applies_kick() {
        let mut game = playing(GameMode::Endless);
        game.player = Some(Piece::new(PieceKind::I).at(5, 3));
        game.handle(Intent::RotateCw, GO_AT + 1);
        game.update(GO_AT + 1);
        let piece = game.active_piece().unwrap();
        assert_eq!((piece.width(), piece.height()), (1, 4));
        assert_eq!((piece.row, piece.col), (3, 5));
    }

    #[test]
    fn test_row_clear_flow() {
        let mut game = playing(GameMode::Endless);
        for col in 0..9 {
            lock_block(&mut game, 19, col);
        }
        game.player = Some(
            Piece::new(PieceKind::I)
                .rotate(RotationDirection::Clockwise)
                .at(0, 9),
        );
        let t = GO_AT + 10;
        game.handle(Intent::HardDrop, t);
        game.update(t);
        game.update(t + 1);
        assert_eq!(game.phase(), Phase::Dropping);
        assert_eq!(game.score().points, 10);
        assert_eq!(game.score().lines, 1);
        assert_eq!(game.main_banner(t + 1).map(|b| b.text.as_str()), Some("SINGLE"));
        assert!(game.board().view(19, 0).unwrap().marked);

        game.update(t + 1 + ROW_CLEAR_DELAY_MS - 1);
        assert_eq!(game.phase(), Phase::Dropping);
        game.update(t + 1 + ROW_CLEAR_DELAY_MS);
        assert_eq!(game.phase(), Phase::CheckRows);
        // Remaining three cells of the bar fell to the floor
        assert_eq!(game.board().row_locked_count(19), 1);
        assert!(game.board().view(17, 9).unwrap().locked);

        game.update(t + 2 + ROW_CLEAR_DELAY_MS);
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::Lock, GameEvent::Clear(1)]
        );

        // Row-clear time is not play time
        game.update(t + 3 + ROW_CLEAR_DELAY_MS);
        assert_eq!(game.elapsed_ms(), t + 3 - GO_AT);
    }

    #[test]
    fn test_gravity_combo_triples_score() {
        let mut game = playing(GameMode::Endless);
        for col in 0..9 {
            lock_block(&mut game, 19, col);
        }
        for col in 1..10 {
            lock_block(&mut game, 18, col);
        }
        lock_block(&mut game, 17, 9);
        game.player = Some(block(0, 0));

        let t = GO_AT + 10;
        game.handle(Intent::HardDrop, t);
        game.update(t);
        game.update(t + 1);
        assert_eq!(game.score().points, 10);
        game.update(t + 1 + ROW_CLEAR_DELAY_MS);
        game.update(t + 2 + ROW_CLEAR_DELAY_MS);
        assert_eq!(game.phase(), Phase::Dropping);
        assert_eq!(game.score().points, 10 + 30);
        assert!(game.combo_banner(t + 2 + ROW_CLEAR_DELAY_MS).is_some());
        game.update(t + 2 + 2 * ROW_CLEAR_DELAY_MS);
        game.update(t + 3 + 2 * ROW_CLEAR_DELAY_MS);
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.score().lines, 2);

        let events = game.drain_events();
        assert!(events.contains(&GameEvent::Combo));
        assert_eq!(
            events.iter().filter(|e| matches!(e, GameEvent::Clear(1))).count(),
            2
        );
    }

    #[test]
    fn test_level_up_speeds_gravity() {
        let mut game = playing(GameMode::Endless);
        game.score.lines_this_level = 9;
        for col in 0..9 {
            lock_block(&mut game, 19, col);
        }
        game.player = Some(block(0, 9));
        game.handle(Intent::HardDrop, GO_AT + 1);
        game.update(GO_AT + 1);
        game.update(GO_AT + 2);
        assert_eq!(game.score().level, 2);
        assert_eq!(game.score().drop_delay_ms(), 930);
        assert!(game.drain_events().contains(&GameEvent::LevelUp));
        assert!(game.level_up_banner(GO_AT + 2).is_some());
    }

    #[test]
    fn test_pause_excludes_time() {
        let mut game = playing(GameMode::Endless);
        game.handle(Intent::Pause, GO_AT + 500);
        assert_eq!(game.phase(), Phase::Paused);

        game.handle(Intent::MoveLeft, GO_AT + 600);
        game.update(GO_AT + 5000);
        assert_eq!(game.active_piece().unwrap().row, 0);

        game.handle(Intent::Pause, GO_AT + 10_500);
        assert_eq!(game.phase(), Phase::Playing);
        game.update(GO_AT + 10_600);
        assert_eq!(game.elapsed_ms(), 600);
        // Gravity deadline moved by the pause length
        assert_eq!(game.active_piece().unwrap().row, 0);
        game.update(GO_AT + 11_000);
        assert_eq!(game.active_piece().unwrap().row, 1);
    }

    #[test]
    fn test_top_out_ends_round() {
        let mut game = playing(GameMode::Endless);
        let mut now = GO_AT;
        for _ in 0..500 {
            if game.phase() == Phase::GameOver {
                break;
            }
            now += 1;
            game.handle(Intent::HardDrop, now);
            game.update(now);
        }
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.game_over_reason(), Some(GameOverReason::ToppedOut));
        assert!(game.board().cells().any(|(_, _, view)| view.crossed));
        assert_eq!(game.drain_events().last(), Some(&GameEvent::GameOver));
    }

    #[test]
    fn test_blitz_time_up() {
        let mut game = playing(GameMode::Blitz);
        game.update(GO_AT + BLITZ_TIME_MS + 250);
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.game_over_reason(), Some(GameOverReason::TimeUp));
        assert_eq!(game.elapsed_ms(), BLITZ_TIME_MS);
    }

    #[test]
    fn test_forty_lines_goal() {
        let mut game = playing(GameMode::FortyLines);
        game.score.lines = 40;
        game.update(GO_AT + 1);
        assert_eq!(game.game_over_reason(), Some(GameOverReason::LinesReached));
    }

    #[test]
    fn test_return_to_menu_clears_round() {
        let mut game = playing(GameMode::Endless);
        game.handle(Intent::HardDrop, GO_AT + 1);
        game.update(GO_AT + 1);
        game.return_to_menu();
        assert_eq!(game.phase(), Phase::Menu);
        assert!(game.board().is_empty());
        assert!(game.queue().is_empty());
        assert!(game.active_piece().is_none());

        game.start(GameMode::Blitz, 50_000);
        assert_eq!(game.mode(), GameMode::Blitz);
        assert_eq!(game.queue().len(), 6);
        assert_eq!(game.score().points, 0);
    }

    #[test]
    fn test_restart_mid_round_replaces_queue() {
        let mut game = playing(GameMode::Endless);
        game.handle(Intent::HardDrop, GO_AT + 1);
        game.update(GO_AT + 1);
        assert!(!game.board().is_empty());

        game.start(GameMode::FortyLines, 60_000);
        assert_eq!(game.phase(), Phase::Countdown);
        assert_eq!(game.queue().len(), crate::queue::PREVIEW_LEN);
        assert!(game.board().is_empty());
        assert!(game.active_piece().is_none());
    }

    #[test]
    fn test_banner_fades() {
        let banner = Banner::new("SINGLE", 1000, 2000);
        assert!(banner.is_visible(1000));
        assert!((banner.opacity(2000) - 0.5).abs() < 1e-9);
        assert!(!banner.is_visible(3000));
        assert_eq!(banner.opacity(5000), 0.0);
    }
}
