//! Falling Bricks - terminal host
//!
//! Owns the terminal, the clock, audio and settings, and drives a
//! [`falling_bricks::Game`] at a fixed frame rate.

mod audio;
mod input;
mod menu;
mod settings;
mod ui;

use audio::{AudioManager, Sfx};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use falling_bricks::{Game, GameEvent, GameMode, Intent, Phase};
use input::{Action, InputHandler};
use menu::{Menu, MenuAction, MenuScreen};
use ratatui::{backend::CrosstermBackend, Terminal};
use settings::Settings;
use std::{
    io::{self, stdout},
    time::{Duration, Instant},
};
use tracing_subscriber::{filter::Directive, EnvFilter};

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Get the falling-bricks temp directory, creating it if needed
fn temp_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("falling-bricks");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn main() -> io::Result<()> {
    // Generate session ID for this instance
    let session_id: u32 = rand::random();

    let log_dir = temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    // Setup tracing to log file
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "falling_bricks=debug".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .init();

    tracing::info!(
        "Falling Bricks starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let mut settings = Settings::load();

    // Game works without audio
    let mut audio = AudioManager::new(settings.audio.music_enabled, settings.audio.sound_enabled);
    audio.set_music_volume(settings.audio.music_volume as f32 / 100.0);
    audio.set_sound_volume(settings.audio.sound_volume as f32 / 100.0);
    tracing::info!("Audio output {}", if audio.has_output() { "ready" } else { "unavailable" });

    // Setup terminal
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut settings, &mut audio);

    // Restore terminal
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    // Keep the music/sound toggles for next time
    settings.audio.music_enabled = audio.music_enabled();
    settings.audio.sound_enabled = audio.sound_enabled();
    if let Err(e) = settings.save() {
        eprintln!("Warning: Could not save settings: {}", e);
    }

    if let Ok(game) = &result {
        println!("\nThanks for playing Falling Bricks!");
        let score = game.score();
        if score.lines > 0 || score.points > 0 {
            println!("Mode: {}", game.mode().name());
            println!("Final Score: {}", score.points);
            println!("Level: {} | Lines: {}", score.level, score.lines);
            if game.mode() == GameMode::FortyLines {
                println!("Time: {}", game.mode_state().display_time());
            }
        }
    }

    tracing::info!("Falling Bricks shutting down");
    result.map(|_| ())
}

/// What the frame loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Host state shared by the frame loop
struct App<'a> {
    game: Game,
    menu: Menu,
    input: InputHandler,
    settings: &'a mut Settings,
    audio: &'a mut AudioManager,
    last_phase: Phase,
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: &mut Settings,
    audio: &mut AudioManager,
) -> io::Result<Game> {
    let clock = Instant::now();
    let mut app = App {
        game: Game::new(),
        menu: Menu::title(),
        input: InputHandler::from_settings(settings),
        settings,
        audio,
        last_phase: Phase::Menu,
    };

    loop {
        let now_ms = clock.elapsed().as_millis() as u64;

        terminal.draw(|frame| match app.game.phase() {
            Phase::Menu => ui::render_menu(frame, &app.menu),
            Phase::GameOver => {
                ui::render_game(frame, &app.game, &*app.settings, now_ms);
                ui::render_game_over(frame, &app.game, &app.menu);
            }
            _ => ui::render_game(frame, &app.game, &*app.settings, now_ms),
        })?;

        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                let now_ms = clock.elapsed().as_millis() as u64;
                match key.kind {
                    KeyEventKind::Release => app.input.key_up(key),
                    KeyEventKind::Press | KeyEventKind::Repeat => {
                        if app.on_key(key, now_ms) == Flow::Exit {
                            break;
                        }
                    }
                }
            }
        }

        let now_ms = clock.elapsed().as_millis() as u64;
        if is_round_phase(app.game.phase()) {
            for intent in app.input.update() {
                app.game.handle(intent, now_ms);
            }
        }
        app.game.update(now_ms);
        app.after_update();
    }

    Ok(app.game)
}

/// Phases where the falling piece takes input
fn is_round_phase(phase: Phase) -> bool {
    matches!(
        phase,
        Phase::Countdown | Phase::Playing | Phase::CheckRows | Phase::Dropping | Phase::Paused
    )
}

impl App<'_> {
    fn on_key(&mut self, key: KeyEvent, now_ms: u64) -> Flow {
        match self.game.phase() {
            Phase::Menu | Phase::GameOver => self.on_menu_key(key, now_ms),
            _ => self.on_game_key(key, now_ms),
        }
    }

    fn on_game_key(&mut self, key: KeyEvent, now_ms: u64) -> Flow {
        match self.input.key_down(key) {
            Some(Action::Play(intent)) => {
                self.game.handle(intent, now_ms);
                if intent == Intent::Pause {
                    self.input.clear();
                }
            }
            Some(Action::ToggleMusic) => {
                self.settings.audio.music_enabled = self.audio.toggle_music();
            }
            Some(Action::ToggleSound) => {
                self.settings.audio.sound_enabled = self.audio.toggle_sound();
            }
            Some(Action::Quit) => return Flow::Exit,
            None => {}
        }
        Flow::Continue
    }

    fn on_menu_key(&mut self, key: KeyEvent, now_ms: u64) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Exit;
        }

        match key.code {
            KeyCode::Up => {
                self.menu.move_up();
                self.audio.play_sfx(Sfx::Move);
            }
            KeyCode::Down => {
                self.menu.move_down();
                self.audio.play_sfx(Sfx::Move);
            }
            KeyCode::Left | KeyCode::Right => {
                self.menu.adjust(key.code == KeyCode::Right, self.settings);
                self.apply_volumes();
            }
            KeyCode::Enter => {
                if let Some(action) = self.menu.select() {
                    return self.on_menu_action(action, now_ms);
                }
            }
            KeyCode::Esc => {
                if self.menu.screen == MenuScreen::Settings {
                    self.menu = Menu::title();
                } else {
                    return Flow::Exit;
                }
            }
            _ => {}
        }
        Flow::Continue
    }

    fn on_menu_action(&mut self, action: MenuAction, now_ms: u64) -> Flow {
        match action {
            MenuAction::StartGame(mode) => {
                tracing::info!("Starting {} round", mode.name());
                self.input = InputHandler::from_settings(self.settings);
                self.game.start(mode, now_ms);
            }
            MenuAction::GoToScreen(screen) => {
                self.menu = Menu::go_to(screen, self.settings);
            }
            MenuAction::MainMenu => {
                self.game.return_to_menu();
                self.menu = Menu::title();
            }
            MenuAction::SaveSettings => {
                if let Err(e) = self.settings.save() {
                    tracing::warn!("Could not save settings: {}", e);
                }
                self.menu = Menu::title();
            }
            MenuAction::Quit => return Flow::Exit,
        }
        Flow::Continue
    }

    fn apply_volumes(&mut self) {
        self.audio
            .set_music_volume(self.settings.audio.music_volume as f32 / 100.0);
        self.audio
            .set_sound_volume(self.settings.audio.sound_volume as f32 / 100.0);
    }

    /// Turn game events and phase changes into sound and menu changes
    fn after_update(&mut self) {
        for event in self.game.drain_events() {
            match event {
                GameEvent::Go => self.audio.start_music(),
                GameEvent::GameOver => {
                    self.audio.game_over();
                    self.input.clear();
                    self.menu = Menu::game_over();
                }
                other => {
                    if let Some(sfx) = Sfx::for_event(other) {
                        self.audio.play_sfx(sfx);
                    }
                }
            }
        }

        let phase = self.game.phase();
        if phase != self.last_phase {
            if phase == Phase::Paused || self.last_phase == Phase::Paused {
                self.audio.pause_music(phase == Phase::Paused);
            }
            if phase == Phase::Menu {
                self.audio.stop_music();
            }
            self.last_phase = phase;
        }
        self.audio.tick();
    }
}
