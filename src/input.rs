//! Keyboard input with DAS (Delayed Auto Shift) and ARR (Auto Repeat Rate)
//!
//! Uses a polling-based approach that doesn't rely on key release events,
//! which are unreliable on Linux terminals.

use crate::settings::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use falling_bricks::Intent;
use std::time::{Duration, Instant};

/// Time after which we consider a key "released" if no repeat received
const KEY_TIMEOUT: Duration = Duration::from_millis(100);
/// Delay before a held movement key starts repeating
const DAS: Duration = Duration::from_millis(170);
/// Interval between repeats of a held movement key
const ARR: Duration = Duration::from_millis(50);

/// What a key press asks the host to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Play(Intent),
    ToggleMusic,
    ToggleSound,
    Quit,
}

/// Input handler with DAS/ARR support
pub struct InputHandler {
    /// Held movement keys (for DAS)
    left_state: Option<KeyPressState>,
    right_state: Option<KeyPressState>,
    down_state: Option<KeyPressState>,
    /// Key bindings
    bindings: KeyBindings,
}

#[derive(Debug, Clone)]
struct KeyPressState {
    first_press: Instant,
    last_seen: Instant,
    das_triggered: bool,
    last_arr: Option<Instant>,
}

impl KeyPressState {
    fn new(now: Instant) -> Self {
        Self {
            first_press: now,
            last_seen: now,
            das_triggered: false,
            last_arr: None,
        }
    }
}

/// Key bindings configuration - supports multiple keys per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub soft_drop: Vec<KeyCode>,
    pub hard_drop: Vec<KeyCode>,
    pub rotate_cw: Vec<KeyCode>,
    pub rotate_ccw: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
    pub music: Vec<KeyCode>,
    pub sound: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key string into KeyCode
    fn parse_key(s: &str) -> Option<KeyCode> {
        let lower = s.to_lowercase();
        let code = match lower.as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "esc" | "escape" => KeyCode::Esc,
            f if f.starts_with('f') && f.len() > 1 => KeyCode::F(f[1..].parse().ok()?),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        tracing::warn!("Unknown key binding {:?}", s);
                        return None;
                    }
                }
            }
        };
        Some(code)
    }

    /// Parse a list of key strings into KeyCodes, skipping unknown names
    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter().filter_map(|s| Self::parse_key(s)).collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            move_left: Self::parse_keys(&settings.keys.move_left),
            move_right: Self::parse_keys(&settings.keys.move_right),
            soft_drop: Self::parse_keys(&settings.keys.soft_drop),
            hard_drop: Self::parse_keys(&settings.keys.hard_drop),
            rotate_cw: Self::parse_keys(&settings.keys.rotate_cw),
            rotate_ccw: Self::parse_keys(&settings.keys.rotate_ccw),
            pause: Self::parse_keys(&settings.keys.pause),
            quit: Self::parse_keys(&settings.keys.quit),
            music: Self::parse_keys(&settings.keys.music),
            sound: Self::parse_keys(&settings.keys.sound),
        }
    }
}

impl InputHandler {
    /// Create input handler from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            left_state: None,
            right_state: None,
            down_state: None,
            bindings: KeyBindings::from_settings(settings),
        }
    }

    /// Handle a key press event - returns immediate actions
    pub fn key_down(&mut self, key: KeyEvent) -> Option<Action> {
        self.key_down_at(key, Instant::now())
    }

    fn key_down_at(&mut self, key: KeyEvent, now: Instant) -> Option<Action> {
        // Handle Ctrl+C for quit
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        let code = normalize_key(key.code);
        let bindings = &self.bindings;

        // Movement keys track DAS/ARR; a fresh press acts immediately
        if bindings.move_left.contains(&code) {
            self.right_state = None;
            return press(&mut self.left_state, now).then_some(Action::Play(Intent::MoveLeft));
        }
        if bindings.move_right.contains(&code) {
            self.left_state = None;
            return press(&mut self.right_state, now).then_some(Action::Play(Intent::MoveRight));
        }
        if bindings.soft_drop.contains(&code) {
            return press(&mut self.down_state, now).then_some(Action::Play(Intent::SoftDrop));
        }

        if bindings.hard_drop.contains(&code) {
            Some(Action::Play(Intent::HardDrop))
        } else if bindings.rotate_cw.contains(&code) {
            Some(Action::Play(Intent::RotateCw))
        } else if bindings.rotate_ccw.contains(&code) {
            Some(Action::Play(Intent::RotateCcw))
        } else if bindings.pause.contains(&code) {
            Some(Action::Play(Intent::Pause))
        } else if bindings.music.contains(&code) {
            Some(Action::ToggleMusic)
        } else if bindings.sound.contains(&code) {
            Some(Action::ToggleSound)
        } else if bindings.quit.contains(&code) {
            Some(Action::Quit)
        } else {
            None
        }
    }

    /// Handle a key release event (may not be called on Linux)
    pub fn key_up(&mut self, key: KeyEvent) {
        let code = normalize_key(key.code);

        if self.bindings.move_left.contains(&code) {
            self.left_state = None;
        } else if self.bindings.move_right.contains(&code) {
            self.right_state = None;
        } else if self.bindings.soft_drop.contains(&code) {
            self.down_state = None;
        }
    }

    /// Update held keys and return repeat intents (call every frame)
    pub fn update(&mut self) -> Vec<Intent> {
        self.update_at(Instant::now())
    }

    fn update_at(&mut self, now: Instant) -> Vec<Intent> {
        let mut intents = Vec::new();
        let held = [
            (&mut self.left_state, Intent::MoveLeft),
            (&mut self.right_state, Intent::MoveRight),
            (&mut self.down_state, Intent::SoftDrop),
        ];

        for (slot, intent) in held {
            // No recent key event means the key was released
            if slot
                .as_ref()
                .is_some_and(|state| now.duration_since(state.last_seen) > KEY_TIMEOUT)
            {
                *slot = None;
            }
            if let Some(state) = slot {
                if process_das_arr(state, now) {
                    intents.push(intent);
                }
            }
        }

        intents
    }

    /// Clear all held keys (useful for pause/resume)
    pub fn clear(&mut self) {
        self.left_state = None;
        self.right_state = None;
        self.down_state = None;
    }
}

/// Record a press of a movement key; true when it is a new press
fn press(slot: &mut Option<KeyPressState>, now: Instant) -> bool {
    match slot {
        Some(state) => {
            state.last_seen = now;
            false
        }
        None => {
            *slot = Some(KeyPressState::new(now));
            true
        }
    }
}

/// Process DAS/ARR logic for a key state, returns true if should trigger action
fn process_das_arr(state: &mut KeyPressState, now: Instant) -> bool {
    let held_duration = now.duration_since(state.first_press);

    if held_duration >= DAS {
        if !state.das_triggered {
            // First trigger after DAS
            state.das_triggered = true;
            state.last_arr = Some(now);
            return true;
        } else if let Some(last) = state.last_arr {
            // Subsequent ARR triggers
            if now.duration_since(last) >= ARR {
                state.last_arr = Some(now);
                return true;
            }
        }
    }

    false
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn handler() -> InputHandler {
        InputHandler::from_settings(&Settings::default())
    }

    #[test]
    fn test_default_bindings() {
        let mut input = handler();
        assert_eq!(
            input.key_down(key(KeyCode::Char(' '))),
            Some(Action::Play(Intent::HardDrop))
        );
        assert_eq!(
            input.key_down(key(KeyCode::Char('X'))),
            Some(Action::Play(Intent::RotateCw))
        );
        assert_eq!(
            input.key_down(key(KeyCode::Char('z'))),
            Some(Action::Play(Intent::RotateCcw))
        );
        assert_eq!(input.key_down(key(KeyCode::Char('m'))), Some(Action::ToggleMusic));
        assert_eq!(input.key_down(key(KeyCode::Char('n'))), Some(Action::ToggleSound));
        assert_eq!(input.key_down(key(KeyCode::Esc)), Some(Action::Quit));
        assert_eq!(input.key_down(key(KeyCode::Char('k'))), None);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut input = handler();
        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(input.key_down(event), Some(Action::Quit));
    }

    #[test]
    fn test_held_key_repeats_after_das() {
        let mut input = handler();
        let start = Instant::now();
        assert_eq!(
            input.key_down_at(key(KeyCode::Left), start),
            Some(Action::Play(Intent::MoveLeft))
        );
        // Terminal auto-repeat keeps the key alive without a new action
        let repeat = start + Duration::from_millis(90);
        assert_eq!(input.key_down_at(key(KeyCode::Left), repeat), None);
        assert!(input.update_at(repeat).is_empty());

        let das = start + Duration::from_millis(170);
        input.key_down_at(key(KeyCode::Left), das);
        assert_eq!(input.update_at(das), vec![Intent::MoveLeft]);
        assert!(input.update_at(das + Duration::from_millis(10)).is_empty());
        let arr = das + Duration::from_millis(50);
        assert_eq!(input.update_at(arr), vec![Intent::MoveLeft]);
    }

    #[test]
    fn test_key_times_out() {
        let mut input = handler();
        let start = Instant::now();
        input.key_down_at(key(KeyCode::Down), start);
        assert!(input.update_at(start + Duration::from_millis(500)).is_empty());
        // Released, so the next press acts immediately
        assert_eq!(
            input.key_down_at(key(KeyCode::Down), start + Duration::from_millis(600)),
            Some(Action::Play(Intent::SoftDrop))
        );
    }

    #[test]
    fn test_opposite_direction_cancels() {
        let mut input = handler();
        let start = Instant::now();
        input.key_down_at(key(KeyCode::Left), start);
        input.key_down_at(key(KeyCode::Right), start);
        assert!(input.left_state.is_none());
        assert!(input.right_state.is_some());
    }

    #[test]
    fn test_parse_key_names() {
        assert_eq!(KeyBindings::parse_key("Space"), Some(KeyCode::Char(' ')));
        assert_eq!(KeyBindings::parse_key("F5"), Some(KeyCode::F(5)));
        assert_eq!(KeyBindings::parse_key("q"), Some(KeyCode::Char('q')));
        assert_eq!(KeyBindings::parse_key("NotAKey"), None);
    }
}
