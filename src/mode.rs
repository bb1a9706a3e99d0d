//! Game modes: 40 Lines, Blitz, Endless

/// Lines needed to finish a 40 Lines round
pub const FORTY_LINES_TARGET: u32 = 40;
/// Blitz round length in milliseconds
pub const BLITZ_TIME_MS: u64 = 120_000;

/// Available game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    FortyLines, // Clear 40 lines as fast as possible
    Blitz,      // Score as much as possible in 2 minutes
    #[default]
    Endless, // Play until the stack tops out
}

impl GameMode {
    pub fn name(&self) -> &'static str {
        match self {
            GameMode::FortyLines => "40 Lines",
            GameMode::Blitz => "Blitz",
            GameMode::Endless => "Endless",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GameMode::FortyLines => "Clear 40 lines as fast as possible",
            GameMode::Blitz => "Score as much as you can in 2 minutes",
            GameMode::Endless => "Play until the bricks reach the top",
        }
    }

    pub fn all() -> &'static [GameMode] {
        &[GameMode::FortyLines, GameMode::Blitz, GameMode::Endless]
    }
}

/// Mode-specific round clock and goals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeState {
    pub mode: GameMode,
    /// Play time in milliseconds, excluding pauses and row-clear delays
    pub elapsed_ms: u64,
}

impl ModeState {
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            elapsed_ms: 0,
        }
    }

    /// Whether the line goal of the mode has been reached
    pub fn lines_reached(&self, lines_cleared: u32) -> bool {
        self.mode == GameMode::FortyLines && lines_cleared >= FORTY_LINES_TARGET
    }

    /// Whether the time limit of the mode has run out
    pub fn time_up(&self) -> bool {
        self.mode == GameMode::Blitz && self.elapsed_ms >= BLITZ_TIME_MS
    }

    /// Get remaining time for Blitz mode (None for other modes)
    pub fn time_remaining_ms(&self) -> Option<u64> {
        match self.mode {
            GameMode::Blitz => Some(BLITZ_TIME_MS.saturating_sub(self.elapsed_ms)),
            _ => None,
        }
    }

    /// Line goal for 40 Lines mode (None for other modes)
    pub fn target_lines(&self) -> Option<u32> {
        match self.mode {
            GameMode::FortyLines => Some(FORTY_LINES_TARGET),
            _ => None,
        }
    }

    /// Clock shown to the player: time left in Blitz, time played otherwise
    pub fn display_time(&self) -> String {
        format_time(self.time_remaining_ms().unwrap_or(self.elapsed_ms))
    }
}

/// Format milliseconds as M:SS.mmm
pub fn format_time(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{}:{:02}.{:03}", minutes, seconds, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00.000");
        assert_eq!(format_time(61_005), "1:01.005");
        assert_eq!(format_time(BLITZ_TIME_MS), "2:00.000");
    }

    #[test]
    fn test_forty_lines_goal() {
        let state = ModeState::new(GameMode::FortyLines);
        assert!(!state.lines_reached(39));
        assert!(state.lines_reached(40));
        assert!(!state.time_up());
        assert_eq!(state.target_lines(), Some(40));
    }

    #[test]
    fn test_blitz_clock() {
        let mut state = ModeState::new(GameMode::Blitz);
        state.elapsed_ms = 119_000;
        assert!(!state.time_up());
        assert_eq!(state.time_remaining_ms(), Some(1000));
        assert_eq!(state.display_time(), "0:01.000");
        state.elapsed_ms = BLITZ_TIME_MS;
        assert!(state.time_up());
        assert!(!state.lines_reached(100));
    }

    #[test]
    fn test_endless_never_finishes() {
        let mut state = ModeState::new(GameMode::Endless);
        state.elapsed_ms = u64::MAX / 2;
        assert!(!state.time_up());
        assert!(!state.lines_reached(u32::MAX));
        assert_eq!(state.time_remaining_ms(), None);
    }
}
