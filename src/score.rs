//! Scoring, leveling and gravity speed

/// Points for a single row at level 1
const BASE_LINE_SCORE: u64 = 10;
/// Multiplier for clears caused by gravity after an earlier clear
const COMBO_MULTIPLIER: u64 = 3;
/// Rows needed to leave level 1
const BASE_LINES_PER_LEVEL: u32 = 10;
/// Growth of the row requirement per level
const LINES_GROWTH: f64 = 1.1;
/// Gravity interval at level 1
const BASE_DROP_DELAY_MS: u64 = 1000;
/// Gravity never gets faster than this
const MIN_DROP_DELAY_MS: u64 = 100;
/// Gravity interval factor per level
const DROP_DELAY_DECAY: f64 = 0.93;

/// Score and level tracking for one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Current level, starting at 1
    pub level: u32,
    /// Total rows cleared
    pub lines: u32,
    /// Rows cleared toward the next level
    pub lines_this_level: u32,
    /// Rows needed to reach the next level
    pub required_lines: u32,
}

impl Default for Score {
    fn default() -> Self {
        Self::new()
    }
}

impl Score {
    pub fn new() -> Self {
        Self {
            points: 0,
            level: 1,
            lines: 0,
            lines_this_level: 0,
            required_lines: BASE_LINES_PER_LEVEL,
        }
    }

    /// Add points for `cleared` simultaneous rows and return the points awarded
    pub fn add_clear(&mut self, cleared: u32, combo: bool) -> u64 {
        let multiplier = if combo { COMBO_MULTIPLIER } else { 1 };
        let cleared_sq = cleared as u64 * cleared as u64;
        let points = cleared_sq * BASE_LINE_SCORE * self.level as u64 * multiplier;
        self.points += points;
        self.lines += cleared;
        self.lines_this_level += cleared;
        points
    }

    /// Advance one level if enough rows were cleared; extra rows carry over.
    /// Returns whether the level changed.
    pub fn update_level(&mut self) -> bool {
        if self.lines_this_level < self.required_lines {
            return false;
        }
        self.lines_this_level -= self.required_lines;
        self.required_lines =
            (BASE_LINES_PER_LEVEL as f64 * LINES_GROWTH.powi(self.level as i32)) as u32;
        self.level += 1;
        true
    }

    /// Gravity interval for the current level in milliseconds
    pub fn drop_delay_ms(&self) -> u64 {
        let exponent = self.level.saturating_sub(1) as i32;
        let delay = (BASE_DROP_DELAY_MS as f64 * DROP_DELAY_DECAY.powi(exponent)) as u64;
        delay.max(MIN_DROP_DELAY_MS)
    }

    /// Progress toward the next level in 0.0..=1.0
    pub fn level_progress(&self) -> f64 {
        if self.required_lines == 0 {
            return 1.0;
        }
        (self.lines_this_level as f64 / self.required_lines as f64).min(1.0)
    }
}

/// Banner text for a simultaneous clear
pub fn clear_label(cleared: u32) -> &'static str {
    match cleared {
        1 => "SINGLE",
        2 => "DOUBLE",
        3 => "TRIPLE",
        4 => "QUADRUPLE",
        _ => "",
    }
}
