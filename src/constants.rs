//! Configuration constants for the quiz night games
//!
//! This module contains the limits, timings and fixed tables used by both
//! games. Runtime options default to these values and are validated
//! against the bounds defined here.

/// Question content limits
pub mod question {
    /// Maximum length of a question prompt in characters
    pub const MAX_PROMPT_LENGTH: usize = 500;
    /// Maximum length of an option or answer text in characters
    pub const MAX_ANSWER_LENGTH: usize = 200;
    /// Maximum length of an explanation in characters
    pub const MAX_EXPLANATION_LENGTH: usize = 1000;
    /// Maximum length of a question or theme identifier
    pub const MAX_ID_LENGTH: usize = 100;
}

/// Millionaire game constants
pub mod millionaire {
    /// Number of questions in a full game
    pub const QUESTION_COUNT: usize = 15;
    /// Upper bound for the configurable question count
    pub const MAX_QUESTION_COUNT: usize = 50;
    /// Pause in milliseconds between confirming an answer and revealing it
    pub const REVEAL_DELAY_MS: u64 = 900;
    /// Pause in milliseconds after a correct reveal before advancing
    pub const ADVANCE_DELAY_MS: u64 = 2000;
    /// Maximum configurable delay in seconds for either pause
    pub const MAX_DELAY_SECONDS: u64 = 30;
    /// Number of incorrect options fifty-fifty removes
    pub const FIFTY_FIFTY_HIDDEN: usize = 2;
}

/// Board game constants
pub mod board {
    /// Number of themes on a board
    pub const THEME_COUNT: usize = 6;
    /// Upper bound for the configurable theme count
    pub const MAX_THEME_COUNT: usize = 12;
    /// Point values of the board columns, in display order
    pub const POINT_TIERS: [u32; 5] = [100, 200, 300, 400, 500];
    /// Chance for a cell to become a decoy when the board is built
    pub const DECOY_CHANCE: f64 = 0.1;
}

/// Preference defaults
pub mod preferences {
    /// Default background music volume
    pub const MUSIC_VOLUME: f64 = 0.3;
}
