//! Player preferences that outlive a single game
//!
//! The games read the active difficulty and edition from an injected store
//! and credit the lifetime earned points to it. Where the values end up is
//! up to the embedder: the [`Preferences`] record converts to and from the
//! flat key-value pairs a browser storage holds, and from JSON.

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::question::{Difficulty, Edition};

/// Storage key of the colour scheme
pub const KEY_UI_THEME: &str = "theme";
/// Storage key of the millionaire difficulty
pub const KEY_DIFFICULTY: &str = "millionaire:difficulty";
/// Storage key of the lifetime earned points
pub const KEY_EARNED_TOTAL: &str = "millionaire:earnedPoints";
/// Storage key of the millionaire edition
pub const KEY_EDITION: &str = "millionaire:gameMode";
/// Storage key of the music toggle
pub const KEY_MUSIC_ENABLED: &str = "millionaire:musicEnabled";
/// Storage key of the music volume
pub const KEY_MUSIC_VOLUME: &str = "millionaire:musicVolume";

/// Errors raised when reading stored preferences strictly
#[derive(Error, Debug)]
pub enum Error {
    /// The key is not one the games store
    #[error("unknown preference key `{0}`")]
    UnknownKey(String),
    /// The stored value cannot be read for its key
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue {
        /// The key being read
        key: String,
        /// The unreadable value
        value: String,
    },
    /// The JSON form is malformed
    #[error("malformed preferences: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON form parsed but holds out-of-range values
    #[error("invalid preferences: {0}")]
    Invalid(#[from] garde::Report),
}

/// Colour scheme of the interface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiTheme {
    /// Light colours
    Light,
    /// Dark colours
    #[default]
    Dark,
}

impl UiTheme {
    fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

/// What the games need from the preference storage
pub trait PreferenceStore {
    /// Active millionaire difficulty
    fn difficulty(&self) -> Difficulty;

    /// Changes the millionaire difficulty
    fn set_difficulty(&mut self, difficulty: Difficulty);

    /// Active millionaire edition
    fn edition(&self) -> Edition;

    /// Changes the millionaire edition
    fn set_edition(&mut self, edition: Edition);

    /// Points earned across all games
    fn earned_total(&self) -> u64;

    /// Credits points earned in a game
    fn add_earned(&mut self, points: u64);

    /// Forgets the lifetime earned points
    fn reset_earned(&mut self);
}

fn validate_volume(val: &f64, _ctx: &()) -> garde::Result {
    if (0.0..=1.0).contains(val) {
        Ok(())
    } else {
        Err(garde::Error::new("volume must be between 0 and 1"))
    }
}

/// The full preference record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Preferences {
    /// Colour scheme
    #[garde(skip)]
    pub ui_theme: UiTheme,
    /// Millionaire difficulty
    #[garde(skip)]
    pub difficulty: Difficulty,
    /// Millionaire edition
    #[garde(skip)]
    pub edition: Edition,
    /// Points earned across all games
    #[garde(skip)]
    pub earned_total: u64,
    /// Whether background music plays
    #[garde(skip)]
    pub music_enabled: bool,
    /// Background music volume between 0 and 1
    #[garde(custom(validate_volume))]
    pub music_volume: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            ui_theme: UiTheme::default(),
            difficulty: Difficulty::default(),
            edition: Edition::default(),
            earned_total: 0,
            music_enabled: false,
            music_volume: crate::constants::preferences::MUSIC_VOLUME,
        }
    }
}

/// Reads a stored point counter, accepting only finite non-negative numbers
fn parse_earned(value: &str) -> Option<u64> {
    let parsed: f64 = value.trim().parse().ok()?;
    (parsed.is_finite() && parsed >= 0.0).then(|| parsed.floor() as u64)
}

fn parse_volume(value: &str) -> Option<f64> {
    let parsed: f64 = value.trim().parse().ok()?;
    (0.0..=1.0).contains(&parsed).then_some(parsed)
}

impl Preferences {
    /// Applies one stored pair
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownKey`] for keys the games do not use, and
    /// [`Error::InvalidValue`] when the value cannot be read; the record is
    /// left unchanged in both cases.
    pub fn set_pair(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let invalid = || Error::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        };
        match key {
            KEY_UI_THEME => self.ui_theme = UiTheme::parse(value).ok_or_else(invalid)?,
            KEY_DIFFICULTY => self.difficulty = value.parse().map_err(|_| invalid())?,
            KEY_EDITION => self.edition = value.parse().map_err(|_| invalid())?,
            KEY_EARNED_TOTAL => self.earned_total = parse_earned(value).ok_or_else(invalid)?,
            KEY_MUSIC_ENABLED => {
                self.music_enabled = match value {
                    "true" => true,
                    "false" => false,
                    _ => return Err(invalid()),
                };
            }
            KEY_MUSIC_VOLUME => self.music_volume = parse_volume(value).ok_or_else(invalid)?,
            _ => return Err(Error::UnknownKey(key.to_owned())),
        }
        Ok(())
    }

    /// Rebuilds the record from stored pairs
    ///
    /// Unknown keys and unreadable values are skipped, leaving the default
    /// for that entry.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut preferences = Self::default();
        for (key, value) in pairs {
            if let Err(e) = preferences.set_pair(key, value) {
                log::warn!("ignoring stored preference: {e}");
            }
        }
        preferences
    }

    /// The record as stored pairs
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_UI_THEME, self.ui_theme.as_str().to_owned()),
            (KEY_DIFFICULTY, self.difficulty.as_str().to_owned()),
            (KEY_EDITION, self.edition.as_str().to_owned()),
            (KEY_EARNED_TOTAL, self.earned_total.to_string()),
            (KEY_MUSIC_ENABLED, self.music_enabled.to_string()),
            (KEY_MUSIC_VOLUME, self.music_volume.to_string()),
        ]
    }

    /// Reads the JSON form
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or holds out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let preferences: Self = serde_json::from_str(json)?;
        preferences.validate()?;
        Ok(preferences)
    }

    /// The JSON form
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

impl PreferenceStore for Preferences {
    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    fn edition(&self) -> Edition {
        self.edition
    }

    fn set_edition(&mut self, edition: Edition) {
        self.edition = edition;
    }

    fn earned_total(&self) -> u64 {
        self.earned_total
    }

    fn add_earned(&mut self, points: u64) {
        self.earned_total = self.earned_total.saturating_add(points);
    }

    fn reset_earned(&mut self) {
        self.earned_total = 0;
    }
}
