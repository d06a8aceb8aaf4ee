//! Question banks keyed by difficulty
//!
//! Banks are read from static JSON. Loading is lenient: anything malformed
//! is dropped with a warning so that a broken file shows up as an empty
//! bank instead of an error. The strict `try_*` constructors surface the
//! reason for callers that want to report it.

use std::collections::HashSet;

use derive_where::derive_where;
use enum_map::EnumMap;
use garde::Validate;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::question::{Difficulty, GridQuestion, MultipleChoiceQuestion, Theme};

/// Errors raised by the strict bank constructors
#[derive(Error, Debug)]
pub enum Error {
    /// The file is not valid JSON
    #[error("bank is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The top level is neither a list nor an object keyed by difficulty
    #[error("bank must be a list or an object keyed by difficulty")]
    Shape,
}

/// A collection of questions partitioned into the three difficulty tiers
#[derive(Debug, Clone)]
#[derive_where(Default)]
pub struct Bank<Q> {
    tiers: EnumMap<Difficulty, Vec<Q>>,
}

/// Bank for the millionaire game
pub type QuestionBank = Bank<MultipleChoiceQuestion>;

/// Bank for the board game, one list of themes per tier
pub type ThemeBank = Bank<Theme>;

/// Entries a bank can hold
pub trait BankEntry: DeserializeOwned + Validate<Context = ()> {
    /// Identifier that must be unique within a tier
    fn id(&self) -> &str;
}

impl BankEntry for MultipleChoiceQuestion {
    fn id(&self) -> &str {
        &self.id
    }
}

impl BankEntry for GridQuestion {
    fn id(&self) -> &str {
        &self.id
    }
}

impl<Q> Bank<Q> {
    /// Builds a bank from already loaded tiers
    pub fn from_tiers(tiers: EnumMap<Difficulty, Vec<Q>>) -> Self {
        Self { tiers }
    }

    /// Entries of one tier
    pub fn tier(&self, difficulty: Difficulty) -> &[Q] {
        &self.tiers[difficulty]
    }

    /// Number of entries in one tier
    pub fn len(&self, difficulty: Difficulty) -> usize {
        self.tiers[difficulty].len()
    }

    /// Whether every tier is empty
    pub fn is_empty(&self) -> bool {
        self.tiers.values().all(Vec::is_empty)
    }
}

/// Parses the entries of one list, dropping invalid and duplicate ones
fn parse_entries<Q: BankEntry>(value: Option<&Value>, context: &str) -> Vec<Q> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            log::warn!("{context}: expected a list, treating as empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    items
        .iter()
        .enumerate()
        .filter_map(|(position, item)| {
            let entry = match Q::deserialize(item) {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("{context}[{position}]: dropped malformed entry: {e}");
                    return None;
                }
            };
            if let Err(e) = entry.validate() {
                log::warn!("{context}[{position}]: dropped invalid entry: {e}");
                return None;
            }
            if !seen.insert(entry.id().to_owned()) {
                log::warn!("{context}[{position}]: dropped duplicate id `{}`", entry.id());
                return None;
            }
            Some(entry)
        })
        .collect()
}

/// Raw theme, with its questions left unparsed so they can be dropped one by one
#[derive(Deserialize)]
struct ThemeSerde {
    id: String,
    name: String,
    #[serde(default)]
    questions: Value,
}

impl QuestionBank {
    /// Reads a millionaire bank, accepting both the tiered and the legacy flat layout
    ///
    /// A flat list is the legacy layout and lands in the easy tier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] if the top level is neither a list nor an object.
    pub fn try_from_value(value: &Value) -> Result<Self, Error> {
        let mut tiers: EnumMap<Difficulty, Vec<MultipleChoiceQuestion>> = EnumMap::default();
        match value {
            Value::Array(_) => {
                tiers[Difficulty::Easy] = parse_entries(Some(value), "easy");
            }
            Value::Object(map) => {
                for difficulty in Difficulty::ALL {
                    tiers[difficulty] =
                        parse_entries(map.get(difficulty.as_str()), difficulty.as_str());
                }
            }
            _ => return Err(Error::Shape),
        }
        Ok(Self { tiers })
    }

    /// Reads a millionaire bank from JSON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or has the wrong shape.
    pub fn try_from_json(json: &str) -> Result<Self, Error> {
        Self::try_from_value(&serde_json::from_str(json)?)
    }

    /// Reads a millionaire bank, falling back to an empty bank on any error
    pub fn from_json(json: &str) -> Self {
        Self::try_from_json(json).unwrap_or_else(|e| {
            log::warn!("question bank unusable, treating as empty: {e}");
            Self::default()
        })
    }
}

impl ThemeBank {
    /// Reads a board bank of the form `{ "easy": { "themes": [...] }, ... }`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] if the top level is not an object.
    pub fn try_from_value(value: &Value) -> Result<Self, Error> {
        let Value::Object(map) = value else {
            return Err(Error::Shape);
        };

        let mut tiers: EnumMap<Difficulty, Vec<Theme>> = EnumMap::default();
        for difficulty in Difficulty::ALL {
            let context = difficulty.as_str();
            let themes = map.get(context).and_then(|tier| tier.get("themes"));
            let raw: Vec<ThemeSerde> = parse_raw_themes(themes, context);

            let mut seen = HashSet::new();
            tiers[difficulty] = raw
                .into_iter()
                .filter_map(|ThemeSerde { id, name, questions }| {
                    let questions: Vec<GridQuestion> =
                        parse_entries(Some(&questions), &format!("{context}/{id}"));
                    let theme = Theme {
                        id,
                        name,
                        questions,
                    };
                    if let Err(e) = theme.validate() {
                        log::warn!("{context}: dropped invalid theme `{}`: {e}", theme.id);
                        return None;
                    }
                    if !seen.insert(theme.id.clone()) {
                        log::warn!("{context}: dropped duplicate theme `{}`", theme.id);
                        return None;
                    }
                    Some(theme)
                })
                .collect();
        }
        Ok(Self { tiers })
    }

    /// Reads a board bank from JSON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or has the wrong shape.
    pub fn try_from_json(json: &str) -> Result<Self, Error> {
        Self::try_from_value(&serde_json::from_str(json)?)
    }

    /// Reads a board bank, falling back to an empty bank on any error
    pub fn from_json(json: &str) -> Self {
        Self::try_from_json(json).unwrap_or_else(|e| {
            log::warn!("theme bank unusable, treating as empty: {e}");
            Self::default()
        })
    }
}

fn parse_raw_themes(value: Option<&Value>, context: &str) -> Vec<ThemeSerde> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match ThemeSerde::deserialize(item) {
                Ok(theme) => Some(theme),
                Err(e) => {
                    log::warn!("{context}: dropped malformed theme: {e}");
                    None
                }
            })
            .collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            log::warn!("{context}: themes must be a list, treating as empty");
            Vec::new()
        }
    }
}
