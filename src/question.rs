//! Question model shared by both games
//!
//! This module defines the immutable question data loaded from the banks:
//! four-option multiple choice questions for the millionaire game, and
//! themed point-valued questions for the board game. It also defines the
//! small enums the rest of the crate keys its tables by.

use std::{fmt::Display, str::FromStr};

use enum_map::{Enum, EnumMap};
use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

/// One of the four option slots of a multiple choice question
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Serialize, Deserialize,
)]
pub enum AnswerKey {
    /// First option
    A,
    /// Second option
    B,
    /// Third option
    C,
    /// Fourth option
    D,
}

impl AnswerKey {
    /// All keys in display order
    pub const ALL: [AnswerKey; 4] = [AnswerKey::A, AnswerKey::B, AnswerKey::C, AnswerKey::D];
}

impl Display for AnswerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        };
        f.write_str(letter)
    }
}

/// Difficulty tier of a question bank
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Enum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Easy questions
    #[default]
    Easy,
    /// Medium questions
    Medium,
    /// Hard questions
    Hard,
}

impl Difficulty {
    /// All tiers in ascending order
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Key used for this tier in bank files and stored preferences
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// Which flavour of the millionaire game is played
///
/// Each edition ships its own question bank. The festive edition also
/// changes the wording of the phone-a-friend script.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Enum, Serialize, Deserialize,
)]
pub enum Edition {
    /// New year special about Saint Petersburg
    #[serde(rename = "newyear")]
    NewYear,
    /// Classic edition
    #[default]
    #[serde(rename = "regular")]
    Regular,
}

impl Edition {
    /// Key used for this edition in stored preferences
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewYear => "newyear",
            Self::Regular => "regular",
        }
    }
}

/// A stored string did not name a known variant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl FromStr for Difficulty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseError {
                kind: "difficulty",
                value: s.to_owned(),
            })
    }
}

impl FromStr for Edition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::NewYear, Self::Regular]
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| ParseError {
                kind: "edition",
                value: s.to_owned(),
            })
    }
}

type ValidationResult = garde::Result;

/// Every option text must be present and reasonably short
fn validate_options(val: &EnumMap<AnswerKey, String>, _ctx: &()) -> ValidationResult {
    for (key, text) in val {
        if text.trim().is_empty() {
            return Err(garde::Error::new(format!("option {key} is empty")));
        }
        if text.chars().count() > crate::constants::question::MAX_ANSWER_LENGTH {
            return Err(garde::Error::new(format!("option {key} is too long")));
        }
    }
    Ok(())
}

/// Board questions must sit on one of the board's columns
fn validate_points(val: &u32, _ctx: &()) -> ValidationResult {
    if crate::constants::board::POINT_TIERS.contains(val) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "{val} is not one of {:?}",
            crate::constants::board::POINT_TIERS
        )))
    }
}

/// Who contributed a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Author {
    /// Contributor's name
    #[garde(length(max = crate::constants::question::MAX_ANSWER_LENGTH))]
    pub name: String,
    /// Contributor's city
    #[garde(length(max = crate::constants::question::MAX_ANSWER_LENGTH))]
    pub city: String,
}

/// A four-option question with exactly one correct key
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MultipleChoiceQuestion {
    /// Identifier, unique within a bank
    #[garde(length(min = 1, max = crate::constants::question::MAX_ID_LENGTH))]
    pub id: String,
    /// The prompt shown to the player
    #[serde(rename = "question")]
    #[garde(length(min = 1, max = crate::constants::question::MAX_PROMPT_LENGTH))]
    pub prompt: String,
    /// Optional contributor
    #[serde(default)]
    #[garde(dive)]
    pub author: Option<Author>,
    /// Option texts keyed A to D
    #[garde(custom(validate_options))]
    pub options: EnumMap<AnswerKey, String>,
    /// The single correct key
    #[garde(skip)]
    pub correct: AnswerKey,
    /// Optional explanation shown after the reveal
    #[serde(default)]
    #[garde(length(max = crate::constants::question::MAX_EXPLANATION_LENGTH))]
    pub explanation: Option<String>,
}

impl MultipleChoiceQuestion {
    /// Text of the option behind `key`
    pub fn option(&self, key: AnswerKey) -> &str {
        &self.options[key]
    }

    /// Whether `key` is the correct answer
    pub fn is_correct(&self, key: AnswerKey) -> bool {
        self.correct == key
    }

    /// The three incorrect keys in display order
    pub fn incorrect_keys(&self) -> impl Iterator<Item = AnswerKey> + '_ {
        AnswerKey::ALL.into_iter().filter(|k| *k != self.correct)
    }
}

/// A question on the board, worth a fixed number of points
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GridQuestion {
    /// Identifier, unique within its theme
    #[garde(length(min = 1, max = crate::constants::question::MAX_ID_LENGTH))]
    pub id: String,
    /// The prompt read out to the players
    #[serde(rename = "question")]
    #[garde(length(min = 1, max = crate::constants::question::MAX_PROMPT_LENGTH))]
    pub prompt: String,
    /// The expected answer, shown to the operator on reveal
    #[garde(length(min = 1, max = crate::constants::question::MAX_ANSWER_LENGTH))]
    pub answer: String,
    /// Point value, one of the board's tiers
    #[garde(custom(validate_points))]
    pub points: u32,
    /// Marked as a decoy in the source data
    #[serde(default, rename = "isCatInBag")]
    #[garde(skip)]
    pub decoy: bool,
    /// Theme the question really belongs to when it is a decoy
    #[serde(default, rename = "originalThemeId")]
    #[garde(length(max = crate::constants::question::MAX_ID_LENGTH))]
    pub origin_theme: Option<String>,
}

/// A board row: a named theme and its pool of questions
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Theme {
    /// Identifier, unique within a difficulty tier
    #[garde(length(min = 1, max = crate::constants::question::MAX_ID_LENGTH))]
    pub id: String,
    /// Display name
    #[garde(length(min = 1, max = crate::constants::question::MAX_ANSWER_LENGTH))]
    pub name: String,
    /// Every question available for this theme, across all tiers
    #[garde(dive)]
    pub questions: Vec<GridQuestion>,
}

impl Theme {
    /// Questions of this theme worth exactly `points`
    pub fn questions_worth(&self, points: u32) -> impl Iterator<Item = &GridQuestion> + '_ {
        self.questions.iter().filter(move |q| q.points == points)
    }

    /// Looks a question up by id
    pub fn question(&self, id: &str) -> Option<&GridQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn mc_question(id: &str, correct: AnswerKey) -> MultipleChoiceQuestion {
        MultipleChoiceQuestion {
            id: id.to_owned(),
            prompt: format!("Question {id}?"),
            author: None,
            options: EnumMap::from_fn(|k: AnswerKey| format!("{id} option {k}")),
            correct,
            explanation: None,
        }
    }

    pub(crate) fn grid_question(id: &str, points: u32) -> GridQuestion {
        GridQuestion {
            id: id.to_owned(),
            prompt: format!("Prompt {id}"),
            answer: format!("Answer {id}"),
            points,
            decoy: false,
            origin_theme: None,
        }
    }

    pub(crate) fn theme(id: &str, per_tier: usize) -> Theme {
        Theme {
            id: id.to_owned(),
            name: format!("Theme {id}"),
            questions: crate::constants::board::POINT_TIERS
                .iter()
                .flat_map(|p| (0..per_tier).map(move |i| grid_question(&format!("{id}-{p}-{i}"), *p)))
                .collect(),
        }
    }

    #[test]
    fn test_deserialize_multiple_choice() {
        let json = r#"{
            "id": "q1",
            "question": "Which river flows through Saint Petersburg?",
            "author": { "name": "Anna", "city": "Saint Petersburg" },
            "options": { "A": "Neva", "B": "Volga", "C": "Don", "D": "Ob" },
            "correct": "A"
        }"#;
        let question: MultipleChoiceQuestion = serde_json::from_str(json).unwrap();

        assert_eq!(question.option(AnswerKey::A), "Neva");
        assert!(question.is_correct(AnswerKey::A));
        assert!(question.explanation.is_none());
        assert!(question.validate().is_ok());
    }

    #[test]
    fn test_missing_option_is_rejected() {
        let json = r#"{
            "id": "q1",
            "question": "Incomplete?",
            "options": { "A": "1", "B": "2", "C": "3" },
            "correct": "B"
        }"#;
        assert!(serde_json::from_str::<MultipleChoiceQuestion>(json).is_err());
    }

    #[test]
    fn test_empty_option_fails_validation() {
        let mut question = mc_question("q", AnswerKey::C);
        question.options[AnswerKey::B] = "  ".to_owned();
        assert!(question.validate().is_err());
    }

    #[test]
    fn test_incorrect_keys_exclude_correct() {
        let question = mc_question("q", AnswerKey::C);
        let keys: Vec<_> = question.incorrect_keys().collect();
        assert_eq!(keys, vec![AnswerKey::A, AnswerKey::B, AnswerKey::D]);
    }

    #[test]
    fn test_grid_question_camel_case() {
        let json = r#"{
            "id": "cats-300",
            "question": "How many lives does a cat have?",
            "answer": "Nine",
            "points": 300,
            "isCatInBag": true,
            "originalThemeId": "cats"
        }"#;
        let question: GridQuestion = serde_json::from_str(json).unwrap();

        assert!(question.decoy);
        assert_eq!(question.origin_theme.as_deref(), Some("cats"));
        assert!(question.validate().is_ok());
    }

    #[test]
    fn test_grid_question_off_tier_points() {
        let question = grid_question("odd", 250);
        assert!(question.validate().is_err());
    }

    #[test]
    fn test_difficulty_and_edition_from_str() {
        assert_eq!("hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!("newyear".parse::<Edition>(), Ok(Edition::NewYear));
        assert!("impossible".parse::<Difficulty>().is_err());
        assert_eq!(
            serde_json::to_string(&Edition::Regular).unwrap(),
            "\"regular\""
        );
    }

    #[test]
    fn test_theme_questions_worth() {
        let theme = theme("spb", 3);
        assert_eq!(theme.questions_worth(200).count(), 3);
        assert!(theme.question("spb-500-2").is_some());
        assert!(theme.question("spb-600-0").is_none());
    }
}
