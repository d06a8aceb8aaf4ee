//! Millionaire game session
//!
//! A session walks a fixed-length sequence of four-option questions. The
//! player selects an option, confirms it, waits through a short suspense
//! pause, and either loses on the spot or collects `index + 1` points and
//! moves on after a longer pause. Points can be spent on lifelines.
//!
//! Both pauses are alarms handed to the embedder through `schedule_message`
//! and fed back through [`Game::receive_alarm`]. Alarms carry the epoch of
//! the session that scheduled them; starting, restarting or switching
//! edition moves to a new epoch, so late alarms from an abandoned session
//! are ignored.

use std::time::Duration;

use enum_map::EnumMap;
use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    bank::QuestionBank,
    call::{CallLine, call_lines},
    ledger::{Ledger, reward_for},
    preferences::PreferenceStore,
    question::{AnswerKey, Author, Difficulty, Edition, MultipleChoiceQuestion},
    selection::draw_session,
    session::Tunnel,
};

type ValidationResult = garde::Result;

/// Validates that a pause is not longer than the configured maximum
fn validate_delay(val: &Duration, _ctx: &()) -> ValidationResult {
    if val.as_secs() <= crate::constants::millionaire::MAX_DELAY_SECONDS {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [0,{}]",
            crate::constants::millionaire::MAX_DELAY_SECONDS
        )))
    }
}

/// Tunable parameters of a millionaire session
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Options {
    /// Questions per game, capped by the bank size
    #[garde(range(min = 1, max = crate::constants::millionaire::MAX_QUESTION_COUNT))]
    pub question_count: usize,
    /// Pause between confirming and revealing
    #[garde(custom(validate_delay))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub reveal_delay: Duration,
    /// Pause between a correct reveal and the next question
    #[garde(custom(validate_delay))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub advance_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            question_count: crate::constants::millionaire::QUESTION_COUNT,
            reveal_delay: Duration::from_millis(crate::constants::millionaire::REVEAL_DELAY_MS),
            advance_delay: Duration::from_millis(crate::constants::millionaire::ADVANCE_DELAY_MS),
        }
    }
}

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Every question answered correctly
    Win,
    /// A wrong answer was confirmed
    Lose,
}

/// Top-level state of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// Before the first question; difficulty and edition can change
    #[default]
    Intro,
    /// Questions are being asked
    Playing,
    /// The game is over
    Finished(Outcome),
}

/// Where the current question stands while playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Nothing selected yet
    AwaitingSelection,
    /// An option is selected but not confirmed
    Selected,
    /// Confirmed, waiting for the reveal
    Revealing,
    /// Revealed as correct, waiting to advance
    ShowingSuccess,
}

/// Timed transitions of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Evaluate the confirmed answer
    Reveal {
        /// Session generation that scheduled the alarm
        epoch: u64,
        /// Question the answer was confirmed on
        index: usize,
    },
    /// Move past a correctly answered question
    Advance {
        /// Session generation that scheduled the alarm
        epoch: u64,
        /// Question that was answered
        index: usize,
    },
}

/// A question as shown to the player, with hidden options left out
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    /// Zero-based position in the session
    pub index: usize,
    /// Number of questions in the session
    pub count: usize,
    /// Prompt text
    pub question: String,
    /// Optional contributor
    pub author: Option<Author>,
    /// Visible options in display order
    pub options: Vec<(AnswerKey, String)>,
    /// Points a correct answer earns
    pub reward: u64,
}

/// Incremental updates of a millionaire session
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub enum UpdateMessage {
    /// The bank for the active difficulty and edition is empty
    NoQuestions {
        /// Active edition
        edition: Edition,
        /// Active difficulty
        difficulty: Difficulty,
    },
    /// Back on the intro screen
    Intro {
        /// Active edition
        edition: Edition,
        /// Active difficulty
        difficulty: Difficulty,
        /// Questions the next game will have
        count: usize,
        /// Points earned across all games
        earned_total: u64,
    },
    /// A new question is on screen
    QuestionAnnouncement(QuestionView),
    /// The player selected an option
    Selected(AnswerKey),
    /// The player locked in an option
    Confirmed(AnswerKey),
    /// The confirmed option was evaluated
    AnswerResult {
        /// What the player chose
        selected: AnswerKey,
        /// The correct option
        correct: AnswerKey,
        /// Points gained, if correct
        gained: Option<u64>,
        /// Optional explanation of the answer
        explanation: Option<String>,
    },
    /// Fifty-fifty hid these options
    OptionsHidden(Vec<AnswerKey>),
    /// Phone-a-friend call opened
    Call(Vec<CallLine>),
    /// The call was closed
    CallClosed,
    /// Spendable points or lifeline price changed
    Ledger {
        /// Spendable points
        points: u64,
        /// Price of the next lifeline
        next_cost: u64,
        /// Points earned across all games
        earned_total: u64,
    },
    /// The game ended
    Finished {
        /// How it ended
        outcome: Outcome,
        /// Points held at the end
        points: u64,
    },
}

/// Full snapshot of a millionaire session
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub enum SyncMessage {
    /// The bank for the active difficulty and edition is empty
    NoQuestions {
        /// Active edition
        edition: Edition,
        /// Active difficulty
        difficulty: Difficulty,
    },
    /// Intro screen
    Intro {
        /// Active edition
        edition: Edition,
        /// Active difficulty
        difficulty: Difficulty,
        /// Questions the next game will have
        count: usize,
        /// Points earned across all games
        earned_total: u64,
    },
    /// A question is in progress
    Playing {
        /// The question on screen
        question: QuestionView,
        /// Sub-phase of the question
        phase: Phase,
        /// Selected option, if any
        selected: Option<AnswerKey>,
        /// The correct option, once revealed
        correct: Option<AnswerKey>,
        /// Spendable points
        points: u64,
        /// Price of the next lifeline
        next_cost: u64,
        /// Whether fifty-fifty was used on this question
        fifty_fifty_used: bool,
        /// Open phone-a-friend call
        call: Option<Vec<CallLine>>,
    },
    /// Game over screen
    Finished {
        /// How it ended
        outcome: Outcome,
        /// Points held at the end
        points: u64,
        /// Points earned across all games
        earned_total: u64,
    },
}

/// A millionaire game session
pub struct Game<P: PreferenceStore> {
    /// One bank per edition
    banks: EnumMap<Edition, QuestionBank>,
    options: Options,
    preferences: P,
    rng: fastrand::Rng,

    // Runtime State
    questions: Vec<MultipleChoiceQuestion>,
    state: GameState,
    index: usize,
    selected: Option<AnswerKey>,
    confirmed: bool,
    revealed: bool,
    success: bool,
    ledger: Ledger,
    call_open: bool,
    epoch: u64,
}

impl<P: PreferenceStore> std::fmt::Debug for Game<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("state", &self.state)
            .field("index", &self.index)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

// Convenience methods
impl<P: PreferenceStore> Game<P> {
    /// Bank of the active edition and difficulty
    fn pool(&self) -> &[MultipleChoiceQuestion] {
        self.banks[self.preferences.edition()].tier(self.preferences.difficulty())
    }

    /// Draws a fresh question sequence for the active bank
    fn draw(&mut self) {
        let pool = self.banks[self.preferences.edition()].tier(self.preferences.difficulty());
        self.questions = draw_session(pool, self.options.question_count, &mut self.rng);
    }

    /// Clears every per-game field and moves to a new epoch
    fn reset(&mut self, state: GameState) {
        self.state = state;
        self.index = 0;
        self.selected = None;
        self.confirmed = false;
        self.revealed = false;
        self.success = false;
        self.ledger = Ledger::default();
        self.call_open = false;
        self.epoch += 1;
    }

    /// Clears the per-question fields
    fn clear_question(&mut self) {
        self.selected = None;
        self.confirmed = false;
        self.revealed = false;
        self.success = false;
        self.call_open = false;
    }

    fn question_view(&self, question: &MultipleChoiceQuestion) -> QuestionView {
        QuestionView {
            index: self.index,
            count: self.total(),
            question: question.prompt.clone(),
            author: question.author.clone(),
            options: self
                .ledger
                .visible_keys(question)
                .into_iter()
                .map(|k| (k, question.option(k).to_owned()))
                .collect_vec(),
            reward: reward_for(self.index),
        }
    }

    fn ledger_message(&self) -> UpdateMessage {
        UpdateMessage::Ledger {
            points: self.ledger.points(),
            next_cost: self.ledger.next_cost(),
            earned_total: self.preferences.earned_total(),
        }
    }

    fn announce_question<T: Tunnel>(&self, tunnel: &T) {
        if let Some(question) = self.current_question() {
            tunnel.send_message(&UpdateMessage::QuestionAnnouncement(self.question_view(question)).into());
        }
    }

    fn announce_intro<T: Tunnel>(&self, tunnel: &T) {
        let message = if self.pool().is_empty() {
            UpdateMessage::NoQuestions {
                edition: self.preferences.edition(),
                difficulty: self.preferences.difficulty(),
            }
        } else {
            UpdateMessage::Intro {
                edition: self.preferences.edition(),
                difficulty: self.preferences.difficulty(),
                count: self.total(),
                earned_total: self.preferences.earned_total(),
            }
        };
        tunnel.send_message(&message.into());
    }

    fn finish<T: Tunnel>(&mut self, outcome: Outcome, tunnel: &T) {
        self.state = GameState::Finished(outcome);
        self.call_open = false;
        log::info!(
            "game finished with {outcome:?} at question {} holding {} points",
            self.index,
            self.ledger.points()
        );
        tunnel.send_message(
            &UpdateMessage::Finished {
                outcome,
                points: self.ledger.points(),
            }
            .into(),
        );
    }
}

impl<P: PreferenceStore> Game<P> {
    /// Creates a session on the intro screen
    ///
    /// # Arguments
    ///
    /// * `banks` - One question bank per edition
    /// * `options` - Session parameters
    /// * `preferences` - Store providing difficulty and edition and
    ///   receiving lifetime points
    /// * `rng` - Random source for question draws and fifty-fifty
    ///
    /// # Errors
    ///
    /// Returns the validation report if `options` are out of bounds.
    pub fn new(
        banks: EnumMap<Edition, QuestionBank>,
        options: Options,
        preferences: P,
        rng: fastrand::Rng,
    ) -> Result<Self, garde::Report> {
        options.validate()?;
        let mut game = Self {
            banks,
            options,
            preferences,
            rng,
            questions: Vec::new(),
            state: GameState::Intro,
            index: 0,
            selected: None,
            confirmed: false,
            revealed: false,
            success: false,
            ledger: Ledger::default(),
            call_open: false,
            epoch: 0,
        };
        game.draw();
        Ok(game)
    }

    /// Current top-level state
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Sub-phase of the current question, while playing
    pub fn phase(&self) -> Option<Phase> {
        if self.state != GameState::Playing {
            return None;
        }
        Some(if self.success {
            Phase::ShowingSuccess
        } else if self.confirmed {
            Phase::Revealing
        } else if self.selected.is_some() {
            Phase::Selected
        } else {
            Phase::AwaitingSelection
        })
    }

    /// Zero-based index of the current question
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of questions in this session
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Questions drawn for this session, in order
    pub fn questions(&self) -> &[MultipleChoiceQuestion] {
        &self.questions
    }

    /// The question on screen
    pub fn current_question(&self) -> Option<&MultipleChoiceQuestion> {
        self.questions.get(self.index)
    }

    /// Selected option, if any
    pub fn selected(&self) -> Option<AnswerKey> {
        self.selected
    }

    /// Whether the correct option is being shown, from confirmation on
    pub fn revealed(&self) -> bool {
        self.revealed
    }

    /// Spendable points
    pub fn points(&self) -> u64 {
        self.ledger.points()
    }

    /// The points and lifeline ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Options of the current question still on display
    pub fn visible_keys(&self) -> Vec<AnswerKey> {
        self.current_question()
            .map(|q| self.ledger.visible_keys(q))
            .unwrap_or_default()
    }

    /// Session generation, bumped by every reset
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The injected preference store
    pub fn preferences(&self) -> &P {
        &self.preferences
    }

    /// Gives the preference store back
    pub fn into_preferences(self) -> P {
        self.preferences
    }

    /// The open phone-a-friend script, if a call is open
    pub fn call(&self) -> Option<Vec<CallLine>> {
        self.call_open
            .then(|| self.current_question())
            .flatten()
            .map(|q| call_lines(q, self.preferences.edition()))
    }

    /// Changes the difficulty from the intro screen
    ///
    /// Ignored once a game is under way.
    pub fn set_difficulty<T: Tunnel>(&mut self, difficulty: Difficulty, tunnel: &T) {
        if self.state != GameState::Intro {
            return;
        }
        self.preferences.set_difficulty(difficulty);
        self.draw();
        self.announce_intro(tunnel);
    }

    /// Switches the edition, abandoning any game in progress
    pub fn set_edition<T: Tunnel>(&mut self, edition: Edition, tunnel: &T) {
        self.preferences.set_edition(edition);
        if self.state != GameState::Intro {
            log::debug!("edition changed mid-game, back to intro");
            self.reset(GameState::Intro);
        }
        self.draw();
        self.announce_intro(tunnel);
    }

    /// Forgets the lifetime earned points
    pub fn reset_earned<T: Tunnel>(&mut self, tunnel: &T) {
        self.preferences.reset_earned();
        tunnel.send_message(&self.ledger_message().into());
    }

    /// Starts a new game with a freshly drawn question sequence
    ///
    /// With an empty bank the session stays on the intro screen and reports
    /// that no questions are available.
    pub fn start<T: Tunnel>(&mut self, tunnel: &T) {
        self.draw();
        if self.questions.is_empty() {
            log::warn!(
                "no questions for {:?}/{:?}",
                self.preferences.edition(),
                self.preferences.difficulty()
            );
            self.reset(GameState::Intro);
            self.announce_intro(tunnel);
            return;
        }

        self.reset(GameState::Playing);
        log::info!(
            "game started with {} questions, epoch {}",
            self.total(),
            self.epoch
        );
        tunnel.send_message(&self.ledger_message().into());
        self.announce_question(tunnel);
    }

    /// Returns to the intro screen with a freshly drawn question sequence
    pub fn restart<T: Tunnel>(&mut self, tunnel: &T) {
        self.draw();
        self.reset(GameState::Intro);
        self.announce_intro(tunnel);
    }

    /// Selects an option of the current question
    ///
    /// Ignored after confirmation, and for options fifty-fifty hid.
    pub fn choose<T: Tunnel>(&mut self, key: AnswerKey, tunnel: &T) {
        if self.state != GameState::Playing || self.confirmed || self.revealed {
            return;
        }
        if !self.visible_keys().contains(&key) {
            return;
        }
        self.selected = Some(key);
        tunnel.send_message(&UpdateMessage::Selected(key).into());
    }

    /// Locks in the selected option and schedules the reveal
    pub fn confirm<T: Tunnel, S: FnMut(crate::AlarmMessage, web_time::Duration)>(
        &mut self,
        mut schedule_message: S,
        tunnel: &T,
    ) {
        if self.state != GameState::Playing || self.confirmed {
            return;
        }
        let Some(selected) = self.selected else {
            return;
        };

        self.confirmed = true;
        self.revealed = true;
        tunnel.send_message(&UpdateMessage::Confirmed(selected).into());
        schedule_message(
            AlarmMessage::Reveal {
                epoch: self.epoch,
                index: self.index,
            }
            .into(),
            self.options.reveal_delay,
        );
    }

    /// Buys fifty-fifty for the current question
    ///
    /// Returns whether the purchase went through. It is refused without any
    /// change outside of play, after confirmation, when already used on this
    /// question, or when the points do not cover the price.
    pub fn fifty_fifty<T: Tunnel>(&mut self, tunnel: &T) -> bool {
        if self.state != GameState::Playing || self.confirmed || self.revealed {
            return false;
        }
        let Some(question) = self.questions.get(self.index) else {
            return false;
        };
        let Some(hidden) = self.ledger.fifty_fifty(question, &mut self.rng) else {
            return false;
        };

        if self.selected.is_some_and(|k| hidden.contains(&k)) {
            self.selected = None;
        }
        tunnel.send_message(&UpdateMessage::OptionsHidden(hidden).into());
        tunnel.send_message(&self.ledger_message().into());
        true
    }

    /// Buys a phone call to the friend who knows the answer
    ///
    /// Returns whether the purchase went through. Allowed at any point of
    /// play as long as the points cover the price.
    pub fn phone_a_friend<T: Tunnel>(&mut self, tunnel: &T) -> bool {
        if self.state != GameState::Playing || !self.ledger.phone_a_friend() {
            return false;
        }
        self.call_open = true;
        if let Some(lines) = self.call() {
            tunnel.send_message(&UpdateMessage::Call(lines).into());
        }
        tunnel.send_message(&self.ledger_message().into());
        true
    }

    /// Closes the phone-a-friend call
    pub fn close_call<T: Tunnel>(&mut self, tunnel: &T) {
        if std::mem::take(&mut self.call_open) {
            tunnel.send_message(&UpdateMessage::CallClosed.into());
        }
    }

    /// Handles a previously scheduled alarm
    ///
    /// # Returns
    ///
    /// `true` if the alarm was applied, `false` if it was stale or did not
    /// match the session's current phase
    pub fn receive_alarm<T: Tunnel, S: FnMut(crate::AlarmMessage, web_time::Duration)>(
        &mut self,
        message: &crate::AlarmMessage,
        mut schedule_message: S,
        tunnel: &T,
    ) -> bool {
        let crate::AlarmMessage::Millionaire(alarm) = message;
        let (epoch, index) = match *alarm {
            AlarmMessage::Reveal { epoch, index } | AlarmMessage::Advance { epoch, index } => {
                (epoch, index)
            }
        };
        if epoch != self.epoch || index != self.index || self.state != GameState::Playing {
            log::debug!("ignoring stale alarm {alarm:?}, epoch is {}", self.epoch);
            return false;
        }

        match alarm {
            AlarmMessage::Reveal { .. } if self.confirmed && !self.success => {
                self.reveal(&mut schedule_message, tunnel);
                true
            }
            AlarmMessage::Advance { .. } if self.success => {
                self.advance(tunnel);
                true
            }
            _ => false,
        }
    }

    fn reveal<T: Tunnel, S: FnMut(crate::AlarmMessage, web_time::Duration)>(
        &mut self,
        schedule_message: &mut S,
        tunnel: &T,
    ) {
        let (Some(selected), Some(question)) = (self.selected, self.questions.get(self.index))
        else {
            return;
        };
        let correct = question.correct;
        let explanation = question.explanation.clone();

        if selected != correct {
            tunnel.send_message(
                &UpdateMessage::AnswerResult {
                    selected,
                    correct,
                    gained: None,
                    explanation,
                }
                .into(),
            );
            self.finish(Outcome::Lose, tunnel);
            return;
        }

        let gained = reward_for(self.index);
        self.ledger.award(gained);
        self.preferences.add_earned(gained);
        self.success = true;
        log::debug!("question {} correct, +{gained}", self.index);

        tunnel.send_message(
            &UpdateMessage::AnswerResult {
                selected,
                correct,
                gained: Some(gained),
                explanation,
            }
            .into(),
        );
        tunnel.send_message(&self.ledger_message().into());
        schedule_message(
            AlarmMessage::Advance {
                epoch: self.epoch,
                index: self.index,
            }
            .into(),
            self.options.advance_delay,
        );
    }

    fn advance<T: Tunnel>(&mut self, tunnel: &T) {
        let next = self.index + 1;
        if next >= self.total() {
            self.finish(Outcome::Win, tunnel);
            return;
        }
        self.close_call(tunnel);
        self.index = next;
        self.clear_question();
        self.announce_question(tunnel);
    }

    /// Full snapshot for redrawing the screen
    pub fn state_message(&self) -> crate::SyncMessage {
        let edition = self.preferences.edition();
        let difficulty = self.preferences.difficulty();
        let message = match self.state {
            GameState::Intro if self.questions.is_empty() => {
                SyncMessage::NoQuestions {
                    edition,
                    difficulty,
                }
            }
            GameState::Intro => SyncMessage::Intro {
                edition,
                difficulty,
                count: self.total(),
                earned_total: self.preferences.earned_total(),
            },
            GameState::Playing => match (self.current_question(), self.phase()) {
                (Some(question), Some(phase)) => SyncMessage::Playing {
                    question: self.question_view(question),
                    phase,
                    selected: self.selected,
                    correct: self.revealed.then_some(question.correct),
                    points: self.ledger.points(),
                    next_cost: self.ledger.next_cost(),
                    fifty_fifty_used: self.ledger.fifty_fifty_used(&question.id),
                    call: self.call(),
                },
                _ => SyncMessage::NoQuestions {
                    edition,
                    difficulty,
                },
            },
            GameState::Finished(outcome) => SyncMessage::Finished {
                outcome,
                points: self.ledger.points(),
                earned_total: self.preferences.earned_total(),
            },
        };
        message.into()
    }

    /// Sends the full snapshot through `tunnel`
    pub fn sync<T: Tunnel>(&self, tunnel: &T) {
        tunnel.send_state(&self.state_message());
    }
}
