//! Board game of themed point cells
//!
//! Each row is a theme and each column a point tier. The operator opens one
//! hidden cell at a time, reads the question, shows the answer and judges
//! the players' response: a correct answer adds the cell's points, a wrong
//! one subtracts them. Some cells are decoys holding a question borrowed
//! from another theme of the same value. The game is finished as soon as
//! every cell is answered.

use std::collections::HashSet;

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    bank::ThemeBank,
    question::{Difficulty, GridQuestion, Theme},
    selection::{assign_decoys, build_grid, choose_themes},
    session::Tunnel,
};

type ValidationResult = garde::Result;

fn validate_chance(val: &f64, _ctx: &()) -> ValidationResult {
    if (0.0..=1.0).contains(val) {
        Ok(())
    } else {
        Err(garde::Error::new("outside of bounds [0,1]"))
    }
}

/// Tunable parameters of a board game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Options {
    /// Themes on the board when none are requested
    #[garde(range(min = 1, max = crate::constants::board::MAX_THEME_COUNT))]
    pub theme_count: usize,
    /// Chance for each cell to become a decoy at game start
    #[garde(custom(validate_chance))]
    pub decoy_chance: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            theme_count: crate::constants::board::THEME_COUNT,
            decoy_chance: crate::constants::board::DECOY_CHANCE,
        }
    }
}

/// Visibility of a cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    /// Not picked yet
    #[default]
    Hidden,
    /// Currently being played
    Open,
    /// Resolved, cannot be picked again
    Answered,
}

/// One cell of the board
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Theme of the row the cell sits in
    pub theme_id: String,
    /// Question behind the cell
    pub question_id: String,
    /// Points the cell is worth
    pub points: u32,
    /// Visibility
    pub state: CellState,
    /// Whether the question belongs to another theme
    pub decoy: bool,
    /// Theme the question belongs to, for decoys
    pub origin_theme: Option<String>,
}

impl Cell {
    /// Moves from `before` to `after`, returning whether the cell was in
    /// `before`
    fn change_state(&mut self, before: CellState, after: CellState) -> bool {
        if self.state == before {
            self.state = after;
            true
        } else {
            false
        }
    }

    /// Theme the question is looked up in and attributed to
    fn attributed_theme(&self) -> &str {
        match (&self.origin_theme, self.decoy) {
            (Some(origin), true) => origin,
            _ => &self.theme_id,
        }
    }
}

/// Top-level state of a board game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// Choosing difficulty and themes; the board is a preview
    #[default]
    SelectDifficulty,
    /// Cells are being played
    Playing,
    /// Every cell is answered
    Finished,
}

/// A cell as shown on the board
#[derive(Debug, Clone, Serialize)]
pub struct CellView {
    /// Points the cell is worth
    pub points: u32,
    /// Visibility
    pub state: CellState,
    /// Whether the cell was answered wrongly
    pub wrong: bool,
}

/// A row as shown on the board
#[derive(Debug, Clone, Serialize)]
pub struct RowView {
    /// Theme identifier
    pub theme_id: String,
    /// Theme display name
    pub theme_name: String,
    /// Cells in tier order
    pub cells: Vec<CellView>,
}

/// A theme offered for selection
#[derive(Debug, Clone, Serialize)]
pub struct ThemeSummary {
    /// Theme identifier
    pub id: String,
    /// Theme display name
    pub name: String,
    /// Whether the theme is on the board
    pub selected: bool,
}

/// The open cell with its question
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct OpenCellView {
    /// Row of the cell
    pub row: usize,
    /// Column of the cell
    pub col: usize,
    /// Name of the theme the question is attributed to
    pub theme_name: String,
    /// Prompt text
    pub question: String,
    /// Points at stake
    pub points: u32,
    /// Whether the cell is a decoy
    pub decoy: bool,
    /// The answer, once shown
    pub answer: Option<String>,
}

/// Incremental updates of a board game
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub enum UpdateMessage {
    /// The board preview changed
    Board {
        /// Active difficulty
        difficulty: Difficulty,
        /// Rows of the preview
        rows: Vec<RowView>,
    },
    /// The active difficulty has no usable themes
    NoThemes {
        /// Active difficulty
        difficulty: Difficulty,
    },
    /// A game started on this board
    Started {
        /// Rows of the board
        rows: Vec<RowView>,
    },
    /// A decoy cell was opened
    DecoyRevealed {
        /// Row of the cell
        row: usize,
        /// Column of the cell
        col: usize,
        /// Theme the question comes from
        origin_theme: Option<String>,
    },
    /// A cell was opened
    CellOpened(OpenCellView),
    /// The answer of the open cell is shown
    AnswerShown {
        /// Row of the cell
        row: usize,
        /// Column of the cell
        col: usize,
        /// Expected answer
        answer: String,
    },
    /// The open cell was judged and closed
    Judged {
        /// Row of the cell
        row: usize,
        /// Column of the cell
        col: usize,
        /// Whether the response was accepted
        correct: bool,
        /// Running total after judging
        total: i64,
    },
    /// Every cell is answered
    Finished {
        /// Final total
        total: i64,
    },
}

/// Full snapshot of a board game
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub enum SyncMessage {
    /// Choosing difficulty and themes
    SelectDifficulty {
        /// Active difficulty
        difficulty: Difficulty,
        /// Themes available at this difficulty
        themes: Vec<ThemeSummary>,
    },
    /// A game is in progress
    Playing {
        /// Rows of the board
        rows: Vec<RowView>,
        /// The open cell, if any
        open: Option<OpenCellView>,
        /// Running total
        total: i64,
    },
    /// Game over
    Finished {
        /// Rows of the board
        rows: Vec<RowView>,
        /// Final total
        total: i64,
    },
}

/// A board game
#[derive(Debug)]
pub struct Game {
    bank: ThemeBank,
    options: Options,
    difficulty: Difficulty,
    requested: Vec<String>,
    rng: fastrand::Rng,

    // Runtime State
    grid: Vec<Vec<Cell>>,
    open: Option<(usize, usize)>,
    answer_shown: bool,
    total: i64,
    wrong: HashSet<(usize, usize)>,
    state: GameState,
}

// Convenience methods
impl Game {
    fn themes(&self) -> &[Theme] {
        self.bank.tier(self.difficulty)
    }

    fn theme(&self, id: &str) -> Option<&Theme> {
        self.themes().iter().find(|t| t.id == id)
    }

    fn chosen_themes(&self) -> Vec<&Theme> {
        choose_themes(self.themes(), &self.requested, self.options.theme_count)
    }

    /// Rebuilds the board without decoys for the selection screen
    fn rebuild_preview(&mut self) {
        let themes = choose_themes(
            self.bank.tier(self.difficulty),
            &self.requested,
            self.options.theme_count,
        );
        self.grid = build_grid(&themes, &crate::constants::board::POINT_TIERS, &mut self.rng);
        self.clear();
    }

    fn clear(&mut self) {
        self.open = None;
        self.answer_shown = false;
        self.total = 0;
        self.wrong.clear();
    }

    fn cell_count(&self) -> usize {
        self.grid.iter().map(Vec::len).sum()
    }

    fn all_answered(&self) -> bool {
        self.grid
            .iter()
            .flatten()
            .all(|c| c.state == CellState::Answered)
    }

    fn rows(&self) -> Vec<RowView> {
        self.grid
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let theme_id = cells
                    .first()
                    .map(|c| c.theme_id.clone())
                    .or_else(|| self.chosen_themes().get(row).map(|t| t.id.clone()))
                    .unwrap_or_default();
                let theme_name = self
                    .theme(&theme_id)
                    .map_or_else(|| theme_id.clone(), |t| t.name.clone());
                RowView {
                    theme_id,
                    theme_name,
                    cells: cells
                        .iter()
                        .enumerate()
                        .map(|(col, cell)| CellView {
                            points: cell.points,
                            state: cell.state,
                            wrong: self.wrong.contains(&(row, col)),
                        })
                        .collect_vec(),
                }
            })
            .collect_vec()
    }

    fn open_cell_view(&self, row: usize, col: usize) -> Option<OpenCellView> {
        let cell = self.grid.get(row)?.get(col)?;
        let question = self.question(row, col)?;
        let attributed = cell.attributed_theme();
        Some(OpenCellView {
            row,
            col,
            theme_name: self
                .theme(attributed)
                .map_or_else(|| attributed.to_owned(), |t| t.name.clone()),
            question: question.prompt.clone(),
            points: cell.points,
            decoy: cell.decoy,
            answer: self.answer_shown.then(|| question.answer.clone()),
        })
    }

    fn announce_board<T: Tunnel>(&self, tunnel: &T) {
        let message = if self.cell_count() == 0 {
            UpdateMessage::NoThemes {
                difficulty: self.difficulty,
            }
        } else {
            UpdateMessage::Board {
                difficulty: self.difficulty,
                rows: self.rows(),
            }
        };
        tunnel.send_message(&message.into());
    }
}

impl Game {
    /// Creates a game on the selection screen
    ///
    /// # Arguments
    ///
    /// * `bank` - Themes per difficulty
    /// * `options` - Board parameters
    /// * `difficulty` - Initial difficulty
    /// * `rng` - Random source for question picks and decoys
    ///
    /// # Errors
    ///
    /// Returns the validation report if `options` are out of bounds.
    pub fn new(
        bank: ThemeBank,
        options: Options,
        difficulty: Difficulty,
        rng: fastrand::Rng,
    ) -> Result<Self, garde::Report> {
        options.validate()?;
        let mut game = Self {
            bank,
            options,
            difficulty,
            requested: Vec::new(),
            rng,
            grid: Vec::new(),
            open: None,
            answer_shown: false,
            total: 0,
            wrong: HashSet::new(),
            state: GameState::SelectDifficulty,
        };
        game.rebuild_preview();
        Ok(game)
    }

    /// Current top-level state
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Active difficulty
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Running total, negative when wrong answers outweigh right ones
    pub fn total(&self) -> i64 {
        self.total
    }

    /// The cells, one row per theme
    pub fn grid(&self) -> &[Vec<Cell>] {
        &self.grid
    }

    /// Position of the open cell
    pub fn open(&self) -> Option<(usize, usize)> {
        self.open
    }

    /// Whether the open cell's answer is shown
    pub fn answer_shown(&self) -> bool {
        self.answer_shown
    }

    /// Whether the cell at `row`, `col` was answered wrongly
    pub fn is_wrong(&self, row: usize, col: usize) -> bool {
        self.wrong.contains(&(row, col))
    }

    /// Themes available at the active difficulty, marking those on the board
    pub fn theme_summaries(&self) -> Vec<ThemeSummary> {
        let chosen = self.chosen_themes().into_iter().map(|t| &t.id).collect_vec();
        self.themes()
            .iter()
            .map(|t| ThemeSummary {
                id: t.id.clone(),
                name: t.name.clone(),
                selected: chosen.contains(&&t.id),
            })
            .collect_vec()
    }

    /// Question behind the cell at `row`, `col`
    ///
    /// Decoys are looked up in their origin theme. When the origin theme does
    /// not hold the question, as for decoys marked in the source data, the
    /// row's own theme is searched.
    pub fn question(&self, row: usize, col: usize) -> Option<&GridQuestion> {
        let cell = self.grid.get(row)?.get(col)?;
        self.theme(cell.attributed_theme())
            .and_then(|t| t.question(&cell.question_id))
            .or_else(|| {
                self.theme(&cell.theme_id)
                    .and_then(|t| t.question(&cell.question_id))
            })
    }

    /// The open cell with its question
    pub fn open_question(&self) -> Option<OpenCellView> {
        let (row, col) = self.open?;
        self.open_cell_view(row, col)
    }

    /// Changes the difficulty and rebuilds the preview
    ///
    /// Ignored while a game is in progress. Requested themes are kept and
    /// matched against the new difficulty's themes.
    pub fn set_difficulty<T: Tunnel>(&mut self, difficulty: Difficulty, tunnel: &T) {
        if self.state == GameState::Playing {
            return;
        }
        self.difficulty = difficulty;
        self.state = GameState::SelectDifficulty;
        self.rebuild_preview();
        self.announce_board(tunnel);
    }

    /// Requests themes by id and rebuilds the preview
    ///
    /// Ignored while a game is in progress. Unknown ids are skipped; an
    /// empty or unusable request falls back to the first themes.
    pub fn set_themes<T: Tunnel>(&mut self, ids: Vec<String>, tunnel: &T) {
        if self.state == GameState::Playing {
            return;
        }
        self.requested = ids;
        self.state = GameState::SelectDifficulty;
        self.rebuild_preview();
        self.announce_board(tunnel);
    }

    /// Builds the board with its decoys and starts playing
    ///
    /// Stays on the selection screen when the active difficulty has no
    /// themes with questions.
    pub fn start<T: Tunnel>(&mut self, tunnel: &T) {
        if self.state == GameState::Playing {
            return;
        }

        let themes = choose_themes(
            self.bank.tier(self.difficulty),
            &self.requested,
            self.options.theme_count,
        );
        let mut grid = build_grid(&themes, &crate::constants::board::POINT_TIERS, &mut self.rng);
        let decoys = assign_decoys(&mut grid, &themes, self.options.decoy_chance, &mut self.rng);
        self.grid = grid;
        self.clear();

        if self.cell_count() == 0 {
            log::warn!("no themes with questions for {:?}", self.difficulty);
            self.state = GameState::SelectDifficulty;
            self.announce_board(tunnel);
            return;
        }

        self.state = GameState::Playing;
        log::info!(
            "board started with {} cells, {decoys} decoys",
            self.cell_count()
        );
        tunnel.send_message(&UpdateMessage::Started { rows: self.rows() }.into());
    }

    /// Opens the hidden cell at `row`, `col`
    ///
    /// Only one cell can be open at a time. Returns whether the cell opened.
    pub fn open_cell<T: Tunnel>(&mut self, row: usize, col: usize, tunnel: &T) -> bool {
        if self.state != GameState::Playing || self.open.is_some() {
            return false;
        }
        let Some(cell) = self.grid.get_mut(row).and_then(|r| r.get_mut(col)) else {
            return false;
        };
        if !cell.change_state(CellState::Hidden, CellState::Open) {
            return false;
        }
        let decoy = cell.decoy.then(|| cell.origin_theme.clone());

        self.open = Some((row, col));
        self.answer_shown = false;
        log::debug!("opened cell {row}/{col}");

        if let Some(origin_theme) = decoy {
            tunnel.send_message(
                &UpdateMessage::DecoyRevealed {
                    row,
                    col,
                    origin_theme,
                }
                .into(),
            );
        }
        if let Some(view) = self.open_cell_view(row, col) {
            tunnel.send_message(&UpdateMessage::CellOpened(view).into());
        }
        true
    }

    /// Shows the answer of the open cell
    pub fn show_answer<T: Tunnel>(&mut self, tunnel: &T) -> bool {
        let Some((row, col)) = self.open else {
            return false;
        };
        if self.answer_shown {
            return false;
        }
        self.answer_shown = true;
        let answer = self
            .question(row, col)
            .map(|q| q.answer.clone())
            .unwrap_or_default();
        tunnel.send_message(&UpdateMessage::AnswerShown { row, col, answer }.into());
        true
    }

    /// Judges the response to the open cell and closes it
    ///
    /// Requires the answer to be shown. A correct response adds the cell's
    /// points to the total, a wrong one subtracts them. Returns whether the
    /// cell was judged.
    pub fn judge<T: Tunnel>(&mut self, correct: bool, tunnel: &T) -> bool {
        if !self.answer_shown {
            return false;
        }
        let Some((row, col)) = self.open else {
            return false;
        };
        let Some(cell) = self.grid.get_mut(row).and_then(|r| r.get_mut(col)) else {
            return false;
        };
        if !cell.change_state(CellState::Open, CellState::Answered) {
            return false;
        }

        let points = i64::from(cell.points);
        if correct {
            self.total += points;
        } else {
            self.total -= points;
            self.wrong.insert((row, col));
        }
        self.open = None;
        self.answer_shown = false;
        log::debug!("cell {row}/{col} judged {correct}, total {}", self.total);

        tunnel.send_message(
            &UpdateMessage::Judged {
                row,
                col,
                correct,
                total: self.total,
            }
            .into(),
        );

        if self.all_answered() {
            self.state = GameState::Finished;
            log::info!("board finished with {} points", self.total);
            tunnel.send_message(&UpdateMessage::Finished { total: self.total }.into());
        }
        true
    }

    /// Returns to the selection screen with a clean total
    pub fn restart<T: Tunnel>(&mut self, tunnel: &T) {
        self.state = GameState::SelectDifficulty;
        self.rebuild_preview();
        self.announce_board(tunnel);
    }

    /// Full snapshot for redrawing the screen
    pub fn state_message(&self) -> crate::SyncMessage {
        let message = match self.state {
            GameState::SelectDifficulty => SyncMessage::SelectDifficulty {
                difficulty: self.difficulty,
                themes: self.theme_summaries(),
            },
            GameState::Playing => SyncMessage::Playing {
                rows: self.rows(),
                open: self.open_question(),
                total: self.total,
            },
            GameState::Finished => SyncMessage::Finished {
                rows: self.rows(),
                total: self.total,
            },
        };
        message.into()
    }

    /// Sends the full snapshot through `tunnel`
    pub fn sync<T: Tunnel>(&self, tunnel: &T) {
        tunnel.send_state(&self.state_message());
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use enum_map::EnumMap;

    use super::*;
    use crate::{question::tests::theme, session::tests::RecordingTunnel};

    fn bank(theme_count: usize) -> ThemeBank {
        let mut tiers: EnumMap<Difficulty, Vec<Theme>> = EnumMap::default();
        tiers[Difficulty::Easy] = (0..theme_count)
            .map(|i| theme(&format!("t{i}"), 2))
            .collect();
        ThemeBank::from_tiers(tiers)
    }

    fn game(decoy_chance: f64) -> Game {
        Game::new(
            bank(8),
            Options {
                decoy_chance,
                ..Options::default()
            },
            Difficulty::Easy,
            fastrand::Rng::with_seed(7),
        )
        .unwrap()
    }

    fn play_cell(game: &mut Game, row: usize, col: usize, correct: bool, tunnel: &RecordingTunnel) {
        assert!(game.open_cell(row, col, tunnel));
        assert!(game.show_answer(tunnel));
        assert!(game.judge(correct, tunnel));
    }

    #[test]
    fn test_options_validation() {
        assert!(Options::default().validate().is_ok());
        let options = Options {
            decoy_chance: 1.5,
            ..Options::default()
        };
        assert!(options.validate().is_err());
        let options = Options {
            theme_count: 0,
            ..Options::default()
        };
        assert!(options.validate().is_err());
        assert!(Game::new(bank(8), options, Difficulty::Easy, fastrand::Rng::with_seed(7)).is_err());
    }

    #[test]
    fn test_themes_without_questions_get_no_row() {
        let mut tiers: EnumMap<Difficulty, Vec<Theme>> = EnumMap::default();
        let mut empty = theme("empty", 1);
        empty.questions.clear();
        tiers[Difficulty::Easy] = vec![empty, theme("full", 1)];
        let tunnel = RecordingTunnel::default();
        let mut game = Game::new(
            ThemeBank::from_tiers(tiers),
            Options::default(),
            Difficulty::Easy,
            fastrand::Rng::with_seed(3),
        )
        .unwrap();
        game.start(&tunnel);

        assert_eq!(game.grid().len(), 1);
        assert_eq!(game.grid()[0][0].theme_id, "full");
        assert!(game.grid().iter().all(|row| !row.is_empty()));
    }

    #[test]
    fn test_start_builds_six_rows_of_five() {
        let tunnel = RecordingTunnel::default();
        let mut game = game(0.0);
        assert_eq!(game.state(), GameState::SelectDifficulty);

        game.start(&tunnel);
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.grid().len(), 6);
        assert!(game.grid().iter().all(|row| row.len() == 5));
        assert_eq!(game.total(), 0);
    }

    #[test]
    fn test_finished_only_when_every_cell_answered() {
        let tunnel = RecordingTunnel::default();
        let mut game = game(0.0);
        game.start(&tunnel);

        let positions = (0..6).cartesian_product(0..5).collect_vec();
        let (last, rest) = positions.split_last().unwrap();
        let mut expected = 0;
        for (i, (row, col)) in rest.iter().copied().enumerate() {
            let correct = i % 3 != 0;
            let points = i64::from(game.grid()[row][col].points);
            expected += if correct { points } else { -points };
            play_cell(&mut game, row, col, correct, &tunnel);
            assert_eq!(game.state(), GameState::Playing);
        }

        play_cell(&mut game, last.0, last.1, true, &tunnel);
        expected += 500;
        assert_eq!(game.state(), GameState::Finished);
        assert_eq!(game.total(), expected);
        assert!(matches!(
            tunnel.last_message(),
            Some(crate::UpdateMessage::Board(UpdateMessage::Finished { .. }))
        ));
    }

    #[test]
    fn test_total_can_go_negative() {
        let tunnel = RecordingTunnel::default();
        let mut game = game(0.0);
        game.start(&tunnel);

        play_cell(&mut game, 0, 4, false, &tunnel);
        assert_eq!(game.total(), -500);
        assert!(game.is_wrong(0, 4));
        play_cell(&mut game, 1, 0, true, &tunnel);
        assert_eq!(game.total(), -400);
        assert!(!game.is_wrong(1, 0));
    }

    #[test]
    fn test_answered_cells_do_not_reopen() {
        let tunnel = RecordingTunnel::default();
        let mut game = game(0.0);
        game.start(&tunnel);

        play_cell(&mut game, 2, 2, true, &tunnel);
        assert!(!game.open_cell(2, 2, &tunnel));
        assert_eq!(game.grid()[2][2].state, CellState::Answered);
        assert!(!game.open_cell(9, 0, &tunnel));
    }

    #[test]
    fn test_one_open_cell_at_a_time() {
        let tunnel = RecordingTunnel::default();
        let mut game = game(0.0);

        assert!(!game.open_cell(0, 0, &tunnel));
        game.start(&tunnel);
        assert!(game.open_cell(0, 0, &tunnel));
        assert!(!game.open_cell(0, 1, &tunnel));
        assert_eq!(game.grid()[0][1].state, CellState::Hidden);
        assert_eq!(game.open(), Some((0, 0)));
    }

    #[test]
    fn test_judge_requires_shown_answer() {
        let tunnel = RecordingTunnel::default();
        let mut game = game(0.0);
        game.start(&tunnel);

        assert!(!game.judge(true, &tunnel));
        assert!(!game.show_answer(&tunnel));
        assert!(game.open_cell(3, 1, &tunnel));
        assert!(game.open_question().unwrap().answer.is_none());
        assert!(!game.judge(true, &tunnel));

        assert!(game.show_answer(&tunnel));
        assert!(!game.show_answer(&tunnel));
        assert!(game.open_question().unwrap().answer.is_some());
        assert!(game.judge(true, &tunnel));
        assert_eq!(game.total(), 200);
        assert_eq!(game.open(), None);
    }

    #[test]
    fn test_decoys_are_looked_up_in_origin_theme() {
        let tunnel = RecordingTunnel::default();
        let mut game = game(1.0);
        game.start(&tunnel);

        let mut decoys = 0;
        for (row, cells) in game.grid().iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let question = game.question(row, col).unwrap();
                assert_eq!(question.points, cell.points);
                if cell.decoy {
                    decoys += 1;
                    let origin = cell.origin_theme.as_deref().unwrap();
                    assert_ne!(origin, cell.theme_id);
                    assert!(question.id.starts_with(&format!("{origin}-")));
                }
            }
        }
        assert_eq!(decoys, 30);

        assert!(game.open_cell(0, 0, &tunnel));
        let view = game.open_question().unwrap();
        let origin = game.grid()[0][0].origin_theme.clone().unwrap();
        assert_eq!(view.theme_name, format!("Theme {origin}"));
        assert!(view.decoy);

        let messages = tunnel.messages.borrow();
        let revealed = messages
            .iter()
            .filter(|m| matches!(m, crate::UpdateMessage::Board(UpdateMessage::DecoyRevealed { .. })))
            .count();
        assert_eq!(revealed, 1);
    }

    #[test]
    fn test_source_decoy_falls_back_to_row_theme() {
        let mut marked = theme("marked", 1);
        for question in &mut marked.questions {
            question.decoy = true;
            question.origin_theme = Some("gone".to_owned());
        }
        let mut tiers: EnumMap<Difficulty, Vec<Theme>> = EnumMap::default();
        tiers[Difficulty::Easy] = vec![marked];
        let tunnel = RecordingTunnel::default();
        let mut game = Game::new(
            ThemeBank::from_tiers(tiers),
            Options::default(),
            Difficulty::Easy,
            fastrand::Rng::with_seed(1),
        )
        .unwrap();
        game.start(&tunnel);

        let question = game.question(0, 0).unwrap();
        assert_eq!(question.id, "marked-100-0");
        assert!(game.open_cell(0, 0, &tunnel));
        assert_eq!(game.open_question().unwrap().theme_name, "gone");
    }

    #[test]
    fn test_selection_ignored_mid_game() {
        let tunnel = RecordingTunnel::default();
        let mut game = game(0.0);
        game.start(&tunnel);
        let grid = game.grid().to_vec();

        game.set_difficulty(Difficulty::Hard, &tunnel);
        game.set_themes(vec!["t7".to_owned()], &tunnel);
        assert_eq!(game.difficulty(), Difficulty::Easy);
        assert_eq!(game.grid(), grid.as_slice());
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn test_requested_themes_build_the_board() {
        let tunnel = RecordingTunnel::default();
        let mut game = game(0.0);
        game.set_themes(vec!["t7".to_owned(), "t3".to_owned()], &tunnel);
        game.start(&tunnel);

        let ids = game.grid().iter().map(|r| r[0].theme_id.as_str()).collect_vec();
        assert_eq!(ids, vec!["t7", "t3"]);

        let crate::SyncMessage::Board(SyncMessage::Playing { rows, .. }) = game.state_message()
        else {
            panic!("expected a playing snapshot");
        };
        assert_eq!(rows[0].theme_name, "Theme t7");
    }

    #[test]
    fn test_empty_difficulty_stays_on_selection() {
        let tunnel = RecordingTunnel::default();
        let mut game = game(0.0);
        game.set_difficulty(Difficulty::Hard, &tunnel);
        game.start(&tunnel);

        assert_eq!(game.state(), GameState::SelectDifficulty);
        assert!(matches!(
            tunnel.last_message(),
            Some(crate::UpdateMessage::Board(UpdateMessage::NoThemes { .. }))
        ));
    }

    #[test]
    fn test_restart_clears_total() {
        let tunnel = RecordingTunnel::default();
        let mut game = game(0.0);
        game.start(&tunnel);
        play_cell(&mut game, 0, 0, false, &tunnel);
        assert!(game.open_cell(0, 1, &tunnel));

        game.restart(&tunnel);
        assert_eq!(game.state(), GameState::SelectDifficulty);
        assert_eq!(game.total(), 0);
        assert_eq!(game.open(), None);
        assert!(!game.is_wrong(0, 0));
        assert!(game.grid().iter().flatten().all(|c| c.state == CellState::Hidden));

        let crate::SyncMessage::Board(SyncMessage::SelectDifficulty { themes, .. }) =
            game.state_message()
        else {
            panic!("expected the selection snapshot");
        };
        assert_eq!(themes.len(), 8);
        assert_eq!(themes.iter().filter(|t| t.selected).count(), 6);
    }
}
