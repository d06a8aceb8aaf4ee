//! Phone-a-friend script
//!
//! The friend on the line always gives the correct answer. The script has a
//! fixed shape of five lines so the UI can pace speech and bubbles the same
//! way on every call.

use serde::Serialize;

use crate::question::{Edition, MultipleChoiceQuestion};

/// Name of the friend on the other end of the call
pub const FRIEND_NAME: &str = "Zhora the Moose";

const FILLERS_NEW_YEAR: [&str; 5] = [
    "One second... switching on smart moose mode.",
    "I'm standing right by the tree, but my brain hasn't frozen.",
    "Rustling my hooves through the archives...",
    "Let me say it confidently, like I do quizzes every day.",
    "The Wi-Fi on my antlers is better than yours anyway.",
];

const FILLERS_REGULAR: [&str; 5] = [
    "One second... switching on smart moose mode.",
    "I graze on facts all day, my brain is in good shape.",
    "Rustling my hooves through the archives...",
    "Let me say it confidently, like I do quizzes every day.",
    "The Wi-Fi on my antlers is better than yours anyway.",
];

/// Who says a line of the call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Speaker {
    /// The player asking for help
    Player,
    /// The friend giving the answer
    Friend,
}

/// A single line of the call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallLine {
    /// Who is speaking
    pub speaker: Speaker,
    /// What they say
    pub text: String,
}

impl CallLine {
    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

/// Picks a filler line from the question id so the same question always
/// gets the same script
fn filler_index(question_id: &str, count: usize) -> usize {
    question_id
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(usize::from(b)))
        % count
}

/// Builds the call script for `question`
///
/// The fourth line is the verdict and names the correct key and its text.
pub fn call_lines(question: &MultipleChoiceQuestion, edition: Edition) -> Vec<CallLine> {
    let (greeting, fillers, excuse) = match edition {
        Edition::NewYear => (
            "Hello, hello! Moose on the line. I hear you great, even better than the snow underfoot.",
            &FILLERS_NEW_YEAR,
            "If anything, we'll say the line in Petersburg was crackling.",
        ),
        Edition::Regular => (
            "Hello, hello! Moose on the line. I hear you fine, the connection is good.",
            &FILLERS_REGULAR,
            "If anything, we'll say the line was crackling.",
        ),
    };
    let filler = fillers[filler_index(&question.id, fillers.len())];
    let key = question.correct;

    vec![
        CallLine::new(
            Speaker::Player,
            format!("{FRIEND_NAME}, hi! I need a hint on a question."),
        ),
        CallLine::new(Speaker::Friend, greeting),
        CallLine::new(Speaker::Friend, filler),
        CallLine::new(
            Speaker::Friend,
            format!(
                "I'd bet on option {key}: \"{}\". {excuse}",
                question.option(key)
            ),
        ),
        CallLine::new(
            Speaker::Friend,
            "Good luck! And remember: don't fret, just chew it over.",
        ),
    ]
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::question::{AnswerKey, tests::mc_question};

    #[test]
    fn test_script_shape() {
        let question = mc_question("q7", AnswerKey::B);
        let lines = call_lines(&question, Edition::Regular);

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].speaker, Speaker::Player);
        assert!(lines[1..].iter().all(|l| l.speaker == Speaker::Friend));
    }

    #[test]
    fn test_verdict_names_correct_option() {
        for key in AnswerKey::ALL {
            let question = mc_question("verdict", key);
            let lines = call_lines(&question, Edition::NewYear);
            let verdict = &lines[3].text;

            assert!(verdict.contains(&format!("option {key}")));
            assert!(verdict.contains(question.option(key)));
            assert!(verdict.contains("Petersburg"));
        }
    }

    #[test]
    fn test_script_is_deterministic() {
        let question = mc_question("stable", AnswerKey::D);
        assert_eq!(
            call_lines(&question, Edition::Regular),
            call_lines(&question, Edition::Regular)
        );
    }
}
