//! Points and lifeline bookkeeping for the millionaire game
//!
//! The ledger owns the player's spendable points, the shared lifeline
//! purchase counter and the record of which options fifty-fifty hid on
//! which question. Phase checks live in the session; the ledger only
//! enforces affordability and the once-per-question rule.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::question::{AnswerKey, MultipleChoiceQuestion};

/// The purchasable aids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifeline {
    /// Hide two incorrect options
    FiftyFifty,
    /// Call a friend who names the correct option
    PhoneAFriend,
}

/// Points awarded for answering the question at zero-based `index` correctly
pub fn reward_for(index: usize) -> u64 {
    index as u64 + 1
}

/// Spendable points, purchase count and fifty-fifty usage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    points: u64,
    purchases: u64,
    hidden: HashMap<String, Vec<AnswerKey>>,
}

impl Ledger {
    /// Current spendable points
    pub fn points(&self) -> u64 {
        self.points
    }

    /// Lifelines bought so far, of either kind
    pub fn purchases(&self) -> u64 {
        self.purchases
    }

    /// Price of the next lifeline, whichever kind it is
    pub fn next_cost(&self) -> u64 {
        self.purchases + 1
    }

    /// Whether the next lifeline is affordable
    pub fn can_afford(&self) -> bool {
        self.points >= self.next_cost()
    }

    /// Adds points for a correct answer
    pub fn award(&mut self, amount: u64) {
        self.points += amount;
    }

    /// Whether fifty-fifty was already used on `question_id`
    pub fn fifty_fifty_used(&self, question_id: &str) -> bool {
        self.hidden.get(question_id).is_some_and(|keys| !keys.is_empty())
    }

    /// Options hidden on `question_id`
    pub fn hidden(&self, question_id: &str) -> &[AnswerKey] {
        self.hidden
            .get(question_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Options of `question` still on display
    pub fn visible_keys(&self, question: &MultipleChoiceQuestion) -> Vec<AnswerKey> {
        let hidden = self.hidden(&question.id);
        AnswerKey::ALL
            .into_iter()
            .filter(|k| !hidden.contains(k))
            .collect_vec()
    }

    /// Deducts the next cost and bumps the shared counter
    ///
    /// Returns the price paid, or `None` if the points do not cover it.
    fn purchase(&mut self, lifeline: Lifeline) -> Option<u64> {
        let cost = self.next_cost();
        if self.points < cost {
            log::debug!("{lifeline:?} rejected: {} points, costs {cost}", self.points);
            return None;
        }
        self.points -= cost;
        self.purchases += 1;
        log::debug!("{lifeline:?} bought for {cost}");
        Some(cost)
    }

    /// Buys fifty-fifty for `question`
    ///
    /// One incorrect option is kept at random and the other two are hidden.
    /// Returns the hidden keys, or `None` without touching anything if the
    /// lifeline was already used on this question or is unaffordable.
    pub fn fifty_fifty(
        &mut self,
        question: &MultipleChoiceQuestion,
        rng: &mut fastrand::Rng,
    ) -> Option<Vec<AnswerKey>> {
        if self.fifty_fifty_used(&question.id) {
            return None;
        }
        let wrong = question.incorrect_keys().collect_vec();
        let keep = rng.choice(wrong.iter().copied())?;
        self.purchase(Lifeline::FiftyFifty)?;

        let hidden = wrong
            .into_iter()
            .filter(|k| *k != keep)
            .take(crate::constants::millionaire::FIFTY_FIFTY_HIDDEN)
            .collect_vec();
        self.hidden.insert(question.id.clone(), hidden.clone());
        Some(hidden)
    }

    /// Buys phone-a-friend
    ///
    /// Returns `false` without touching anything if it is unaffordable.
    pub fn phone_a_friend(&mut self) -> bool {
        self.purchase(Lifeline::PhoneAFriend).is_some()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::question::tests::mc_question;

    fn ledger_with(points: u64) -> Ledger {
        let mut ledger = Ledger::default();
        ledger.award(points);
        ledger
    }

    #[test]
    fn test_reward_escalates() {
        assert_eq!(reward_for(0), 1);
        assert_eq!(reward_for(14), 15);
        assert_eq!((0..15).map(reward_for).sum::<u64>(), 120);
    }

    #[test]
    fn test_cost_is_shared_and_rising() {
        let mut ledger = ledger_with(10);
        let mut rng = fastrand::Rng::with_seed(7);
        let question = mc_question("q1", AnswerKey::B);

        assert_eq!(ledger.next_cost(), 1);
        assert!(ledger.fifty_fifty(&question, &mut rng).is_some());
        assert_eq!(ledger.points(), 9);
        assert_eq!(ledger.next_cost(), 2);
        assert!(ledger.phone_a_friend());
        assert_eq!(ledger.points(), 7);
        assert_eq!(ledger.next_cost(), 3);
        assert_eq!(ledger.purchases(), 2);
    }

    #[test]
    fn test_purchase_blocked_when_short() {
        let mut ledger = ledger_with(2);
        assert!(ledger.phone_a_friend());
        assert!(!ledger.can_afford());
        assert!(!ledger.phone_a_friend());
        assert_eq!(ledger.points(), 1);
        assert_eq!(ledger.purchases(), 1);

        let mut empty = Ledger::default();
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(empty.fifty_fifty(&mc_question("q", AnswerKey::A), &mut rng).is_none());
        assert_eq!(empty.next_cost(), 1);
        assert!(!empty.fifty_fifty_used("q"));
    }

    #[test]
    fn test_fifty_fifty_keeps_correct_and_one_wrong() {
        for seed in 0..50 {
            let mut ledger = ledger_with(1);
            let mut rng = fastrand::Rng::with_seed(seed);
            let question = mc_question("q", AnswerKey::C);

            let hidden = ledger.fifty_fifty(&question, &mut rng).unwrap();
            assert_eq!(hidden.len(), 2);
            assert!(!hidden.contains(&AnswerKey::C));

            let visible = ledger.visible_keys(&question);
            assert_eq!(visible.len(), 2);
            assert!(visible.contains(&AnswerKey::C));
        }
    }

    #[test]
    fn test_fifty_fifty_once_per_question() {
        let mut ledger = ledger_with(10);
        let mut rng = fastrand::Rng::with_seed(3);
        let first = mc_question("first", AnswerKey::A);
        let second = mc_question("second", AnswerKey::D);

        assert!(ledger.fifty_fifty(&first, &mut rng).is_some());
        assert!(ledger.fifty_fifty(&first, &mut rng).is_none());
        assert_eq!(ledger.points(), 9);
        assert_eq!(ledger.purchases(), 1);

        assert!(ledger.fifty_fifty(&second, &mut rng).is_some());
        assert_eq!(ledger.points(), 7);
        assert_eq!(ledger.hidden("first").len(), 2);
        assert_eq!(ledger.hidden("unknown").len(), 0);
    }
}
