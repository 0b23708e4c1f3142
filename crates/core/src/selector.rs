//! Preference-based sampling of questions from a bank.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;

use crate::bank::QuestionBank;
use crate::model::{Difficulty, LearningPreference, Question};

/// Source of permutations for question selection.
pub trait RandomSource {
    /// Reorder `items` in place.
    fn permute<T>(&mut self, items: &mut [T]);
}

/// Unseeded thread-local randomness; the production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn permute<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut rand::rng());
    }
}

/// Reproducible randomness from a fixed seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn permute<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

/// Leaves items in catalog order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedOrder;

impl RandomSource for FixedOrder {
    fn permute<T>(&mut self, _items: &mut [T]) {}
}

/// Picks questions matching a learner's preferences.
#[derive(Debug, Clone, Copy)]
pub struct QuestionSelector<'a> {
    bank: &'a QuestionBank,
}

impl<'a> QuestionSelector<'a> {
    #[must_use]
    pub fn new(bank: &'a QuestionBank) -> Self {
        Self { bank }
    }

    /// Samples up to `count` questions.
    ///
    /// - Keeps questions whose preference is in `preferences`; if none match, the whole
    ///   bank is used instead.
    /// - `difficulty` is applied afterwards and may empty the pool; there is no second
    ///   fallback.
    /// - The pool is permuted with `rng` and the first `min(count, pool)` are returned.
    pub fn select<R: RandomSource>(
        &self,
        preferences: &BTreeSet<LearningPreference>,
        count: usize,
        difficulty: Option<Difficulty>,
        rng: &mut R,
    ) -> Vec<Question> {
        let mut pool: Vec<&Question> = self
            .bank
            .questions()
            .iter()
            .filter(|q| preferences.contains(&q.learning_preference))
            .collect();

        if pool.is_empty() {
            pool = self.bank.questions().iter().collect();
        }

        if let Some(difficulty) = difficulty {
            pool.retain(|q| q.difficulty == difficulty);
        }

        rng.permute(&mut pool);
        pool.into_iter().take(count).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CorrectAnswer, QuestionId, QuestionType};

    fn question(id: &str, pref: LearningPreference, difficulty: Difficulty) -> Question {
        Question {
            id: QuestionId::new(id),
            kind: QuestionType::TrueFalse,
            prompt: format!("statement {id}"),
            options: Some(vec!["True".into(), "False".into()]),
            correct_answer: CorrectAnswer::Single("True".into()),
            explanation: String::new(),
            difficulty,
            learning_preference: pref,
            subject: "General".into(),
            tags: Default::default(),
        }
    }

    /// Four visual and four kinesthetic questions; every second one is medium.
    fn eight_question_bank() -> QuestionBank {
        let mut questions = Vec::new();
        for i in 0..4 {
            let d = if i % 2 == 0 {
                Difficulty::Easy
            } else {
                Difficulty::Medium
            };
            questions.push(question(&format!("v{i}"), LearningPreference::Visual, d));
            questions.push(question(&format!("k{i}"), LearningPreference::Kinesthetic, d));
        }
        QuestionBank::new(questions).unwrap()
    }

    fn prefs(list: &[LearningPreference]) -> BTreeSet<LearningPreference> {
        list.iter().copied().collect()
    }

    fn ids(questions: &[Question]) -> BTreeSet<String> {
        questions.iter().map(|q| q.id.as_str().to_owned()).collect()
    }

    #[test]
    fn returns_every_matching_question_when_count_exceeds_pool() {
        let bank = eight_question_bank();
        let picked = QuestionSelector::new(&bank).select(
            &prefs(&[LearningPreference::Visual]),
            10,
            None,
            &mut ThreadRandom,
        );
        let expected: BTreeSet<String> = ["v0", "v1", "v2", "v3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(picked.len(), 4);
        assert_eq!(ids(&picked), expected);
    }

    #[test]
    fn honours_count_below_pool_size() {
        let bank = eight_question_bank();
        let picked = QuestionSelector::new(&bank).select(
            &prefs(&[LearningPreference::Visual]),
            2,
            None,
            &mut ThreadRandom,
        );
        assert_eq!(picked.len(), 2);
        assert!(picked
            .iter()
            .all(|q| q.learning_preference == LearningPreference::Visual));
        assert_eq!(ids(&picked).len(), 2);
    }

    #[test]
    fn length_is_min_of_count_and_pool() {
        let bank = eight_question_bank();
        let selector = QuestionSelector::new(&bank);
        let both = prefs(&[LearningPreference::Visual, LearningPreference::Kinesthetic]);
        for n in 0..12 {
            let picked = selector.select(&both, n, None, &mut SeededRandom::new(n as u64));
            assert_eq!(picked.len(), n.min(8));
        }
    }

    #[test]
    fn unmatched_preferences_fall_back_to_whole_bank() {
        let bank = eight_question_bank();
        let picked = QuestionSelector::new(&bank).select(
            &prefs(&[LearningPreference::Auditory]),
            20,
            None,
            &mut FixedOrder,
        );
        assert_eq!(picked.len(), 8);

        let none = QuestionSelector::new(&bank).select(&BTreeSet::new(), 3, None, &mut FixedOrder);
        assert_eq!(none.len(), 3);
    }

    #[test]
    fn difficulty_filter_can_empty_the_selection() {
        let bank = eight_question_bank();
        let selector = QuestionSelector::new(&bank);
        let visual = prefs(&[LearningPreference::Visual]);

        let medium = selector.select(&visual, 10, Some(Difficulty::Medium), &mut FixedOrder);
        assert_eq!(ids(&medium), ["v1", "v3"].iter().map(|s| s.to_string()).collect());

        let hard = selector.select(&visual, 10, Some(Difficulty::Hard), &mut FixedOrder);
        assert!(hard.is_empty());
    }

    #[test]
    fn fixed_order_keeps_catalog_sequence() {
        let bank = eight_question_bank();
        let picked = QuestionSelector::new(&bank).select(
            &prefs(&[LearningPreference::Kinesthetic]),
            3,
            None,
            &mut FixedOrder,
        );
        let order: Vec<_> = picked.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(order, vec!["k0", "k1", "k2"]);
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let bank = QuestionBank::builtin();
        let selector = QuestionSelector::new(&bank);
        let all: BTreeSet<_> = LearningPreference::ALL.into_iter().collect();
        let a = selector.select(&all, 10, None, &mut SeededRandom::new(7));
        let b = selector.select(&all, 10, None, &mut SeededRandom::new(7));
        assert_eq!(a, b);
    }

    #[test]
    fn empty_bank_yields_nothing() {
        let bank = QuestionBank::empty();
        let picked =
            QuestionSelector::new(&bank).select(&BTreeSet::new(), 5, None, &mut ThreadRandom);
        assert!(picked.is_empty());
    }
}
