use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{SeedableRng, rng};

use quiz_core::model::{Question, QuestionSet};

/// Produces the question order for a fresh session.
///
/// Called once per fresh start. Never called again while answers exist
/// against the current order: answer indices are positions in it.
pub trait Shuffler: Send {
    fn shuffle(&mut self, questions: &mut [Question]);
}

/// Uniform shuffle backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngShuffler;

impl Shuffler for ThreadRngShuffler {
    fn shuffle(&mut self, questions: &mut [Question]) {
        let mut rng = rng();
        questions.shuffle(&mut rng);
    }
}

/// Reproducible shuffle for tests and replays.
#[derive(Debug, Clone)]
pub struct SeededShuffler {
    rng: StdRng,
}

impl SeededShuffler {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Shuffler for SeededShuffler {
    fn shuffle(&mut self, questions: &mut [Question]) {
        questions.shuffle(&mut self.rng);
    }
}

/// Copies `questions` into a newly ordered set.
pub fn shuffled(questions: &[Question], shuffler: &mut dyn Shuffler) -> QuestionSet {
    let mut ordered = questions.to_vec();
    shuffler.shuffle(&mut ordered);
    QuestionSet::new(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question::new(format!("Q{i}"), vec!["a".into(), "b".into()], 0, None).unwrap())
            .collect()
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let source = questions(40);
        let set = shuffled(&source, &mut ThreadRngShuffler);
        assert_eq!(set.len(), source.len());

        let mut seen: Vec<_> = set.iter().map(|q| q.question().to_owned()).collect();
        let mut expected: Vec<_> = source.iter().map(|q| q.question().to_owned()).collect();
        seen.sort();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let source = questions(25);
        let a = shuffled(&source, &mut SeededShuffler::new(7));
        let b = shuffled(&source, &mut SeededShuffler::new(7));
        assert_eq!(a, b);
    }

    #[test]
    fn leaves_source_untouched() {
        let source = questions(10);
        let before = source.clone();
        let _ = shuffled(&source, &mut SeededShuffler::new(1));
        assert_eq!(source, before);
    }

    proptest! {
        #[test]
        fn any_seed_yields_a_permutation(n in 0usize..120, seed in any::<u64>()) {
            let source = questions(n);
            let set = shuffled(&source, &mut SeededShuffler::new(seed));
            let mut order: Vec<usize> = set
                .iter()
                .map(|q| q.question()[1..].parse().unwrap())
                .collect();
            order.sort_unstable();
            prop_assert_eq!(order, (0..n).collect::<Vec<_>>());
        }
    }
}
