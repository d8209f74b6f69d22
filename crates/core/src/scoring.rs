use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, Question, QuestionSet};

/// Number of recorded answers that match their question's correct option.
///
/// Unanswered questions, and answers keyed past the end of the set, score zero.
#[must_use]
pub fn score(questions: &QuestionSet, answers: &AnswerMap) -> u32 {
    let correct = answers
        .iter()
        .filter(|(index, option)| {
            questions
                .get(*index)
                .is_some_and(|question| question.is_correct(*option))
        })
        .count();
    u32::try_from(correct).unwrap_or(u32::MAX)
}

/// Finalized outcome of a submitted quiz, handed to the host exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    score: u32,
    answer_map: AnswerMap,
    question_set: QuestionSet,
    elapsed_seconds: u64,
    submitted_at: DateTime<Utc>,
}

impl QuizResult {
    #[must_use]
    pub fn build(
        question_set: QuestionSet,
        answer_map: AnswerMap,
        elapsed_seconds: u64,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            score: score(&question_set, &answer_map),
            answer_map,
            question_set,
            elapsed_seconds,
            submitted_at,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.question_set.len()
    }

    #[must_use]
    pub fn answer_map(&self) -> &AnswerMap {
        &self.answer_map
    }

    #[must_use]
    pub fn question_set(&self) -> &QuestionSet {
        &self.question_set
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Per-question outcome in question-set order, for the results view.
    #[must_use]
    pub fn review(&self) -> Vec<QuestionReview<'_>> {
        self.question_set
            .iter()
            .enumerate()
            .map(|(index, question)| QuestionReview::new(index, question, &self.answer_map))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Correct,
    Incorrect,
    Unanswered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview<'a> {
    pub index: usize,
    pub question: &'a Question,
    pub selected: Option<usize>,
    pub outcome: ReviewOutcome,
}

impl<'a> QuestionReview<'a> {
    fn new(index: usize, question: &'a Question, answers: &AnswerMap) -> Self {
        let selected = answers.get(index);
        let outcome = match selected {
            None => ReviewOutcome::Unanswered,
            Some(option) if question.is_correct(option) => ReviewOutcome::Correct,
            Some(_) => ReviewOutcome::Incorrect,
        };
        Self {
            index,
            question,
            selected,
            outcome,
        }
    }
}
