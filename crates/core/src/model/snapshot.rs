use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, QuestionSet};

/// Persisted form of an unsubmitted session.
///
/// One snapshot per chapter; a newer write replaces the older one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub answer_map: AnswerMap,
    pub batch_index: usize,
    pub question_set: QuestionSet,
}

impl SessionSnapshot {
    /// Every recorded answer points at a question in `question_set` and at
    /// one of that question's options.
    #[must_use]
    pub fn answers_fit_questions(&self) -> bool {
        self.answer_map.iter().all(|(index, option)| {
            self.question_set
                .get(index)
                .is_some_and(|question| option < question.option_count())
        })
    }
}
