use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, ChapterId, Question};

/// Content type discriminator supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Markdown,
    Image,
    Pdf,
    Video,
    Quiz,
}

/// A chapter content unit as handed over by the host application.
///
/// Only `Quiz` records drive a session. `finalized_answers`, when present,
/// bypass the interactive flow and open straight into results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub chapter_id: ChapterId,
    pub kind: ContentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<Question>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_answers: Option<AnswerMap>,
}

impl ContentRecord {
    #[must_use]
    pub fn quiz(chapter_id: ChapterId, questions: Vec<Question>) -> Self {
        Self {
            chapter_id,
            kind: ContentKind::Quiz,
            title: None,
            questions: Some(questions),
            finalized_answers: None,
        }
    }

    #[must_use]
    pub fn with_finalized_answers(mut self, answers: AnswerMap) -> Self {
        self.finalized_answers = Some(answers);
        self
    }

    #[must_use]
    pub fn is_quiz(&self) -> bool {
        self.kind == ContentKind::Quiz
    }

    /// Questions of a quiz record; an absent array reads as an empty quiz.
    #[must_use]
    pub fn quiz_questions(&self) -> &[Question] {
        self.questions.as_deref().unwrap_or_default()
    }
}
