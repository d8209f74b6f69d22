//! Shared error types for the services crate.

use std::fmt;

use thiserror::Error;

use quiz_core::model::SessionPhase;

/// Transition requested of a quiz session, named for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Start,
    Resume,
    Discard,
    SelectAnswer,
    Navigate,
    RequestSubmit,
    CancelSubmit,
    ConfirmSubmit,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionAction::Start => "start",
            SessionAction::Resume => "resume",
            SessionAction::Discard => "discard",
            SessionAction::SelectAnswer => "select answer",
            SessionAction::Navigate => "navigate",
            SessionAction::RequestSubmit => "request submit",
            SessionAction::CancelSubmit => "cancel submit",
            SessionAction::ConfirmSubmit => "confirm submit",
        };
        f.write_str(name)
    }
}

/// Errors emitted by quiz sessions and the chapter controller.
///
/// Storage failures never show up here: they are downgraded to warnings so the
/// in-memory session keeps working.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot {action} while session is {phase}")]
    InvalidTransition {
        action: SessionAction,
        phase: SessionPhase,
    },
    #[error("question {index} is out of range for {total} questions")]
    QuestionOutOfRange { index: usize, total: usize },
    #[error("option {option} is out of range for question {index}")]
    OptionOutOfRange { index: usize, option: usize },
    #[error("batch {index} is out of range for {page_count} pages")]
    BatchOutOfRange { index: usize, page_count: usize },
    #[error("{answered} of {required} required answers given")]
    NotEnoughAnswers { answered: usize, required: usize },
    #[error("no quiz content loaded")]
    NoQuiz,
}
