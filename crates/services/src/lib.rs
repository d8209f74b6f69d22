#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use error::SessionError;
pub use sessions::{
    AnswerOutcome, CompletionCallback, QuizController, QuizEvent, QuizSession, SeededShuffler,
    SessionContext, SessionProgress, SessionTicker, Shuffler, StoreOp, StoreWarning,
    ThreadRngShuffler,
};
