mod controller;
mod progress;
mod session;
mod shuffle;
mod ticker;

// Public API of the quiz session subsystem.
pub use crate::error::{SessionAction, SessionError};
pub use controller::{QuizController, QuizEvent};
pub use progress::SessionProgress;
pub use session::{
    AnswerOutcome, CompletionCallback, QuizSession, SessionContext, StoreOp, StoreWarning,
};
pub use shuffle::{SeededShuffler, Shuffler, ThreadRngShuffler, shuffled};
pub use ticker::SessionTicker;
