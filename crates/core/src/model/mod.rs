mod answers;
mod content;
mod ids;
mod phase;
mod question;
mod settings;
mod snapshot;

pub use answers::AnswerMap;
pub use content::{ContentKind, ContentRecord};
pub use ids::{ChapterId, ChapterIdError};
pub use phase::SessionPhase;
pub use question::{Question, QuestionError, QuestionSet};
pub use settings::{
    DEFAULT_KEY_NAMESPACE, DEFAULT_PAGE_SIZE, DEFAULT_SUBMIT_FLOOR, QuizSettings, SettingsError,
};
pub use snapshot::SessionSnapshot;
