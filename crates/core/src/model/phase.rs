use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a quiz session currently sits. Exactly one phase is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Idle,
    ResumePrompt,
    Active,
    SubmitConfirm,
    Results,
}

impl SessionPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Results)
    }

    /// Only an active session takes answers and advances the timer.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, SessionPhase::Active)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::ResumePrompt => "resume_prompt",
            SessionPhase::Active => "active",
            SessionPhase::SubmitConfirm => "submit_confirm",
            SessionPhase::Results => "results",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
