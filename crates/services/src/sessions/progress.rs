use quiz_core::model::SessionPhase;

/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub phase: SessionPhase,
    pub total: usize,
    pub answered: usize,
    pub required_to_submit: usize,
    pub batch_index: usize,
    pub page_count: usize,
    pub elapsed_seconds: u64,
}

impl SessionProgress {
    /// Answers still missing before submission unlocks.
    #[must_use]
    pub fn remaining_to_unlock(&self) -> usize {
        self.required_to_submit.saturating_sub(self.answered)
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.phase.is_active() && self.answered >= self.required_to_submit
    }
}
