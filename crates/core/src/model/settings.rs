use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_SUBMIT_FLOOR: usize = 50;
pub const DEFAULT_KEY_NAMESPACE: &str = "quiz_progress";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("page size must be > 0")]
    InvalidPageSize,

    #[error("storage key namespace cannot be empty")]
    EmptyNamespace,
}

/// Tunables for quiz sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    page_size: usize,
    submit_floor: usize,
    key_namespace: String,
}

impl QuizSettings {
    /// Pages of 50, submission unlocked at `min(50, N)` answers.
    #[must_use]
    pub fn default_settings() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            submit_floor: DEFAULT_SUBMIT_FLOOR,
            key_namespace: DEFAULT_KEY_NAMESPACE.to_owned(),
        }
    }

    /// # Errors
    ///
    /// Returns `SettingsError` if `page_size` is zero or the namespace is blank.
    pub fn new(
        page_size: usize,
        submit_floor: usize,
        key_namespace: impl Into<String>,
    ) -> Result<Self, SettingsError> {
        if page_size == 0 {
            return Err(SettingsError::InvalidPageSize);
        }
        let key_namespace = key_namespace.into();
        if key_namespace.trim().is_empty() {
            return Err(SettingsError::EmptyNamespace);
        }
        Ok(Self {
            page_size,
            submit_floor,
            key_namespace: key_namespace.trim().to_owned(),
        })
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn submit_floor(&self) -> usize {
        self.submit_floor
    }

    #[must_use]
    pub fn key_namespace(&self) -> &str {
        &self.key_namespace
    }

    /// Distinct answers needed before a set of `total` questions may be submitted.
    #[must_use]
    pub fn required_answers(&self, total: usize) -> usize {
        self.submit_floor.min(total)
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self::default_settings()
    }
}
