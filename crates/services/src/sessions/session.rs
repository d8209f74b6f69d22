use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::batch::Batcher;
use quiz_core::elapsed::ElapsedTracker;
use quiz_core::model::{
    AnswerMap, ChapterId, Question, QuestionSet, QuizSettings, SessionPhase, SessionSnapshot,
};
use quiz_core::scoring::QuizResult;
use storage::progress::{decode_snapshot, encode_snapshot, progress_key};
use storage::repository::{ProgressStore, StorageError};

use super::progress::SessionProgress;
use super::shuffle::{Shuffler, shuffled};
use crate::error::{SessionAction, SessionError};

//
// ─── SUPPORT TYPES ─────────────────────────────────────────────────────────────
//

/// Host hook receiving the finalized result. Runs once, on confirmed submission.
pub type CompletionCallback = Box<dyn FnOnce(&QuizResult) + Send>;

/// Collaborators shared by every session a host creates.
#[derive(Clone)]
pub struct SessionContext {
    pub store: Arc<dyn ProgressStore>,
    pub settings: QuizSettings,
    pub clock: Clock,
}

impl SessionContext {
    #[must_use]
    pub fn new(store: Arc<dyn ProgressStore>, settings: QuizSettings, clock: Clock) -> Self {
        Self {
            store,
            settings,
            clock,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded,
    /// The index already had an answer; the first one stands.
    AlreadyAnswered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Read,
    Write,
    Delete,
}

/// A persistence failure the session recovered from.
///
/// In-memory state stays authoritative; only durability across reloads is lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWarning {
    pub op: StoreOp,
    pub key: String,
    pub message: String,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Quiz attempt for one chapter.
///
/// Owns phase, question order, answers, batch position and elapsed time. All
/// mutation goes through the named transitions below; each one finishes its
/// store write or delete before returning.
pub struct QuizSession {
    chapter_id: ChapterId,
    key: String,
    ctx: SessionContext,
    source: Vec<Question>,
    finalized: Option<AnswerMap>,
    phase: SessionPhase,
    questions: QuestionSet,
    answers: AnswerMap,
    batch_index: usize,
    elapsed: ElapsedTracker,
    pending: Option<SessionSnapshot>,
    result: Option<QuizResult>,
    on_complete: Option<CompletionCallback>,
    warnings: Vec<StoreWarning>,
}

impl QuizSession {
    /// Create an idle session. Nothing is read or shuffled until `start`.
    #[must_use]
    pub fn new(
        chapter_id: ChapterId,
        questions: Vec<Question>,
        finalized: Option<AnswerMap>,
        ctx: SessionContext,
    ) -> Self {
        let key = progress_key(ctx.settings.key_namespace(), &chapter_id);
        Self {
            chapter_id,
            key,
            ctx,
            source: questions,
            finalized,
            phase: SessionPhase::Idle,
            questions: QuestionSet::default(),
            answers: AnswerMap::new(),
            batch_index: 0,
            elapsed: ElapsedTracker::new(),
            pending: None,
            result: None,
            on_complete: None,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_completion(mut self, callback: CompletionCallback) -> Self {
        self.on_complete = Some(callback);
        self
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Leave `Idle`.
    ///
    /// - finalized answers supplied: adopt them and the given order, go to `Results`.
    /// - snapshot stored: shuffle, go to `ResumePrompt`.
    /// - otherwise: shuffle, go to `Active`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is idle.
    pub async fn start(
        &mut self,
        shuffler: &mut dyn Shuffler,
    ) -> Result<SessionPhase, SessionError> {
        if self.phase != SessionPhase::Idle {
            return Err(self.invalid(SessionAction::Start));
        }
        let source = std::mem::take(&mut self.source);

        if let Some(answers) = self.finalized.take() {
            self.questions = QuestionSet::new(source);
            self.answers = answers;
            self.elapsed.stop();
            self.result = Some(QuizResult::build(
                self.questions.clone(),
                self.answers.clone(),
                0,
                self.ctx.clock.now(),
            ));
            self.phase = SessionPhase::Results;
            tracing::info!(chapter = %self.chapter_id, "opened quiz with finalized answers");
            return Ok(self.phase);
        }

        let saved = self.load_snapshot().await;
        self.questions = shuffled(&source, shuffler);
        self.answers.clear();
        self.batch_index = 0;

        if let Some(snapshot) = saved {
            tracing::info!(
                chapter = %self.chapter_id,
                answered = snapshot.answer_map.len(),
                "saved quiz progress found"
            );
            self.pending = Some(snapshot);
            self.phase = SessionPhase::ResumePrompt;
        } else {
            self.phase = SessionPhase::Active;
            self.elapsed.run();
        }
        Ok(self.phase)
    }

    /// Continue from the stored snapshot, replacing the order shuffled on entry.
    ///
    /// Elapsed time is not restored; it counts from zero again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `ResumePrompt`.
    pub async fn resume(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::ResumePrompt {
            return Err(self.invalid(SessionAction::Resume));
        }
        let Some(snapshot) = self.pending.take() else {
            return Err(self.invalid(SessionAction::Resume));
        };

        let batcher = Batcher::new(snapshot.question_set.len(), self.ctx.settings.page_size());
        self.batch_index = batcher.clamp(snapshot.batch_index);
        self.questions = snapshot.question_set;
        self.answers = snapshot.answer_map;
        self.elapsed = ElapsedTracker::new();
        self.elapsed.run();
        self.phase = SessionPhase::Active;
        tracing::info!(
            chapter = %self.chapter_id,
            answered = self.answers.len(),
            batch = self.batch_index,
            "resumed quiz progress"
        );

        self.persist().await;
        Ok(())
    }

    /// Drop the stored snapshot and start over with the order shuffled on entry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `ResumePrompt`.
    pub async fn discard(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::ResumePrompt {
            return Err(self.invalid(SessionAction::Discard));
        }
        self.pending = None;
        self.clear_snapshot().await;
        self.answers.clear();
        self.batch_index = 0;
        self.elapsed = ElapsedTracker::new();
        self.elapsed.run();
        self.phase = SessionPhase::Active;
        tracing::info!(chapter = %self.chapter_id, "discarded saved quiz progress");
        Ok(())
    }

    /// Record `option` for question `index`.
    ///
    /// A second selection on an answered index is ignored and reported as
    /// `AnswerOutcome::AlreadyAnswered`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Active`, and
    /// `QuestionOutOfRange` / `OptionOutOfRange` for indices that do not exist.
    pub async fn select_answer(
        &mut self,
        index: usize,
        option: usize,
    ) -> Result<AnswerOutcome, SessionError> {
        if self.phase != SessionPhase::Active {
            return Err(self.invalid(SessionAction::SelectAnswer));
        }
        let Some(question) = self.questions.get(index) else {
            return Err(SessionError::QuestionOutOfRange {
                index,
                total: self.questions.len(),
            });
        };
        if option >= question.option_count() {
            return Err(SessionError::OptionOutOfRange { index, option });
        }

        if !self.answers.record(index, option) {
            tracing::debug!(chapter = %self.chapter_id, index, "answer already recorded");
            return Ok(AnswerOutcome::AlreadyAnswered);
        }

        self.persist().await;
        Ok(AnswerOutcome::Recorded)
    }

    /// Move to batch `index`. Allowed while active and while reviewing results.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` in other phases and
    /// `SessionError::BatchOutOfRange` past the last page.
    pub async fn go_to_batch(&mut self, index: usize) -> Result<usize, SessionError> {
        if !matches!(self.phase, SessionPhase::Active | SessionPhase::Results) {
            return Err(self.invalid(SessionAction::Navigate));
        }
        let page_count = self.batcher().page_count();
        if index >= page_count.max(1) {
            return Err(SessionError::BatchOutOfRange { index, page_count });
        }
        if index != self.batch_index {
            self.batch_index = index;
            self.persist().await;
        }
        Ok(self.batch_index)
    }

    /// Returns `false` when already on the last page.
    ///
    /// # Errors
    ///
    /// See `go_to_batch`.
    pub async fn next_batch(&mut self) -> Result<bool, SessionError> {
        if !self.batcher().has_next(self.batch_index) {
            self.ensure_navigable()?;
            return Ok(false);
        }
        self.go_to_batch(self.batch_index + 1).await?;
        Ok(true)
    }

    /// Returns `false` when already on the first page.
    ///
    /// # Errors
    ///
    /// See `go_to_batch`.
    pub async fn previous_batch(&mut self) -> Result<bool, SessionError> {
        if !self.batcher().has_previous(self.batch_index) {
            self.ensure_navigable()?;
            return Ok(false);
        }
        self.go_to_batch(self.batch_index - 1).await?;
        Ok(true)
    }

    /// Ask to submit. Pauses the timer behind a confirmation step.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Active` and
    /// `SessionError::NotEnoughAnswers` below `min(submit_floor, N)` answers.
    pub async fn request_submit(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Active {
            return Err(self.invalid(SessionAction::RequestSubmit));
        }
        let required = self.required_answers();
        if self.answers.len() < required {
            return Err(SessionError::NotEnoughAnswers {
                answered: self.answers.len(),
                required,
            });
        }
        self.phase = SessionPhase::SubmitConfirm;
        self.elapsed.pause();
        self.persist().await;
        Ok(())
    }

    /// Back out of the confirmation step with nothing changed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `SubmitConfirm`.
    pub async fn cancel_submit(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::SubmitConfirm {
            return Err(self.invalid(SessionAction::CancelSubmit));
        }
        self.phase = SessionPhase::Active;
        self.elapsed.run();
        self.persist().await;
        Ok(())
    }

    /// Finalize: delete the snapshot, score, enter `Results`, notify the host.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `SubmitConfirm`.
    pub async fn confirm_submit(&mut self) -> Result<QuizResult, SessionError> {
        if self.phase != SessionPhase::SubmitConfirm {
            return Err(self.invalid(SessionAction::ConfirmSubmit));
        }
        self.clear_snapshot().await;
        self.elapsed.stop();

        let result = QuizResult::build(
            self.questions.clone(),
            self.answers.clone(),
            self.elapsed.seconds(),
            self.ctx.clock.now(),
        );
        self.phase = SessionPhase::Results;
        self.result = Some(result.clone());
        tracing::info!(
            chapter = %self.chapter_id,
            score = result.score(),
            total = result.total(),
            elapsed_seconds = result.elapsed_seconds(),
            "quiz submitted"
        );

        if let Some(callback) = self.on_complete.take() {
            callback(&result);
        }
        Ok(result)
    }

    /// One second of wall-clock time. Counts only while `Active`.
    pub fn tick(&mut self) -> u64 {
        if self.phase.is_active() {
            self.elapsed.tick()
        } else {
            self.elapsed.seconds()
        }
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn chapter_id(&self) -> &ChapterId {
        &self.chapter_id
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn batch_index(&self) -> usize {
        self.batch_index
    }

    #[must_use]
    pub fn batcher(&self) -> Batcher {
        Batcher::new(self.questions.len(), self.ctx.settings.page_size())
    }

    /// Question indices on the current page.
    #[must_use]
    pub fn current_batch_range(&self) -> Range<usize> {
        self.batcher().batch_range(self.batch_index)
    }

    #[must_use]
    pub fn current_batch(&self) -> &[Question] {
        self.questions.slice_clipped(self.current_batch_range())
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.seconds()
    }

    #[must_use]
    pub fn required_answers(&self) -> usize {
        self.ctx.settings.required_answers(self.questions.len())
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.phase.is_active() && self.answers.len() >= self.required_answers()
    }

    /// Whether leaving now should warn about unsubmitted answers.
    #[must_use]
    pub fn has_unsubmitted_progress(&self) -> bool {
        self.phase.is_active() && !self.answers.is_empty()
    }

    /// Snapshot offered by the resume prompt, if any.
    #[must_use]
    pub fn pending_snapshot(&self) -> Option<&SessionSnapshot> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            answer_map: self.answers.clone(),
            batch_index: self.batch_index,
            question_set: self.questions.clone(),
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            phase: self.phase,
            total: self.questions.len(),
            answered: self.answers.len(),
            required_to_submit: self.required_answers(),
            batch_index: self.batch_index,
            page_count: self.batcher().page_count(),
            elapsed_seconds: self.elapsed.seconds(),
        }
    }

    #[must_use]
    pub fn warnings(&self) -> &[StoreWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<StoreWarning> {
        std::mem::take(&mut self.warnings)
    }

    //
    // ─── STORE ─────────────────────────────────────────────────────────────────
    //

    async fn load_snapshot(&mut self) -> Option<SessionSnapshot> {
        let raw = match self.ctx.store.get(&self.key).await {
            Ok(raw) => raw?,
            Err(err) => {
                self.warn(StoreOp::Read, &err);
                return None;
            }
        };
        match decode_snapshot(&raw) {
            Ok(snapshot) if snapshot.answers_fit_questions() => Some(snapshot),
            Ok(snapshot) => {
                tracing::warn!(
                    chapter = %self.chapter_id,
                    answered = snapshot.answer_map.len(),
                    questions = snapshot.question_set.len(),
                    "ignoring quiz snapshot with answers outside its questions"
                );
                None
            }
            Err(err) => {
                tracing::warn!(
                    chapter = %self.chapter_id,
                    error = %err,
                    "ignoring unreadable quiz snapshot"
                );
                None
            }
        }
    }

    /// Mirror unsubmitted answers to the store.
    async fn persist(&mut self) {
        if self.phase.is_terminal() || self.answers.is_empty() {
            return;
        }
        let written = match encode_snapshot(&self.snapshot()) {
            Ok(raw) => self.ctx.store.set(&self.key, &raw).await,
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            self.warn(StoreOp::Write, &err);
        }
    }

    async fn clear_snapshot(&mut self) {
        if let Err(err) = self.ctx.store.delete(&self.key).await {
            self.warn(StoreOp::Delete, &err);
        }
    }

    fn warn(&mut self, op: StoreOp, err: &StorageError) {
        tracing::warn!(
            chapter = %self.chapter_id,
            key = %self.key,
            ?op,
            error = %err,
            "quiz progress store failed; keeping state in memory"
        );
        self.warnings.push(StoreWarning {
            op,
            key: self.key.clone(),
            message: err.to_string(),
        });
    }

    fn ensure_navigable(&self) -> Result<(), SessionError> {
        if matches!(self.phase, SessionPhase::Active | SessionPhase::Results) {
            Ok(())
        } else {
            Err(self.invalid(SessionAction::Navigate))
        }
    }

    fn invalid(&self, action: SessionAction) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase,
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("chapter_id", &self.chapter_id)
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("answered", &self.answers.len())
            .field("batch_index", &self.batch_index)
            .field("elapsed", &self.elapsed.seconds())
            .field("warnings_len", &self.warnings.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
