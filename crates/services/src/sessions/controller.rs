use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use quiz_core::model::{ContentRecord, SessionPhase};
use quiz_core::scoring::QuizResult;
use storage::progress::progress_key;

use super::session::{AnswerOutcome, QuizSession, SessionContext};
use super::shuffle::{Shuffler, ThreadRngShuffler};
use super::ticker::SessionTicker;
use crate::error::SessionError;

const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Discrete inputs to the chapter controller. Handled one at a time, to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizEvent {
    Tick { generation: u64 },
    Resume,
    Discard,
    Select { index: usize, option: usize },
    NextBatch,
    PreviousBatch,
    GoToBatch(usize),
    RequestSubmit,
    CancelSubmit,
    ConfirmSubmit,
    Retake,
}

type ResultHandler = Arc<dyn Fn(&QuizResult) + Send + Sync>;

/// Hosts the quiz session of whichever chapter is loaded.
///
/// Keeps at most one ticker alive, and only while the session is `Active`.
/// Loading new content tears down the ticker and the old session before the
/// new one starts.
pub struct QuizController {
    ctx: SessionContext,
    events: UnboundedSender<QuizEvent>,
    tick_period: Duration,
    shuffler: Box<dyn Shuffler>,
    on_complete: Option<ResultHandler>,
    content: Option<ContentRecord>,
    session: Option<QuizSession>,
    ticker: Option<SessionTicker>,
    generation: u64,
}

impl QuizController {
    /// `events` receives ticker output; feed it back through `handle`.
    #[must_use]
    pub fn new(ctx: SessionContext, events: UnboundedSender<QuizEvent>) -> Self {
        Self {
            ctx,
            events,
            tick_period: DEFAULT_TICK_PERIOD,
            shuffler: Box::new(ThreadRngShuffler),
            on_complete: None,
            content: None,
            session: None,
            ticker: None,
            generation: 0,
        }
    }

    #[must_use]
    pub fn with_shuffler(mut self, shuffler: Box<dyn Shuffler>) -> Self {
        self.shuffler = shuffler;
        self
    }

    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Called once per confirmed submission, for every session this controller hosts.
    #[must_use]
    pub fn with_completion_handler(mut self, handler: ResultHandler) -> Self {
        self.on_complete = Some(handler);
        self
    }

    /// Switch to new content.
    ///
    /// Returns the phase the new quiz opened in, or `None` for non-quiz content.
    ///
    /// # Errors
    ///
    /// Propagates `SessionError` from starting the session.
    pub async fn load_content(
        &mut self,
        record: ContentRecord,
    ) -> Result<Option<SessionPhase>, SessionError> {
        self.teardown();
        if !record.is_quiz() {
            tracing::debug!(chapter = %record.chapter_id, kind = ?record.kind, "loaded non-quiz content");
            self.content = Some(record);
            return Ok(None);
        }

        let session = self.build_session(&record, true);
        self.content = Some(record);
        let phase = self.start_session(session).await?;
        Ok(Some(phase))
    }

    /// Apply one event, then bring the ticker in line with the resulting phase.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuiz` when no quiz is loaded, or whatever the
    /// session transition rejects.
    pub async fn handle(&mut self, event: QuizEvent) -> Result<(), SessionError> {
        let outcome = self.dispatch(event).await;
        self.sync_ticker();
        outcome
    }

    /// Throw away the current attempt and start a fresh shuffled one for the
    /// same chapter. Finalized answers from the host are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuiz` when the loaded content is not a quiz.
    pub async fn retake(&mut self) -> Result<SessionPhase, SessionError> {
        let Some(record) = self.content.clone().filter(ContentRecord::is_quiz) else {
            return Err(SessionError::NoQuiz);
        };
        self.stop_ticker();
        self.session = None;

        let key = progress_key(self.ctx.settings.key_namespace(), &record.chapter_id);
        if let Err(err) = self.ctx.store.delete(&key).await {
            tracing::warn!(chapter = %record.chapter_id, error = %err, "could not clear quiz progress before retake");
        }

        let session = self.build_session(&record, false);
        tracing::info!(chapter = %record.chapter_id, "retaking quiz");
        self.start_session(session).await
    }

    /// Whether the host shell should warn before leaving or reloading.
    #[must_use]
    pub fn should_warn_on_leave(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(QuizSession::has_unsubmitted_progress)
    }

    #[must_use]
    pub fn content(&self) -> Option<&ContentRecord> {
        self.content.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut QuizSession> {
        self.session.as_mut()
    }

    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    #[must_use]
    pub fn ticker_generation(&self) -> Option<u64> {
        self.ticker.as_ref().map(SessionTicker::generation)
    }

    async fn dispatch(&mut self, event: QuizEvent) -> Result<(), SessionError> {
        match event {
            QuizEvent::Tick { generation } => {
                self.on_tick(generation);
                return Ok(());
            }
            QuizEvent::Retake => {
                self.retake().await?;
                return Ok(());
            }
            _ => {}
        }

        let session = self.session.as_mut().ok_or(SessionError::NoQuiz)?;
        match event {
            QuizEvent::Resume => session.resume().await,
            QuizEvent::Discard => session.discard().await,
            QuizEvent::Select { index, option } => {
                if session.select_answer(index, option).await? == AnswerOutcome::AlreadyAnswered {
                    tracing::debug!(index, "ignored repeat selection");
                }
                Ok(())
            }
            QuizEvent::NextBatch => session.next_batch().await.map(|_| ()),
            QuizEvent::PreviousBatch => session.previous_batch().await.map(|_| ()),
            QuizEvent::GoToBatch(index) => session.go_to_batch(index).await.map(|_| ()),
            QuizEvent::RequestSubmit => session.request_submit().await,
            QuizEvent::CancelSubmit => session.cancel_submit().await,
            QuizEvent::ConfirmSubmit => session.confirm_submit().await.map(|_| ()),
            QuizEvent::Tick { .. } | QuizEvent::Retake => Ok(()),
        }
    }

    fn on_tick(&mut self, generation: u64) {
        if self.ticker_generation() != Some(generation) {
            tracing::trace!(generation, "dropping tick from retired ticker");
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.tick();
        }
    }

    fn build_session(&self, record: &ContentRecord, honor_finalized: bool) -> QuizSession {
        let finalized = if honor_finalized {
            record.finalized_answers.clone()
        } else {
            None
        };
        let session = QuizSession::new(
            record.chapter_id.clone(),
            record.quiz_questions().to_vec(),
            finalized,
            self.ctx.clone(),
        );
        match &self.on_complete {
            Some(handler) => {
                let handler = Arc::clone(handler);
                session.with_completion(Box::new(move |result: &QuizResult| handler(result)))
            }
            None => session,
        }
    }

    async fn start_session(
        &mut self,
        mut session: QuizSession,
    ) -> Result<SessionPhase, SessionError> {
        let phase = session.start(self.shuffler.as_mut()).await?;
        self.session = Some(session);
        self.sync_ticker();
        Ok(phase)
    }

    fn sync_ticker(&mut self) {
        let active = self
            .session
            .as_ref()
            .is_some_and(|session| session.phase().is_active());
        if active && self.ticker.is_none() {
            self.generation += 1;
            self.ticker = Some(SessionTicker::spawn(
                self.tick_period,
                self.generation,
                self.events.clone(),
            ));
        } else if !active {
            self.stop_ticker();
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }

    fn teardown(&mut self) {
        self.stop_ticker();
        if let Some(session) = self.session.take() {
            tracing::debug!(chapter = %session.chapter_id(), phase = %session.phase(), "unloading quiz");
        }
        self.content = None;
    }
}
