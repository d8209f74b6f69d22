mod common;

use std::sync::{Arc, Mutex};

use common::{FailingStore, KeepOrder, Reverse, chapter, ctx, ctx_with, questions};
use quiz_core::model::{AnswerMap, Question, QuizSettings, SessionPhase, SessionSnapshot};
use quiz_core::scoring::{QuizResult, score};
use services::{QuizSession, SeededShuffler, SessionError, StoreOp};
use storage::progress::{decode_snapshot, encode_snapshot, progress_key};
use storage::repository::{InMemoryProgressStore, ProgressStore};

async fn store_snapshot(
    store: &InMemoryProgressStore,
    chapter_id: &str,
    snapshot: &SessionSnapshot,
) {
    let key = progress_key("quiz_progress", &chapter(chapter_id));
    store
        .set(&key, &encode_snapshot(snapshot).unwrap())
        .await
        .unwrap();
}

async fn answer_first(session: &mut QuizSession, count: usize) {
    for index in 0..count {
        session.select_answer(index, 0).await.unwrap();
    }
}

#[tokio::test]
async fn end_to_end_scores_and_notifies_host_once() {
    let store = InMemoryProgressStore::new();
    let q = vec![
        Question::new("q0", vec!["a".into(), "b".into()], 1, None).unwrap(),
        Question::new("q1", vec!["c".into(), "d".into()], 0, None).unwrap(),
    ];
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);

    let mut session = QuizSession::new(chapter("ch-e2e"), q.clone(), None, ctx(&store))
        .with_completion(Box::new(move |result: &QuizResult| {
            sink.lock().unwrap().push(result.clone());
        }));
    session.start(&mut KeepOrder).await.unwrap();
    session.select_answer(0, 1).await.unwrap();
    session.select_answer(1, 1).await.unwrap();
    session.tick();
    session.request_submit().await.unwrap();
    let result = session.confirm_submit().await.unwrap();

    assert_eq!(result.score(), 1);
    assert_eq!(result.answer_map(), &[(0, 1), (1, 1)].into_iter().collect::<AnswerMap>());
    assert_eq!(result.question_set().as_slice(), q.as_slice());
    assert_eq!(result.elapsed_seconds(), 1);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], result);
}

#[tokio::test]
async fn submission_clears_snapshot_and_is_terminal() {
    let store = InMemoryProgressStore::new();
    let mut session = QuizSession::new(chapter("ch-term"), questions(3), None, ctx(&store));
    session.start(&mut KeepOrder).await.unwrap();
    answer_first(&mut session, 3).await;
    assert_eq!(store.len().unwrap(), 1);

    session.request_submit().await.unwrap();
    let result = session.confirm_submit().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Results);
    assert_eq!(store.len().unwrap(), 0);

    let before = session.answers().clone();
    let err = session.select_answer(0, 3).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidTransition { .. }));
    assert!(session.request_submit().await.is_err());
    assert!(session.confirm_submit().await.is_err());
    assert!(session.resume().await.is_err());
    assert_eq!(session.answers(), &before);
    assert_eq!(score(session.questions(), session.answers()), result.score());
    assert_eq!(store.len().unwrap(), 0);
}

#[tokio::test]
async fn submission_floor_for_short_sets_is_the_whole_set() {
    let store = InMemoryProgressStore::new();
    let mut session = QuizSession::new(chapter("ch-10"), questions(10), None, ctx(&store));
    session.start(&mut KeepOrder).await.unwrap();

    answer_first(&mut session, 9).await;
    assert!(!session.can_submit());
    assert_eq!(
        session.request_submit().await.unwrap_err(),
        SessionError::NotEnoughAnswers {
            answered: 9,
            required: 10
        }
    );
    assert_eq!(session.phase(), SessionPhase::Active);

    session.select_answer(9, 0).await.unwrap();
    session.request_submit().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::SubmitConfirm);
}

#[tokio::test]
async fn submission_floor_for_large_sets_is_fifty() {
    let store = InMemoryProgressStore::new();
    let mut session = QuizSession::new(chapter("ch-200"), questions(200), None, ctx(&store));
    session.start(&mut SeededShuffler::new(9)).await.unwrap();

    answer_first(&mut session, 49).await;
    assert!(!session.can_submit());
    assert_eq!(session.progress().remaining_to_unlock(), 1);

    session.select_answer(150, 1).await.unwrap();
    assert!(session.can_submit());
    session.request_submit().await.unwrap();
    session.cancel_submit().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Active);
    assert_eq!(session.answers().len(), 50);
}

#[tokio::test]
async fn empty_question_set_submits_zero_of_zero() {
    let store = InMemoryProgressStore::new();
    let mut session = QuizSession::new(chapter("ch-empty"), Vec::new(), None, ctx(&store));
    session.start(&mut SeededShuffler::new(1)).await.unwrap();

    assert!(session.can_submit());
    assert!(session.current_batch().is_empty());
    session.request_submit().await.unwrap();
    let result = session.confirm_submit().await.unwrap();
    assert_eq!(result.score(), 0);
    assert_eq!(result.total(), 0);
    assert!(result.answer_map().is_empty());
}

#[tokio::test]
async fn resume_restores_answers_position_and_order_but_not_time() {
    let store = InMemoryProgressStore::new();
    let stored_order: Vec<Question> = questions(5).into_iter().rev().collect();
    let snapshot = SessionSnapshot {
        answer_map: [(0, 2), (1, 0)].into_iter().collect(),
        batch_index: 1,
        question_set: stored_order.into(),
    };
    store_snapshot(&store, "ch-resume", &snapshot).await;

    let settings = QuizSettings::new(2, 50, "quiz_progress").unwrap();
    let mut session = QuizSession::new(
        chapter("ch-resume"),
        questions(5),
        None,
        ctx_with(Arc::new(store.clone()), settings),
    );
    let phase = session.start(&mut KeepOrder).await.unwrap();
    assert_eq!(phase, SessionPhase::ResumePrompt);
    assert!(session.answers().is_empty());
    assert_eq!(session.pending_snapshot(), Some(&snapshot));

    // No answers or ticks while the prompt is open.
    assert!(session.select_answer(2, 0).await.is_err());
    session.tick();

    session.resume().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Active);
    assert_eq!(session.answers(), &snapshot.answer_map);
    assert_eq!(session.batch_index(), 1);
    assert_eq!(session.questions(), &snapshot.question_set);
    assert_eq!(session.elapsed_seconds(), 0);
}

#[tokio::test]
async fn resume_clamps_stale_batch_index() {
    let store = InMemoryProgressStore::new();
    let snapshot = SessionSnapshot {
        answer_map: [(0, 1)].into_iter().collect(),
        batch_index: 7,
        question_set: questions(5).into(),
    };
    store_snapshot(&store, "ch-stale", &snapshot).await;

    let mut session = QuizSession::new(chapter("ch-stale"), questions(5), None, ctx(&store));
    session.start(&mut KeepOrder).await.unwrap();
    session.resume().await.unwrap();
    assert_eq!(session.batch_index(), 0);

    let key = progress_key("quiz_progress", &chapter("ch-stale"));
    let raw = store.get(&key).await.unwrap().unwrap();
    assert_eq!(decode_snapshot(&raw).unwrap().batch_index, 0);
}

#[tokio::test]
async fn discard_clears_store_and_keeps_fresh_shuffle() {
    let store = InMemoryProgressStore::new();
    let snapshot = SessionSnapshot {
        answer_map: [(0, 2), (1, 0)].into_iter().collect(),
        batch_index: 0,
        question_set: questions(5).into(),
    };
    store_snapshot(&store, "ch-discard", &snapshot).await;

    let mut session = QuizSession::new(chapter("ch-discard"), questions(5), None, ctx(&store));
    session.start(&mut Reverse).await.unwrap();
    session.discard().await.unwrap();

    assert_eq!(session.phase(), SessionPhase::Active);
    assert!(session.answers().is_empty());
    assert_eq!(session.batch_index(), 0);
    assert_eq!(store.len().unwrap(), 0);
    assert_ne!(session.questions(), &snapshot.question_set);
    assert_eq!(session.questions().get(0).unwrap().question(), "Q4");
}

#[tokio::test]
async fn malformed_snapshot_is_treated_as_absent() {
    let store = InMemoryProgressStore::new();
    let key = progress_key("quiz_progress", &chapter("ch-bad"));
    store.set(&key, "{not json").await.unwrap();

    let mut session = QuizSession::new(chapter("ch-bad"), questions(3), None, ctx(&store));
    let phase = session.start(&mut KeepOrder).await.unwrap();
    assert_eq!(phase, SessionPhase::Active);
    assert!(session.pending_snapshot().is_none());

    // First answer overwrites the junk entry.
    session.select_answer(0, 0).await.unwrap();
    let raw = store.get(&key).await.unwrap().unwrap();
    assert_eq!(decode_snapshot(&raw).unwrap(), session.snapshot());
}

#[tokio::test]
async fn snapshot_with_answers_outside_its_questions_is_ignored() {
    let store = InMemoryProgressStore::new();
    let stray = SessionSnapshot {
        answer_map: [(0, 9), (7, 0), (8, 0)].into_iter().collect(),
        batch_index: 0,
        question_set: questions(2).into(),
    };
    store_snapshot(&store, "ch-stray", &stray).await;

    let mut session = QuizSession::new(chapter("ch-stray"), questions(2), None, ctx(&store));
    let phase = session.start(&mut KeepOrder).await.unwrap();
    assert_eq!(phase, SessionPhase::Active);
    assert!(session.pending_snapshot().is_none());
    assert!(session.answers().is_empty());
    assert!(!session.can_submit());
    assert!(matches!(
        session.request_submit().await,
        Err(SessionError::NotEnoughAnswers {
            answered: 0,
            required: 2
        })
    ));

    // Options past the end are rejected even when every index is in range.
    let store = InMemoryProgressStore::new();
    let bad_option = SessionSnapshot {
        answer_map: [(0, 4)].into_iter().collect(),
        batch_index: 0,
        question_set: questions(2).into(),
    };
    store_snapshot(&store, "ch-stray", &bad_option).await;
    let mut session = QuizSession::new(chapter("ch-stray"), questions(2), None, ctx(&store));
    assert_eq!(
        session.start(&mut KeepOrder).await.unwrap(),
        SessionPhase::Active
    );
}

#[tokio::test]
async fn finalized_answers_open_results_directly() {
    let store = InMemoryProgressStore::new();
    let fired = Arc::new(Mutex::new(0_u32));
    let sink = Arc::clone(&fired);
    let finalized: AnswerMap = [(0, 0), (2, 3)].into_iter().collect();

    let mut session = QuizSession::new(
        chapter("ch-done"),
        questions(4),
        Some(finalized.clone()),
        ctx(&store),
    )
    .with_completion(Box::new(move |_: &QuizResult| *sink.lock().unwrap() += 1));
    let phase = session.start(&mut Reverse).await.unwrap();

    assert_eq!(phase, SessionPhase::Results);
    assert_eq!(session.answers(), &finalized);
    // Order is adopted as given, not shuffled.
    assert_eq!(session.questions().as_slice(), questions(4).as_slice());
    assert_eq!(session.result().map(|r| r.score()), Some(1));
    assert!(session.select_answer(1, 1).await.is_err());
    assert_eq!(*fired.lock().unwrap(), 0);
    assert_eq!(store.len().unwrap(), 0);
}

#[tokio::test]
async fn store_failures_are_warnings_not_errors() {
    let mut session = QuizSession::new(
        chapter("ch-offline"),
        questions(2),
        None,
        ctx_with(Arc::new(FailingStore), QuizSettings::default_settings()),
    );
    assert_eq!(session.start(&mut KeepOrder).await.unwrap(), SessionPhase::Active);
    session.select_answer(0, 0).await.unwrap();
    session.select_answer(1, 3).await.unwrap();
    session.request_submit().await.unwrap();
    let result = session.confirm_submit().await.unwrap();
    assert_eq!(result.score(), 1);
    assert_eq!(session.answers().len(), 2);

    let warnings = session.take_warnings();
    assert_eq!(warnings.first().map(|w| w.op), Some(StoreOp::Read));
    assert!(warnings.iter().any(|w| w.op == StoreOp::Write));
    assert_eq!(warnings.last().map(|w| w.op), Some(StoreOp::Delete));
    assert!(warnings.iter().all(|w| w.key == "quiz_progress_ch-offline"));
    assert!(session.warnings().is_empty());
}

#[tokio::test]
async fn answers_on_every_page_survive_to_results() {
    let store = InMemoryProgressStore::new();
    let mut session = QuizSession::new(chapter("ch-pages"), questions(120), None, ctx(&store));
    session.start(&mut KeepOrder).await.unwrap();

    for page in 0..3 {
        for index in session.current_batch_range() {
            session.select_answer(index, index % 4).await.unwrap();
        }
        assert_eq!(session.batch_index(), page);
        session.next_batch().await.unwrap();
    }
    session.previous_batch().await.unwrap();
    assert_eq!(session.batch_index(), 1);

    session.request_submit().await.unwrap();
    let result = session.confirm_submit().await.unwrap();
    assert_eq!(result.score(), 120);
    assert_eq!(result.answer_map().len(), 120);

    // Results can still be paged through.
    assert!(session.next_batch().await.unwrap());
    assert_eq!(session.batch_index(), 2);
}

#[tokio::test]
async fn navigation_is_rejected_while_prompting() {
    let store = InMemoryProgressStore::new();
    let snapshot = SessionSnapshot {
        answer_map: [(0, 1)].into_iter().collect(),
        batch_index: 0,
        question_set: questions(120).into(),
    };
    store_snapshot(&store, "ch-nav", &snapshot).await;

    let mut session = QuizSession::new(chapter("ch-nav"), questions(120), None, ctx(&store));
    session.start(&mut KeepOrder).await.unwrap();
    assert!(matches!(
        session.next_batch().await,
        Err(SessionError::InvalidTransition { .. })
    ));
    assert_eq!(session.batch_index(), 0);
}
