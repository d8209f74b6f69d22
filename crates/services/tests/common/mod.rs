#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{ChapterId, Question, QuizSettings};
use quiz_core::time::fixed_clock;
use services::{SessionContext, Shuffler};
use storage::repository::{InMemoryProgressStore, ProgressStore, StorageError};

/// Leaves the order untouched so tests can reason about indices.
pub struct KeepOrder;

impl Shuffler for KeepOrder {
    fn shuffle(&mut self, _questions: &mut [Question]) {}
}

/// Reverses the order, standing in for "a different shuffle".
pub struct Reverse;

impl Shuffler for Reverse {
    fn shuffle(&mut self, questions: &mut [Question]) {
        questions.reverse();
    }
}

/// Store whose every call fails, like a full or disabled local storage.
pub struct FailingStore;

#[async_trait]
impl ProgressStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("storage disabled".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".into()))
    }
}

pub fn questions(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| {
            Question::new(
                format!("Q{i}"),
                vec!["a".into(), "b".into(), "c".into(), "d".into()],
                i % 4,
                None,
            )
            .unwrap()
        })
        .collect()
}

pub fn chapter(id: &str) -> ChapterId {
    ChapterId::new(id).unwrap()
}

pub fn ctx_with(store: Arc<dyn ProgressStore>, settings: QuizSettings) -> SessionContext {
    SessionContext::new(store, settings, fixed_clock())
}

pub fn ctx(store: &InMemoryProgressStore) -> SessionContext {
    ctx_with(Arc::new(store.clone()), QuizSettings::default_settings())
}
